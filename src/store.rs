//! JSON persistence of the whole ledger.
//!
//! The file holds an array of bank records, each embedding its accounts and
//! their transaction logs. Saving always rewrites the full file.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

use crate::bank::Bank;
use crate::ledger::{Ledger, LedgerError};

/// Errors that can occur when loading or saving the ledger file.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("{path}: {source}")]
    Io { path: PathBuf, source: io::Error },

    #[error("{path}: malformed ledger: {source}")]
    Json {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("{path}: inconsistent ledger: {source}")]
    Ledger { path: PathBuf, source: LedgerError },
}

/// Load a ledger file. A missing file is an empty ledger.
pub fn load_ledger(path: impl AsRef<Path>) -> Result<Ledger, StoreError> {
    let path = path.as_ref();
    if !path.exists() {
        debug!(path = %path.display(), "no ledger file, starting empty");
        return Ok(Ledger::new());
    }

    let content = fs::read_to_string(path).map_err(|source| StoreError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let banks: Vec<Bank> = serde_json::from_str(&content).map_err(|source| StoreError::Json {
        path: path.to_path_buf(),
        source,
    })?;
    debug!(path = %path.display(), banks = banks.len(), "ledger loaded");

    Ledger::from_banks(banks).map_err(|source| StoreError::Ledger {
        path: path.to_path_buf(),
        source,
    })
}

/// Write the whole ledger out as pretty-printed JSON.
pub fn save_ledger(ledger: &Ledger, path: impl AsRef<Path>) -> Result<(), StoreError> {
    let path = path.as_ref();
    let json = serde_json::to_string_pretty(ledger.banks()).map_err(|source| StoreError::Json {
        path: path.to_path_buf(),
        source,
    })?;
    fs::write(path, json).map_err(|source| StoreError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    debug!(path = %path.display(), banks = ledger.banks().len(), "ledger saved");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Amount;
    use crate::account::{Account, Owner};
    use crate::bank::BankError;
    use crate::model::{Command, TransactionType};
    use std::io::Write;
    use tempfile::{NamedTempFile, TempDir};

    fn owner() -> Owner {
        Owner::new("Gabriela", "Silang", "gabriela@example.com")
    }

    fn populated() -> Ledger {
        let mut ledger = Ledger::new();
        ledger.add_bank(Bank::new(1, "BPI", "1111")).unwrap();
        ledger
            .add_account(
                1,
                Account::savings(1, "10001", owner(), "0000", Amount::units(100)).unwrap(),
            )
            .unwrap();
        ledger
            .add_account(1, Account::credit(1, "20001", owner(), "0000"))
            .unwrap();
        ledger
            .apply(Command::Pay {
                bank: 1,
                from: "20001".to_string(),
                to: "10001".to_string(),
                amount: Amount::from_float(12.34),
            })
            .unwrap();
        ledger
    }

    #[test]
    fn missing_file_loads_empty_ledger() {
        let dir = TempDir::new().unwrap();
        let ledger = load_ledger(dir.path().join("banks.json")).unwrap();
        assert!(ledger.banks().is_empty());
    }

    #[test]
    fn saved_ledger_loads_back_identically() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("banks.json");
        let ledger = populated();

        save_ledger(&ledger, &path).unwrap();
        let loaded = load_ledger(&path).unwrap();

        assert_eq!(loaded.banks(), ledger.banks());
        let savings = loaded.account(1, "10001").unwrap();
        assert_eq!(savings.balance(), Some(Amount::from_float(112.34)));
        assert_eq!(
            savings.transactions()[0].kind(),
            TransactionType::ReceiveTransfer
        );
    }

    #[test]
    fn rehydrated_accounts_keep_working() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("banks.json");
        save_ledger(&populated(), &path).unwrap();

        let mut ledger = load_ledger(&path).unwrap();
        ledger
            .apply(Command::Recompense {
                bank: 1,
                account: "20001".to_string(),
                amount: Amount::from_float(2.34),
            })
            .unwrap();

        let credit = ledger.account(1, "20001").unwrap();
        assert_eq!(credit.loan(), Some(Amount::units(10)));
        assert_eq!(credit.transactions().len(), 2);
    }

    #[test]
    fn malformed_file_fails() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(b"{ not json").unwrap();
        let result = load_ledger(file.path());
        assert!(matches!(result, Err(StoreError::Json { .. })));
    }

    #[test]
    fn duplicate_bank_ids_fail() {
        let mut file = NamedTempFile::new().unwrap();
        let bank = serde_json::to_value(Bank::new(1, "BPI", "1111")).unwrap();
        let json = serde_json::to_string(&vec![bank.clone(), bank]).unwrap();
        file.write_all(json.as_bytes()).unwrap();

        let result = load_ledger(file.path());
        assert!(matches!(
            result,
            Err(StoreError::Ledger {
                source: LedgerError::DuplicateBank(1),
                ..
            })
        ));
    }

    #[test]
    fn negative_balances_fail_to_load() {
        let mut file = NamedTempFile::new().unwrap();
        let mut bank = serde_json::to_value(Bank::new(1, "BPI", "1111")).unwrap();
        bank["accounts"] = serde_json::json!([{
            "bankId": 1, "accountNumber": "10001", "pin": "0000",
            "ownerFname": "A", "ownerLname": "B", "ownerEmail": "a@b.c",
            "accountType": "SavingsAccount", "balance": -500.0
        }]);
        let json = serde_json::to_string(&vec![bank]).unwrap();
        file.write_all(json.as_bytes()).unwrap();

        let result = load_ledger(file.path());
        assert!(matches!(
            result,
            Err(StoreError::Ledger {
                source: LedgerError::Bank(BankError::NegativeAccountState { field: "balance", .. }),
                ..
            })
        ));
    }
}
