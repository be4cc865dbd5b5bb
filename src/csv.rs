use serde::{Deserialize, Serialize};
use std::io;
use std::path::Path;
use thiserror::Error;

use crate::account::Account;
use crate::bank::Bank;
use crate::model::{AccountNumber, BankId, Command};
use crate::Amount;

/// Errors that can occur when reading or writing csv files
#[derive(Debug, Error)]
pub enum CsvError {
    #[error("failed to open csv file: {0}")]
    Open(csv::Error),

    #[error("line {line}: failed to parse row: {source}")]
    Parse { line: usize, source: csv::Error },

    #[error("line {line}: unrecognized command type '{command}'")]
    UnrecognizedType { line: usize, command: String },

    #[error("line {line}: {command} missing {field}")]
    MissingField {
        line: usize,
        command: String,
        field: &'static str,
    },

    #[error("line {line}: invalid amount {value}, expected a finite value with at most 2 decimal places")]
    InvalidAmount { line: usize, value: f64 },

    #[error("failed to write csv row: {0}")]
    Write(#[from] csv::Error),

    #[error("failed to flush csv writer: {0}")]
    Flush(#[from] io::Error),
}

#[derive(Debug, Deserialize)]
struct InputRow {
    r#type: String,
    bank: BankId,
    account: AccountNumber,
    to_bank: Option<BankId>,
    to_account: Option<AccountNumber>,
    amount: Option<f64>,
}

#[derive(Debug, Serialize)]
struct SummaryRow<'a> {
    bank: BankId,
    account: &'a str,
    r#type: String,
    balance: Option<String>,
    loan: Option<String>,
    transactions: usize,
}

#[derive(Debug, Serialize)]
struct StatementRow<'a> {
    time: String,
    source: &'a str,
    r#type: String,
    description: &'a str,
}

impl InputRow {
    fn require<T>(
        value: Option<T>,
        line: usize,
        command: &str,
        field: &'static str,
    ) -> Result<T, CsvError> {
        value.ok_or_else(|| CsvError::MissingField {
            line,
            command: command.to_string(),
            field,
        })
    }

    fn into_command(self, line: usize) -> Result<Command, CsvError> {
        let kind = self.r#type.as_str();
        let value = Self::require(self.amount, line, kind, "amount")?;
        // sub-cent and out-of-range inputs are rejected, never rounded
        let amount =
            Amount::try_from_float(value).ok_or(CsvError::InvalidAmount { line, value })?;
        match kind {
            "deposit" => Ok(Command::Deposit {
                bank: self.bank,
                account: self.account,
                amount,
            }),
            "withdraw" => Ok(Command::Withdraw {
                bank: self.bank,
                account: self.account,
                amount,
            }),
            "recompense" => Ok(Command::Recompense {
                bank: self.bank,
                account: self.account,
                amount,
            }),
            "transfer" => Ok(Command::Transfer {
                bank: self.bank,
                from: self.account,
                to: Self::require(self.to_account, line, kind, "to_account")?,
                amount,
            }),
            "pay" => Ok(Command::Pay {
                bank: self.bank,
                from: self.account,
                to: Self::require(self.to_account, line, kind, "to_account")?,
                amount,
            }),
            "external" => Ok(Command::ExternalTransfer {
                from_bank: self.bank,
                from: self.account,
                to_bank: Self::require(self.to_bank, line, kind, "to_bank")?,
                to: Self::require(self.to_account, line, kind, "to_account")?,
                amount,
            }),
            other => Err(CsvError::UnrecognizedType {
                line,
                command: other.to_string(),
            }),
        }
    }
}

/// Read commands from a csv file
pub fn read_commands(
    path: impl AsRef<Path>,
) -> Result<impl Iterator<Item = Result<Command, CsvError>>, CsvError> {
    let reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_path(path)
        .map_err(CsvError::Open)?;

    Ok(reader
        .into_deserialize::<InputRow>()
        .enumerate()
        .map(|(idx, result)| {
            let line = idx + 2; // 1-indexed, skip header
            let row = result.map_err(|source| CsvError::Parse { line, source })?;
            row.into_command(line)
        }))
}

/// Write one summary row per account of every bank
pub fn write_accounts<'a>(
    banks: impl IntoIterator<Item = &'a Bank>,
    out: impl io::Write,
) -> Result<(), CsvError> {
    let mut writer = csv::Writer::from_writer(out);

    for bank in banks {
        for account in bank.accounts() {
            writer.serialize(SummaryRow {
                bank: bank.id(),
                account: account.number(),
                r#type: account.account_type().to_string(),
                balance: account.balance().map(|b| b.to_string()),
                loan: account.loan().map(|l| l.to_string()),
                transactions: account.transactions().len(),
            })?;
        }
    }

    writer.flush()?;
    Ok(())
}

/// Export an account's transaction history
pub fn write_statement(account: &Account, out: impl io::Write) -> Result<(), CsvError> {
    let mut writer = csv::Writer::from_writer(out);

    for tx in account.transactions() {
        writer.serialize(StatementRow {
            time: tx.timestamp().format("%Y-%m-%d %H:%M:%S").to_string(),
            source: tx.source(),
            r#type: tx.kind().to_string(),
            description: tx.description(),
        })?;
    }

    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::account::Owner;
    use crate::ledger::Ledger;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const HEADER: &str = "type,bank,account,to_bank,to_account,amount\n";

    fn write_csv(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(HEADER.as_bytes()).unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    fn read(content: &str) -> Vec<Result<Command, CsvError>> {
        let file = write_csv(content);
        read_commands(file.path()).unwrap().collect()
    }

    #[test]
    fn read_deposit() {
        let results = read("deposit,1,10001,,,10.5\n");
        assert_eq!(results.len(), 1);

        let command = results.into_iter().next().unwrap().unwrap();
        assert_eq!(
            command,
            Command::Deposit {
                bank: 1,
                account: "10001".to_string(),
                amount: Amount::from_float(10.5),
            }
        );
    }

    #[test]
    fn read_external_transfer() {
        let results = read("external,1,10001,2,50001,500\n");
        let command = results.into_iter().next().unwrap().unwrap();
        assert_eq!(
            command,
            Command::ExternalTransfer {
                from_bank: 1,
                from: "10001".to_string(),
                to_bank: 2,
                to: "50001".to_string(),
                amount: Amount::units(500),
            }
        );
    }

    #[test]
    fn read_with_whitespace() {
        let results = read("transfer, 1, 10001, , 10002, 25.00\n");
        assert_eq!(results.len(), 1);
        assert!(matches!(results[0], Ok(Command::Transfer { .. })));
    }

    #[test]
    fn read_returns_error_for_unknown_type() {
        let results = read("refund,1,10001,,,10.0\n");
        let err = results[0].as_ref().unwrap_err();
        assert!(matches!(err, CsvError::UnrecognizedType { line: 2, .. }));
    }

    #[test]
    fn read_returns_error_for_missing_amount() {
        let results = read("deposit,1,10001,,,\n");
        let err = results[0].as_ref().unwrap_err();
        assert!(matches!(
            err,
            CsvError::MissingField {
                line: 2,
                field: "amount",
                ..
            }
        ));
    }

    #[test]
    fn read_returns_error_for_missing_recipient() {
        let results = read("pay,1,20001,,,10.0\n");
        let err = results[0].as_ref().unwrap_err();
        assert!(matches!(
            err,
            CsvError::MissingField {
                line: 2,
                field: "to_account",
                ..
            }
        ));
    }

    #[test]
    fn read_returns_error_for_invalid_amount() {
        let results = read(
            "deposit,1,10001,,,10.005\n\
             pay,1,20001,,10001,1e300\n\
             withdraw,1,10001,,,inf\n",
        );
        assert_eq!(results.len(), 3);
        assert!(matches!(
            results[0],
            Err(CsvError::InvalidAmount { line: 2, .. })
        ));
        assert!(matches!(
            results[1],
            Err(CsvError::InvalidAmount { line: 3, .. })
        ));
        assert!(matches!(
            results[2],
            Err(CsvError::InvalidAmount { line: 4, .. })
        ));
    }

    #[test]
    fn read_missing_file_fails() {
        let result = read_commands("/nonexistent/commands.csv");
        assert!(matches!(result, Err(CsvError::Open(_))));
    }

    #[test]
    fn write_account_summaries() {
        let mut ledger = Ledger::new();
        ledger.add_bank(Bank::new(1, "BPI", "1111")).unwrap();
        let owner = Owner::new("A", "B", "a@b.c");
        ledger
            .add_account(
                1,
                Account::savings(1, "10001", owner.clone(), "0", Amount::units(75)).unwrap(),
            )
            .unwrap();
        ledger
            .add_account(1, Account::credit(1, "20001", owner, "0"))
            .unwrap();

        let mut out = Vec::new();
        write_accounts(ledger.banks(), &mut out).unwrap();

        let text = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "bank,account,type,balance,loan,transactions");
        assert_eq!(lines[1], "1,10001,Savings,75.00,,0");
        assert_eq!(lines[2], "1,20001,Credit,,0.00,0");
    }

    #[test]
    fn write_statement_lists_history() {
        let mut ledger = Ledger::new();
        ledger.add_bank(Bank::new(1, "BPI", "1111")).unwrap();
        let owner = Owner::new("A", "B", "a@b.c");
        ledger
            .add_account(
                1,
                Account::savings(1, "10001", owner, "0", Amount::ZERO).unwrap(),
            )
            .unwrap();
        ledger
            .apply(Command::Deposit {
                bank: 1,
                account: "10001".to_string(),
                amount: Amount::units(5),
            })
            .unwrap();

        let mut out = Vec::new();
        write_statement(ledger.account(1, "10001").unwrap(), &mut out).unwrap();

        let text = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "time,source,type,description");
        assert!(lines[1].ends_with(",10001,Deposit,Deposited Php 5.00"));
    }
}
