//! Core domain types for the ledger.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::Amount;

/// Bank identifier.
pub type BankId = u32;

/// Account number, unique within its bank.
pub type AccountNumber = String;

/// Kind of money movement recorded by a ledger entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TransactionType {
    Deposit,
    Withdraw,
    FundTransfer,
    ReceiveTransfer,
    ExternalTransfer,
    Payment,
    Recompense,
}

impl fmt::Display for TransactionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Immutable ledger entry for one completed money movement.
///
/// `source` is the counterpart account for transfer legs and the account
/// itself for single-account operations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    #[serde(rename = "accountNum")]
    source: AccountNumber,
    #[serde(rename = "type")]
    kind: TransactionType,
    description: String,
    #[serde(rename = "time")]
    timestamp: NaiveDateTime,
}

impl Transaction {
    pub(crate) fn new(
        source: impl Into<AccountNumber>,
        kind: TransactionType,
        description: String,
        timestamp: NaiveDateTime,
    ) -> Self {
        Self {
            source: source.into(),
            kind,
            description,
            timestamp,
        }
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn kind(&self) -> TransactionType {
        self.kind
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn timestamp(&self) -> NaiveDateTime {
        self.timestamp
    }
}

impl fmt::Display for Transaction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Transaction{{Time: {}, Source: {}, Type: {}, Description: {}}}",
            self.timestamp.format("%Y-%m-%d %H:%M:%S"),
            self.source,
            self.kind,
            self.description
        )
    }
}

/// A request representing the possible inputs of the ledger.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Cash deposit into a balance-holding account.
    Deposit {
        bank: BankId,
        account: AccountNumber,
        amount: Amount,
    },
    /// Cash withdrawal from a balance-holding account.
    Withdraw {
        bank: BankId,
        account: AccountNumber,
        amount: Amount,
    },
    /// Fund transfer between two accounts of the same bank.
    Transfer {
        bank: BankId,
        from: AccountNumber,
        to: AccountNumber,
        amount: Amount,
    },
    /// Fund transfer to another bank; the sender pays its bank's processing fee.
    ExternalTransfer {
        from_bank: BankId,
        from: AccountNumber,
        to_bank: BankId,
        to: AccountNumber,
        amount: Amount,
    },
    /// Credit-funded payment into a savings-like account of the same bank.
    Pay {
        bank: BankId,
        from: AccountNumber,
        to: AccountNumber,
        amount: Amount,
    },
    /// Repayment reducing a loan.
    Recompense {
        bank: BankId,
        account: AccountNumber,
        amount: Amount,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn at(h: u32, m: u32, s: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 3, 14)
            .unwrap()
            .and_hms_opt(h, m, s)
            .unwrap()
    }

    #[test]
    fn transaction_display() {
        let tx = Transaction::new(
            "10001",
            TransactionType::Deposit,
            "Deposited Php 100.00".to_string(),
            at(9, 5, 0),
        );
        assert_eq!(
            tx.to_string(),
            "Transaction{Time: 2025-03-14 09:05:00, Source: 10001, Type: Deposit, Description: Deposited Php 100.00}"
        );
    }

    #[test]
    fn transaction_serializes_with_persisted_field_names() {
        let tx = Transaction::new(
            "10002",
            TransactionType::ReceiveTransfer,
            "Received Php 5.00 from 10001".to_string(),
            at(12, 0, 30),
        );
        let value = serde_json::to_value(&tx).unwrap();
        assert_eq!(value["accountNum"], "10002");
        assert_eq!(value["type"], "ReceiveTransfer");
        assert_eq!(value["time"], "2025-03-14T12:00:30");

        let back: Transaction = serde_json::from_value(value).unwrap();
        assert_eq!(back, tx);
    }
}
