//! Error types for transaction processing.

use std::fmt;
use thiserror::Error;

use crate::Amount;
use crate::account::AccountType;
use crate::model::{AccountNumber, BankId};

/// The engine operation being performed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Deposit,
    Withdraw,
    InternalTransfer,
    ExternalTransfer,
    Payment,
    Recompense,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Deposit => "deposit",
            Self::Withdraw => "withdraw",
            Self::InternalTransfer => "transfer",
            Self::ExternalTransfer => "external transfer",
            Self::Payment => "payment",
            Self::Recompense => "recompense",
        };
        f.write_str(name)
    }
}

/// Rule violation reported by an engine operation. Nothing is mutated when one is returned.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TransactionError {
    #[error("{0}: amount must be positive and within the owed loan, got {1}")]
    InvalidAmount(Operation, Amount),

    #[error("insufficient funds in account {account}: available {available}, required {required}")]
    InsufficientFunds {
        account: AccountNumber,
        available: Amount,
        required: Amount,
    },

    #[error("{0}: {2} exceeds the bank limit of {1}")]
    LimitExceeded(Operation, Amount, Amount),

    #[error("credit limit of {limit} exceeded: loan {loan}, requested {requested}")]
    CreditLimitExceeded {
        limit: Amount,
        loan: Amount,
        requested: Amount,
    },

    #[error("{0}: illegal account type {1}")]
    IllegalAccountType(Operation, AccountType),

    #[error("{0}: sender and recipient are the same account {1}")]
    SameAccount(Operation, AccountNumber),

    #[error("{0}: account {1} is not registered to bank {2}")]
    BankMismatch(Operation, AccountNumber, BankId),

    #[error("external transfer within bank {0}, use an internal transfer")]
    SameBank(BankId),
}
