pub mod account;
pub mod amount;
pub mod bank;
pub mod clock;
pub mod config;
pub mod csv;
pub mod engine;
pub mod ledger;
pub mod model;
pub mod store;

pub use account::{Account, AccountKind, AccountType, Owner};
pub use amount::Amount;
pub use bank::{Bank, BankLimits, BankProfile};
pub use engine::{Engine, Operation, TransactionError};
pub use ledger::{Ledger, LedgerError};
pub use model::{AccountNumber, BankId, Command, Transaction, TransactionType};
