//! Registry of banks and the entry point that routes commands to the engine.
//!
//! The ledger resolves bank ids and account numbers into handles, then hands
//! them to the [`Engine`]. Lookup failures are reported as
//! [`LedgerError::BankNotFound`] / [`LedgerError::AccountNotFound`]; rule
//! violations come back unchanged from the engine.

use thiserror::Error;
use tokio_stream::{Stream, StreamExt};
use tracing::info;

use crate::Amount;
use crate::account::Account;
use crate::bank::{Bank, BankError};
use crate::engine::{Engine, Operation, TransactionError};
use crate::model::{AccountNumber, BankId, Command};

/// Errors returned by [`Ledger`] operations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum LedgerError {
    #[error("bank {0} not found")]
    BankNotFound(BankId),

    #[error("account {1} not found in bank {0}")]
    AccountNotFound(BankId, AccountNumber),

    #[error("bank id {0} is already registered")]
    DuplicateBank(BankId),

    #[error("{0} takes a sender and a recipient")]
    TwoPartyOperation(Operation),

    #[error("{0} is not a transfer between two accounts of one bank")]
    SingleBankPairOperation(Operation),

    #[error(transparent)]
    Bank(#[from] BankError),

    #[error(transparent)]
    Transaction(#[from] TransactionError),
}

/// All banks known to the session, in registration order.
#[derive(Debug, Default)]
pub struct Ledger {
    banks: Vec<Bank>,
    engine: Engine,
}

/// Public API
impl Ledger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a ledger from rehydrated banks, rejecting duplicate ids.
    pub fn from_banks(banks: impl IntoIterator<Item = Bank>) -> Result<Self, LedgerError> {
        let mut ledger = Self::new();
        for bank in banks {
            ledger.add_bank(bank)?;
        }
        Ok(ledger)
    }

    pub fn add_bank(&mut self, bank: Bank) -> Result<(), LedgerError> {
        if self.banks.iter().any(|b| b.id() == bank.id()) {
            return Err(LedgerError::DuplicateBank(bank.id()));
        }
        bank.check_registry()?;
        info!(bank = bank.id(), name = bank.name(), "bank registered");
        self.banks.push(bank);
        Ok(())
    }

    pub fn add_account(&mut self, bank: BankId, account: Account) -> Result<(), LedgerError> {
        let index = self.bank_index(bank)?;
        self.banks[index].add_account(account)?;
        Ok(())
    }

    pub fn banks(&self) -> &[Bank] {
        &self.banks
    }

    pub fn into_banks(self) -> Vec<Bank> {
        self.banks
    }

    pub fn bank(&self, id: BankId) -> Result<&Bank, LedgerError> {
        self.banks
            .iter()
            .find(|b| b.id() == id)
            .ok_or(LedgerError::BankNotFound(id))
    }

    pub fn bank_by_name(&self, name: &str) -> Option<&Bank> {
        self.banks.iter().find(|b| b.name() == name)
    }

    pub fn account(&self, bank: BankId, number: &str) -> Result<&Account, LedgerError> {
        self.bank(bank)?
            .account(number)
            .ok_or_else(|| LedgerError::AccountNotFound(bank, number.to_string()))
    }

    /// First account with this number in any bank.
    pub fn find_account(&self, number: &str) -> Option<&Account> {
        self.banks.iter().find_map(|b| b.account(number))
    }

    /// Run the ledger over a stream of commands. Failed commands are skipped.
    pub async fn run(&mut self, mut stream: impl Stream<Item = Command> + Unpin) {
        while let Some(command) = stream.next().await {
            // failures are logged in `apply` and must not stop the run
            let _ = self.apply(command);
        }
    }

    /// Apply a single command on top of the current ledger state.
    pub fn apply(&mut self, command: Command) -> Result<(), LedgerError> {
        match &command {
            Command::Deposit {
                bank,
                account,
                amount,
            } => {
                let result = self.apply_single(Operation::Deposit, *bank, account, *amount);
                Self::log_result(Operation::Deposit, *bank, account, *amount, &result);
                result?;
            }
            Command::Withdraw {
                bank,
                account,
                amount,
            } => {
                let result = self.apply_single(Operation::Withdraw, *bank, account, *amount);
                Self::log_result(Operation::Withdraw, *bank, account, *amount, &result);
                result?;
            }
            Command::Recompense {
                bank,
                account,
                amount,
            } => {
                let result = self.apply_single(Operation::Recompense, *bank, account, *amount);
                Self::log_result(Operation::Recompense, *bank, account, *amount, &result);
                result?;
            }
            Command::Transfer {
                bank,
                from,
                to,
                amount,
            } => {
                let result =
                    self.apply_pair(Operation::InternalTransfer, *bank, from, to, *amount);
                Self::log_result(Operation::InternalTransfer, *bank, from, *amount, &result);
                result?;
            }
            Command::Pay {
                bank,
                from,
                to,
                amount,
            } => {
                let result = self.apply_pair(Operation::Payment, *bank, from, to, *amount);
                Self::log_result(Operation::Payment, *bank, from, *amount, &result);
                result?;
            }
            Command::ExternalTransfer {
                from_bank,
                from,
                to_bank,
                to,
                amount,
            } => {
                let result = self.apply_external(*from_bank, from, *to_bank, to, *amount);
                Self::log_result(
                    Operation::ExternalTransfer,
                    *from_bank,
                    from,
                    *amount,
                    &result,
                );
                result?;
            }
        }
        Ok(())
    }
}

/// Private API
impl Ledger {
    fn log_result(
        op: Operation,
        bank: BankId,
        account: &str,
        amount: Amount,
        result: &Result<(), LedgerError>,
    ) {
        match result {
            Ok(()) => {
                info!(bank = bank, account = account, amount = %amount, "{op} applied");
            }
            Err(e) => {
                info!(
                    bank = bank,
                    account = account,
                    amount = %amount,
                    reason = %e,
                    "{op} skipped"
                );
            }
        }
    }

    fn bank_index(&self, id: BankId) -> Result<usize, LedgerError> {
        self.banks
            .iter()
            .position(|b| b.id() == id)
            .ok_or(LedgerError::BankNotFound(id))
    }

    fn account_index(bank: &Bank, number: &str) -> Result<usize, LedgerError> {
        bank.index_of(number)
            .ok_or_else(|| LedgerError::AccountNotFound(bank.id(), number.to_string()))
    }

    /// Deposit, withdraw or recompense on one account.
    fn apply_single(
        &mut self,
        op: Operation,
        bank: BankId,
        number: &str,
        amount: Amount,
    ) -> Result<(), LedgerError> {
        let bank_index = self.bank_index(bank)?;
        let bank = &mut self.banks[bank_index];
        let index = Self::account_index(bank, number)?;
        let (profile, accounts) = bank.split_mut();
        let account = &mut accounts[index];

        match op {
            Operation::Deposit => self.engine.deposit(profile, account, amount)?,
            Operation::Withdraw => self.engine.withdraw(profile, account, amount)?,
            Operation::Recompense => self.engine.recompense(profile, account, amount)?,
            Operation::InternalTransfer | Operation::ExternalTransfer | Operation::Payment => {
                return Err(LedgerError::TwoPartyOperation(op));
            }
        }
        Ok(())
    }

    /// Internal transfer or payment between two accounts of one bank.
    fn apply_pair(
        &mut self,
        op: Operation,
        bank: BankId,
        from: &str,
        to: &str,
        amount: Amount,
    ) -> Result<(), LedgerError> {
        let bank_index = self.bank_index(bank)?;
        let bank = &mut self.banks[bank_index];
        let sender_index = Self::account_index(bank, from)?;
        let recipient_index = Self::account_index(bank, to)?;
        if sender_index == recipient_index {
            return Err(TransactionError::SameAccount(op, from.to_string()).into());
        }

        let (profile, accounts) = bank.split_mut();
        let (sender, recipient) = pair_mut(accounts, sender_index, recipient_index);

        match op {
            Operation::InternalTransfer => self
                .engine
                .internal_transfer(profile, sender, recipient, amount)?,
            Operation::Payment => self.engine.pay(profile, sender, recipient, amount)?,
            Operation::Deposit
            | Operation::Withdraw
            | Operation::Recompense
            | Operation::ExternalTransfer => {
                return Err(LedgerError::SingleBankPairOperation(op));
            }
        }
        Ok(())
    }

    fn apply_external(
        &mut self,
        from_bank: BankId,
        from: &str,
        to_bank: BankId,
        to: &str,
        amount: Amount,
    ) -> Result<(), LedgerError> {
        let sender_bank = self.bank_index(from_bank)?;
        let recipient_bank = self.bank_index(to_bank)?;
        if sender_bank == recipient_bank {
            return Err(TransactionError::SameBank(from_bank).into());
        }
        let sender_index = Self::account_index(&self.banks[sender_bank], from)?;
        let recipient_index = Self::account_index(&self.banks[recipient_bank], to)?;

        let (sender_bank, recipient_bank) = pair_mut(&mut self.banks, sender_bank, recipient_bank);
        let (sender_profile, sender_accounts) = sender_bank.split_mut();
        let (recipient_profile, recipient_accounts) = recipient_bank.split_mut();

        self.engine.external_transfer(
            sender_profile,
            &mut sender_accounts[sender_index],
            recipient_profile,
            &mut recipient_accounts[recipient_index],
            amount,
        )?;
        Ok(())
    }
}

/// Two distinct mutable elements of one slice, split at the higher index.
fn pair_mut<T>(items: &mut [T], first: usize, second: usize) -> (&mut T, &mut T) {
    debug_assert_ne!(first, second);
    if first < second {
        let (low, high) = items.split_at_mut(second);
        (&mut low[first], &mut high[0])
    } else {
        let (low, high) = items.split_at_mut(first);
        (&mut high[0], &mut low[second])
    }
}
