//! Transaction processing engine.
//!
//! The engine validates and applies deposits, withdrawals, internal and
//! external transfers, credit payments and loan recompense. Every operation
//! checks all of its rules before touching any account, so a rejected
//! operation leaves balances, loans and transaction logs exactly as they were.
//! On success both sides of a movement are updated and logged together.

use crate::Amount;
use crate::account::{Account, AccountType};
use crate::bank::{BankLimits, BankProfile};
use crate::clock::{Clock, SystemClock};
use crate::model::{Transaction, TransactionType};

mod error;
pub use error::{Operation, TransactionError};

/// Business accounts borrow against twice the bank's credit limit.
pub const BUSINESS_CREDIT_MULTIPLIER: i64 = 2;

/// The transaction processing engine.
///
/// Holds no account state; only the clock used to timestamp ledger entries.
#[derive(Debug, Default, Clone)]
pub struct Engine<C = SystemClock> {
    clock: C,
}

impl Engine {
    pub fn new() -> Self {
        Self::with_clock(SystemClock)
    }
}

/// Public API
impl<C: Clock> Engine<C> {
    pub fn with_clock(clock: C) -> Self {
        Self { clock }
    }

    /// Cash deposit into a balance-holding account.
    /// Student accounts are held to half the bank's deposit limit.
    pub fn deposit(
        &self,
        bank: &BankProfile,
        account: &mut Account,
        amount: Amount,
    ) -> Result<(), TransactionError> {
        use Operation::Deposit;

        ensure_positive(Deposit, amount)?;
        current_balance(Deposit, account)?;
        ensure_member(Deposit, bank, account)?;

        let limit = deposit_limit(&bank.limits, account.account_type());
        if amount > limit {
            return Err(TransactionError::LimitExceeded(Deposit, limit, amount));
        }
        ensure_headroom(Deposit, account, amount)?;

        let tx = self.entry(
            account.number(),
            TransactionType::Deposit,
            format!("Deposited Php {amount}"),
        );
        account.credit_balance(amount);
        account.record(tx);

        Ok(())
    }

    /// Cash withdrawal from a balance-holding account.
    pub fn withdraw(
        &self,
        bank: &BankProfile,
        account: &mut Account,
        amount: Amount,
    ) -> Result<(), TransactionError> {
        use Operation::Withdraw;

        ensure_positive(Withdraw, amount)?;
        let balance = current_balance(Withdraw, account)?;
        ensure_member(Withdraw, bank, account)?;
        ensure_within(Withdraw, bank.limits.withdraw_limit, amount)?;
        ensure_funds(account, balance, amount)?;

        let tx = self.entry(
            account.number(),
            TransactionType::Withdraw,
            format!("Withdraw Php {amount}"),
        );
        account.debit_balance(amount);
        account.record(tx);

        Ok(())
    }

    /// Move funds between two accounts of the same bank. No fee is charged.
    pub fn internal_transfer(
        &self,
        bank: &BankProfile,
        sender: &mut Account,
        recipient: &mut Account,
        amount: Amount,
    ) -> Result<(), TransactionError> {
        use Operation::InternalTransfer;

        ensure_positive(InternalTransfer, amount)?;
        ensure_distinct(InternalTransfer, sender, recipient)?;
        let balance = current_balance(InternalTransfer, sender)?;
        ensure_transferable(InternalTransfer, sender, recipient)?;
        ensure_member(InternalTransfer, bank, sender)?;
        ensure_member(InternalTransfer, bank, recipient)?;
        ensure_within(InternalTransfer, bank.limits.withdraw_limit, amount)?;
        ensure_headroom(InternalTransfer, recipient, amount)?;
        ensure_funds(sender, balance, amount)?;

        let sent = self.entry(
            recipient.number(),
            TransactionType::FundTransfer,
            format!("Transferred Php {amount} to {}", recipient.number()),
        );
        let received = self.entry(
            sender.number(),
            TransactionType::ReceiveTransfer,
            format!("Received Php {amount} from {}", sender.number()),
        );

        sender.debit_balance(amount);
        recipient.credit_balance(amount);
        sender.record(sent);
        recipient.record(received);

        Ok(())
    }

    /// Move funds to an account of another bank.
    ///
    /// The sender is charged `amount` plus its own bank's processing fee; the
    /// recipient receives exactly `amount`. The combined debit is held to the
    /// sender bank's withdraw limit.
    pub fn external_transfer(
        &self,
        sender_bank: &BankProfile,
        sender: &mut Account,
        recipient_bank: &BankProfile,
        recipient: &mut Account,
        amount: Amount,
    ) -> Result<(), TransactionError> {
        use Operation::ExternalTransfer;

        ensure_positive(ExternalTransfer, amount)?;
        if sender_bank.bank_id == recipient_bank.bank_id {
            return Err(TransactionError::SameBank(sender_bank.bank_id));
        }
        let balance = current_balance(ExternalTransfer, sender)?;
        ensure_transferable(ExternalTransfer, sender, recipient)?;
        ensure_member(ExternalTransfer, sender_bank, sender)?;
        ensure_member(ExternalTransfer, recipient_bank, recipient)?;

        let fee = sender_bank.limits.processing_fee;
        let withdraw_limit = sender_bank.limits.withdraw_limit;
        let total = amount
            .checked_add(fee)
            .ok_or(TransactionError::LimitExceeded(ExternalTransfer, withdraw_limit, amount))?;
        ensure_within(ExternalTransfer, withdraw_limit, total)?;
        ensure_headroom(ExternalTransfer, recipient, amount)?;
        ensure_funds(sender, balance, total)?;

        let sent = self.entry(
            recipient.number(),
            TransactionType::ExternalTransfer,
            format!(
                "Transferred Php {amount} to {} at {} (Fee: Php {fee})",
                recipient.number(),
                recipient_bank.bank_name
            ),
        );
        let received = self.entry(
            sender.number(),
            TransactionType::ReceiveTransfer,
            format!(
                "Received Php {amount} from {} at {} (Fee: Php {fee})",
                sender.number(),
                sender_bank.bank_name
            ),
        );

        sender.debit_balance(total);
        recipient.credit_balance(amount);
        sender.record(sent);
        recipient.record(received);

        Ok(())
    }

    /// Fund a savings-like account by borrowing: the sender's loan grows by `amount`.
    pub fn pay(
        &self,
        bank: &BankProfile,
        sender: &mut Account,
        recipient: &mut Account,
        amount: Amount,
    ) -> Result<(), TransactionError> {
        use Operation::Payment;

        ensure_positive(Payment, amount)?;
        ensure_distinct(Payment, sender, recipient)?;
        let loan = current_loan(Payment, sender)?;
        if !sender.account_type().can_pay_to(recipient.account_type()) {
            return Err(TransactionError::IllegalAccountType(
                Payment,
                recipient.account_type(),
            ));
        }
        ensure_member(Payment, bank, sender)?;
        ensure_member(Payment, bank, recipient)?;

        let limit = credit_limit(&bank.limits, sender.account_type());
        if loan.checked_add(amount).is_none_or(|total| total > limit) {
            return Err(TransactionError::CreditLimitExceeded {
                limit,
                loan,
                requested: amount,
            });
        }
        ensure_headroom(Payment, recipient, amount)?;

        let paid = self.entry(
            recipient.number(),
            TransactionType::Payment,
            format!("Paid Php {amount} to {}", recipient.number()),
        );
        let received = self.entry(
            sender.number(),
            TransactionType::ReceiveTransfer,
            format!(
                "Received Php {amount} from {} Account {}",
                sender.account_type(),
                sender.number()
            ),
        );

        sender.increase_loan(amount);
        recipient.credit_balance(amount);
        sender.record(paid);
        recipient.record(received);

        Ok(())
    }

    /// Repay part or all of an outstanding loan.
    pub fn recompense(
        &self,
        bank: &BankProfile,
        account: &mut Account,
        amount: Amount,
    ) -> Result<(), TransactionError> {
        use Operation::Recompense;

        ensure_positive(Recompense, amount)?;
        let loan = current_loan(Recompense, account)?;
        ensure_member(Recompense, bank, account)?;
        if amount > loan {
            return Err(TransactionError::InvalidAmount(Recompense, amount));
        }

        let tx = self.entry(
            account.number(),
            TransactionType::Recompense,
            format!("Recompensed Php {amount}"),
        );
        account.reduce_loan(amount);
        account.record(tx);

        Ok(())
    }
}

/// Private API
impl<C: Clock> Engine<C> {
    fn entry(&self, source: &str, kind: TransactionType, description: String) -> Transaction {
        Transaction::new(source, kind, description, self.clock.now())
    }
}

/// Deposit ceiling for an account type.
pub fn deposit_limit(limits: &BankLimits, account_type: AccountType) -> Amount {
    match account_type {
        AccountType::Student => limits.deposit_limit.half(),
        _ => limits.deposit_limit,
    }
}

/// Loan ceiling for an account type.
pub fn credit_limit(limits: &BankLimits, account_type: AccountType) -> Amount {
    match account_type {
        AccountType::Business => limits.credit_limit.times(BUSINESS_CREDIT_MULTIPLIER),
        _ => limits.credit_limit,
    }
}

fn ensure_positive(op: Operation, amount: Amount) -> Result<(), TransactionError> {
    if amount.is_positive() {
        Ok(())
    } else {
        Err(TransactionError::InvalidAmount(op, amount))
    }
}

fn ensure_member(
    op: Operation,
    bank: &BankProfile,
    account: &Account,
) -> Result<(), TransactionError> {
    if account.bank_id() == bank.bank_id {
        Ok(())
    } else {
        Err(TransactionError::BankMismatch(
            op,
            account.number().to_string(),
            bank.bank_id,
        ))
    }
}

fn ensure_distinct(
    op: Operation,
    sender: &Account,
    recipient: &Account,
) -> Result<(), TransactionError> {
    if sender.bank_id() == recipient.bank_id() && sender.number() == recipient.number() {
        Err(TransactionError::SameAccount(op, sender.number().to_string()))
    } else {
        Ok(())
    }
}

fn ensure_transferable(
    op: Operation,
    sender: &Account,
    recipient: &Account,
) -> Result<(), TransactionError> {
    if sender.account_type().can_transfer_to(recipient.account_type()) {
        Ok(())
    } else {
        Err(TransactionError::IllegalAccountType(
            op,
            recipient.account_type(),
        ))
    }
}

fn ensure_within(op: Operation, limit: Amount, amount: Amount) -> Result<(), TransactionError> {
    if amount > limit {
        Err(TransactionError::LimitExceeded(op, limit, amount))
    } else {
        Ok(())
    }
}

/// The credited balance must stay representable.
fn ensure_headroom(
    op: Operation,
    recipient: &Account,
    amount: Amount,
) -> Result<(), TransactionError> {
    match recipient.balance() {
        Some(balance) if balance.checked_add(amount).is_none() => Err(
            TransactionError::LimitExceeded(op, Amount::MAX.saturating_sub(balance), amount),
        ),
        _ => Ok(()),
    }
}

fn ensure_funds(
    account: &Account,
    available: Amount,
    required: Amount,
) -> Result<(), TransactionError> {
    if available < required {
        Err(TransactionError::InsufficientFunds {
            account: account.number().to_string(),
            available,
            required,
        })
    } else {
        Ok(())
    }
}

fn current_balance(op: Operation, account: &Account) -> Result<Amount, TransactionError> {
    account
        .balance()
        .ok_or(TransactionError::IllegalAccountType(op, account.account_type()))
}

fn current_loan(op: Operation, account: &Account) -> Result<Amount, TransactionError> {
    account
        .loan()
        .ok_or(TransactionError::IllegalAccountType(op, account.account_type()))
}
