//! Customer accounts and their variant rules.

use chrono::{Datelike, Local};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use crate::Amount;
use crate::model::{AccountNumber, BankId, Transaction};

/// Minimum deposit required to open a business account.
pub const MIN_BUSINESS_OPENING_DEPOSIT: Amount = Amount::units(5_000);

/// Inclusive age window for opening a student account.
pub const STUDENT_AGE_RANGE: std::ops::RangeInclusive<i32> = 18..=25;

/// Errors raised while opening an account.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum AccountError {
    #[error("opening balance cannot be negative: {0}")]
    NegativeOpeningBalance(Amount),
    #[error("student account holders must be 18 to 25 years old, got {0}")]
    StudentAgeIneligible(i32),
    #[error("business accounts need an opening deposit of at least {minimum}, got {deposit}")]
    BelowMinimumOpeningDeposit { minimum: Amount, deposit: Amount },
}

/// Closed set of account variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AccountType {
    Savings,
    Credit,
    Student,
    Business,
}

impl AccountType {
    /// Variants carrying a cash balance: deposit, withdraw, transfer.
    pub fn holds_balance(self) -> bool {
        matches!(self, Self::Savings | Self::Student | Self::Business)
    }

    /// Variants carrying a loan: pay, recompense.
    pub fn holds_loan(self) -> bool {
        matches!(self, Self::Credit | Self::Business)
    }

    pub fn can_transfer_to(self, recipient: AccountType) -> bool {
        self.holds_balance() && recipient.holds_balance()
    }

    /// Payments only land in savings-like accounts.
    pub fn can_pay_to(self, recipient: AccountType) -> bool {
        self.holds_loan() && matches!(recipient, Self::Savings | Self::Student)
    }
}

impl fmt::Display for AccountType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Account holder details.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Owner {
    #[serde(rename = "ownerFname")]
    pub first_name: String,
    #[serde(rename = "ownerLname")]
    pub last_name: String,
    #[serde(rename = "ownerEmail")]
    pub email: String,
}

impl Owner {
    pub fn new(
        first_name: impl Into<String>,
        last_name: impl Into<String>,
        email: impl Into<String>,
    ) -> Self {
        Self {
            first_name: first_name.into(),
            last_name: last_name.into(),
            email: email.into(),
        }
    }

    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

/// Variant-specific state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "accountType")]
pub enum AccountKind {
    #[serde(rename = "SavingsAccount")]
    Savings { balance: Amount },
    #[serde(rename = "CreditAccount")]
    Credit { loan: Amount },
    #[serde(rename = "StudentAccount", rename_all = "camelCase")]
    Student {
        balance: Amount,
        year_of_birth: i32,
        student_id: String,
    },
    #[serde(rename = "BusinessAccount", rename_all = "camelCase")]
    Business {
        balance: Amount,
        loan: Amount,
        business_name: String,
        business_permit_id: String,
    },
}

impl AccountKind {
    pub fn account_type(&self) -> AccountType {
        match self {
            Self::Savings { .. } => AccountType::Savings,
            Self::Credit { .. } => AccountType::Credit,
            Self::Student { .. } => AccountType::Student,
            Self::Business { .. } => AccountType::Business,
        }
    }
}

/// A customer account registered to exactly one bank.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Account {
    bank_id: BankId,
    account_number: AccountNumber,
    #[serde(flatten)]
    owner: Owner,
    pin: String,
    #[serde(flatten)]
    kind: AccountKind,
    #[serde(default)]
    transactions: Vec<Transaction>,
}

/// Constructors
impl Account {
    fn open(
        bank_id: BankId,
        account_number: impl Into<AccountNumber>,
        owner: Owner,
        pin: impl Into<String>,
        kind: AccountKind,
    ) -> Self {
        Self {
            bank_id,
            account_number: account_number.into(),
            owner,
            pin: pin.into(),
            kind,
            transactions: Vec::new(),
        }
    }

    pub fn savings(
        bank_id: BankId,
        account_number: impl Into<AccountNumber>,
        owner: Owner,
        pin: impl Into<String>,
        opening_balance: Amount,
    ) -> Result<Self, AccountError> {
        if opening_balance.is_negative() {
            return Err(AccountError::NegativeOpeningBalance(opening_balance));
        }
        let kind = AccountKind::Savings {
            balance: opening_balance,
        };
        Ok(Self::open(bank_id, account_number, owner, pin, kind))
    }

    pub fn credit(
        bank_id: BankId,
        account_number: impl Into<AccountNumber>,
        owner: Owner,
        pin: impl Into<String>,
    ) -> Self {
        let kind = AccountKind::Credit { loan: Amount::ZERO };
        Self::open(bank_id, account_number, owner, pin, kind)
    }

    /// Open a student account, checking the holder's age against `current_year`.
    pub fn student(
        bank_id: BankId,
        account_number: impl Into<AccountNumber>,
        owner: Owner,
        pin: impl Into<String>,
        year_of_birth: i32,
        student_id: impl Into<String>,
        current_year: i32,
    ) -> Result<Self, AccountError> {
        let age = current_year - year_of_birth;
        if !STUDENT_AGE_RANGE.contains(&age) {
            return Err(AccountError::StudentAgeIneligible(age));
        }
        let kind = AccountKind::Student {
            balance: Amount::ZERO,
            year_of_birth,
            student_id: student_id.into(),
        };
        Ok(Self::open(bank_id, account_number, owner, pin, kind))
    }

    /// Same as [`Account::student`], aged against the local calendar year.
    pub fn student_today(
        bank_id: BankId,
        account_number: impl Into<AccountNumber>,
        owner: Owner,
        pin: impl Into<String>,
        year_of_birth: i32,
        student_id: impl Into<String>,
    ) -> Result<Self, AccountError> {
        let year = Local::now().year();
        Self::student(
            bank_id,
            account_number,
            owner,
            pin,
            year_of_birth,
            student_id,
            year,
        )
    }

    pub fn business(
        bank_id: BankId,
        account_number: impl Into<AccountNumber>,
        owner: Owner,
        pin: impl Into<String>,
        business_name: impl Into<String>,
        business_permit_id: impl Into<String>,
        opening_deposit: Amount,
    ) -> Result<Self, AccountError> {
        if opening_deposit < MIN_BUSINESS_OPENING_DEPOSIT {
            return Err(AccountError::BelowMinimumOpeningDeposit {
                minimum: MIN_BUSINESS_OPENING_DEPOSIT,
                deposit: opening_deposit,
            });
        }
        let kind = AccountKind::Business {
            balance: opening_deposit,
            loan: Amount::ZERO,
            business_name: business_name.into(),
            business_permit_id: business_permit_id.into(),
        };
        Ok(Self::open(bank_id, account_number, owner, pin, kind))
    }
}

/// Accessors
impl Account {
    pub fn bank_id(&self) -> BankId {
        self.bank_id
    }

    pub fn number(&self) -> &str {
        &self.account_number
    }

    pub fn owner(&self) -> &Owner {
        &self.owner
    }

    pub fn kind(&self) -> &AccountKind {
        &self.kind
    }

    pub fn account_type(&self) -> AccountType {
        self.kind.account_type()
    }

    pub fn verify_pin(&self, pin: &str) -> bool {
        self.pin == pin
    }

    /// Cash balance, if this variant holds one.
    pub fn balance(&self) -> Option<Amount> {
        match &self.kind {
            AccountKind::Savings { balance }
            | AccountKind::Student { balance, .. }
            | AccountKind::Business { balance, .. } => Some(*balance),
            AccountKind::Credit { .. } => None,
        }
    }

    /// Outstanding loan, if this variant holds one.
    pub fn loan(&self) -> Option<Amount> {
        match &self.kind {
            AccountKind::Credit { loan } | AccountKind::Business { loan, .. } => Some(*loan),
            AccountKind::Savings { .. } | AccountKind::Student { .. } => None,
        }
    }

    /// Chronological transaction log.
    pub fn transactions(&self) -> &[Transaction] {
        &self.transactions
    }

    /// One-line balance or loan statement.
    pub fn statement(&self) -> String {
        let number = &self.account_number;
        let owner = self.owner.full_name();
        match &self.kind {
            AccountKind::Savings { balance } => format!(
                "SavingsAccount{{Account Number: {number}, Owner: {owner}, Balance: Php {balance}}}"
            ),
            AccountKind::Credit { loan } => format!(
                "CreditAccount{{Account Number: {number}, Owner: {owner}, Loan Balance: Php {loan}}}"
            ),
            AccountKind::Student { balance, .. } => format!(
                "StudentAccount{{Account Number: {number}, Owner: {owner}, Balance: Php {balance}}}"
            ),
            AccountKind::Business {
                balance,
                loan,
                business_name,
                ..
            } => format!(
                "BusinessAccount{{Account Number: {number}, Owner: {owner}, Business: {business_name}, Balance: Php {balance}, Loan Balance: Php {loan}}}"
            ),
        }
    }

    /// Full transaction history, one entry per line.
    pub fn transactions_info(&self) -> String {
        if self.transactions.is_empty() {
            return "No transactions found for this account.".to_string();
        }
        let mut log = String::from("Transaction History:\n");
        for tx in &self.transactions {
            log.push_str(&tx.to_string());
            log.push('\n');
        }
        log
    }
}

/// Mutators reserved for the engine. Callers validate first; these never reject.
impl Account {
    pub(crate) fn credit_balance(&mut self, amount: Amount) {
        if let Some(balance) = self.balance_mut() {
            *balance += amount;
        }
    }

    pub(crate) fn debit_balance(&mut self, amount: Amount) {
        if let Some(balance) = self.balance_mut() {
            debug_assert!(*balance >= amount, "debit below zero must be rejected first");
            *balance -= amount;
        }
    }

    pub(crate) fn increase_loan(&mut self, amount: Amount) {
        if let Some(loan) = self.loan_mut() {
            *loan += amount;
        }
    }

    pub(crate) fn reduce_loan(&mut self, amount: Amount) {
        if let Some(loan) = self.loan_mut() {
            *loan = (*loan - amount).max(Amount::ZERO);
        }
    }

    pub(crate) fn record(&mut self, tx: Transaction) {
        self.transactions.push(tx);
    }

    fn balance_mut(&mut self) -> Option<&mut Amount> {
        match &mut self.kind {
            AccountKind::Savings { balance }
            | AccountKind::Student { balance, .. }
            | AccountKind::Business { balance, .. } => Some(balance),
            AccountKind::Credit { .. } => None,
        }
    }

    fn loan_mut(&mut self) -> Option<&mut Amount> {
        match &mut self.kind {
            AccountKind::Credit { loan } | AccountKind::Business { loan, .. } => Some(loan),
            AccountKind::Savings { .. } | AccountKind::Student { .. } => None,
        }
    }
}

impl fmt::Display for Account {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} Account {{Owner: {}, Email: {}, Bank: {}, Account Number: {}, Transactions Count: {}}}",
            self.account_type(),
            self.owner.full_name(),
            self.owner.email,
            self.bank_id,
            self.account_number,
            self.transactions.len()
        )
    }
}
