//! Banks: limit and fee configuration plus the account registry.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use crate::Amount;
use crate::account::{Account, AccountType};
use crate::engine::credit_limit;
use crate::model::{AccountNumber, BankId};

/// Errors raised while configuring a bank or registering accounts.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum BankError {
    #[error("{name} cannot be negative: {value}")]
    NegativeLimit { name: &'static str, value: Amount },
    #[error("account number {0} already exists in this bank")]
    DuplicateAccount(AccountNumber),
    #[error("account {account} belongs to bank {actual}, not {expected}")]
    WrongBank {
        account: AccountNumber,
        expected: BankId,
        actual: BankId,
    },
    #[error("account {account} has a negative {field}: {value}")]
    NegativeAccountState {
        account: AccountNumber,
        field: &'static str,
        value: Amount,
    },
    #[error("account {account} owes {loan}, above its credit limit of {limit}")]
    LoanOverLimit {
        account: AccountNumber,
        loan: Amount,
        limit: Amount,
    },
}

/// Per-bank ceilings shared by every account registered to the bank.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BankLimits {
    /// Maximum single deposit.
    pub deposit_limit: Amount,
    /// Maximum single withdrawal or outgoing transfer.
    pub withdraw_limit: Amount,
    /// Maximum outstanding loan of a credit account.
    pub credit_limit: Amount,
    /// Charged to the sender of an external transfer.
    pub processing_fee: Amount,
}

impl Default for BankLimits {
    fn default() -> Self {
        Self {
            deposit_limit: Amount::units(50_000),
            withdraw_limit: Amount::units(50_000),
            credit_limit: Amount::units(100_000),
            processing_fee: Amount::units(10),
        }
    }
}

impl BankLimits {
    pub fn validate(&self) -> Result<(), BankError> {
        let fields = [
            ("deposit limit", self.deposit_limit),
            ("withdraw limit", self.withdraw_limit),
            ("credit limit", self.credit_limit),
            ("processing fee", self.processing_fee),
        ];
        for (name, value) in fields {
            if value.is_negative() {
                return Err(BankError::NegativeLimit { name, value });
            }
        }
        Ok(())
    }
}

/// Identity and configuration of a bank, without its accounts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BankProfile {
    pub bank_id: BankId,
    pub bank_name: String,
    #[serde(flatten)]
    pub limits: BankLimits,
}

/// A bank and the accounts registered to it, in registration order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bank {
    #[serde(flatten)]
    profile: BankProfile,
    passcode: String,
    #[serde(default)]
    accounts: Vec<Account>,
}

impl Bank {
    /// Create a bank with the default limits.
    pub fn new(id: BankId, name: impl Into<String>, passcode: impl Into<String>) -> Self {
        Self {
            profile: BankProfile {
                bank_id: id,
                bank_name: name.into(),
                limits: BankLimits::default(),
            },
            passcode: passcode.into(),
            accounts: Vec::new(),
        }
    }

    pub fn with_limits(
        id: BankId,
        name: impl Into<String>,
        passcode: impl Into<String>,
        limits: BankLimits,
    ) -> Result<Self, BankError> {
        limits.validate()?;
        let mut bank = Self::new(id, name, passcode);
        bank.profile.limits = limits;
        Ok(bank)
    }

    pub fn id(&self) -> BankId {
        self.profile.bank_id
    }

    pub fn name(&self) -> &str {
        &self.profile.bank_name
    }

    pub fn limits(&self) -> &BankLimits {
        &self.profile.limits
    }

    pub fn profile(&self) -> &BankProfile {
        &self.profile
    }

    pub fn verify_passcode(&self, passcode: &str) -> bool {
        self.passcode == passcode
    }

    /// Register an account; its number must be new to this bank.
    pub fn add_account(&mut self, account: Account) -> Result<(), BankError> {
        if account.bank_id() != self.id() {
            return Err(BankError::WrongBank {
                account: account.number().to_string(),
                expected: self.id(),
                actual: account.bank_id(),
            });
        }
        if self.account_exists(account.number()) {
            return Err(BankError::DuplicateAccount(account.number().to_string()));
        }
        self.accounts.push(account);
        Ok(())
    }

    pub fn account_exists(&self, number: &str) -> bool {
        self.index_of(number).is_some()
    }

    pub fn account(&self, number: &str) -> Option<&Account> {
        self.accounts.iter().find(|a| a.number() == number)
    }

    pub fn accounts(&self) -> &[Account] {
        &self.accounts
    }

    pub fn accounts_of_type(
        &self,
        account_type: AccountType,
    ) -> impl Iterator<Item = &Account> + '_ {
        self.accounts
            .iter()
            .filter(move |a| a.account_type() == account_type)
    }

    /// Check a rehydrated bank: limits are non-negative, every account points
    /// back at this bank, account numbers are unique, balances and loans are
    /// non-negative and loans are within the credit limit.
    pub fn check_registry(&self) -> Result<(), BankError> {
        self.profile.limits.validate()?;
        for (i, account) in self.accounts.iter().enumerate() {
            self.check_account_state(account)?;
            if account.bank_id() != self.id() {
                return Err(BankError::WrongBank {
                    account: account.number().to_string(),
                    expected: self.id(),
                    actual: account.bank_id(),
                });
            }
            if self.accounts[..i].iter().any(|a| a.number() == account.number()) {
                return Err(BankError::DuplicateAccount(account.number().to_string()));
            }
        }
        Ok(())
    }

    fn check_account_state(&self, account: &Account) -> Result<(), BankError> {
        let negative = |field, value: Amount| BankError::NegativeAccountState {
            account: account.number().to_string(),
            field,
            value,
        };
        if let Some(balance) = account.balance().filter(|b| b.is_negative()) {
            return Err(negative("balance", balance));
        }
        if let Some(loan) = account.loan() {
            if loan.is_negative() {
                return Err(negative("loan", loan));
            }
            let limit = credit_limit(&self.profile.limits, account.account_type());
            if loan > limit {
                return Err(BankError::LoanOverLimit {
                    account: account.number().to_string(),
                    loan,
                    limit,
                });
            }
        }
        Ok(())
    }

    pub(crate) fn index_of(&self, number: &str) -> Option<usize> {
        self.accounts.iter().position(|a| a.number() == number)
    }

    /// Borrow the configuration and the registry separately.
    pub(crate) fn split_mut(&mut self) -> (&BankProfile, &mut [Account]) {
        (&self.profile, &mut self.accounts)
    }
}

impl fmt::Display for Bank {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Bank{{Bank ID: {}, Bank Name: {}, Bank Passcode: {}, # of Account Registered: {}}}",
            self.id(),
            self.name(),
            "*".repeat(self.passcode.chars().count()),
            self.accounts.len()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::account::Owner;

    fn owner() -> Owner {
        Owner::new("Maria", "Santos", "maria@example.com")
    }

    #[test]
    fn default_limits() {
        let bank = Bank::new(1, "BPI", "1234");
        assert_eq!(bank.limits().deposit_limit, Amount::units(50_000));
        assert_eq!(bank.limits().withdraw_limit, Amount::units(50_000));
        assert_eq!(bank.limits().credit_limit, Amount::units(100_000));
        assert_eq!(bank.limits().processing_fee, Amount::units(10));
    }

    #[test]
    fn negative_limits_are_rejected() {
        let limits = BankLimits {
            processing_fee: Amount::units(-1),
            ..BankLimits::default()
        };
        assert_eq!(
            Bank::with_limits(1, "BPI", "1234", limits),
            Err(BankError::NegativeLimit {
                name: "processing fee",
                value: Amount::units(-1)
            })
        );
    }

    #[test]
    fn duplicate_account_numbers_are_rejected() {
        let mut bank = Bank::new(1, "BPI", "1234");
        bank.add_account(Account::credit(1, "10001", owner(), "0000"))
            .unwrap();

        let result = bank.add_account(Account::credit(1, "10001", owner(), "1111"));
        assert_eq!(result, Err(BankError::DuplicateAccount("10001".to_string())));
        assert_eq!(bank.accounts().len(), 1);
    }

    #[test]
    fn accounts_of_another_bank_are_rejected() {
        let mut bank = Bank::new(1, "BPI", "1234");
        let result = bank.add_account(Account::credit(2, "10001", owner(), "0000"));
        assert!(matches!(result, Err(BankError::WrongBank { expected: 1, actual: 2, .. })));
    }

    #[test]
    fn lookup_and_filter_by_type() {
        let mut bank = Bank::new(1, "BPI", "1234");
        bank.add_account(Account::credit(1, "20001", owner(), "0000"))
            .unwrap();
        bank.add_account(Account::savings(1, "10001", owner(), "0000", Amount::ZERO).unwrap())
            .unwrap();

        assert!(bank.account("10001").is_some());
        assert!(bank.account("99999").is_none());

        let credit: Vec<_> = bank.accounts_of_type(AccountType::Credit).collect();
        assert_eq!(credit.len(), 1);
        assert_eq!(credit[0].number(), "20001");
    }

    #[test]
    fn check_registry_flags_rehydrated_duplicates() {
        let json = r#"{
            "bankId": 1, "bankName": "BPI", "passcode": "1234",
            "depositLimit": 50000.0, "withdrawLimit": 50000.0,
            "creditLimit": 100000.0, "processingFee": 10.0,
            "accounts": [
                {"bankId": 1, "accountNumber": "20001", "pin": "0000",
                 "ownerFname": "A", "ownerLname": "B", "ownerEmail": "a@b.c",
                 "accountType": "CreditAccount", "loan": 0.0},
                {"bankId": 1, "accountNumber": "20001", "pin": "0000",
                 "ownerFname": "C", "ownerLname": "D", "ownerEmail": "c@d.e",
                 "accountType": "CreditAccount", "loan": 0.0}
            ]
        }"#;
        let bank: Bank = serde_json::from_str(json).unwrap();
        assert_eq!(
            bank.check_registry(),
            Err(BankError::DuplicateAccount("20001".to_string()))
        );
    }

    fn rehydrate(accounts: &str) -> Bank {
        let json = format!(
            r#"{{
                "bankId": 1, "bankName": "BPI", "passcode": "1234",
                "depositLimit": 50000.0, "withdrawLimit": 50000.0,
                "creditLimit": 100.0, "processingFee": 10.0,
                "accounts": [{accounts}]
            }}"#
        );
        serde_json::from_str(&json).unwrap()
    }

    #[test]
    fn check_registry_flags_negative_balance() {
        let bank = rehydrate(
            r#"{"bankId": 1, "accountNumber": "10001", "pin": "0000",
                "ownerFname": "A", "ownerLname": "B", "ownerEmail": "a@b.c",
                "accountType": "SavingsAccount", "balance": -500.0}"#,
        );
        assert_eq!(
            bank.check_registry(),
            Err(BankError::NegativeAccountState {
                account: "10001".to_string(),
                field: "balance",
                value: Amount::units(-500),
            })
        );
    }

    #[test]
    fn check_registry_flags_negative_loan() {
        let bank = rehydrate(
            r#"{"bankId": 1, "accountNumber": "20001", "pin": "0000",
                "ownerFname": "A", "ownerLname": "B", "ownerEmail": "a@b.c",
                "accountType": "CreditAccount", "loan": -900.0}"#,
        );
        assert_eq!(
            bank.check_registry(),
            Err(BankError::NegativeAccountState {
                account: "20001".to_string(),
                field: "loan",
                value: Amount::units(-900),
            })
        );
    }

    #[test]
    fn check_registry_flags_loan_over_limit() {
        let bank = rehydrate(
            r#"{"bankId": 1, "accountNumber": "20001", "pin": "0000",
                "ownerFname": "A", "ownerLname": "B", "ownerEmail": "a@b.c",
                "accountType": "CreditAccount", "loan": 150.0},
               {"bankId": 1, "accountNumber": "40001", "pin": "0000",
                "ownerFname": "C", "ownerLname": "D", "ownerEmail": "c@d.e",
                "accountType": "BusinessAccount", "balance": 5000.0, "loan": 150.0,
                "businessName": "Shop", "businessPermitId": "BP-1"}"#,
        );
        assert_eq!(
            bank.check_registry(),
            Err(BankError::LoanOverLimit {
                account: "20001".to_string(),
                loan: Amount::units(150),
                limit: Amount::units(100),
            })
        );
    }

    #[test]
    fn check_registry_accepts_business_loan_within_doubled_limit() {
        let bank = rehydrate(
            r#"{"bankId": 1, "accountNumber": "40001", "pin": "0000",
                "ownerFname": "C", "ownerLname": "D", "ownerEmail": "c@d.e",
                "accountType": "BusinessAccount", "balance": 5000.0, "loan": 150.0,
                "businessName": "Shop", "businessPermitId": "BP-1"}"#,
        );
        assert_eq!(bank.check_registry(), Ok(()));
    }

    #[test]
    fn display_masks_passcode() {
        let bank = Bank::new(3, "Metrobank", "secret");
        assert_eq!(
            bank.to_string(),
            "Bank{Bank ID: 3, Bank Name: Metrobank, Bank Passcode: ******, # of Account Registered: 0}"
        );
        assert!(bank.verify_passcode("secret"));
        assert!(!bank.verify_passcode("Secret"));
    }

    #[test]
    fn serializes_persisted_record() {
        let bank = Bank::new(1, "BPI", "1234");
        let value = serde_json::to_value(&bank).unwrap();
        assert_eq!(value["bankId"], 1);
        assert_eq!(value["bankName"], "BPI");
        assert_eq!(value["passcode"], "1234");
        assert_eq!(value["depositLimit"], 50000.0);
        assert_eq!(value["processingFee"], 10.0);
        assert!(value["accounts"].as_array().unwrap().is_empty());
    }
}
