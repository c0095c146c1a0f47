//! Account domain model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::money::{Currency, Money};
use crate::error::DomainError;

/// Storage-assigned surrogate key of an account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AccountId(i64);

impl AccountId {
    pub fn new(id: i64) -> Self {
        Self(id)
    }

    pub fn get(&self) -> i64 {
        self.0
    }
}

impl std::fmt::Display for AccountId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// An account holding a single-currency balance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    /// Surrogate key, owned by storage
    pub id: AccountId,
    /// Caller-facing unique handle
    pub identifier: String,
    pub currency: Currency,
    /// Current balance, never negative
    pub balance: Money,
    pub created_at: DateTime<Utc>,
}

impl Account {
    /// Reassembles an account from stored fields.
    pub fn from_parts(
        id: AccountId,
        identifier: String,
        currency: Currency,
        balance: Money,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            identifier,
            currency,
            balance,
            created_at,
        }
    }

    /// Checks if the account could cover a debit of `amount`.
    pub fn has_sufficient_funds(&self, amount: Money) -> bool {
        self.balance >= amount
    }
}

/// An account row read under a write lock inside an open storage transaction.
///
/// This is the only handle through which a balance can change: adapters hand
/// it out from [`LedgerTransaction::lock_accounts`] and only accept it back in
/// [`LedgerTransaction::write_balance`].
///
/// [`LedgerTransaction::lock_accounts`]: crate::ports::LedgerTransaction::lock_accounts
/// [`LedgerTransaction::write_balance`]: crate::ports::LedgerTransaction::write_balance
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LockedAccount {
    account: Account,
    read_balance: Money,
}

impl LockedAccount {
    /// Wraps a row that the calling adapter has just locked.
    pub fn acquired(account: Account) -> Self {
        let read_balance = account.balance;
        Self {
            account,
            read_balance,
        }
    }

    pub fn account(&self) -> &Account {
        &self.account
    }

    pub fn identifier(&self) -> &str {
        &self.account.identifier
    }

    pub fn currency(&self) -> Currency {
        self.account.currency
    }

    pub fn balance(&self) -> Money {
        self.account.balance
    }

    /// Balance as it was when the lock was taken.
    pub fn read_balance(&self) -> Money {
        self.read_balance
    }

    /// Adds `amount` to the in-transaction balance.
    pub fn credit(&mut self, amount: Money) -> Result<(), DomainError> {
        self.account.balance = self.account.balance.checked_add(amount)?;
        Ok(())
    }

    /// Subtracts `amount` from the in-transaction balance.
    pub fn debit(&mut self, amount: Money) -> Result<(), DomainError> {
        self.account.balance = self.account.balance.checked_sub(amount)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn account(identifier: &str, balance: i64) -> Account {
        Account::from_parts(
            AccountId::new(1),
            identifier.to_string(),
            Currency::new("USD").unwrap(),
            Money::new(balance).unwrap(),
            Utc::now(),
        )
    }

    #[test]
    fn test_sufficient_funds() {
        let acc = account("A", 100);
        assert!(acc.has_sufficient_funds(Money::new(100).unwrap()));
        assert!(!acc.has_sufficient_funds(Money::new(101).unwrap()));
    }

    #[test]
    fn test_locked_account_debit_credit() {
        let mut locked = LockedAccount::acquired(account("A", 1000));
        locked.debit(Money::new(300).unwrap()).unwrap();
        locked.credit(Money::new(50).unwrap()).unwrap();

        assert_eq!(locked.balance().minor_units(), 750);
        assert_eq!(locked.read_balance().minor_units(), 1000);
    }

    #[test]
    fn test_locked_account_overdraft_leaves_balance() {
        let mut locked = LockedAccount::acquired(account("A", 100));
        let result = locked.debit(Money::new(200).unwrap());

        assert!(matches!(result, Err(DomainError::InsufficientFunds { .. })));
        assert_eq!(locked.balance().minor_units(), 100);
    }
}
