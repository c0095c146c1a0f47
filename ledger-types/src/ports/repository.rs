//! Storage port traits.
//!
//! These are the primary ports in our hexagonal architecture.
//! Adapters (Postgres, SQLite, in-memory mocks) implement them.
//!
//! Reads go straight through [`AccountStore`] and [`PaymentLedger`]. Writes
//! exist only on [`LedgerTransaction`], and a balance can only be written
//! back through a [`LockedAccount`] that the same transaction handed out.

use crate::domain::{Account, LockedAccount, NewPayment, Payment};
use crate::error::RepoError;

/// Read access to account records.
#[async_trait::async_trait]
pub trait AccountStore: Send + Sync + 'static {
    /// Returns the accounts that exist among `identifiers`.
    ///
    /// Unknown identifiers are simply absent from the result.
    async fn get_accounts(&self, identifiers: &[String]) -> Result<Vec<Account>, RepoError>;

    /// Lists every account, ordered by identifier.
    async fn get_available_accounts(&self) -> Result<Vec<Account>, RepoError>;
}

/// Read access to the append-only payment log.
#[async_trait::async_trait]
pub trait PaymentLedger: Send + Sync + 'static {
    /// All payments sent or received by `identifier`, oldest first.
    ///
    /// Fails with `DomainError::AccountNotFound` when the account itself
    /// does not exist, so "no payments" and "no such account" stay distinct.
    async fn get_payments(&self, identifier: &str) -> Result<Vec<Payment>, RepoError>;
}

/// A store that can open ledger transactions.
#[async_trait::async_trait]
pub trait LedgerStore: AccountStore + PaymentLedger {
    type Tx: LedgerTransaction;

    /// Opens a storage transaction.
    async fn begin(&self) -> Result<Self::Tx, RepoError>;
}

/// One open storage transaction.
///
/// Dropping a transaction without calling `commit` discards its writes.
#[async_trait::async_trait]
pub trait LedgerTransaction: Send + 'static {
    /// Reads the given accounts under a write lock held until commit or rollback.
    ///
    /// Rows are locked in identifier order. Unknown identifiers are absent
    /// from the result.
    async fn lock_accounts(
        &mut self,
        identifiers: &[String],
    ) -> Result<Vec<LockedAccount>, RepoError>;

    /// Persists the in-transaction balance of a locked account.
    async fn write_balance(&mut self, account: &LockedAccount) -> Result<(), RepoError>;

    /// Appends a payment record and returns it with its assigned id.
    async fn append_payment(&mut self, payment: NewPayment) -> Result<Payment, RepoError>;

    async fn commit(self) -> Result<(), RepoError>;

    async fn rollback(self) -> Result<(), RepoError>;
}
