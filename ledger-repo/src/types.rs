//! Database row types shared by the SQLite and PostgreSQL adapters.

use chrono::{DateTime, Utc};
use sqlx::FromRow;

use ledger_types::{Account, AccountId, Currency, Money, Payment, PaymentId, RepoError};

// ─────────────────────────────────────────────────────────────────────────────
// Database row structs (derive FromRow for automatic mapping)
// ─────────────────────────────────────────────────────────────────────────────

/// Column list matching [`DbAccount`].
pub const ACCOUNT_COLUMNS: &str = "id, identifier, currency, balance, created_at";

/// Column list matching [`DbPayment`].
pub const PAYMENT_COLUMNS: &str = "id, from_id, to_id, amount, currency, occurred_at";

/// Account row from database.
#[derive(FromRow)]
pub struct DbAccount {
    pub id: i64,
    pub identifier: String,
    pub currency: String,
    pub balance: i64,
    pub created_at: DateTime<Utc>,
}

/// Payment row from database.
#[derive(FromRow)]
pub struct DbPayment {
    pub id: i64,
    pub from_id: String,
    pub to_id: String,
    pub amount: i64,
    pub currency: String,
    pub occurred_at: DateTime<Utc>,
}

// ─────────────────────────────────────────────────────────────────────────────
// Parsing helpers
// ─────────────────────────────────────────────────────────────────────────────

/// Stored values were validated on the way in, so a bad one is corruption
/// rather than caller input.
pub fn parse_currency(s: &str) -> Result<Currency, RepoError> {
    Currency::new(s).map_err(|_| RepoError::Database(format!("Unknown currency: {}", s)))
}

pub fn parse_money(minor_units: i64, column: &str) -> Result<Money, RepoError> {
    Money::new(minor_units)
        .map_err(|_| RepoError::Database(format!("Negative {} in storage: {}", column, minor_units)))
}

/// `?, ?, ?` for a SQLite `IN` list of `n` values.
#[cfg(feature = "sqlite")]
pub fn placeholders(n: usize) -> String {
    vec!["?"; n].join(", ")
}

// ─────────────────────────────────────────────────────────────────────────────
// Domain conversion
// ─────────────────────────────────────────────────────────────────────────────

impl DbAccount {
    /// Convert database row to domain Account.
    pub fn into_domain(self) -> Result<Account, RepoError> {
        Ok(Account::from_parts(
            AccountId::new(self.id),
            self.identifier,
            parse_currency(&self.currency)?,
            parse_money(self.balance, "balance")?,
            self.created_at,
        ))
    }
}

impl DbPayment {
    /// Convert database row to domain Payment.
    pub fn into_domain(self) -> Result<Payment, RepoError> {
        Ok(Payment {
            id: PaymentId::new(self.id),
            from: self.from_id,
            to: self.to_id,
            amount: parse_money(self.amount, "amount")?,
            currency: parse_currency(&self.currency)?,
            occurred_at: self.occurred_at,
        })
    }
}

/// Maps a sqlx error, turning unique violations into conflicts.
pub fn map_insert_error(e: sqlx::Error, what: &str) -> RepoError {
    match e.as_database_error() {
        Some(db) if db.is_unique_violation() => RepoError::Conflict(format!("{} already exists", what)),
        _ => RepoError::Database(e.to_string()),
    }
}
