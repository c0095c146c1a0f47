//! Error types for the ledger service.

use crate::domain::Currency;

/// Domain-level errors (business rule violations).
///
/// Every variant is something the caller could have avoided, so the
/// message is safe to show them verbatim.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DomainError {
    #[error("amount cannot be negative")]
    NegativeAmount,

    #[error("non-positive transfer amount")]
    NonPositiveAmount,

    #[error("account not found: {}", .0.join(", "))]
    AccountNotFound(Vec<String>),

    #[error("currency mismatch: {from} cannot be transferred to a {to} account")]
    CurrencyMismatch { from: Currency, to: Currency },

    #[error("insufficient funds")]
    InsufficientFunds { available: i64, requested: i64 },

    #[error("balance overflow")]
    BalanceOverflow,

    #[error("invalid currency code: {0:?}")]
    InvalidCurrency(String),

    #[error("validation error: {0}")]
    ValidationError(String),

    #[error("invalid request body: {0}")]
    InvalidRequest(String),
}

/// Repository-level errors (data access failures).
#[derive(Debug, thiserror::Error)]
pub enum RepoError {
    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Transaction error: {0}")]
    Transaction(String),

    #[error("Conflict: {0}")]
    Conflict(String),
}

/// Which side of the service boundary a failure belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// Caller's fault, message may be echoed.
    Input,
    /// Infrastructure fault, message stays server-side.
    Internal,
    /// Rollback failed; ledger consistency can no longer be asserted.
    Fatal,
}

/// Classified result of a ledger operation.
///
/// The engine converts every failure into one of these at the point of
/// origin; the HTTP layer only has to look at [`LedgerError::class`].
#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    #[error("{0}")]
    Input(DomainError),

    #[error("internal error: {0}")]
    Internal(String),

    #[error("rollback failed: {rollback} (while handling: {cause})")]
    RollbackFailed { cause: String, rollback: String },
}

impl LedgerError {
    pub fn internal(cause: impl std::fmt::Display) -> Self {
        LedgerError::Internal(cause.to_string())
    }

    pub fn class(&self) -> ErrorClass {
        match self {
            LedgerError::Input(_) => ErrorClass::Input,
            LedgerError::Internal(_) => ErrorClass::Internal,
            LedgerError::RollbackFailed { .. } => ErrorClass::Fatal,
        }
    }

    /// The message that may cross the service boundary.
    pub fn public_message(&self) -> String {
        match self {
            LedgerError::Input(e) => e.to_string(),
            LedgerError::Internal(_) | LedgerError::RollbackFailed { .. } => {
                "internal error".to_string()
            }
        }
    }
}

impl From<DomainError> for LedgerError {
    fn from(err: DomainError) -> Self {
        LedgerError::Input(err)
    }
}

impl From<RepoError> for LedgerError {
    fn from(err: RepoError) -> Self {
        match err {
            RepoError::Domain(e) => LedgerError::Input(e),
            RepoError::Conflict(msg) => LedgerError::Input(DomainError::ValidationError(msg)),
            RepoError::Database(e) | RepoError::Transaction(e) => LedgerError::Internal(e),
        }
    }
}
