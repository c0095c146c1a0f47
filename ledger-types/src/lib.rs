//! # Ledger Types
//!
//! Domain types and port traits for the ledger service.
//! This crate has ZERO external IO dependencies - only data structures,
//! business rules, and trait definitions.
//!
//! ## Architecture
//!
//! This crate represents the **innermost core** of the hexagonal architecture:
//! - `domain/` - Pure domain types (Money, Currency, Account, Payment)
//! - `ports/` - Trait definitions that storage adapters must implement
//! - `dto/` - Data Transfer Objects for API boundaries
//! - `error/` - Domain, repository and classified ledger errors

pub mod domain;
pub mod dto;
pub mod error;
pub mod ports;

// Re-export commonly used types
pub use domain::{Account, AccountId, Currency, LockedAccount, Money, NewPayment, Payment, PaymentId};
pub use dto::*;
pub use error::{DomainError, ErrorClass, LedgerError, RepoError};
pub use ports::{AccountStore, LedgerStore, LedgerTransaction, PaymentLedger};
