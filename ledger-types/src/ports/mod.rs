//! Port traits (interfaces for storage adapters).
//!
//! These are the contracts that adapters must implement.
//! The transfer engine depends on these traits, not concrete implementations.

mod repository;

pub use repository::{AccountStore, LedgerStore, LedgerTransaction, PaymentLedger};
