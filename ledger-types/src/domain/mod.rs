//! Domain models for the ledger service.

pub mod account;
pub mod money;
pub mod payment;

pub use account::{Account, AccountId, LockedAccount};
pub use money::{Currency, Money};
pub use payment::{NewPayment, Payment, PaymentId};
