//! # Ledger Hex
//!
//! Transfer engine and HTTP adapter for the ledger service.
//!
//! ## Architecture
//!
//! - `service` - Transfer engine (orchestrates the storage transaction)
//! - `inbound/` - HTTP adapter (Axum server)
//! - `openapi` - Generated API description
//!
//! The service is generic over `S: LedgerStore`, allowing
//! different storage adapters to be injected.

pub mod inbound;
pub mod openapi;
pub mod service;


pub use service::LedgerService;
