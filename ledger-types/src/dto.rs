//! Data Transfer Objects (DTOs) for requests and responses.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::{Account, Payment};

// ─────────────────────────────────────────────────────────────────────────────
// Account DTOs
// ─────────────────────────────────────────────────────────────────────────────

/// Account as shown in the public listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct AccountSummary {
    /// Caller-facing account handle
    #[schema(example = "A")]
    pub identifier: String,
    #[schema(example = "USD")]
    pub currency: String,
    /// Balance in minor units (e.g., cents)
    #[schema(example = 10000)]
    pub balance: i64,
    /// Balance formatted as major.minor
    #[schema(example = "100.00")]
    pub display_balance: String,
}

impl From<&Account> for AccountSummary {
    fn from(account: &Account) -> Self {
        Self {
            identifier: account.identifier.clone(),
            currency: account.currency.to_string(),
            balance: account.balance.minor_units(),
            display_balance: account.balance.to_string(),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Transfer DTOs
// ─────────────────────────────────────────────────────────────────────────────

/// Request to move money between two accounts.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct TransferRequest {
    /// Identifier of the account to debit
    #[schema(example = "A")]
    pub from: String,
    /// Identifier of the account to credit
    #[schema(example = "B")]
    pub to: String,
    /// Amount in minor units, must be positive
    #[schema(example = 1000)]
    pub amount: i64,
}

/// A recorded payment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct PaymentResponse {
    #[schema(example = 1)]
    pub id: i64,
    #[schema(example = "A")]
    pub from: String,
    #[schema(example = "B")]
    pub to: String,
    /// Amount in minor units
    #[schema(example = 1000)]
    pub amount: i64,
    #[schema(example = "USD")]
    pub currency: String,
    /// When the transfer committed (UTC)
    pub occurred_at: DateTime<Utc>,
}

impl From<Payment> for PaymentResponse {
    fn from(p: Payment) -> Self {
        Self {
            id: p.id.get(),
            from: p.from,
            to: p.to,
            amount: p.amount.minor_units(),
            currency: p.currency.to_string(),
            occurred_at: p.occurred_at,
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Payment history DTOs
// ─────────────────────────────────────────────────────────────────────────────

/// One payment seen from the queried account's side.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct PaymentEntry {
    #[schema(example = 1)]
    pub id: i64,
    /// The other party of the payment
    #[schema(example = "B")]
    pub counterparty: String,
    /// Amount in minor units
    #[schema(example = 1000)]
    pub amount: i64,
    #[schema(example = "10.00")]
    pub display_amount: String,
    #[schema(example = "USD")]
    pub currency: String,
    pub occurred_at: DateTime<Utc>,
}

/// Payments of one account, split by role.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct PaymentHistory {
    #[schema(example = "A")]
    pub account: String,
    pub sent: Vec<PaymentEntry>,
    pub received: Vec<PaymentEntry>,
}

impl PaymentHistory {
    /// Splits `payments` into what `account` sent and what it received.
    ///
    /// A payment from the account to itself is listed on both sides.
    pub fn split(account: &str, payments: Vec<Payment>) -> Self {
        let mut sent = Vec::new();
        let mut received = Vec::new();

        for p in payments {
            if p.from == account {
                sent.push(entry(&p, &p.to));
            }
            if p.to == account {
                received.push(entry(&p, &p.from));
            }
        }

        Self {
            account: account.to_string(),
            sent,
            received,
        }
    }
}

fn entry(p: &Payment, counterparty: &str) -> PaymentEntry {
    PaymentEntry {
        id: p.id.get(),
        counterparty: counterparty.to_string(),
        amount: p.amount.minor_units(),
        display_amount: p.amount.to_string(),
        currency: p.currency.to_string(),
        occurred_at: p.occurred_at,
    }
}
