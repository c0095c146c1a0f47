//! Payment domain model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::money::{Currency, Money};

/// Storage-assigned surrogate key of a payment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PaymentId(i64);

impl PaymentId {
    pub fn new(id: i64) -> Self {
        Self(id)
    }

    pub fn get(&self) -> i64 {
        self.0
    }
}

impl std::fmt::Display for PaymentId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A completed transfer between two accounts.
///
/// Payments are immutable once created - a correction is a new payment in
/// the opposite direction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Payment {
    pub id: PaymentId,
    /// Identifier of the debited account
    pub from: String,
    /// Identifier of the credited account
    pub to: String,
    /// Strictly positive amount in minor units
    pub amount: Money,
    pub currency: Currency,
    /// Set by the engine when the transfer commits, never by the caller
    pub occurred_at: DateTime<Utc>,
}

impl Payment {
    /// Returns true if `identifier` sent or received this payment.
    pub fn involves(&self, identifier: &str) -> bool {
        self.from == identifier || self.to == identifier
    }
}

/// A validated payment awaiting its storage-assigned id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewPayment {
    pub from: String,
    pub to: String,
    pub amount: Money,
    pub currency: Currency,
    pub occurred_at: DateTime<Utc>,
}

impl NewPayment {
    /// Attaches the id assigned on insert.
    pub fn into_payment(self, id: PaymentId) -> Payment {
        Payment {
            id,
            from: self.from,
            to: self.to,
            amount: self.amount,
            currency: self.currency,
            occurred_at: self.occurred_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_into_payment_keeps_validated_fields() {
        let now = Utc::now();
        let new = NewPayment {
            from: "A".to_string(),
            to: "B".to_string(),
            amount: Money::new(1000).unwrap(),
            currency: Currency::new("USD").unwrap(),
            occurred_at: now,
        };

        let payment = new.into_payment(PaymentId::new(7));

        assert_eq!(payment.id.get(), 7);
        assert_eq!(payment.amount.minor_units(), 1000);
        assert_eq!(payment.occurred_at, now);
        assert!(payment.involves("A"));
        assert!(payment.involves("B"));
        assert!(!payment.involves("C"));
    }
}
