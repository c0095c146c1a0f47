//! Fixed-point monetary amounts and currency codes.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::DomainError;

/// ISO-like three letter currency code, always upper case.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Currency([u8; 3]);

impl Currency {
    /// Parses a currency code, accepting any case.
    pub fn new(code: &str) -> Result<Self, DomainError> {
        let bytes = code.trim().as_bytes();
        match bytes {
            [a, b, c] if bytes.iter().all(u8::is_ascii_alphabetic) => Ok(Self([
                a.to_ascii_uppercase(),
                b.to_ascii_uppercase(),
                c.to_ascii_uppercase(),
            ])),
            _ => Err(DomainError::InvalidCurrency(code.to_string())),
        }
    }

    pub fn as_str(&self) -> &str {
        // Only ASCII letters are ever stored.
        std::str::from_utf8(&self.0).unwrap_or("???")
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Currency {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for Currency {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(&value)
    }
}

impl From<Currency> for String {
    fn from(currency: Currency) -> Self {
        currency.as_str().to_string()
    }
}

/// Non-negative amount of money in minor units (cents, pence, ...).
///
/// All arithmetic is exact and checked. The float conversion exists for
/// presentation only and must never feed back into a balance.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i64")]
pub struct Money(i64);

impl Money {
    pub const ZERO: Money = Money(0);

    /// Creates a new Money value from minor units.
    pub fn new(minor_units: i64) -> Result<Self, DomainError> {
        if minor_units < 0 {
            return Err(DomainError::NegativeAmount);
        }
        Ok(Self(minor_units))
    }

    /// Creates a strictly positive amount, as required for a transfer.
    pub fn positive(minor_units: i64) -> Result<Self, DomainError> {
        if minor_units <= 0 {
            return Err(DomainError::NonPositiveAmount);
        }
        Ok(Self(minor_units))
    }

    /// Returns the amount in minor units.
    pub fn minor_units(&self) -> i64 {
        self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// Checked addition - fails instead of wrapping past `i64::MAX`.
    pub fn checked_add(&self, other: Money) -> Result<Money, DomainError> {
        self.0
            .checked_add(other.0)
            .map(Money)
            .ok_or(DomainError::BalanceOverflow)
    }

    /// Checked subtraction - fails when the result would be negative.
    pub fn checked_sub(&self, other: Money) -> Result<Money, DomainError> {
        if self.0 < other.0 {
            return Err(DomainError::InsufficientFunds {
                available: self.0,
                requested: other.0,
            });
        }
        Ok(Money(self.0 - other.0))
    }

    /// Lossy conversion to major units, for display only.
    pub fn as_f64(&self) -> f64 {
        self.0 as f64 / 100.0
    }
}

impl TryFrom<i64> for Money {
    type Error = DomainError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Money> for i64 {
    fn from(money: Money) -> Self {
        money.0
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{:02}", self.0 / 100, self.0 % 100)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_money_creation() {
        let money = Money::new(1000).unwrap();
        assert_eq!(money.minor_units(), 1000);
        assert!(Money::new(0).unwrap().is_zero());
    }

    #[test]
    fn test_negative_money_fails() {
        let result = Money::new(-100);
        assert!(matches!(result, Err(DomainError::NegativeAmount)));
    }

    #[test]
    fn test_positive_rejects_zero_and_negative() {
        assert!(matches!(
            Money::positive(0),
            Err(DomainError::NonPositiveAmount)
        ));
        assert!(matches!(
            Money::positive(-1),
            Err(DomainError::NonPositiveAmount)
        ));
        assert_eq!(Money::positive(1).unwrap().minor_units(), 1);
    }

    #[test]
    fn test_money_addition() {
        let a = Money::new(100).unwrap();
        let b = Money::new(50).unwrap();
        assert_eq!(a.checked_add(b).unwrap().minor_units(), 150);
    }

    #[test]
    fn test_money_addition_overflow() {
        let a = Money::new(i64::MAX).unwrap();
        let result = a.checked_add(Money::new(1).unwrap());
        assert!(matches!(result, Err(DomainError::BalanceOverflow)));
    }

    #[test]
    fn test_money_subtraction_never_goes_negative() {
        let a = Money::new(100).unwrap();
        assert_eq!(a.checked_sub(a).unwrap(), Money::ZERO);

        let result = a.checked_sub(Money::new(101).unwrap());
        assert!(matches!(
            result,
            Err(DomainError::InsufficientFunds {
                available: 100,
                requested: 101
            })
        ));
    }

    #[test]
    fn test_money_display() {
        assert_eq!(Money::new(1050).unwrap().to_string(), "10.50");
        assert_eq!(Money::new(5).unwrap().to_string(), "0.05");
        assert_eq!(Money::new(0).unwrap().to_string(), "0.00");
        assert_eq!(Money::new(123456).unwrap().to_string(), "1234.56");
    }

    #[test]
    fn test_money_as_f64() {
        assert_eq!(Money::new(1234).unwrap().as_f64(), 12.34);
    }

    #[test]
    fn test_money_serde_rejects_negative() {
        let money: Money = serde_json::from_str("250").unwrap();
        assert_eq!(money.minor_units(), 250);
        assert_eq!(serde_json::to_string(&money).unwrap(), "250");
        assert!(serde_json::from_str::<Money>("-1").is_err());
    }

    #[test]
    fn test_currency_parsing() {
        assert_eq!(Currency::new("usd").unwrap().as_str(), "USD");
        assert_eq!("EUR".parse::<Currency>().unwrap().to_string(), "EUR");
        assert!(matches!(
            Currency::new("US"),
            Err(DomainError::InvalidCurrency(_))
        ));
        assert!(Currency::new("U5D").is_err());
        assert!(Currency::new("EURO").is_err());
    }

    #[test]
    fn test_currency_serde() {
        let usd: Currency = serde_json::from_str("\"usd\"").unwrap();
        assert_eq!(serde_json::to_string(&usd).unwrap(), "\"USD\"");
        assert!(serde_json::from_str::<Currency>("\"dollars\"").is_err());
    }
}
