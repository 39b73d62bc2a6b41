//! # Money Module
//!
//! Provides the `Money` type for handling monetary values safely.
//!
//! ## Why Integer Money?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  THE FLOATING POINT PROBLEM                                             │
//! │                                                                         │
//! │  Summing floats:                                                        │
//! │    2 × 50.00 + 3 × 33.33 = 199.98999999999998  ❌                       │
//! │                                                                         │
//! │  OUR SOLUTION: Integer Cents                                            │
//! │    2 × 5000 + 3 × 3333 = 19999 cents = 199.99  ✅                       │
//! │                                                                         │
//! │  Every line total is exact at 2 decimals, so the invoice total is the  │
//! │  sum of already-rounded line amounts by construction.                  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use tally_core::money::Money;
//!
//! let price: Money = "33.33".parse().unwrap();
//! assert_eq!(price.cents(), 3333);
//!
//! let line_total = price.checked_multiply_quantity(3).unwrap();
//! assert_eq!(line_total.to_string(), "$99.99");
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::Add;
use std::str::FromStr;

use crate::error::ValidationError;

// =============================================================================
// Money Type
// =============================================================================

/// A monetary value in cents (2-decimal fixed precision).
///
/// ## Where Money is Used
/// ```text
/// Product.unit_price_cents ──► InvoiceLine.unit_price_cents (snapshot)
///                                   │
///                                   ▼
///                       × quantity = InvoiceLine.line_total_cents
///                                   │
///                                   ▼
///                       Σ lines    = Invoice.total_cents
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Money(i64);

impl Money {
    /// Creates a Money value from cents.
    ///
    /// ## Example
    /// ```rust
    /// use tally_core::money::Money;
    ///
    /// let price = Money::from_cents(10_000); // 100.00
    /// assert_eq!(price.cents(), 10_000);
    /// ```
    #[inline]
    pub const fn from_cents(cents: i64) -> Self {
        Money(cents)
    }

    /// Returns the value in cents.
    #[inline]
    pub const fn cents(&self) -> i64 {
        self.0
    }

    /// Returns the whole-unit portion.
    #[inline]
    pub const fn units(&self) -> i64 {
        self.0 / 100
    }

    /// Returns the cents portion (always 0-99).
    #[inline]
    pub const fn cents_part(&self) -> i64 {
        (self.0 % 100).abs()
    }

    /// Returns zero money value.
    #[inline]
    pub const fn zero() -> Self {
        Money(0)
    }

    /// Multiplies money by a quantity, returning `None` on overflow.
    ///
    /// ## Example
    /// ```rust
    /// use tally_core::money::Money;
    ///
    /// let unit_price = Money::from_cents(10_000);
    /// assert_eq!(unit_price.checked_multiply_quantity(3), Some(Money::from_cents(30_000)));
    /// assert_eq!(Money::from_cents(i64::MAX).checked_multiply_quantity(2), None);
    /// ```
    #[inline]
    pub fn checked_multiply_quantity(&self, qty: i64) -> Option<Self> {
        self.0.checked_mul(qty).map(Money)
    }

    /// Adds two amounts, returning `None` on overflow.
    #[inline]
    pub fn checked_add(&self, other: Money) -> Option<Self> {
        self.0.checked_add(other.0).map(Money)
    }

    /// Parses a non-negative decimal amount with at most two fraction digits.
    ///
    /// Accepted: `"100"`, `"100.5"`, `"33.33"`. Rejected: `"1.234"`, `"-3"`,
    /// `"1."`, `"abc"`, `""`.
    pub fn parse_amount(input: &str) -> Result<Money, ValidationError> {
        let raw = input.trim();
        let invalid = |reason: &str| ValidationError::InvalidFormat {
            field: "amount".to_string(),
            reason: reason.to_string(),
        };

        if raw.is_empty() {
            return Err(ValidationError::Required {
                field: "amount".to_string(),
            });
        }

        let (whole, fraction) = match raw.split_once('.') {
            Some((w, f)) => (w, Some(f)),
            None => (raw, None),
        };

        if whole.is_empty() || !whole.chars().all(|c| c.is_ascii_digit()) {
            return Err(invalid("must be a non-negative decimal number"));
        }

        let minor = match fraction {
            None => 0,
            Some(f) if f.is_empty() || f.len() > 2 || !f.chars().all(|c| c.is_ascii_digit()) => {
                return Err(invalid("must have one or two decimal digits"));
            }
            Some(f) if f.len() == 1 => f.parse::<i64>().map_err(|_| invalid("bad fraction"))? * 10,
            Some(f) => f.parse::<i64>().map_err(|_| invalid("bad fraction"))?,
        };

        let major: i64 = whole.parse().map_err(|_| invalid("amount is too large"))?;
        major
            .checked_mul(100)
            .and_then(|c| c.checked_add(minor))
            .map(Money)
            .ok_or_else(|| invalid("amount is too large"))
    }
}

// =============================================================================
// Trait Implementations
// =============================================================================

/// Display shows `$123.45`. Presentation layers do their own localization.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        write!(f, "{}${}.{:02}", sign, self.units().abs(), self.cents_part())
    }
}

impl FromStr for Money {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Money::parse_amount(s)
    }
}

impl Default for Money {
    fn default() -> Self {
        Money::zero()
    }
}

impl Add for Money {
    type Output = Self;

    #[inline]
    fn add(self, other: Self) -> Self {
        Money(self.0 + other.0)
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Self {
        iter.fold(Money::zero(), Add::add)
    }
}

impl<'a> Sum<&'a Money> for Money {
    fn sum<I: Iterator<Item = &'a Money>>(iter: I) -> Self {
        iter.copied().sum()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_cents() {
        let money = Money::from_cents(1099);
        assert_eq!(money.cents(), 1099);
        assert_eq!(money.units(), 10);
        assert_eq!(money.cents_part(), 99);
    }

    #[test]
    fn test_display() {
        assert_eq!(Money::from_cents(19_999).to_string(), "$199.99");
        assert_eq!(Money::from_cents(500).to_string(), "$5.00");
        assert_eq!(Money::from_cents(-550).to_string(), "-$5.50");
        assert_eq!(Money::zero().to_string(), "$0.00");
    }

    #[test]
    fn test_parse_amount() {
        assert_eq!(Money::parse_amount("100").unwrap().cents(), 10_000);
        assert_eq!(Money::parse_amount("100.00").unwrap().cents(), 10_000);
        assert_eq!(Money::parse_amount("33.33").unwrap().cents(), 3333);
        assert_eq!(Money::parse_amount("0.5").unwrap().cents(), 50);
        assert_eq!(Money::parse_amount(" 7.05 ").unwrap().cents(), 705);
    }

    #[test]
    fn test_parse_amount_rejects_bad_input() {
        assert!(Money::parse_amount("").is_err());
        assert!(Money::parse_amount("abc").is_err());
        assert!(Money::parse_amount("-3").is_err());
        assert!(Money::parse_amount("1.234").is_err());
        assert!(Money::parse_amount("1.").is_err());
        assert!(Money::parse_amount(".5").is_err());
        assert!(Money::parse_amount("1.2.3").is_err());
        assert!(Money::parse_amount("99999999999999999999").is_err());
    }

    #[test]
    fn test_from_str_matches_parse_amount() {
        let money: Money = "50.00".parse().unwrap();
        assert_eq!(money, Money::from_cents(5000));
    }

    #[test]
    fn test_arithmetic_and_sum() {
        let a = Money::from_cents(1000);
        let b = Money::from_cents(500);
        assert_eq!((a + b).cents(), 1500);

        let lines = [Money::from_cents(10_000), Money::from_cents(9_999)];
        let total: Money = lines.iter().sum();
        assert_eq!(total.cents(), 19_999);
    }

    #[test]
    fn test_checked_operations() {
        assert_eq!(
            Money::from_cents(3333).checked_multiply_quantity(3),
            Some(Money::from_cents(9999))
        );
        assert_eq!(Money::from_cents(i64::MAX).checked_multiply_quantity(2), None);
        assert_eq!(Money::from_cents(i64::MAX).checked_add(Money::from_cents(1)), None);
    }
}
