//! Exact decimal money amounts.

use std::iter::Sum;
use std::ops::Add;
use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Number of fractional digits every amount is normalised to.
const SCALE: u32 = 2;

/// A price or total in the shop's single currency.
///
/// Backed by [`Decimal`] so sums and quantity multiples are exact. Amounts
/// are kept at two fractional digits, including on deserialization;
/// serialized as a string such as `"10.00"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(from = "Decimal", into = "Decimal")]
pub struct Money(Decimal);

impl Money {
    /// Creates an amount from minor units (e.g. 1000 = 10.00).
    pub fn from_cents(cents: i64) -> Self {
        Self(Decimal::new(cents, SCALE))
    }

    /// Creates an amount from a decimal, rounding to two fractional digits
    /// with banker's rounding.
    pub fn from_decimal(amount: Decimal) -> Self {
        let mut rounded = amount.round_dp(SCALE);
        rounded.rescale(SCALE);
        Self(rounded)
    }

    /// Returns zero money.
    pub fn zero() -> Self {
        Self(Decimal::new(0, SCALE))
    }

    /// Returns the underlying decimal amount.
    pub fn amount(&self) -> Decimal {
        self.0
    }

    /// Returns true if the amount is zero.
    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    /// Returns true if the amount is below zero.
    pub fn is_negative(&self) -> bool {
        self.0.is_sign_negative() && !self.0.is_zero()
    }

    /// Multiplies by a quantity.
    ///
    /// Panics if the product leaves the decimal range; amounts stored in a
    /// cart have already passed [`Money::checked_multiply`].
    pub fn multiply(&self, quantity: u32) -> Money {
        Money(self.0 * Decimal::from(quantity))
    }

    /// Multiplies by a quantity, or `None` on overflow.
    pub fn checked_multiply(&self, quantity: u32) -> Option<Money> {
        self.0.checked_mul(Decimal::from(quantity)).map(Money)
    }

    /// Adds two amounts, or `None` on overflow.
    pub fn checked_add(self, rhs: Money) -> Option<Money> {
        self.0.checked_add(rhs.0).map(Money)
    }
}

impl Default for Money {
    fn default() -> Self {
        Self::zero()
    }
}

impl From<Decimal> for Money {
    fn from(amount: Decimal) -> Self {
        Self::from_decimal(amount)
    }
}

impl From<Money> for Decimal {
    fn from(money: Money) -> Self {
        money.0
    }
}

impl std::fmt::Display for Money {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:.2}", self.0)
    }
}

impl FromStr for Money {
    type Err = rust_decimal::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Decimal::from_str(s.trim()).map(Self::from_decimal)
    }
}

impl Add for Money {
    type Output = Money;

    fn add(self, rhs: Self) -> Self::Output {
        Money(self.0 + rhs.0)
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_cents_keeps_two_digits() {
        assert_eq!(Money::from_cents(1234).to_string(), "12.34");
        assert_eq!(Money::from_cents(5).to_string(), "0.05");
        assert_eq!(Money::zero().to_string(), "0.00");
    }

    #[test]
    fn parse_rounds_to_cents() {
        let money: Money = "10".parse().unwrap();
        assert_eq!(money, Money::from_cents(1000));
        assert_eq!(money.to_string(), "10.00");

        let money: Money = "0.125".parse().unwrap();
        assert_eq!(money, Money::from_cents(12));

        assert!("ten".parse::<Money>().is_err());
    }

    #[test]
    fn decimal_sums_do_not_drift() {
        // 0.10 added ten times is exactly 1.00, unlike f64.
        let total: Money = std::iter::repeat_n(Money::from_cents(10), 10).sum();
        assert_eq!(total, Money::from_cents(100));
    }

    #[test]
    fn multiply_by_quantity() {
        assert_eq!(Money::from_cents(1999).multiply(3), Money::from_cents(5997));
        assert_eq!(Money::from_cents(1999).multiply(0), Money::zero());
    }

    #[test]
    fn addition_and_sign() {
        let a = Money::from_cents(1000);
        let b = Money::from_cents(250);

        assert_eq!(a + b, Money::from_cents(1250));
        assert!(Money::zero().is_zero());
        assert!(Money::from_cents(-1).is_negative());
        assert!(!Money::zero().is_negative());
    }

    #[test]
    fn checked_arithmetic_reports_overflow() {
        let huge = Money::from_decimal(Decimal::MAX / Decimal::from(1000));

        assert_eq!(
            Money::from_cents(250).checked_multiply(4),
            Some(Money::from_cents(1000))
        );
        assert_eq!(huge.checked_multiply(u32::MAX), None);
        assert_eq!(huge.checked_add(huge), Some(huge + huge));
        assert_eq!(
            Money::from_decimal(Decimal::MAX).checked_add(Money::from_cents(100)),
            None
        );
    }

    #[test]
    fn serializes_as_string() {
        let json = serde_json::to_string(&Money::from_cents(2000)).unwrap();
        assert_eq!(json, "\"20.00\"");
        let back: Money = serde_json::from_str(&json).unwrap();
        assert_eq!(back, Money::from_cents(2000));

        let short: Money = serde_json::from_str("\"12.5\"").unwrap();
        assert_eq!(short.amount().scale(), 2);
    }
}
