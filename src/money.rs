//! Fixed-point monetary amounts.
//!
//! Sales and earnings arrive from the data store as decimal strings
//! (`"1000.00"`). They are parsed once into [`Money`], a thin wrapper around
//! [`rust_decimal::Decimal`], and every sum or percentage is computed at full
//! decimal precision. Rounding happens only when an amount is displayed:
//! two places, half away from zero.

use crate::error::{Error, Result};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Number of decimal places used when an amount is displayed.
pub const DISPLAY_SCALE: u32 = 2;

const HUNDRED: Decimal = Decimal::ONE_HUNDRED;

/// A currency amount (BRL) held at full decimal precision.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Money(Decimal);

impl Money {
    pub const ZERO: Money = Money(Decimal::ZERO);

    pub fn new(amount: Decimal) -> Self {
        Money(amount)
    }

    /// Parse a decimal string coming from the data store.
    ///
    /// `field` names the offending column in the error message.
    ///
    /// # Errors
    ///
    /// Returns `Error::ComputationError` when `raw` is not a decimal number.
    pub fn parse(field: &str, raw: &str) -> Result<Self> {
        let trimmed = raw.trim();
        Decimal::from_str(trimmed)
            .or_else(|_| Decimal::from_scientific(trimmed))
            .map(Money)
            .map_err(|_| {
                Error::ComputationError(format!(
                    "non-numeric monetary field '{}': {:?}",
                    field, raw
                ))
            })
    }

    pub fn amount(&self) -> Decimal {
        self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    /// `self * rate / 100`, with `rate` expressed on a 0–100 scale.
    ///
    /// # Errors
    ///
    /// Returns `Error::ComputationError` when the product does not fit in a
    /// `Decimal`.
    pub fn percent(&self, rate: Decimal) -> Result<Money> {
        self.0
            .checked_mul(rate)
            .and_then(|product| product.checked_div(HUNDRED))
            .map(Money)
            .ok_or_else(|| overflow("percentage", self.0, rate))
    }

    /// `self + other`, failing instead of wrapping or panicking.
    pub fn checked_add(self, other: Money) -> Result<Money> {
        self.0
            .checked_add(other.0)
            .map(Money)
            .ok_or_else(|| overflow("sum", self.0, other.0))
    }

    /// The amount rounded for display (two places, half away from zero).
    pub fn rounded(&self) -> Decimal {
        self.0
            .round_dp_with_strategy(DISPLAY_SCALE, RoundingStrategy::MidpointAwayFromZero)
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2}", self.rounded())
    }
}

impl From<Decimal> for Money {
    fn from(amount: Decimal) -> Self {
        Money(amount)
    }
}

fn overflow(operation: &str, lhs: Decimal, rhs: Decimal) -> Error {
    Error::ComputationError(format!(
        "monetary overflow in {} of {} and {}",
        operation, lhs, rhs
    ))
}

/// Render a percentage without trailing zeros (`10`, `2.5`).
pub fn format_percent(rate: Decimal) -> String {
    rate.normalize().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn test_parse_plain_and_padded() {
        assert_eq!(Money::parse("value", "1000").unwrap().amount(), dec("1000"));
        assert_eq!(
            Money::parse("value", " 1000.50 ").unwrap().amount(),
            dec("1000.50")
        );
        assert_eq!(Money::parse("value", "1e3").unwrap().amount(), dec("1000"));
    }

    #[test]
    fn test_parse_rejects_garbage() {
        let err = Money::parse("value", "abc").unwrap_err();
        assert!(matches!(err, Error::ComputationError(_)));
        assert!(err.to_string().contains("'value'"));
        assert!(Money::parse("earnings", "").is_err());
    }

    #[test]
    fn test_display_rounds_half_away_from_zero() {
        assert_eq!(Money::new(dec("0.125")).to_string(), "0.13");
        assert_eq!(Money::new(dec("0.124")).to_string(), "0.12");
        assert_eq!(Money::new(dec("1000")).to_string(), "1000.00");
    }

    #[test]
    fn test_accumulation_keeps_precision() {
        let third = Money::new(dec("0.333"));
        let total = std::iter::repeat(third)
            .take(3)
            .try_fold(Money::ZERO, Money::checked_add)
            .unwrap();
        assert_eq!(total.amount(), dec("0.999"));
        assert_eq!(total.to_string(), "1.00");
    }

    #[test]
    fn test_percent() {
        let sale = Money::new(dec("1000"));
        assert_eq!(sale.percent(dec("10")).unwrap().amount(), dec("100"));
        assert_eq!(sale.percent(dec("2.5")).unwrap().amount(), dec("25"));
    }

    #[test]
    fn test_overflow_is_an_error() {
        let huge = Money::new(Decimal::MAX);

        let err = huge.percent(dec("10")).unwrap_err();
        assert!(matches!(err, Error::ComputationError(_)));
        assert!(err.to_string().contains("monetary overflow"));

        let err = huge.checked_add(Money::new(dec("1"))).unwrap_err();
        assert!(matches!(err, Error::ComputationError(_)));

        assert_eq!(
            huge.checked_add(Money::ZERO).unwrap().amount(),
            Decimal::MAX
        );
    }

    #[test]
    fn test_format_percent() {
        assert_eq!(format_percent(dec("10.00")), "10");
        assert_eq!(format_percent(dec("2.50")), "2.5");
    }
}
