//! Money value with two decimal places.

use std::fmt;
use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Decimal places kept for every amount.
pub const AMOUNT_SCALE: u32 = 2;

/// A decimal amount normalized to two places. The store keeps it as
/// integer cents, so construction also bounds the mantissa to `i64`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "Decimal", into = "Decimal")]
pub struct Amount(Decimal);

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Invalid amount '{0}': expected a number with at most two decimals")]
pub struct ParseAmountError(String);

impl Amount {
    pub fn from_cents(cents: i64) -> Self {
        Self(Decimal::new(cents, AMOUNT_SCALE))
    }

    pub fn cents(&self) -> i64 {
        // Scale is fixed at two and the mantissa was checked on construction.
        self.0.mantissa() as i64
    }

    pub fn value(&self) -> Decimal {
        self.0
    }

    pub fn is_positive(&self) -> bool {
        self.0 > Decimal::ZERO
    }
}

impl TryFrom<Decimal> for Amount {
    type Error = ParseAmountError;

    fn try_from(value: Decimal) -> Result<Self, Self::Error> {
        if value.scale() > AMOUNT_SCALE {
            return Err(ParseAmountError(value.to_string()));
        }
        let mut scaled = value;
        scaled.rescale(AMOUNT_SCALE);
        if scaled.scale() != AMOUNT_SCALE || i64::try_from(scaled.mantissa()).is_err() {
            return Err(ParseAmountError(value.to_string()));
        }
        Ok(Self(scaled))
    }
}

impl From<Amount> for Decimal {
    fn from(amount: Amount) -> Self {
        amount.0
    }
}

impl FromStr for Amount {
    type Err = ParseAmountError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let value =
            Decimal::from_str_exact(s.trim()).map_err(|_| ParseAmountError(s.to_string()))?;
        Amount::try_from(value).map_err(|_| ParseAmountError(s.to_string()))
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}
