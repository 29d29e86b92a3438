//! Conversion between CHF decimal strings and integer Rappen.
//!
//! Amounts are integers in Rappen everywhere inside the crate. Only the form
//! boundary ([`parse_chf`]) and the rendering boundary ([`format_chf`]) deal
//! with decimal strings.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use std::str::FromStr;
use thiserror::Error;

/// Why a CHF amount could not be converted to Rappen.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MoneyError {
    #[error("not a decimal amount: '{0}'")]
    Malformed(String),

    #[error("amount is negative")]
    Negative,

    #[error("amount is too large")]
    OutOfRange,
}

/// Parses a CHF amount such as `"12.50"` into Rappen.
///
/// The string is parsed as an exact decimal, multiplied by 100 and rounded to
/// the nearest Rappen with ties going away from zero: `"12.345"` is 1235 and
/// `"0.005"` is 1. Round-half-to-even would give 1234 and 0 here; this crate
/// always uses half-away-from-zero. Negative amounts are rejected after
/// rounding, so `"-0.004"` parses as 0.
pub fn parse_chf(input: &str) -> Result<i64, MoneyError> {
    let trimmed = input.trim();
    let amount =
        Decimal::from_str(trimmed).map_err(|_| MoneyError::Malformed(trimmed.to_string()))?;

    let rappen = amount
        .checked_mul(Decimal::ONE_HUNDRED)
        .ok_or(MoneyError::OutOfRange)?
        .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero);

    if rappen < Decimal::ZERO {
        return Err(MoneyError::Negative);
    }

    rappen.to_i64().ok_or(MoneyError::OutOfRange)
}

/// Formats Rappen as a CHF amount with two decimals, e.g. `2250` → `"22.50"`.
#[must_use]
pub fn format_chf(rappen: i64) -> String {
    let sign = if rappen < 0 { "-" } else { "" };
    let abs = rappen.unsigned_abs();
    format!("{sign}{}.{:02}", abs / 100, abs % 100)
}
