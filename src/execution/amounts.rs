use std::fmt;

use num_bigint::BigUint;
use num_traits::{pow, Zero};
use tycho_common::Bytes;

use crate::execution::errors::ExecutionError;

/// Returns `10^decimals`, the base-unit value of one whole token.
pub fn one_unit(decimals: u8) -> BigUint {
    pow(BigUint::from(10u8), decimals as usize)
}

/// Converts a human decimal quantity (e.g. `"0.1"`) into base units for a token with the given
/// decimals.
///
/// The conversion works on the digit string so it is exact for any precision. Underscores are
/// accepted as digit separators. Fractional digits beyond `decimals` are truncated toward zero.
pub fn parse_units(value: &str, decimals: u8) -> Result<BigUint, ExecutionError> {
    let cleaned: String = value
        .trim()
        .chars()
        .filter(|c| *c != '_')
        .collect();
    let (whole, fraction) = match cleaned.split_once('.') {
        Some((whole, fraction)) => (whole, fraction),
        None => (cleaned.as_str(), ""),
    };
    if whole.is_empty() && fraction.is_empty() {
        return Err(ExecutionError::InvalidInput(format!("Invalid amount: {:?}", value)));
    }
    let is_digits = |s: &str| s.chars().all(|c| c.is_ascii_digit());
    if !is_digits(whole) || !is_digits(fraction) {
        return Err(ExecutionError::InvalidInput(format!("Invalid amount: {:?}", value)));
    }

    let decimals = decimals as usize;
    let mut digits = String::with_capacity(whole.len() + decimals);
    digits.push_str(whole);
    digits.extend(fraction.chars().take(decimals));
    for _ in fraction.len().min(decimals)..decimals {
        digits.push('0');
    }
    if digits.is_empty() {
        return Ok(BigUint::zero());
    }
    BigUint::parse_bytes(digits.as_bytes(), 10)
        .ok_or_else(|| ExecutionError::InvalidInput(format!("Invalid amount: {:?}", value)))
}

/// Renders a base-unit amount as a human decimal string, trimming trailing fractional zeros.
pub fn format_units(amount: &BigUint, decimals: u8) -> String {
    let digits = amount.to_str_radix(10);
    let decimals = decimals as usize;
    if decimals == 0 {
        return digits;
    }
    let padded = format!("{:0>width$}", digits, width = decimals + 1);
    let (whole, fraction) = padded.split_at(padded.len() - decimals);
    let fraction = fraction.trim_end_matches('0');
    if fraction.is_empty() {
        whole.to_string()
    } else {
        format!("{}.{}", whole, fraction)
    }
}

/// An amount of a specific token, held in base units.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TokenAmount {
    pub token: Bytes,
    pub decimals: u8,
    pub amount: BigUint,
}

impl TokenAmount {
    pub fn new(token: Bytes, decimals: u8, amount: BigUint) -> Self {
        Self { token, decimals, amount }
    }

    pub fn from_decimal(token: Bytes, value: &str, decimals: u8) -> Result<Self, ExecutionError> {
        Ok(Self { amount: parse_units(value, decimals)?, token, decimals })
    }
}

impl fmt::Display for TokenAmount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({} base units)", format_units(&self.amount, self.decimals), self.amount)
    }
}
