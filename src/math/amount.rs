// DANS : src/math/amount.rs

use serde::{Serialize, Serializer};
use std::{cmp::Ordering, fmt, str::FromStr};
use thiserror::Error;
use uint::construct_uint;

construct_uint! { pub struct U256(4); }

/// Au-delà, 10^decimals ne tient plus dans un u128.
pub const MAX_DECIMALS: u8 = 38;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AmountError {
    #[error("empty amount")]
    Empty,
    #[error("negative amount {0}")]
    Negative(String),
    #[error("invalid amount {0}")]
    Invalid(String),
    #[error("amount {value} has more than {decimals} decimals")]
    TooPrecise { value: String, decimals: u8 },
    #[error("amount {0} overflows")]
    Overflow(String),
    #[error("unsupported precision: {0} decimals (max {MAX_DECIMALS})")]
    UnsupportedDecimals(u8),
}

/// Une quantité de tokens exacte : un entier d'unités brutes et sa précision.
///
/// `raw = 50_000_000_000` avec `decimals = 9` vaut 50 (SOL). Les comparaisons
/// se font en entiers 256 bits après mise à la même échelle, jamais en flottant,
/// donc `1.0` (10, 1) et `1.00` (100, 2) sont égaux.
#[derive(Debug, Clone, Copy)]
pub struct Amount {
    raw: u128,
    decimals: u8,
}

impl Amount {
    pub const ZERO: Amount = Amount { raw: 0, decimals: 0 };

    pub fn new(raw: u128, decimals: u8) -> Result<Self, AmountError> {
        if decimals > MAX_DECIMALS {
            return Err(AmountError::UnsupportedDecimals(decimals));
        }
        Ok(Self { raw, decimals })
    }

    /// Montant en unités brutes tel que renvoyé par le RPC (`"123456789"`).
    pub fn from_raw_str(raw: &str, decimals: u8) -> Result<Self, AmountError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(AmountError::Empty);
        }
        if trimmed.starts_with('-') {
            return Err(AmountError::Negative(trimmed.to_string()));
        }
        if !trimmed.bytes().all(|b| b.is_ascii_digit()) {
            return Err(AmountError::Invalid(trimmed.to_string()));
        }
        let value = trimmed
            .parse::<u128>()
            .map_err(|_| AmountError::Overflow(trimmed.to_string()))?;
        Self::new(value, decimals)
    }

    /// Montant "humain" (`"20"`, `"0.5"`) exprimé dans un token à `decimals` décimales.
    pub fn from_ui_str(value: &str, decimals: u8) -> Result<Self, AmountError> {
        if decimals > MAX_DECIMALS {
            return Err(AmountError::UnsupportedDecimals(decimals));
        }
        let (int_part, frac_part) = split_decimal(value)?;
        if frac_part.len() > decimals as usize {
            return Err(AmountError::TooPrecise { value: value.trim().to_string(), decimals });
        }

        let overflow = || AmountError::Overflow(value.trim().to_string());
        let int_value = if int_part.is_empty() { 0 } else { int_part.parse::<u128>().map_err(|_| overflow())? };
        let frac_value = if frac_part.is_empty() { 0 } else { frac_part.parse::<u128>().map_err(|_| overflow())? };

        let raw = int_value
            .checked_mul(pow10(decimals))
            .and_then(|v| v.checked_add(frac_value * pow10(decimals - frac_part.len() as u8)))
            .ok_or_else(overflow)?;

        Ok(Self { raw, decimals })
    }

    /// Comme `from_ui_str`, la précision étant celle écrite (`"0.05"` -> 2 décimales).
    pub fn parse_decimal(value: &str) -> Result<Self, AmountError> {
        let (_, frac_part) = split_decimal(value)?;
        let decimals = u8::try_from(frac_part.len())
            .map_err(|_| AmountError::UnsupportedDecimals(u8::MAX))?;
        Self::from_ui_str(value, decimals)
    }

    pub fn raw(&self) -> u128 {
        self.raw
    }

    pub fn decimals(&self) -> u8 {
        self.decimals
    }

    pub fn is_zero(&self) -> bool {
        self.raw == 0
    }

    fn rescaled(&self, decimals: u8) -> U256 {
        debug_assert!(decimals >= self.decimals);
        U256::from(self.raw) * U256::exp10((decimals - self.decimals) as usize)
    }
}

fn pow10(exp: u8) -> u128 {
    10u128.pow(exp as u32)
}

fn split_decimal(value: &str) -> Result<(&str, &str), AmountError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(AmountError::Empty);
    }
    if trimmed.starts_with('-') {
        return Err(AmountError::Negative(trimmed.to_string()));
    }

    let (int_part, frac_part) = match trimmed.split_once('.') {
        Some((i, f)) => (i, f),
        None => (trimmed, ""),
    };
    let digits_only = |s: &str| s.bytes().all(|b| b.is_ascii_digit());
    if (int_part.is_empty() && frac_part.is_empty()) || !digits_only(int_part) || !digits_only(frac_part) {
        return Err(AmountError::Invalid(trimmed.to_string()));
    }
    Ok((int_part, frac_part))
}

impl Ord for Amount {
    fn cmp(&self, other: &Self) -> Ordering {
        match self.decimals.cmp(&other.decimals) {
            Ordering::Equal => self.raw.cmp(&other.raw),
            Ordering::Less => self.rescaled(other.decimals).cmp(&U256::from(other.raw)),
            Ordering::Greater => U256::from(self.raw).cmp(&other.rescaled(self.decimals)),
        }
    }
}

impl PartialOrd for Amount {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for Amount {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Amount {}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.decimals == 0 {
            return write!(f, "{}", self.raw);
        }
        let scale = pow10(self.decimals);
        let int_part = self.raw / scale;
        let frac_part = self.raw % scale;
        if frac_part == 0 {
            return write!(f, "{}", int_part);
        }
        let frac = format!("{:0width$}", frac_part, width = self.decimals as usize);
        write!(f, "{}.{}", int_part, frac.trim_end_matches('0'))
    }
}

impl FromStr for Amount {
    type Err = AmountError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse_decimal(s)
    }
}

impl Serialize for Amount {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ui_string_is_scaled_to_raw_units() {
        let amount = Amount::from_ui_str("20", 9).unwrap();
        assert_eq!(amount.raw(), 20_000_000_000);
        assert_eq!(amount.decimals(), 9);

        let half = Amount::from_ui_str("0.5", 9).unwrap();
        assert_eq!(half.raw(), 500_000_000);
    }

    #[test]
    fn rejects_negative_and_malformed_values() {
        assert!(matches!(Amount::from_ui_str("-1", 9), Err(AmountError::Negative(_))));
        assert!(matches!(Amount::from_ui_str("", 9), Err(AmountError::Empty)));
        assert!(matches!(Amount::from_ui_str("1.2.3", 9), Err(AmountError::Invalid(_))));
        assert!(matches!(Amount::from_ui_str("abc", 9), Err(AmountError::Invalid(_))));
        assert!(matches!(Amount::from_raw_str("-5", 9), Err(AmountError::Negative(_))));
    }

    #[test]
    fn rejects_more_fraction_digits_than_precision() {
        let err = Amount::from_ui_str("0.0000000001", 9).unwrap_err();
        assert!(matches!(err, AmountError::TooPrecise { decimals: 9, .. }));
    }

    #[test]
    fn compares_across_precisions_without_rounding() {
        let sol = Amount::from_ui_str("1", 9).unwrap();
        let coarse = Amount::parse_decimal("1.0").unwrap();
        assert_eq!(sol, coarse);

        // 300.000000001 SOL doit rester strictement au-dessus de 300.
        let just_above = Amount::from_raw_str("300000000001", 9).unwrap();
        let bound = Amount::parse_decimal("300").unwrap();
        assert!(just_above > bound);
        assert!(bound < just_above);
    }

    #[test]
    fn large_supplies_keep_exact_ordering() {
        let a = Amount::new(u64::MAX as u128, 0).unwrap();
        let b = Amount::new(u64::MAX as u128 * 10 + 1, 1).unwrap();
        assert!(b > a);
    }

    #[test]
    fn display_trims_trailing_zeros() {
        assert_eq!(Amount::from_raw_str("50000000000", 9).unwrap().to_string(), "50");
        assert_eq!(Amount::from_raw_str("1500000000", 9).unwrap().to_string(), "1.5");
        assert_eq!(Amount::from_raw_str("1", 6).unwrap().to_string(), "0.000001");
        assert_eq!(Amount::ZERO.to_string(), "0");
    }
}
