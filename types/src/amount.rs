//! Token amount type.
//!
//! Amounts are fixed-point integers (u128) to avoid floating-point drift in
//! balance arithmetic. One token is `RAW_PER_TOKEN` raw units. The backend and
//! config files speak decimal strings or JSON numbers; both are accepted on the
//! way in, and amounts always serialize as decimal strings.

use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::ops::{Add, Sub};
use std::str::FromStr;

use crate::error::TypesError;

/// Number of decimal places carried by [`Amount`].
pub const DECIMALS: u32 = 6;

/// Raw units per whole token.
pub const RAW_PER_TOKEN: u128 = 10u128.pow(DECIMALS);

/// A non-negative token amount, stored as raw units.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Amount(u128);

impl Amount {
    pub const ZERO: Self = Self(0);

    pub const fn new(raw: u128) -> Self {
        Self(raw)
    }

    /// A whole number of tokens.
    pub const fn from_tokens(tokens: u64) -> Self {
        Self(tokens as u128 * RAW_PER_TOKEN)
    }

    pub fn raw(&self) -> u128 {
        self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0 == 0
    }

    pub fn checked_add(self, other: Self) -> Option<Self> {
        self.0.checked_add(other.0).map(Self)
    }

    pub fn checked_sub(self, other: Self) -> Option<Self> {
        self.0.checked_sub(other.0).map(Self)
    }

    pub fn saturating_add(self, other: Self) -> Self {
        Self(self.0.saturating_add(other.0))
    }

    pub fn saturating_sub(self, other: Self) -> Self {
        Self(self.0.saturating_sub(other.0))
    }

    /// Apply a signed raw delta. `None` if the result would be negative or overflow.
    pub fn checked_apply(self, delta: i128) -> Option<Self> {
        if delta >= 0 {
            self.0.checked_add(delta.unsigned_abs()).map(Self)
        } else {
            self.0.checked_sub(delta.unsigned_abs()).map(Self)
        }
    }

    /// The amount as a signed raw value, or `None` above `i128::MAX`.
    pub fn to_signed_raw(self) -> Option<i128> {
        i128::try_from(self.0).ok()
    }
}

impl Add for Amount {
    type Output = Self;
    fn add(self, rhs: Self) -> Self {
        Self(self.0 + rhs.0)
    }
}

impl Sub for Amount {
    type Output = Self;
    fn sub(self, rhs: Self) -> Self {
        Self(self.0 - rhs.0)
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let whole = self.0 / RAW_PER_TOKEN;
        let frac = self.0 % RAW_PER_TOKEN;
        if frac == 0 {
            return write!(f, "{whole}");
        }
        let digits = format!("{:0width$}", frac, width = DECIMALS as usize);
        write!(f, "{whole}.{}", digits.trim_end_matches('0'))
    }
}

impl FromStr for Amount {
    type Err = TypesError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = |reason| TypesError::InvalidAmount {
            input: s.to_string(),
            reason,
        };

        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(invalid("empty"));
        }
        let (whole, frac) = match trimmed.split_once('.') {
            Some((w, f)) => (w, f),
            None => (trimmed, ""),
        };
        if whole.is_empty() || !whole.bytes().all(|b| b.is_ascii_digit()) {
            return Err(invalid("expected decimal digits"));
        }
        if !frac.bytes().all(|b| b.is_ascii_digit()) {
            return Err(invalid("expected decimal digits"));
        }
        let frac = frac.trim_end_matches('0');
        if frac.len() > DECIMALS as usize {
            return Err(invalid("too many decimal places"));
        }

        let whole: u128 = whole.parse().map_err(|_| invalid("out of range"))?;
        let frac_raw: u128 = if frac.is_empty() {
            0
        } else {
            let padded = format!("{:0<width$}", frac, width = DECIMALS as usize);
            padded.parse().map_err(|_| invalid("out of range"))?
        };

        whole
            .checked_mul(RAW_PER_TOKEN)
            .and_then(|w| w.checked_add(frac_raw))
            .map(Self)
            .ok_or_else(|| invalid("out of range"))
    }
}

impl Serialize for Amount {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Amount {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(AmountVisitor)
    }
}

struct AmountVisitor;

impl<'de> Visitor<'de> for AmountVisitor {
    type Value = Amount;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a non-negative decimal amount as a string or number")
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Amount, E> {
        v.parse().map_err(E::custom)
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<Amount, E> {
        Ok(Amount::from_tokens(v))
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<Amount, E> {
        u64::try_from(v)
            .map(Amount::from_tokens)
            .map_err(|_| E::custom("amount must not be negative"))
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> Result<Amount, E> {
        if !v.is_finite() || v < 0.0 {
            return Err(E::custom("amount must be a finite non-negative number"));
        }
        // Rounded to the carried precision; JSON floats cannot hold more anyway.
        format!("{:.prec$}", v, prec = DECIMALS as usize)
            .parse()
            .map_err(E::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn signed_raw_refuses_amounts_beyond_i128() {
        assert_eq!(Amount::from_tokens(3).to_signed_raw(), Some(3_000_000));
        assert_eq!(Amount::new(i128::MAX as u128).to_signed_raw(), Some(i128::MAX));
        assert_eq!(Amount::new(i128::MAX as u128 + 1).to_signed_raw(), None);
        assert_eq!(Amount::new(u128::MAX).to_signed_raw(), None);
    }

    #[test]
    fn parses_fractional_amounts() {
        let a: Amount = "12.5".parse().unwrap();
        assert_eq!(a.raw(), 12_500_000);
        assert_eq!(a.to_string(), "12.5");
    }

    #[test]
    fn parses_whole_amounts() {
        let a: Amount = "100".parse().unwrap();
        assert_eq!(a, Amount::from_tokens(100));
        assert_eq!(a.to_string(), "100");
    }

    #[test]
    fn trailing_zeros_do_not_count_as_precision() {
        let a: Amount = "1.2500000000".parse().unwrap();
        assert_eq!(a.raw(), 1_250_000);
    }

    #[test]
    fn rejects_negative_and_garbage() {
        assert!("-1".parse::<Amount>().is_err());
        assert!("".parse::<Amount>().is_err());
        assert!("1.2.3".parse::<Amount>().is_err());
        assert!(".5".parse::<Amount>().is_err());
        assert!("0.0000001".parse::<Amount>().is_err());
    }

    #[test]
    fn checked_apply_refuses_to_go_negative() {
        let a = Amount::from_tokens(1);
        assert_eq!(a.checked_apply(-(RAW_PER_TOKEN as i128)), Some(Amount::ZERO));
        assert_eq!(a.checked_apply(-(RAW_PER_TOKEN as i128) - 1), None);
        assert_eq!(a.checked_apply(5), Some(Amount::new(RAW_PER_TOKEN + 5)));
    }

    #[test]
    fn deserializes_from_json_numbers_and_strings() {
        let from_float: Amount = serde_json::from_str("512.5").unwrap();
        let from_int: Amount = serde_json::from_str("40").unwrap();
        let from_str: Amount = serde_json::from_str("\"0.001\"").unwrap();
        assert_eq!(from_float.raw(), 512_500_000);
        assert_eq!(from_int, Amount::from_tokens(40));
        assert_eq!(from_str.raw(), 1_000);
        assert!(serde_json::from_str::<Amount>("-3").is_err());
    }

    #[test]
    fn serializes_as_decimal_string() {
        let json = serde_json::to_string(&Amount::new(1_500_000)).unwrap();
        assert_eq!(json, "\"1.5\"");
    }
}
