//! Counterparty address type.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::TypesError;

/// The destination or source of a transfer.
///
/// The core never interprets addresses; it only rejects values that could not
/// possibly be one (empty, containing whitespace, or absurdly long).
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct WalletAddress(String);

impl WalletAddress {
    pub const MAX_LEN: usize = 128;

    pub fn parse(raw: impl Into<String>) -> Result<Self, TypesError> {
        let s = raw.into();
        let well_formed = !s.is_empty()
            && s.len() <= Self::MAX_LEN
            && !s.chars().any(char::is_whitespace);
        if !well_formed {
            return Err(TypesError::InvalidAddress(s));
        }
        Ok(Self(s))
    }

    /// Return the raw address string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for WalletAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for WalletAddress {
    type Err = TypesError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for WalletAddress {
    type Error = TypesError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::parse(s)
    }
}

impl From<WalletAddress> for String {
    fn from(addr: WalletAddress) -> Self {
        addr.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_plain_addresses() {
        let addr = WalletAddress::parse("0xabc123").unwrap();
        assert_eq!(addr.as_str(), "0xabc123");
    }

    #[test]
    fn rejects_empty_and_whitespace() {
        assert!(WalletAddress::parse("").is_err());
        assert!(WalletAddress::parse("0x ab").is_err());
        assert!(WalletAddress::parse("x".repeat(WalletAddress::MAX_LEN + 1)).is_err());
    }
}
