//! Settlement identifiers.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier assigned to a transaction when its settlement is confirmed.
///
/// Servers hand these out as opaque strings; locally simulated settlements
/// derive them from a 32-byte digest rendered as hex.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SettlementHash(String);

impl SettlementHash {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn from_digest(digest: [u8; 32]) -> Self {
        Self(hex::encode(digest))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for SettlementHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let short: String = self.0.chars().take(8).collect();
        write!(f, "SettlementHash({short})")
    }
}

impl fmt::Display for SettlementHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
