//! Fundamental types for the Vein wallet core.
//!
//! This crate defines the types shared across every other crate in the workspace:
//! fixed-point amounts, timestamps and clocks, counterparty addresses, and the
//! identifiers attached to transactions and their settlements.

pub mod address;
pub mod amount;
pub mod error;
pub mod hash;
pub mod id;
pub mod time;

pub use address::WalletAddress;
pub use amount::Amount;
pub use error::TypesError;
pub use hash::SettlementHash;
pub use id::TxId;
pub use time::{Clock, SystemClock, Timestamp};
