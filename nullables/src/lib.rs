//! Nullable infrastructure for deterministic testing.
//!
//! Every external dependency of the wallet core (clock, balance source,
//! settlement source) sits behind a trait. This crate provides test-friendly
//! implementations that:
//! - Return deterministic values
//! - Can be controlled programmatically
//! - Never touch the network or wait on real time
//!
//! Usage: swap real implementations for nullables in tests.

pub mod balance;
pub mod clock;
pub mod settlement;

pub use balance::NullBalanceSource;
pub use clock::NullClock;
pub use settlement::{NullOutcome, NullSettlement};
