//! Wallet core for Vein.
//!
//! Provides everything a wallet application needs from the balance side:
//! - Three-bucket balance ledger (sendable, non-sendable, pending)
//! - Outbound transfers with asynchronous settlement
//! - Exchange between the non-sendable and sendable buckets
//! - Mining session reconciliation against the backend balance
//! - Sweeping of reservations whose settlement never arrived
//! - A synchronous event bus for UI collaborators

pub mod config;
pub mod error;
pub mod event;
pub mod settlement;
pub mod wallet;

pub use config::WalletConfig;
pub use error::WalletError;
pub use event::{EventBus, WalletEvent};
pub use settlement::SimulatedSettlement;
pub use wallet::{PendingSend, Wallet};
