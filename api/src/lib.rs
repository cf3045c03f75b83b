//! The wallet core's view of the remote API.
//!
//! Two capabilities cross the boundary: reading the authoritative balance
//! ([`BalanceSource`]) and settling an outbound transfer ([`SettlementSource`]).
//! Both are object-safe so the wallet can hold them as `Arc<dyn ..>` and tests
//! can swap in deterministic fakes. [`ApiClient`] implements both over HTTP.

pub mod client;
pub mod error;
pub mod source;

pub use client::ApiClient;
pub use error::ApiError;
pub use source::{BackendBalance, BalanceSource, SendReceipt, SendRequest, SettlementSource};
