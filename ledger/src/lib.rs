//! Client-side wallet balance ledger.
//!
//! Balances live in three buckets (sendable, non-sendable, pending) whose sum
//! is the total. Every mutation goes through [`BalanceLedger`], which takes one
//! lock per operation and commits all-or-nothing, so no reader ever observes a
//! torn or negative breakdown.
//!
//! Outbound transfers are two-phase ([`TransactionLifecycle`]): a synchronous
//! reservation moves funds from sendable into pending, and a later settlement
//! either removes them for good or restores them. [`ExchangeOperations`] moves
//! funds between the sendable and non-sendable buckets without changing the
//! total.

pub mod breakdown;
pub mod error;
pub mod exchange;
pub mod ledger;
pub mod lifecycle;
pub mod transaction;

pub use breakdown::{BalanceBreakdown, Bucket, BreakdownDelta, BreakdownUpdate};
pub use error::LedgerError;
pub use exchange::ExchangeOperations;
pub use ledger::BalanceLedger;
pub use lifecycle::{SettleResult, SettlementOutcome, TransactionLifecycle};
pub use transaction::{Transaction, TxKind, TxStatus};
