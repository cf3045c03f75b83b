use thiserror::Error;
use vein_types::{Amount, Timestamp};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MiningError {
    #[error("a mining session is already active")]
    SessionAlreadyActive,

    #[error("no mining session is active")]
    SessionNotActive,

    #[error("session earnings cannot go backwards: current {current}, proposed {proposed}")]
    EarningsRegressed { current: Amount, proposed: Amount },
}

/// A failed backend sync, kept in the reconciler state until the next
/// successful sync.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("sync failed at {at}: {reason}")]
pub struct SyncError {
    pub reason: String,
    pub at: Timestamp,
}
