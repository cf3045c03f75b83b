//! Snapshot of the reconciler's state.

use serde::Serialize;
use vein_types::{Amount, Timestamp};

use crate::error::SyncError;

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct MiningIntegrationState {
    /// Last balance confirmed by the backend or by ending a session.
    pub base_balance: Amount,
    /// Cumulative local accrual since the session started, unconfirmed.
    pub current_session_earnings: Amount,
    /// `base_balance + current_session_earnings`.
    pub display_balance: Amount,
    pub last_sync_time: Option<Timestamp>,
    pub is_mining_active: bool,
    pub session_started_at: Option<Timestamp>,
    #[serde(serialize_with = "serialize_sync_error")]
    pub sync_error: Option<SyncError>,
}

fn serialize_sync_error<S: serde::Serializer>(
    err: &Option<SyncError>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    match err {
        Some(e) => serializer.serialize_some(&e.to_string()),
        None => serializer.serialize_none(),
    }
}

impl MiningIntegrationState {
    pub fn with_base_balance(base: Amount) -> Self {
        Self {
            base_balance: base,
            display_balance: base,
            ..Default::default()
        }
    }

    pub(crate) fn recompute_display(&mut self) {
        self.display_balance = self.base_balance.saturating_add(self.current_session_earnings);
    }
}
