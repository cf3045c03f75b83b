//! The mining reconciler state machine.
//!
//! ```text
//! Idle --start_session--> Active --end_session(final)--> Idle
//!          Active: record_earnings(cumulative)
//!          any:    sync_with_backend
//! ```

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use vein_api::{BackendBalance, BalanceSource};
use vein_types::{Amount, Timestamp};

use crate::error::{MiningError, SyncError};
use crate::state::MiningIntegrationState;

/// Handle to one wallet's mining reconciliation state. Clones share it.
#[derive(Clone, Default)]
pub struct MiningReconciler {
    inner: Arc<Mutex<MiningIntegrationState>>,
}

impl MiningReconciler {
    pub fn new(base_balance: Amount) -> Self {
        Self {
            inner: Arc::new(Mutex::new(MiningIntegrationState::with_base_balance(base_balance))),
        }
    }

    fn lock(&self) -> MutexGuard<'_, MiningIntegrationState> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn state(&self) -> MiningIntegrationState {
        self.lock().clone()
    }

    /// The value to show the user.
    pub fn display_balance(&self) -> Amount {
        self.lock().display_balance
    }

    pub fn is_active(&self) -> bool {
        self.lock().is_mining_active
    }

    pub fn start_session(&self, now: Timestamp) -> Result<(), MiningError> {
        let mut state = self.lock();
        if state.is_mining_active {
            return Err(MiningError::SessionAlreadyActive);
        }
        state.is_mining_active = true;
        state.session_started_at = Some(now);
        state.current_session_earnings = Amount::ZERO;
        state.sync_error = None;
        state.recompute_display();
        tracing::info!(base = %state.base_balance, "mining session started");
        Ok(())
    }

    /// Set the session's cumulative earnings. Returns the new display balance.
    ///
    /// The caller owns the running total; a value below the current one is
    /// refused so the display never steps backwards on local input.
    pub fn record_earnings(&self, cumulative: Amount) -> Result<Amount, MiningError> {
        let mut state = self.lock();
        if !state.is_mining_active {
            return Err(MiningError::SessionNotActive);
        }
        if cumulative < state.current_session_earnings {
            tracing::warn!(
                current = %state.current_session_earnings,
                proposed = %cumulative,
                "ignoring regressing session earnings"
            );
            return Err(MiningError::EarningsRegressed {
                current: state.current_session_earnings,
                proposed: cumulative,
            });
        }
        state.current_session_earnings = cumulative;
        state.recompute_display();
        Ok(state.display_balance)
    }

    /// Fold the session into the confirmed balance. Returns the session
    /// earnings that were folded.
    pub fn end_session(&self, final_balance: Amount) -> Result<Amount, MiningError> {
        let mut state = self.lock();
        if !state.is_mining_active {
            return Err(MiningError::SessionNotActive);
        }
        let earned = state.current_session_earnings;
        state.is_mining_active = false;
        state.session_started_at = None;
        state.base_balance = final_balance;
        state.current_session_earnings = Amount::ZERO;
        state.recompute_display();
        tracing::info!(%earned, %final_balance, "mining session ended");
        Ok(earned)
    }

    /// Re-read the authoritative balance.
    ///
    /// On success the base moves to the backend total and unconfirmed session
    /// earnings stay on top of it. On failure the error is kept in the state
    /// and the balances are left as they were. Either way the outcome is also
    /// returned. Nothing here retries.
    pub async fn sync_with_backend(
        &self,
        source: &dyn BalanceSource,
        now: Timestamp,
    ) -> Result<BackendBalance, SyncError> {
        // The lock is not held across the fetch.
        match source.fetch_balance().await {
            Ok(balance) => {
                let mut state = self.lock();
                state.base_balance = balance.total_balance;
                state.recompute_display();
                state.sync_error = None;
                state.last_sync_time = Some(now);
                tracing::debug!(
                    base = %state.base_balance,
                    display = %state.display_balance,
                    "synced with backend"
                );
                Ok(balance)
            }
            Err(e) => {
                let err = SyncError {
                    reason: e.to_string(),
                    at: now,
                };
                tracing::warn!(error = %err, "backend sync failed; keeping last known balance");
                self.lock().sync_error = Some(err.clone());
                Err(err)
            }
        }
    }
}
