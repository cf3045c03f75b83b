//! Mining session reconciliation.
//!
//! While mining, earnings accrue locally much faster than the backend can
//! confirm them. The reconciler keeps the two apart: `base_balance` only moves
//! on confirmed input (ending a session, syncing with the backend), and
//! `current_session_earnings` is the volatile local delta on top of it. The
//! user sees their sum.

pub mod accrual;
pub mod error;
pub mod reconciler;
pub mod state;

pub use accrual::session_earnings;
pub use error::{MiningError, SyncError};
pub use reconciler::MiningReconciler;
pub use state::MiningIntegrationState;
