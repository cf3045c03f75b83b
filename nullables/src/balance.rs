//! Nullable balance source: a backend balance you set by hand.

use futures_util::future::BoxFuture;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use vein_api::{ApiError, BackendBalance, BalanceSource};
use vein_types::Amount;

/// Answers every fetch with the currently configured response.
pub struct NullBalanceSource {
    response: Mutex<Result<BackendBalance, ApiError>>,
    calls: AtomicUsize,
}

impl NullBalanceSource {
    pub fn new(balance: BackendBalance) -> Self {
        Self {
            response: Mutex::new(Ok(balance)),
            calls: AtomicUsize::new(0),
        }
    }

    /// A backend holding everything in one bucket: sendable.
    pub fn sendable(total: Amount) -> Self {
        Self::new(BackendBalance {
            total_balance: total,
            sendable_balance: total,
            non_sendable_balance: Amount::ZERO,
            pending_balance: Amount::ZERO,
        })
    }

    /// A backend that is unreachable.
    pub fn failing(reason: &str) -> Self {
        Self {
            response: Mutex::new(Err(ApiError::Transport(reason.to_string()))),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn set_balance(&self, balance: BackendBalance) {
        *self.response.lock().unwrap() = Ok(balance);
    }

    pub fn set_failure(&self, reason: &str) {
        *self.response.lock().unwrap() = Err(ApiError::Transport(reason.to_string()));
    }

    /// Number of fetches served so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl BalanceSource for NullBalanceSource {
    fn fetch_balance(&self) -> BoxFuture<'_, Result<BackendBalance, ApiError>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let response = self.response.lock().unwrap().clone();
        Box::pin(async move { response })
    }
}
