//! Nullable settlement source: scripted outcomes, no delays.

use futures_util::future::BoxFuture;
use std::collections::VecDeque;
use std::sync::Mutex;

use vein_api::{ApiError, SendReceipt, SendRequest, SettlementSource};
use vein_types::SettlementHash;

/// What the next submitted transfer will experience.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum NullOutcome {
    /// Settles immediately with a deterministic hash.
    Confirm,
    /// Fails immediately with the given reason.
    Reject(String),
    /// Never resolves, like a confirmation that never arrives.
    Hold,
}

/// A settlement source that records what it was asked to settle.
///
/// Outcomes are taken from the script in order; once the script runs out the
/// default outcome applies.
pub struct NullSettlement {
    script: Mutex<VecDeque<NullOutcome>>,
    default: NullOutcome,
    submitted: Mutex<Vec<SendRequest>>,
}

impl NullSettlement {
    pub fn new(default: NullOutcome) -> Self {
        Self {
            script: Mutex::new(VecDeque::new()),
            default,
            submitted: Mutex::new(Vec::new()),
        }
    }

    pub fn confirming() -> Self {
        Self::new(NullOutcome::Confirm)
    }

    pub fn rejecting(reason: &str) -> Self {
        Self::new(NullOutcome::Reject(reason.to_string()))
    }

    pub fn holding() -> Self {
        Self::new(NullOutcome::Hold)
    }

    /// Queue an outcome ahead of the default.
    pub fn then(self, outcome: NullOutcome) -> Self {
        self.script.lock().unwrap().push_back(outcome);
        self
    }

    /// The hash a confirmed request receives.
    pub fn hash_for(request: &SendRequest) -> SettlementHash {
        SettlementHash::new(format!("null-{}", request.tx_id.as_u64()))
    }

    /// All requests submitted so far (for assertions).
    pub fn submitted(&self) -> Vec<SendRequest> {
        self.submitted.lock().unwrap().clone()
    }

    fn next_outcome(&self) -> NullOutcome {
        self.script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| self.default.clone())
    }
}

impl SettlementSource for NullSettlement {
    fn submit<'a>(&'a self, request: &'a SendRequest) -> BoxFuture<'a, Result<SendReceipt, ApiError>> {
        self.submitted.lock().unwrap().push(request.clone());
        let outcome = self.next_outcome();
        Box::pin(async move {
            match outcome {
                NullOutcome::Confirm => Ok(SendReceipt {
                    settlement_hash: Self::hash_for(request),
                }),
                NullOutcome::Reject(reason) => Err(ApiError::Rejected(reason)),
                NullOutcome::Hold => std::future::pending().await,
            }
        })
    }
}
