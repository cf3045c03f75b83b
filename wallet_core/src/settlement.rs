//! Timer-based settlement for running without a settling backend.

use std::time::Duration;

use blake2::digest::consts::U32;
use blake2::{Blake2b, Digest};
use futures_util::future::BoxFuture;

use vein_api::{ApiError, SendReceipt, SendRequest, SettlementSource};
use vein_types::SettlementHash;

type Blake2b256 = Blake2b<U32>;

/// Confirms every transfer after a fixed delay.
///
/// The settlement hash is `Blake2b-256(tx_id || destination || amount || fee)`,
/// so the same request always settles to the same hash.
#[derive(Clone, Debug)]
pub struct SimulatedSettlement {
    delay: Duration,
}

impl SimulatedSettlement {
    pub fn new(delay: Duration) -> Self {
        Self { delay }
    }

    pub fn hash_request(request: &SendRequest) -> SettlementHash {
        let mut hasher = Blake2b256::new();
        hasher.update(request.tx_id.to_be_bytes());
        hasher.update(request.destination.as_str().as_bytes());
        hasher.update(request.amount.raw().to_le_bytes());
        hasher.update(request.fee.raw().to_le_bytes());
        let mut digest = [0u8; 32];
        digest.copy_from_slice(&hasher.finalize());
        SettlementHash::from_digest(digest)
    }
}

impl SettlementSource for SimulatedSettlement {
    fn submit<'a>(&'a self, request: &'a SendRequest) -> BoxFuture<'a, Result<SendReceipt, ApiError>> {
        Box::pin(async move {
            tokio::time::sleep(self.delay).await;
            Ok(SendReceipt {
                settlement_hash: Self::hash_request(request),
            })
        })
    }
}
