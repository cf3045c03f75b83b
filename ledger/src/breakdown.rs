//! The three-bucket balance breakdown and the two ways of changing it.

use serde::Serialize;
use std::fmt;
use vein_types::Amount;

use crate::error::LedgerError;

/// One of the three balance buckets.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Bucket {
    Sendable,
    NonSendable,
    Pending,
    Total,
}

impl fmt::Display for Bucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Bucket::Sendable => "sendable",
            Bucket::NonSendable => "non-sendable",
            Bucket::Pending => "pending",
            Bucket::Total => "total",
        };
        f.write_str(name)
    }
}

/// An immutable read of the balance buckets.
///
/// `total == sendable + non_sendable + pending` holds for every value of this
/// type: the only constructors compute `total` themselves.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct BalanceBreakdown {
    sendable: Amount,
    non_sendable: Amount,
    pending: Amount,
    total: Amount,
}

impl BalanceBreakdown {
    pub fn new(sendable: Amount, non_sendable: Amount, pending: Amount) -> Result<Self, LedgerError> {
        let total = sendable
            .checked_add(non_sendable)
            .and_then(|t| t.checked_add(pending))
            .ok_or_else(|| LedgerError::InvariantViolation {
                bucket: Bucket::Total,
                detail: "sum of buckets overflows".to_string(),
            })?;
        Ok(Self {
            sendable,
            non_sendable,
            pending,
            total,
        })
    }

    pub fn sendable(&self) -> Amount {
        self.sendable
    }

    pub fn non_sendable(&self) -> Amount {
        self.non_sendable
    }

    pub fn pending(&self) -> Amount {
        self.pending
    }

    pub fn total(&self) -> Amount {
        self.total
    }

    pub fn get(&self, bucket: Bucket) -> Amount {
        match bucket {
            Bucket::Sendable => self.sendable,
            Bucket::NonSendable => self.non_sendable,
            Bucket::Pending => self.pending,
            Bucket::Total => self.total,
        }
    }

    /// Compute the breakdown that results from applying `delta`.
    ///
    /// Fails with `InvariantViolation` naming the first bucket that would go
    /// negative or overflow. `self` is never modified.
    pub fn with_delta(&self, delta: &BreakdownDelta) -> Result<Self, LedgerError> {
        let shift = |bucket: Bucket, current: Amount, by: i128| {
            current
                .checked_apply(by)
                .ok_or_else(|| LedgerError::InvariantViolation {
                    bucket,
                    detail: format!("{current} adjusted by {by} raw is out of range"),
                })
        };
        Self::new(
            shift(Bucket::Sendable, self.sendable, delta.sendable)?,
            shift(Bucket::NonSendable, self.non_sendable, delta.non_sendable)?,
            shift(Bucket::Pending, self.pending, delta.pending)?,
        )
    }

    /// Compute the breakdown that results from merging `update` over `self`.
    pub fn with_update(&self, update: &BreakdownUpdate) -> Result<Self, LedgerError> {
        Self::new(
            update.sendable.unwrap_or(self.sendable),
            update.non_sendable.unwrap_or(self.non_sendable),
            update.pending.unwrap_or(self.pending),
        )
    }
}

impl fmt::Display for BalanceBreakdown {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "total {} (sendable {}, non-sendable {}, pending {})",
            self.total, self.sendable, self.non_sendable, self.pending
        )
    }
}

/// `amount` as a signed adjustment of `bucket`.
///
/// Amounts above `i128::MAX` raw cannot be expressed as a delta and are
/// refused rather than clamped.
pub(crate) fn signed(amount: Amount, bucket: Bucket) -> Result<i128, LedgerError> {
    amount
        .to_signed_raw()
        .ok_or_else(|| LedgerError::InvariantViolation {
            bucket,
            detail: format!("{amount} is too large to apply as an adjustment"),
        })
}

/// Signed per-bucket adjustment in raw units. Zero leaves a bucket untouched.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct BreakdownDelta {
    pub sendable: i128,
    pub non_sendable: i128,
    pub pending: i128,
}

impl BreakdownDelta {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sendable(mut self, by: i128) -> Self {
        self.sendable = by;
        self
    }

    pub fn non_sendable(mut self, by: i128) -> Self {
        self.non_sendable = by;
        self
    }

    pub fn pending(mut self, by: i128) -> Self {
        self.pending = by;
        self
    }

    pub fn is_empty(&self) -> bool {
        self.sendable == 0 && self.non_sendable == 0 && self.pending == 0
    }
}

/// Partial absolute update: `Some` buckets replace the current value, `None`
/// buckets keep it. `total` is always recomputed.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct BreakdownUpdate {
    pub sendable: Option<Amount>,
    pub non_sendable: Option<Amount>,
    pub pending: Option<Amount>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokens(n: u64) -> Amount {
        Amount::from_tokens(n)
    }

    #[test]
    fn total_is_sum_of_buckets() {
        let b = BalanceBreakdown::new(tokens(10), tokens(5), tokens(2)).unwrap();
        assert_eq!(b.total(), tokens(17));
    }

    #[test]
    fn delta_that_goes_negative_names_the_bucket() {
        let b = BalanceBreakdown::new(tokens(10), tokens(0), tokens(0)).unwrap();
        let delta = BreakdownDelta::new().non_sendable(-1);
        match b.with_delta(&delta) {
            Err(LedgerError::InvariantViolation { bucket, .. }) => {
                assert_eq!(bucket, Bucket::NonSendable)
            }
            other => panic!("expected invariant violation, got {other:?}"),
        }
    }

    #[test]
    fn update_merges_only_given_buckets() {
        let b = BalanceBreakdown::new(tokens(10), tokens(5), tokens(2)).unwrap();
        let update = BreakdownUpdate {
            non_sendable: Some(tokens(50)),
            ..Default::default()
        };
        let merged = b.with_update(&update).unwrap();
        assert_eq!(merged.sendable(), tokens(10));
        assert_eq!(merged.non_sendable(), tokens(50));
        assert_eq!(merged.pending(), tokens(2));
        assert_eq!(merged.total(), tokens(62));
    }

    #[test]
    fn overflowing_sum_is_rejected() {
        let huge = Amount::new(u128::MAX);
        assert!(BalanceBreakdown::new(huge, Amount::new(1), Amount::ZERO).is_err());
    }
}
