//! Outbound transfers: reserve first, settle later.
//!
//! `initiate_send` checks and reserves under one lock, so two sends racing for
//! the same sendable funds cannot both pass the balance check. `settle` is
//! idempotent per transaction: only the first settlement of a pending
//! transaction moves funds, later ones report `AlreadySettled`.

use std::time::Duration;

use vein_types::{Amount, SettlementHash, Timestamp, TxId, WalletAddress};

use crate::breakdown::{signed, BreakdownDelta, Bucket};
use crate::error::LedgerError;
use crate::ledger::{BalanceLedger, LedgerState};
use crate::transaction::{Transaction, TxStatus};

/// How a pending transfer ended.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SettlementOutcome {
    /// The network accepted the transfer; the funds have left the wallet.
    Confirmed(SettlementHash),
    /// The transfer failed; the reservation goes back to sendable.
    Rejected(String),
}

/// Result of a `settle` call.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SettleResult {
    /// This call settled the transaction.
    Settled(Transaction),
    /// The transaction had already left `pending`; nothing changed.
    AlreadySettled(Transaction),
}

impl SettleResult {
    pub fn transaction(&self) -> &Transaction {
        match self {
            SettleResult::Settled(tx) | SettleResult::AlreadySettled(tx) => tx,
        }
    }

    pub fn was_applied(&self) -> bool {
        matches!(self, SettleResult::Settled(_))
    }
}

#[derive(Clone)]
pub struct TransactionLifecycle {
    ledger: BalanceLedger,
}

impl TransactionLifecycle {
    pub fn new(ledger: BalanceLedger) -> Self {
        Self { ledger }
    }

    pub fn ledger(&self) -> &BalanceLedger {
        &self.ledger
    }

    /// Reserve `amount + fee` from sendable and record a pending send.
    ///
    /// The fee leaves the wallet at reservation time; `amount` sits in pending
    /// until settlement. Returns without waiting for settlement.
    pub fn initiate_send(
        &self,
        destination: WalletAddress,
        amount: Amount,
        memo: Option<String>,
        fee: Amount,
        now: Timestamp,
    ) -> Result<Transaction, LedgerError> {
        if amount.is_zero() {
            return Err(LedgerError::InvalidAmount);
        }
        let required = amount
            .checked_add(fee)
            .ok_or_else(|| LedgerError::InvariantViolation {
                bucket: Bucket::Sendable,
                detail: "amount plus fee overflows".to_string(),
            })?;

        self.ledger.with_state(|state| {
            let available = state.breakdown().sendable();
            if required > available {
                return Err(LedgerError::InsufficientSendableBalance {
                    requested: required,
                    available,
                    shortfall: required - available,
                });
            }

            let delta = BreakdownDelta::new()
                .sendable(-signed(required, Bucket::Sendable)?)
                .pending(signed(amount, Bucket::Pending)?);
            state.apply_delta(&delta)?;

            let id = state.next_tx_id();
            let tx = state.push(Transaction::pending_send(id, destination, amount, fee, memo, now));
            tracing::info!(
                tx_id = %tx.id,
                %amount,
                %fee,
                destination = ?tx.counterparty.as_ref().map(|a| a.as_str()),
                "reserved funds for send"
            );
            Ok(tx)
        })
    }

    /// Finish a pending transaction. Settling a transaction that is no longer
    /// pending changes nothing.
    pub fn settle(
        &self,
        id: TxId,
        outcome: SettlementOutcome,
        now: Timestamp,
    ) -> Result<SettleResult, LedgerError> {
        self.ledger
            .with_state(|state| settle_locked(state, id, outcome, now))
    }

    /// Fail every pending send created at least `max_age` before `now`,
    /// releasing its reservation. Returns the transactions that were failed.
    ///
    /// The sweep is per transaction, not all-or-nothing: a transaction whose
    /// release would break the bucket invariant is logged and left pending.
    pub fn reconcile_pending_older_than(&self, max_age: Duration, now: Timestamp) -> Vec<Transaction> {
        self.ledger.with_state(|state| {
            let stale: Vec<TxId> = state
                .pending_ids()
                .into_iter()
                .filter(|id| {
                    state
                        .get(*id)
                        .is_some_and(|tx| tx.timestamp.is_older_than(max_age, now))
                })
                .collect();

            let mut failed = Vec::with_capacity(stale.len());
            for id in stale {
                let reason = format!(
                    "settlement timed out after {}s",
                    max_age.as_secs()
                );
                match settle_locked(state, id, SettlementOutcome::Rejected(reason), now) {
                    Ok(SettleResult::Settled(tx)) => failed.push(tx),
                    Ok(SettleResult::AlreadySettled(_)) => {}
                    // Each transaction settles on its own; one that cannot be
                    // released stays pending and the rest are still swept.
                    Err(e) => {
                        tracing::error!(tx_id = %id, error = %e, "could not release stale reservation");
                    }
                }
            }
            if !failed.is_empty() {
                tracing::warn!(count = failed.len(), "swept stale pending transactions");
            }
            failed
        })
    }
}

fn settle_locked(
    state: &mut LedgerState,
    id: TxId,
    outcome: SettlementOutcome,
    now: Timestamp,
) -> Result<SettleResult, LedgerError> {
    let tx = state
        .get(id)
        .cloned()
        .ok_or(LedgerError::TransactionNotFound(id))?;

    if tx.status.is_final() {
        tracing::debug!(tx_id = %id, status = ?tx.status, "ignoring settlement of final transaction");
        return Ok(SettleResult::AlreadySettled(tx));
    }

    let reserved = signed(tx.reservation(), Bucket::Pending)?;
    let delta = match &outcome {
        SettlementOutcome::Confirmed(_) => BreakdownDelta::new().pending(-reserved),
        SettlementOutcome::Rejected(_) => {
            let restored = tx.amount.checked_add(tx.fee).ok_or_else(|| {
                LedgerError::InvariantViolation {
                    bucket: Bucket::Sendable,
                    detail: "amount plus fee overflows".to_string(),
                }
            })?;
            BreakdownDelta::new()
                .pending(-reserved)
                .sendable(signed(restored, Bucket::Sendable)?)
        }
    };
    state.apply_delta(&delta)?;

    let record = state
        .get_mut(id)
        .ok_or(LedgerError::TransactionNotFound(id))?;
    record.settled_at = Some(now);
    match outcome {
        SettlementOutcome::Confirmed(hash) => {
            tracing::info!(tx_id = %id, settlement = %hash, "send completed");
            record.status = TxStatus::Completed;
            record.settlement_hash = Some(hash);
        }
        SettlementOutcome::Rejected(reason) => {
            tracing::warn!(tx_id = %id, %reason, "send failed, reservation released");
            record.status = TxStatus::Failed;
            record.failure_reason = Some(reason);
        }
    }
    Ok(SettleResult::Settled(record.clone()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokens(n: u64) -> Amount {
        Amount::from_tokens(n)
    }

    fn dest() -> WalletAddress {
        WalletAddress::parse("0xdest").unwrap()
    }

    fn funded(sendable: u64) -> TransactionLifecycle {
        let ledger = BalanceLedger::with_breakdown(tokens(sendable), Amount::ZERO, Amount::ZERO).unwrap();
        TransactionLifecycle::new(ledger)
    }

    #[test]
    fn send_reserves_then_completes() {
        let lc = funded(100);
        let tx = lc
            .initiate_send(dest(), tokens(40), None, tokens(1), Timestamp::new(10))
            .unwrap();
        assert_eq!(tx.status, TxStatus::Pending);

        let snap = lc.ledger().snapshot();
        assert_eq!(snap.sendable(), tokens(59));
        assert_eq!(snap.pending(), tokens(40));
        assert_eq!(snap.total(), tokens(99));

        let hash = SettlementHash::new("abc");
        let result = lc
            .settle(tx.id, SettlementOutcome::Confirmed(hash.clone()), Timestamp::new(12))
            .unwrap();
        assert!(result.was_applied());
        assert_eq!(result.transaction().status, TxStatus::Completed);
        assert_eq!(result.transaction().settlement_hash, Some(hash));

        let snap = lc.ledger().snapshot();
        assert_eq!(snap.sendable(), tokens(59));
        assert_eq!(snap.pending(), Amount::ZERO);
    }

    #[test]
    fn overdraft_fails_without_touching_state() {
        let lc = funded(100);
        let before = lc.ledger().snapshot();
        let err = lc
            .initiate_send(dest(), tokens(150), None, tokens(1), Timestamp::new(10))
            .unwrap_err();
        assert_eq!(
            err,
            LedgerError::InsufficientSendableBalance {
                requested: tokens(151),
                available: tokens(100),
                shortfall: tokens(51),
            }
        );
        assert_eq!(lc.ledger().snapshot(), before);
        assert!(lc.ledger().transactions().is_empty());
    }

    #[test]
    fn fee_counts_against_sendable() {
        let lc = funded(100);
        let err = lc
            .initiate_send(dest(), tokens(100), None, tokens(1), Timestamp::new(0))
            .unwrap_err();
        assert!(matches!(
            err,
            LedgerError::InsufficientSendableBalance { shortfall, .. } if shortfall == tokens(1)
        ));
    }

    #[test]
    fn zero_amount_is_rejected() {
        let lc = funded(100);
        assert_eq!(
            lc.initiate_send(dest(), Amount::ZERO, None, tokens(1), Timestamp::new(0)),
            Err(LedgerError::InvalidAmount)
        );
    }

    #[test]
    fn rejected_settlement_restores_amount_and_fee() {
        let lc = funded(100);
        let before = lc.ledger().snapshot();
        let tx = lc
            .initiate_send(dest(), tokens(30), Some("rent".into()), tokens(2), Timestamp::new(0))
            .unwrap();
        let result = lc
            .settle(tx.id, SettlementOutcome::Rejected("node refused".into()), Timestamp::new(1))
            .unwrap();
        assert_eq!(result.transaction().status, TxStatus::Failed);
        assert_eq!(result.transaction().failure_reason.as_deref(), Some("node refused"));
        assert_eq!(lc.ledger().snapshot(), before);
    }

    #[test]
    fn second_settlement_is_a_noop() {
        let lc = funded(100);
        let tx = lc
            .initiate_send(dest(), tokens(10), None, Amount::ZERO, Timestamp::new(0))
            .unwrap();
        lc.settle(tx.id, SettlementOutcome::Confirmed(SettlementHash::new("h1")), Timestamp::new(1))
            .unwrap();
        let after_first = lc.ledger().snapshot();

        let second = lc
            .settle(tx.id, SettlementOutcome::Rejected("late".into()), Timestamp::new(2))
            .unwrap();
        assert!(!second.was_applied());
        assert_eq!(second.transaction().status, TxStatus::Completed);
        assert_eq!(lc.ledger().snapshot(), after_first);
    }

    #[test]
    fn unknown_transaction_is_an_error() {
        let lc = funded(1);
        assert_eq!(
            lc.settle(TxId::new(99), SettlementOutcome::Rejected("x".into()), Timestamp::new(0)),
            Err(LedgerError::TransactionNotFound(TxId::new(99)))
        );
    }

    #[test]
    fn second_send_sees_first_reservation() {
        let lc = funded(100);
        lc.initiate_send(dest(), tokens(60), None, Amount::ZERO, Timestamp::new(0))
            .unwrap();
        let err = lc
            .initiate_send(dest(), tokens(60), None, Amount::ZERO, Timestamp::new(0))
            .unwrap_err();
        assert!(matches!(
            err,
            LedgerError::InsufficientSendableBalance { available, .. } if available == tokens(40)
        ));
    }

    #[test]
    fn sweep_fails_only_stale_sends() {
        let lc = funded(100);
        let old = lc
            .initiate_send(dest(), tokens(10), None, tokens(1), Timestamp::new(0))
            .unwrap();
        let fresh = lc
            .initiate_send(dest(), tokens(20), None, tokens(1), Timestamp::new(250))
            .unwrap();

        let swept = lc.reconcile_pending_older_than(Duration::from_secs(300), Timestamp::new(300));
        assert_eq!(swept.len(), 1);
        assert_eq!(swept[0].id, old.id);
        assert_eq!(swept[0].status, TxStatus::Failed);

        let snap = lc.ledger().snapshot();
        assert_eq!(snap.pending(), tokens(20));
        assert_eq!(snap.sendable(), tokens(79));
        assert!(lc.ledger().transaction(fresh.id).unwrap().is_pending());

        // A late confirmation of the swept send must not move funds again.
        let late = lc
            .settle(old.id, SettlementOutcome::Confirmed(SettlementHash::new("late")), Timestamp::new(301))
            .unwrap();
        assert!(!late.was_applied());
        assert_eq!(lc.ledger().snapshot(), snap);
    }

    #[test]
    fn sweep_keeps_going_past_a_send_it_cannot_release() {
        let lc = funded(100);
        let first = lc
            .initiate_send(dest(), tokens(10), None, Amount::ZERO, Timestamp::new(0))
            .unwrap();
        let second = lc
            .initiate_send(dest(), tokens(20), None, Amount::ZERO, Timestamp::new(0))
            .unwrap();
        // Shrink pending below the second reservation so releasing it fails.
        lc.ledger()
            .apply_breakdown_delta(BreakdownDelta::new().pending(-15_000_000))
            .unwrap();

        let swept = lc.reconcile_pending_older_than(Duration::from_secs(60), Timestamp::new(60));
        assert_eq!(swept.len(), 1);
        assert_eq!(swept[0].id, first.id);
        assert_eq!(lc.ledger().transaction(first.id).unwrap().status, TxStatus::Failed);
        assert!(lc.ledger().transaction(second.id).unwrap().is_pending());

        let snap = lc.ledger().snapshot();
        assert_eq!(snap.pending(), tokens(5));
        assert_eq!(snap.sendable(), tokens(80));
    }

    #[test]
    fn send_beyond_signed_range_is_refused() {
        let huge = Amount::new(i128::MAX as u128 + 1);
        let ledger = BalanceLedger::with_breakdown(huge, Amount::ZERO, Amount::ZERO).unwrap();
        let lc = TransactionLifecycle::new(ledger);
        let before = lc.ledger().snapshot();
        assert!(matches!(
            lc.initiate_send(dest(), huge, None, Amount::ZERO, Timestamp::new(0)),
            Err(LedgerError::InvariantViolation { .. })
        ));
        assert_eq!(lc.ledger().snapshot(), before);
        assert!(lc.ledger().transactions().is_empty());
    }
}
