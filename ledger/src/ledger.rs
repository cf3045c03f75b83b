//! The balance ledger: one breakdown, one transaction log, one lock.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use vein_types::{Amount, Timestamp, TxId, WalletAddress};

use crate::breakdown::{signed, BalanceBreakdown, Bucket, BreakdownDelta, BreakdownUpdate};
use crate::error::LedgerError;
use crate::transaction::{Transaction, TxKind};

/// Handle to a balance ledger.
///
/// Cloning the handle shares the ledger; [`BalanceLedger::new`] creates an
/// independent one. Each operation locks once, validates, then commits, so the
/// sum invariant holds between any two operations and a rejected operation
/// leaves no trace.
#[derive(Clone, Default)]
pub struct BalanceLedger {
    inner: Arc<Mutex<LedgerState>>,
}

#[derive(Default)]
pub(crate) struct LedgerState {
    breakdown: BalanceBreakdown,
    transactions: Vec<Transaction>,
    by_id: HashMap<TxId, usize>,
    next_id: u64,
    // Bumped on every committed bucket change.
    generation: u64,
}

impl LedgerState {
    pub(crate) fn breakdown(&self) -> BalanceBreakdown {
        self.breakdown
    }

    /// Apply a delta or leave the breakdown untouched.
    pub(crate) fn apply_delta(&mut self, delta: &BreakdownDelta) -> Result<BalanceBreakdown, LedgerError> {
        match self.breakdown.with_delta(delta) {
            Ok(next) => {
                self.breakdown = next;
                self.generation += 1;
                Ok(next)
            }
            Err(e) => {
                tracing::error!(
                    error = %e,
                    breakdown = %self.breakdown,
                    ?delta,
                    "rejected breakdown delta"
                );
                Err(e)
            }
        }
    }

    pub(crate) fn apply_update(&mut self, update: &BreakdownUpdate) -> Result<BalanceBreakdown, LedgerError> {
        match self.breakdown.with_update(update) {
            Ok(next) => {
                self.breakdown = next;
                self.generation += 1;
                Ok(next)
            }
            Err(e) => {
                tracing::error!(
                    error = %e,
                    breakdown = %self.breakdown,
                    ?update,
                    "rejected breakdown update"
                );
                Err(e)
            }
        }
    }

    pub(crate) fn next_tx_id(&mut self) -> TxId {
        self.next_id += 1;
        TxId::new(self.next_id)
    }

    pub(crate) fn push(&mut self, tx: Transaction) -> Transaction {
        self.by_id.insert(tx.id, self.transactions.len());
        self.transactions.push(tx.clone());
        tx
    }

    pub(crate) fn get(&self, id: TxId) -> Option<&Transaction> {
        self.by_id.get(&id).map(|&i| &self.transactions[i])
    }

    pub(crate) fn get_mut(&mut self, id: TxId) -> Option<&mut Transaction> {
        match self.by_id.get(&id) {
            Some(&i) => self.transactions.get_mut(i),
            None => None,
        }
    }

    fn has_pending_sends(&self) -> bool {
        self.transactions
            .iter()
            .any(|tx| tx.is_pending() && tx.kind.is_outgoing())
    }

    pub(crate) fn pending_ids(&self) -> Vec<TxId> {
        self.transactions
            .iter()
            .filter(|tx| tx.is_pending())
            .map(|tx| tx.id)
            .collect()
    }
}

impl BalanceLedger {
    /// An empty ledger.
    pub fn new() -> Self {
        Self::default()
    }

    /// A ledger seeded with an initial breakdown (e.g. the last backend read).
    pub fn with_breakdown(
        sendable: Amount,
        non_sendable: Amount,
        pending: Amount,
    ) -> Result<Self, LedgerError> {
        let breakdown = BalanceBreakdown::new(sendable, non_sendable, pending)?;
        Ok(Self {
            inner: Arc::new(Mutex::new(LedgerState {
                breakdown,
                ..Default::default()
            })),
        })
    }

    /// Run `f` with exclusive access to the ledger state.
    pub(crate) fn with_state<R>(&self, f: impl FnOnce(&mut LedgerState) -> R) -> R {
        f(&mut self.lock())
    }

    // Every mutation validates before committing, so a panic elsewhere cannot
    // leave a half-applied state behind the poison flag.
    fn lock(&self) -> MutexGuard<'_, LedgerState> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Immutable read of the current buckets.
    pub fn snapshot(&self) -> BalanceBreakdown {
        self.lock().breakdown()
    }

    /// Counter of committed bucket changes. Read it before fetching an
    /// authoritative balance and hand it back to
    /// [`BalanceLedger::resync_from_backend`].
    pub fn generation(&self) -> u64 {
        self.lock().generation
    }

    /// Merge a signed per-bucket adjustment. All-or-nothing.
    pub fn apply_breakdown_delta(&self, delta: BreakdownDelta) -> Result<BalanceBreakdown, LedgerError> {
        self.lock().apply_delta(&delta)
    }

    /// Merge a partial absolute update, recomputing the total.
    pub fn apply_breakdown_update(&self, update: BreakdownUpdate) -> Result<BalanceBreakdown, LedgerError> {
        self.lock().apply_update(&update)
    }

    /// Replace all three buckets with an authoritative reading.
    ///
    /// `observed` is the [`generation`](Self::generation) read before the
    /// balance was fetched. The resync is deferred (`Ok(None)`) when the
    /// buckets changed since then, or while an outbound transfer still holds a
    /// reservation. Checked and applied under one lock.
    pub fn resync_from_backend(
        &self,
        sendable: Amount,
        non_sendable: Amount,
        pending: Amount,
        observed: u64,
    ) -> Result<Option<BalanceBreakdown>, LedgerError> {
        let mut state = self.lock();
        if state.generation != observed {
            tracing::debug!(
                observed,
                current = state.generation,
                "deferring bucket resync; ledger changed while the balance was fetched"
            );
            return Ok(None);
        }
        if state.has_pending_sends() {
            tracing::debug!("deferring bucket resync while sends are in flight");
            return Ok(None);
        }
        let update = BreakdownUpdate {
            sendable: Some(sendable),
            non_sendable: Some(non_sendable),
            pending: Some(pending),
        };
        state.apply_update(&update).map(Some)
    }

    /// Credit earned funds that must be exchanged before they can be sent.
    pub fn credit_non_sendable(&self, amount: Amount) -> Result<BalanceBreakdown, LedgerError> {
        if amount.is_zero() {
            return Err(LedgerError::InvalidAmount);
        }
        let delta = BreakdownDelta::new().non_sendable(signed(amount, Bucket::NonSendable)?);
        self.lock().apply_delta(&delta)
    }

    /// Record an incoming credit as a completed transaction.
    ///
    /// Receives land in sendable; mining rewards and referral bonuses land in
    /// non-sendable.
    pub fn record_incoming(
        &self,
        kind: TxKind,
        amount: Amount,
        counterparty: Option<WalletAddress>,
        now: Timestamp,
    ) -> Result<Transaction, LedgerError> {
        if amount.is_zero() {
            return Err(LedgerError::InvalidAmount);
        }
        let delta = match kind {
            TxKind::Send => return Err(LedgerError::NotIncoming(kind)),
            TxKind::Receive => BreakdownDelta::new().sendable(signed(amount, Bucket::Sendable)?),
            TxKind::MiningReward | TxKind::ReferralBonus => {
                BreakdownDelta::new().non_sendable(signed(amount, Bucket::NonSendable)?)
            }
        };

        let mut state = self.lock();
        state.apply_delta(&delta)?;
        let id = state.next_tx_id();
        let tx = state.push(Transaction::completed_incoming(id, kind, amount, counterparty, now));
        tracing::info!(tx_id = %tx.id, %kind, %amount, "recorded incoming transaction");
        Ok(tx)
    }

    /// Snapshot of the whole transaction log, oldest first.
    pub fn transactions(&self) -> Vec<Transaction> {
        self.lock().transactions.clone()
    }

    pub fn transaction(&self, id: TxId) -> Option<Transaction> {
        self.lock().get(id).cloned()
    }

    /// Transactions still awaiting settlement.
    pub fn pending_transactions(&self) -> Vec<Transaction> {
        self.lock()
            .transactions
            .iter()
            .filter(|tx| tx.is_pending())
            .cloned()
            .collect()
    }

    /// Whether any outbound transfer still holds a reservation.
    pub fn has_pending_sends(&self) -> bool {
        self.lock().has_pending_sends()
    }
}
