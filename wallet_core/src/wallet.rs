//! The wallet facade.
//!
//! Wires one ledger and one mining reconciler to the outside world: a
//! [`BalanceSource`] for the authoritative balance, a [`SettlementSource`] for
//! outbound transfers, a [`Clock`] and an [`EventBus`]. All ledger and
//! reconciler calls are synchronous and lock-scoped; the only suspension
//! points are the backend fetch in [`Wallet::sync_with_backend`] and the
//! settlement task spawned by [`Wallet::send`].

use std::sync::Arc;

use tokio::task::JoinHandle;

use vein_api::{ApiClient, BackendBalance, BalanceSource, SendRequest, SettlementSource};
use vein_ledger::{
    BalanceBreakdown, BalanceLedger, ExchangeOperations, SettleResult, SettlementOutcome,
    Transaction, TransactionLifecycle, TxKind,
};
use vein_mining::{session_earnings, MiningError, MiningIntegrationState, MiningReconciler};
use vein_types::{Amount, Clock, SystemClock, TxId, WalletAddress};

use crate::config::WalletConfig;
use crate::error::WalletError;
use crate::event::{EventBus, WalletEvent};
use crate::settlement::SimulatedSettlement;

/// A send that has been reserved but not necessarily settled.
#[derive(Debug)]
pub struct PendingSend {
    /// The transaction as recorded at reservation time (status `pending`).
    pub transaction: Transaction,
    /// Resolves to the settled transaction, or `None` if something else
    /// (e.g. the stale-reservation sweep) settled it first.
    pub settlement: JoinHandle<Option<Transaction>>,
}

#[derive(Clone)]
pub struct Wallet {
    config: Arc<WalletConfig>,
    ledger: BalanceLedger,
    lifecycle: TransactionLifecycle,
    exchange: ExchangeOperations,
    mining: MiningReconciler,
    balance_source: Arc<dyn BalanceSource>,
    settlement: Arc<dyn SettlementSource>,
    clock: Arc<dyn Clock>,
    events: Arc<EventBus>,
}

impl Wallet {
    /// Build a wallet around an existing ledger. The mining base balance
    /// starts at the ledger total.
    pub fn new(
        config: WalletConfig,
        ledger: BalanceLedger,
        balance_source: Arc<dyn BalanceSource>,
        settlement: Arc<dyn SettlementSource>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let mining = MiningReconciler::new(ledger.snapshot().total());
        Self {
            config: Arc::new(config),
            lifecycle: TransactionLifecycle::new(ledger.clone()),
            exchange: ExchangeOperations::new(ledger.clone()),
            ledger,
            mining,
            balance_source,
            settlement,
            clock,
            events: Arc::new(EventBus::new()),
        }
    }

    /// Build a wallet talking to the configured backend.
    ///
    /// Settlement goes through the backend unless `simulate_settlement` is
    /// set, in which case sends confirm locally after the configured delay.
    pub fn from_config(config: WalletConfig) -> Result<Self, WalletError> {
        let api_url = config
            .api_url
            .clone()
            .ok_or_else(|| WalletError::Config("api_url is required".into()))?;
        let client = Arc::new(ApiClient::new(api_url, config.api_token.clone())?);
        let settlement: Arc<dyn SettlementSource> = if config.simulate_settlement {
            Arc::new(SimulatedSettlement::new(config.settlement_delay()))
        } else {
            client.clone()
        };
        Ok(Self::new(
            config,
            BalanceLedger::new(),
            client,
            settlement,
            Arc::new(SystemClock),
        ))
    }

    pub fn config(&self) -> &WalletConfig {
        &self.config
    }

    pub fn ledger(&self) -> &BalanceLedger {
        &self.ledger
    }

    pub fn events(&self) -> &EventBus {
        &self.events
    }

    // ── Balances ───────────────────────────────────────────────────────

    pub fn snapshot(&self) -> BalanceBreakdown {
        self.ledger.snapshot()
    }

    pub fn transactions(&self) -> Vec<Transaction> {
        self.ledger.transactions()
    }

    pub fn transaction(&self, id: TxId) -> Option<Transaction> {
        self.ledger.transaction(id)
    }

    /// The mining display value: confirmed base plus unconfirmed session
    /// earnings.
    pub fn display_balance(&self) -> Amount {
        self.mining.display_balance()
    }

    pub fn mining_state(&self) -> MiningIntegrationState {
        self.mining.state()
    }

    // ── Transfers ──────────────────────────────────────────────────────

    /// Reserve funds for a transfer and hand it to the settlement source.
    ///
    /// The reservation happens before this returns, so a second send sees it.
    /// Settlement runs on a spawned task bounded by `settlement_timeout`; an
    /// error or timeout fails the transaction and releases the reservation.
    pub fn send(
        &self,
        destination: WalletAddress,
        amount: Amount,
        memo: Option<String>,
    ) -> Result<PendingSend, WalletError> {
        let runtime = tokio::runtime::Handle::try_current().map_err(|_| WalletError::NoRuntime)?;

        let tx = self.lifecycle.initiate_send(
            destination.clone(),
            amount,
            memo.clone(),
            self.config.send_fee,
            self.clock.now(),
        )?;
        self.events.emit(&WalletEvent::TransactionCreated(tx.clone()));
        self.events.emit(&WalletEvent::BalanceChanged(self.ledger.snapshot()));

        let request = SendRequest {
            tx_id: tx.id,
            destination,
            amount,
            fee: tx.fee,
            memo,
        };
        let wallet = self.clone();
        let settlement = runtime.spawn(async move { wallet.drive_settlement(request).await });

        Ok(PendingSend {
            transaction: tx,
            settlement,
        })
    }

    async fn drive_settlement(self, request: SendRequest) -> Option<Transaction> {
        let timeout = self.config.settlement_timeout();
        let outcome = match tokio::time::timeout(timeout, self.settlement.submit(&request)).await {
            Ok(Ok(receipt)) => SettlementOutcome::Confirmed(receipt.settlement_hash),
            Ok(Err(e)) => {
                tracing::warn!(tx_id = %request.tx_id, error = %e, "settlement failed");
                SettlementOutcome::Rejected(e.to_string())
            }
            Err(_) => {
                tracing::warn!(tx_id = %request.tx_id, timeout_secs = timeout.as_secs(), "settlement timed out");
                SettlementOutcome::Rejected(format!(
                    "settlement timed out after {}s",
                    timeout.as_secs()
                ))
            }
        };

        match self.lifecycle.settle(request.tx_id, outcome, self.clock.now()) {
            Ok(SettleResult::Settled(tx)) => {
                self.events.emit(&WalletEvent::TransactionSettled(tx.clone()));
                self.events.emit(&WalletEvent::BalanceChanged(self.ledger.snapshot()));
                Some(tx)
            }
            Ok(SettleResult::AlreadySettled(tx)) => {
                tracing::debug!(tx_id = %tx.id, status = ?tx.status, "late settlement ignored");
                None
            }
            Err(e) => {
                tracing::error!(tx_id = %request.tx_id, error = %e, "could not apply settlement");
                None
            }
        }
    }

    /// Fail pending sends older than `settlement_timeout`.
    pub fn sweep_stale_reservations(&self) -> Vec<Transaction> {
        let swept = self
            .lifecycle
            .reconcile_pending_older_than(self.config.settlement_timeout(), self.clock.now());
        if !swept.is_empty() {
            for tx in &swept {
                self.events.emit(&WalletEvent::TransactionSettled(tx.clone()));
            }
            self.events.emit(&WalletEvent::BalanceChanged(self.ledger.snapshot()));
        }
        swept
    }

    /// Record an incoming credit (receive, mining reward, referral bonus).
    pub fn record_incoming(
        &self,
        kind: TxKind,
        amount: Amount,
        counterparty: Option<WalletAddress>,
    ) -> Result<Transaction, WalletError> {
        let tx = self
            .ledger
            .record_incoming(kind, amount, counterparty, self.clock.now())?;
        self.events.emit(&WalletEvent::BalanceChanged(self.ledger.snapshot()));
        Ok(tx)
    }

    // ── Exchange ───────────────────────────────────────────────────────

    pub fn exchange_to_sendable(&self, amount: Amount) -> Result<BalanceBreakdown, WalletError> {
        let after = self.exchange.exchange_to_sendable(amount)?;
        self.events.emit(&WalletEvent::BalanceChanged(after));
        Ok(after)
    }

    pub fn exchange_to_non_sendable(&self, amount: Amount) -> Result<BalanceBreakdown, WalletError> {
        let after = self.exchange.exchange_to_non_sendable(amount)?;
        self.events.emit(&WalletEvent::BalanceChanged(after));
        Ok(after)
    }

    // ── Mining ─────────────────────────────────────────────────────────

    pub fn start_mining(&self) -> Result<(), WalletError> {
        self.mining.start_session(self.clock.now())?;
        self.events
            .emit(&WalletEvent::DisplayBalanceChanged(self.mining.display_balance()));
        Ok(())
    }

    /// Report the session's cumulative earnings.
    pub fn record_mining_earnings(&self, cumulative: Amount) -> Result<Amount, WalletError> {
        let display = self.mining.record_earnings(cumulative)?;
        self.events.emit(&WalletEvent::DisplayBalanceChanged(display));
        Ok(display)
    }

    /// Accrue the active session at `mining_rate_per_hour` up to now.
    pub fn tick_mining(&self) -> Result<Amount, WalletError> {
        let started_at = self
            .mining
            .state()
            .session_started_at
            .ok_or(MiningError::SessionNotActive)?;
        let earned = session_earnings(started_at, self.clock.now(), self.config.mining_rate_per_hour);
        self.record_mining_earnings(earned)
    }

    /// End the session at `final_balance` and book its earnings as a
    /// completed mining reward in the non-sendable bucket.
    ///
    /// Returns the reward transaction, or `None` when the session earned
    /// nothing.
    pub fn end_mining(&self, final_balance: Amount) -> Result<Option<Transaction>, WalletError> {
        let earned = self.mining.end_session(final_balance)?;
        self.events
            .emit(&WalletEvent::DisplayBalanceChanged(self.mining.display_balance()));
        if earned.is_zero() {
            return Ok(None);
        }
        let tx = self.record_incoming(TxKind::MiningReward, earned, None)?;
        Ok(Some(tx))
    }

    // ── Backend sync ───────────────────────────────────────────────────

    /// Re-read the authoritative balance.
    ///
    /// The mining base always follows a successful read. The ledger buckets
    /// are realigned to the backend breakdown only when it is self-consistent,
    /// no send is in flight and the ledger did not change while the balance
    /// was being fetched; the returned breakdown is `Some` when they were. A failed read is recorded in the mining state, emitted as
    /// [`WalletEvent::SyncFailed`] and returned.
    pub async fn sync_with_backend(&self) -> Result<Option<BalanceBreakdown>, WalletError> {
        let before = self.mining.display_balance();
        let generation = self.ledger.generation();
        let balance = match self
            .mining
            .sync_with_backend(self.balance_source.as_ref(), self.clock.now())
            .await
        {
            Ok(balance) => balance,
            Err(e) => {
                self.events.emit(&WalletEvent::SyncFailed(e.clone()));
                return Err(e.into());
            }
        };

        let display = self.mining.display_balance();
        if display != before {
            self.events.emit(&WalletEvent::DisplayBalanceChanged(display));
        }
        self.realign_buckets(&balance, generation)
    }

    fn realign_buckets(
        &self,
        balance: &BackendBalance,
        generation: u64,
    ) -> Result<Option<BalanceBreakdown>, WalletError> {
        if !balance.is_consistent() {
            tracing::warn!(
                total = %balance.total_balance,
                sendable = %balance.sendable_balance,
                non_sendable = %balance.non_sendable_balance,
                pending = %balance.pending_balance,
                "backend breakdown does not add up; buckets left as they are"
            );
            return Ok(None);
        }
        let before = self.ledger.snapshot();
        let applied = self.ledger.resync_from_backend(
            balance.sendable_balance,
            balance.non_sendable_balance,
            balance.pending_balance,
            generation,
        )?;
        if let Some(after) = applied {
            if after != before {
                tracing::info!(%before, %after, "realigned buckets to backend");
                self.events.emit(&WalletEvent::BalanceChanged(after));
            }
        }
        Ok(applied)
    }
}
