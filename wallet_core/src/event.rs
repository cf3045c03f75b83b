//! Events emitted by the wallet for UI collaborators.

use std::sync::{PoisonError, RwLock};

use vein_ledger::{BalanceBreakdown, Transaction};
use vein_mining::SyncError;
use vein_types::Amount;

/// Wallet-level events that observers can subscribe to via the [`EventBus`].
#[derive(Clone, Debug, PartialEq)]
pub enum WalletEvent {
    /// The bucket breakdown changed.
    BalanceChanged(BalanceBreakdown),
    /// A send was reserved and is awaiting settlement.
    TransactionCreated(Transaction),
    /// A pending transaction completed or failed.
    TransactionSettled(Transaction),
    /// The optimistic mining display value changed.
    DisplayBalanceChanged(Amount),
    /// A backend sync failed; the display keeps its last known value.
    SyncFailed(SyncError),
}

type Listener = Box<dyn Fn(&WalletEvent) + Send + Sync>;

/// Synchronous fan-out event bus.
///
/// Listeners are invoked inline on the emitting task, after the wallet has
/// released its internal locks; keep handlers fast.
#[derive(Default)]
pub struct EventBus {
    listeners: RwLock<Vec<Listener>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&self, listener: impl Fn(&WalletEvent) + Send + Sync + 'static) {
        self.listeners
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(Box::new(listener));
    }

    pub fn emit(&self, event: &WalletEvent) {
        let listeners = self.listeners.read().unwrap_or_else(PoisonError::into_inner);
        for listener in listeners.iter() {
            listener(event);
        }
    }

    pub fn listener_count(&self) -> usize {
        self.listeners
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}
