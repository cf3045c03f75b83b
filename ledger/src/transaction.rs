//! Transaction records kept in the ledger's log.

use serde::{Deserialize, Serialize};
use std::fmt;
use vein_types::{Amount, SettlementHash, Timestamp, TxId, WalletAddress};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TxKind {
    Send,
    Receive,
    MiningReward,
    ReferralBonus,
}

impl TxKind {
    pub fn is_outgoing(&self) -> bool {
        matches!(self, TxKind::Send)
    }
}

impl fmt::Display for TxKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TxKind::Send => "send",
            TxKind::Receive => "receive",
            TxKind::MiningReward => "mining-reward",
            TxKind::ReferralBonus => "referral-bonus",
        };
        f.write_str(name)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TxStatus {
    Pending,
    Completed,
    Failed,
}

impl TxStatus {
    pub fn is_final(&self) -> bool {
        !matches!(self, TxStatus::Pending)
    }
}

/// A snapshot of one transaction.
///
/// The ledger owns the authoritative record; values handed out are copies, so
/// changing one has no effect on the ledger.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: TxId,
    pub kind: TxKind,
    /// Magnitude of the transfer. See [`Transaction::signed_amount`].
    pub amount: Amount,
    pub counterparty: Option<WalletAddress>,
    pub memo: Option<String>,
    pub timestamp: Timestamp,
    pub status: TxStatus,
    pub fee: Amount,
    /// Assigned when the transaction completes.
    pub settlement_hash: Option<SettlementHash>,
    pub failure_reason: Option<String>,
    pub settled_at: Option<Timestamp>,
}

impl Transaction {
    /// A freshly reserved outbound transfer.
    pub(crate) fn pending_send(
        id: TxId,
        destination: WalletAddress,
        amount: Amount,
        fee: Amount,
        memo: Option<String>,
        now: Timestamp,
    ) -> Self {
        Self {
            id,
            kind: TxKind::Send,
            amount,
            counterparty: Some(destination),
            memo,
            timestamp: now,
            status: TxStatus::Pending,
            fee,
            settlement_hash: None,
            failure_reason: None,
            settled_at: None,
        }
    }

    /// An incoming credit, final as soon as it is recorded.
    pub(crate) fn completed_incoming(
        id: TxId,
        kind: TxKind,
        amount: Amount,
        counterparty: Option<WalletAddress>,
        now: Timestamp,
    ) -> Self {
        Self {
            id,
            kind,
            amount,
            counterparty,
            memo: None,
            timestamp: now,
            status: TxStatus::Completed,
            fee: Amount::ZERO,
            settlement_hash: None,
            failure_reason: None,
            settled_at: Some(now),
        }
    }

    /// Amount in raw units, negative for outgoing transfers. `None` if the
    /// amount does not fit an `i128`.
    pub fn signed_amount(&self) -> Option<i128> {
        let raw = self.amount.to_signed_raw()?;
        Some(if self.kind.is_outgoing() { -raw } else { raw })
    }

    /// Funds held in the pending bucket for this transaction.
    pub fn reservation(&self) -> Amount {
        if self.kind.is_outgoing() && self.status == TxStatus::Pending {
            self.amount
        } else {
            Amount::ZERO
        }
    }

    pub fn is_pending(&self) -> bool {
        self.status == TxStatus::Pending
    }
}
