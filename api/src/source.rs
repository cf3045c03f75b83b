//! Capability traits and the values that cross them.

use futures_util::future::BoxFuture;
use serde::{Deserialize, Serialize};
use vein_types::{Amount, SettlementHash, TxId, WalletAddress};

use crate::error::ApiError;

/// The backend's authoritative balance.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BackendBalance {
    pub total_balance: Amount,
    pub sendable_balance: Amount,
    pub non_sendable_balance: Amount,
    pub pending_balance: Amount,
}

impl BackendBalance {
    /// Whether the reported buckets add up to the reported total.
    pub fn is_consistent(&self) -> bool {
        self.sendable_balance
            .checked_add(self.non_sendable_balance)
            .and_then(|s| s.checked_add(self.pending_balance))
            == Some(self.total_balance)
    }
}

/// An outbound transfer handed to the backend for settlement.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SendRequest {
    pub tx_id: TxId,
    pub destination: WalletAddress,
    pub amount: Amount,
    pub fee: Amount,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub memo: Option<String>,
}

/// The backend's acknowledgement of a settled transfer.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendReceipt {
    pub settlement_hash: SettlementHash,
}

/// Reads the authoritative balance.
pub trait BalanceSource: Send + Sync {
    fn fetch_balance(&self) -> BoxFuture<'_, Result<BackendBalance, ApiError>>;
}

/// Settles outbound transfers. Resolves once the transfer is final: `Ok`
/// with a settlement identifier, or `Err` if it will never settle.
pub trait SettlementSource: Send + Sync {
    fn submit<'a>(&'a self, request: &'a SendRequest) -> BoxFuture<'a, Result<SendReceipt, ApiError>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backend_balance_parses_camel_case_numbers() {
        let json = r#"{
            "totalBalance": 512.5,
            "sendableBalance": "100",
            "nonSendableBalance": 412.5,
            "pendingBalance": 0
        }"#;
        let balance: BackendBalance = serde_json::from_str(json).unwrap();
        assert_eq!(balance.total_balance.raw(), 512_500_000);
        assert!(balance.is_consistent());
    }

    #[test]
    fn inconsistent_breakdown_is_detected() {
        let balance = BackendBalance {
            total_balance: Amount::from_tokens(10),
            sendable_balance: Amount::from_tokens(4),
            non_sendable_balance: Amount::from_tokens(4),
            pending_balance: Amount::ZERO,
        };
        assert!(!balance.is_consistent());
    }

    #[test]
    fn send_request_omits_missing_memo() {
        let req = SendRequest {
            tx_id: TxId::new(7),
            destination: WalletAddress::parse("0xabc").unwrap(),
            amount: Amount::from_tokens(40),
            fee: Amount::new(1_000),
            memo: None,
        };
        let json = serde_json::to_value(&req).unwrap();
        assert_eq!(json["txId"], 7);
        assert_eq!(json["amount"], "40");
        assert_eq!(json["fee"], "0.001");
        assert!(json.get("memo").is_none());
    }
}
