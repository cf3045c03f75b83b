use thiserror::Error;
use vein_types::{Amount, TxId};

use crate::breakdown::Bucket;
use crate::transaction::TxKind;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LedgerError {
    /// The sendable bucket cannot cover the request. `shortfall` is how much
    /// more would be needed, e.g. to suggest an exchange of that size.
    #[error("insufficient sendable balance: need {requested}, have {available} (short {shortfall})")]
    InsufficientSendableBalance {
        requested: Amount,
        available: Amount,
        shortfall: Amount,
    },

    #[error("insufficient non-sendable balance: need {requested}, have {available} (short {shortfall})")]
    InsufficientNonSendableBalance {
        requested: Amount,
        available: Amount,
        shortfall: Amount,
    },

    #[error("amount must be greater than zero")]
    InvalidAmount,

    #[error("invariant violation on {bucket} bucket: {detail}")]
    InvariantViolation { bucket: Bucket, detail: String },

    #[error("transaction {0} not found")]
    TransactionNotFound(TxId),

    #[error("{0} is not an incoming transaction kind")]
    NotIncoming(TxKind),
}
