use thiserror::Error;

#[derive(Debug, Error)]
pub enum WalletError {
    #[error(transparent)]
    Ledger(#[from] vein_ledger::LedgerError),

    #[error(transparent)]
    Mining(#[from] vein_mining::MiningError),

    #[error(transparent)]
    Sync(#[from] vein_mining::SyncError),

    #[error("backend error: {0}")]
    Api(#[from] vein_api::ApiError),

    #[error("config error: {0}")]
    Config(String),

    #[error("no Tokio runtime available to drive settlement")]
    NoRuntime,
}
