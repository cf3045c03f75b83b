use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApiError {
    #[error("failed to build HTTP client: {0}")]
    Client(String),

    #[error("request failed: {0}")]
    Transport(String),

    #[error("backend returned HTTP {status}")]
    Status { status: u16 },

    #[error("backend rejected request: {0}")]
    Rejected(String),

    #[error("invalid response: {0}")]
    Decode(String),
}
