//! HTTP client for the wallet backend.

use std::time::Duration;

use futures_util::future::BoxFuture;
use serde::de::DeserializeOwned;
use serde::Deserialize;

use crate::error::ApiError;
use crate::source::{BackendBalance, BalanceSource, SendReceipt, SendRequest, SettlementSource};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// JSON-over-HTTP client for the wallet backend.
///
/// Wraps `reqwest::Client` with the backend's base URL and an optional bearer
/// token, and implements both backend capabilities.
#[derive(Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    token: Option<String>,
}

/// Error envelope some backend failures come wrapped in.
#[derive(Deserialize)]
struct ErrorBody {
    error: String,
}

impl ApiClient {
    /// Create a client targeting the given base URL (e.g. `https://api.example.com/v1`).
    pub fn new(base_url: impl Into<String>, token: Option<String>) -> Result<Self, ApiError> {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .connect_timeout(CONNECT_TIMEOUT)
            .build()
            .map_err(|e| ApiError::Client(e.to_string()))?;
        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    fn authorize(&self, req: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.token {
            Some(token) => req.bearer_auth(token),
            None => req,
        }
    }

    async fn execute<T: DeserializeOwned>(&self, req: reqwest::RequestBuilder) -> Result<T, ApiError> {
        let response = self
            .authorize(req)
            .send()
            .await
            .map_err(|e| ApiError::Transport(e.to_string()))?;

        let status = response.status();
        let body = response
            .bytes()
            .await
            .map_err(|e| ApiError::Transport(e.to_string()))?;

        if !status.is_success() {
            if let Ok(err) = serde_json::from_slice::<ErrorBody>(&body) {
                return Err(ApiError::Rejected(err.error));
            }
            return Err(ApiError::Status {
                status: status.as_u16(),
            });
        }

        serde_json::from_slice(&body).map_err(|e| ApiError::Decode(e.to_string()))
    }

    /// `GET /wallet/balance`
    pub async fn balance(&self) -> Result<BackendBalance, ApiError> {
        let balance: BackendBalance = self.execute(self.http.get(self.url("wallet/balance"))).await?;
        tracing::debug!(total = %balance.total_balance, "fetched backend balance");
        Ok(balance)
    }

    /// `POST /wallet/send`
    pub async fn send(&self, request: &SendRequest) -> Result<SendReceipt, ApiError> {
        let receipt: SendReceipt = self
            .execute(self.http.post(self.url("wallet/send")).json(request))
            .await?;
        tracing::debug!(tx_id = %request.tx_id, settlement = %receipt.settlement_hash, "backend settled send");
        Ok(receipt)
    }
}

impl BalanceSource for ApiClient {
    fn fetch_balance(&self) -> BoxFuture<'_, Result<BackendBalance, ApiError>> {
        Box::pin(self.balance())
    }
}

impl SettlementSource for ApiClient {
    fn submit<'a>(&'a self, request: &'a SendRequest) -> BoxFuture<'a, Result<SendReceipt, ApiError>> {
        Box::pin(self.send(request))
    }
}
