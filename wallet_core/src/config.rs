//! Wallet configuration with TOML file support.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use vein_types::Amount;
use vein_utils::LogFormat;

use crate::error::WalletError;

/// Configuration for a wallet instance.
///
/// Can be loaded from a TOML file via [`WalletConfig::from_toml_file`] or
/// built programmatically (e.g. for tests).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct WalletConfig {
    /// Base URL of the wallet backend.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_url: Option<String>,

    /// Bearer token sent with backend requests.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_token: Option<String>,

    /// Settle sends locally after `settlement_delay_ms` instead of asking the
    /// backend.
    #[serde(default)]
    pub simulate_settlement: bool,

    /// Fee charged on every send, taken from sendable at reservation time.
    #[serde(default = "default_send_fee")]
    pub send_fee: Amount,

    /// Delay of the simulated settlement.
    #[serde(default = "default_settlement_delay_ms")]
    pub settlement_delay_ms: u64,

    /// A pending send older than this is failed and its reservation released.
    #[serde(default = "default_settlement_timeout_secs")]
    pub settlement_timeout_secs: u64,

    /// How often the daemon re-reads the backend balance.
    #[serde(default = "default_sync_interval_secs")]
    pub sync_interval_secs: u64,

    /// Local mining accrual rate used by `Wallet::tick_mining`.
    #[serde(default = "default_mining_rate_per_hour")]
    pub mining_rate_per_hour: Amount,

    /// Log format: "human" or "json".
    #[serde(default)]
    pub log_format: LogFormat,

    /// Log level filter: "trace", "debug", "info", "warn", "error".
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

// ── Serde default helpers ──────────────────────────────────────────────

fn default_send_fee() -> Amount {
    Amount::new(1_000)
}

fn default_settlement_delay_ms() -> u64 {
    2_000
}

fn default_settlement_timeout_secs() -> u64 {
    300
}

fn default_sync_interval_secs() -> u64 {
    30
}

fn default_mining_rate_per_hour() -> Amount {
    Amount::new(250_000)
}

fn default_log_level() -> String {
    "info".to_string()
}

// ── Impl ───────────────────────────────────────────────────────────────

impl WalletConfig {
    /// Load configuration from a TOML file.
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, WalletError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| WalletError::Config(format!("{}: {e}", path.display())))?;
        Self::from_toml_str(&content)
    }

    /// Parse configuration from a TOML string.
    pub fn from_toml_str(s: &str) -> Result<Self, WalletError> {
        let config: Self = toml::from_str(s).map_err(|e| WalletError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize the configuration to a TOML string.
    pub fn to_toml_string(&self) -> Result<String, WalletError> {
        toml::to_string_pretty(self).map_err(|e| WalletError::Config(e.to_string()))
    }

    pub fn validate(&self) -> Result<(), WalletError> {
        if self.settlement_timeout_secs == 0 {
            return Err(WalletError::Config(
                "settlement_timeout_secs must be greater than zero".into(),
            ));
        }
        if self.sync_interval_secs == 0 {
            return Err(WalletError::Config(
                "sync_interval_secs must be greater than zero".into(),
            ));
        }
        Ok(())
    }

    pub fn settlement_delay(&self) -> Duration {
        Duration::from_millis(self.settlement_delay_ms)
    }

    pub fn settlement_timeout(&self) -> Duration {
        Duration::from_secs(self.settlement_timeout_secs)
    }

    pub fn sync_interval(&self) -> Duration {
        Duration::from_secs(self.sync_interval_secs)
    }
}

impl Default for WalletConfig {
    fn default() -> Self {
        Self {
            api_url: None,
            api_token: None,
            simulate_settlement: false,
            send_fee: default_send_fee(),
            settlement_delay_ms: default_settlement_delay_ms(),
            settlement_timeout_secs: default_settlement_timeout_secs(),
            sync_interval_secs: default_sync_interval_secs(),
            mining_rate_per_hour: default_mining_rate_per_hour(),
            log_format: LogFormat::default(),
            log_level: default_log_level(),
        }
    }
}
