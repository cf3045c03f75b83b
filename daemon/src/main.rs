//! Vein daemon: keeps a wallet in step with its backend.

mod shutdown;

use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use vein_types::{Amount, WalletAddress};
use vein_utils::LogFormat;
use vein_wallet_core::{Wallet, WalletConfig};

use crate::shutdown::Shutdown;

#[derive(Parser)]
#[command(name = "vein-daemon", about = "Vein wallet daemon")]
struct Cli {
    /// Path to a TOML configuration file. If provided, file settings
    /// are used as the base; CLI flags and env vars override them.
    #[arg(long, env = "VEIN_CONFIG")]
    config: Option<PathBuf>,

    /// Base URL of the wallet backend.
    #[arg(long, env = "VEIN_API_URL")]
    api_url: Option<String>,

    /// Bearer token for the backend.
    #[arg(long, env = "VEIN_API_TOKEN", hide_env_values = true)]
    api_token: Option<String>,

    /// Confirm sends locally instead of through the backend.
    #[arg(long, env = "VEIN_SIMULATE_SETTLEMENT")]
    simulate_settlement: bool,

    /// Log level: "trace", "debug", "info", "warn", "error".
    #[arg(long, env = "VEIN_LOG_LEVEL")]
    log_level: Option<String>,

    /// Log format: "human" or "json".
    #[arg(long, env = "VEIN_LOG_FORMAT")]
    log_format: Option<LogFormat>,

    #[command(subcommand)]
    command: Command,
}

#[derive(clap::Subcommand)]
enum Command {
    /// Sync with the backend and sweep stale reservations until interrupted.
    Run,
    /// Sync once and print the balance breakdown.
    Balance,
    /// Send funds and wait for the transfer to settle.
    Send {
        #[arg(long)]
        to: WalletAddress,
        #[arg(long)]
        amount: Amount,
        #[arg(long)]
        memo: Option<String>,
    },
    /// Print the effective configuration as TOML.
    Config,
}

impl Cli {
    fn resolve_config(&self) -> anyhow::Result<WalletConfig> {
        let mut config = match &self.config {
            Some(path) => WalletConfig::from_toml_file(path)
                .with_context(|| format!("loading config from {}", path.display()))?,
            None => WalletConfig::default(),
        };
        if let Some(url) = &self.api_url {
            config.api_url = Some(url.clone());
        }
        if let Some(token) = &self.api_token {
            config.api_token = Some(token.clone());
        }
        config.simulate_settlement |= self.simulate_settlement;
        if let Some(level) = &self.log_level {
            config.log_level = level.clone();
        }
        if let Some(format) = self.log_format {
            config.log_format = format;
        }
        config.validate()?;
        Ok(config)
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = cli.resolve_config()?;

    if let Command::Config = cli.command {
        print!("{}", config.to_toml_string()?);
        return Ok(());
    }

    vein_utils::init_logging(config.log_format, &config.log_level)?;
    if let Some(path) = &cli.config {
        tracing::info!(path = %path.display(), "loaded config");
    }

    let wallet = Wallet::from_config(config)?;

    match cli.command {
        Command::Run => run(wallet).await?,
        Command::Balance => {
            wallet.sync_with_backend().await?;
            println!("{}", wallet.snapshot());
            println!("display: {}", wallet.display_balance());
        }
        Command::Send { to, amount, memo } => {
            wallet.sync_with_backend().await?;
            let pending = wallet.send(to, amount, memo)?;
            println!("{} reserved, awaiting settlement", pending.transaction.id);
            match pending.settlement.await? {
                Some(tx) => match (&tx.settlement_hash, &tx.failure_reason) {
                    (Some(hash), _) => println!("{} completed: {hash}", tx.id),
                    (None, Some(reason)) => println!("{} failed: {reason}", tx.id),
                    (None, None) => println!("{} {:?}", tx.id, tx.status),
                },
                None => println!("{} was settled elsewhere", pending.transaction.id),
            }
            println!("{}", wallet.snapshot());
        }
        Command::Config => {}
    }

    Ok(())
}

async fn run(wallet: Wallet) -> anyhow::Result<()> {
    let shutdown = Shutdown::new();
    let mut stop = shutdown.listener();
    let mut ticker = tokio::time::interval(wallet.config().sync_interval());
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

    tracing::info!(
        api_url = wallet.config().api_url.as_deref().unwrap_or_default(),
        sync_interval_secs = wallet.config().sync_interval_secs,
        simulate_settlement = wallet.config().simulate_settlement,
        "vein daemon started"
    );

    let loop_wallet = wallet.clone();
    let worker = tokio::spawn(async move {
        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    // Failures are recorded in the wallet's mining state.
                    if let Ok(Some(buckets)) = loop_wallet.sync_with_backend().await {
                        tracing::debug!(%buckets, "buckets in step with backend");
                    }
                    let swept = loop_wallet.sweep_stale_reservations();
                    if !swept.is_empty() {
                        tracing::info!(count = swept.len(), "failed stale reservations");
                    }
                }
                _ = stop.stopped() => break,
            }
        }
    });

    let signal = shutdown::os_signal().await;
    tracing::info!(signal, "shutting down");
    shutdown.trigger();
    worker.await?;

    tracing::info!(balance = %wallet.snapshot(), "vein daemon exited cleanly");
    Ok(())
}
