//! Faucet admission gate.
//!
//! An HTTP front for a native-token faucet that decides which claims may
//! proceed to a payout.
//!
//! # Architecture Overview
//!
//! ```text
//!     POST /api/claim
//!         │
//!         ▼
//!   ┌──────────────┐   400/413 malformed body or address
//!   │ request.rs   │──────────────────────────────────────▶
//!   └──────┬───────┘
//!          ▼
//!   ┌──────────────┐   429 + Retry-After (address or client IP cooling down)
//!   │ rate_limit   │──────────────────────────────────────▶
//!   └──────┬───────┘
//!          ▼
//!   ┌──────────────┐   429 captcha / 401 session
//!   │ captcha,     │──────────────────────────────────────▶  (cooldown rolled back)
//!   │ session      │
//!   └──────┬───────┘
//!          ▼
//!   ┌──────────────┐   500 transfer failed or timed out
//!   │ claim handler│──────────────────────────────────────▶  (cooldown rolled back)
//!   └──────┬───────┘
//!          ▼
//!     200 {"msg": "Txhash: 0x…"}   (cooldown kept)
//! ```

use clap::Parser;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::net::TcpListener;

use faucet_gate::blockchain::{BlockchainClient, TxBuilder, Wallet};
use faucet_gate::config::{load_config, validate_config, ConfigError, FaucetConfig};
use faucet_gate::http::{HttpServer, Services};
use faucet_gate::lifecycle::{shutdown_signal, OfflineWatcher, Shutdown};
use faucet_gate::observability::{logging, metrics};
use faucet_gate::security::{CaptchaVerifier, DiscordSessionValidator, HCaptchaVerifier, SessionValidator};

#[derive(Parser, Debug)]
#[command(name = "faucet-gate", version, about = "Native-token faucet with claim admission control")]
struct Args {
    /// Path to a TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Listener port, keeping the configured host.
    #[arg(long)]
    port: Option<u16>,

    /// Number of trusted reverse proxies in front of the faucet.
    #[arg(long)]
    proxy_count: Option<usize>,

    /// Minutes between claims for the same address or client IP.
    #[arg(long)]
    interval: Option<u64>,

    /// Whole tokens paid per claim.
    #[arg(long)]
    payout: Option<u64>,
}

impl Args {
    fn apply(&self, config: &mut FaucetConfig) {
        if let Some(port) = self.port {
            config.listener.bind_address = match config.listener.bind_address.parse::<SocketAddr>() {
                Ok(mut addr) => {
                    addr.set_port(port);
                    addr.to_string()
                }
                Err(_) => format!("0.0.0.0:{port}"),
            };
        }
        if let Some(count) = self.proxy_count {
            config.client_ip.trusted_proxy_count = count;
        }
        if let Some(interval) = self.interval {
            config.faucet.interval_mins = interval;
        }
        if let Some(payout) = self.payout {
            config.faucet.payout = payout;
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => load_config(path)?,
        None => FaucetConfig::default(),
    };
    args.apply(&mut config);
    validate_config(&config).map_err(ConfigError::Validation)?;

    logging::init_logging(&config.observability.log_level);
    tracing::info!("faucet-gate v{} starting", env!("CARGO_PKG_VERSION"));

    tracing::info!(
        bind_address = %config.listener.bind_address,
        network = %config.faucet.network,
        payout = config.faucet.payout,
        interval_mins = config.faucet.interval_mins,
        trusted_proxy_count = config.client_ip.trusted_proxy_count,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        let addr: SocketAddr = config.observability.metrics_address.parse()?;
        metrics::init_metrics(addr);
    }

    let wallet = Wallet::from_env(config.blockchain.chain_id)?;
    let client = BlockchainClient::new(config.blockchain.clone(), &wallet).await?;
    tracing::info!(account = %wallet.address(), "Faucet wallet loaded");

    let http_client = reqwest::Client::builder()
        .timeout(config.timeouts.outbound())
        .build()?;
    let captcha: Option<Arc<dyn CaptchaVerifier>> = config
        .captcha
        .enabled()
        .then(|| Arc::new(HCaptchaVerifier::new(http_client.clone(), &config.captcha)) as Arc<dyn CaptchaVerifier>);
    let session: Option<Arc<dyn SessionValidator>> = config
        .auth
        .enabled
        .then(|| Arc::new(DiscordSessionValidator::new(http_client.clone(), &config.auth)) as Arc<dyn SessionValidator>);

    let services = Services {
        transfer: Arc::new(TxBuilder::new(client, wallet)),
        captcha,
        session,
    };

    let shutdown = Shutdown::new();

    let _offline_watcher = match std::env::current_dir() {
        Ok(dir) => match OfflineWatcher::new(&dir, shutdown.clone()).run() {
            Ok(watcher) => Some(watcher),
            Err(e) => {
                tracing::warn!(error = %e, "Offline marker watcher unavailable");
                None
            }
        },
        Err(e) => {
            tracing::warn!(error = %e, "Cannot resolve working directory");
            None
        }
    };

    let signal_shutdown = shutdown.clone();
    tokio::spawn(async move {
        shutdown_signal().await;
        signal_shutdown.trigger();
    });

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    let server = HttpServer::new(config, services);
    server.run(listener, shutdown.subscribe()).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
