//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the faucet.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Root configuration for the faucet gateway.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct FaucetConfig {
    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// Payout and cooldown settings.
    pub faucet: FaucetSettings,

    /// Client address resolution behind reverse proxies.
    pub client_ip: ClientIpConfig,

    /// hCaptcha verification.
    pub captcha: CaptchaConfig,

    /// Discord session validation.
    pub auth: AuthConfig,

    /// Chain access for payouts.
    pub blockchain: BlockchainConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
        }
    }
}

/// What the faucet pays out and how often.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct FaucetSettings {
    /// Network name shown to clients.
    pub network: String,

    /// Native token symbol.
    pub symbol: String,

    /// Payout per claim, in whole tokens.
    pub payout: u64,

    /// Cooldown between claims for the same address or client IP, in minutes.
    /// Zero disables rate limiting.
    pub interval_mins: u64,

    /// Upper bound on a single payout transfer, in seconds.
    pub transfer_timeout_secs: u64,
}

impl FaucetSettings {
    pub fn cooldown(&self) -> Duration {
        Duration::from_secs(self.interval_mins.saturating_mul(60))
    }

    pub fn transfer_timeout(&self) -> Duration {
        Duration::from_secs(self.transfer_timeout_secs)
    }
}

impl Default for FaucetSettings {
    fn default() -> Self {
        Self {
            network: "testnet".to_string(),
            symbol: "ETH".to_string(),
            payout: 1,
            interval_mins: 1440,
            transfer_timeout_secs: 5,
        }
    }
}

/// Client IP extraction settings.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct ClientIpConfig {
    /// Number of reverse proxies in front of the faucet that append
    /// themselves to `X-Forwarded-For`.
    pub trusted_proxy_count: usize,
}

/// hCaptcha configuration. An empty secret disables the check.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CaptchaConfig {
    pub site_key: String,
    pub secret: String,
    pub verify_url: String,
}

impl CaptchaConfig {
    pub fn enabled(&self) -> bool {
        !self.secret.is_empty()
    }
}

impl Default for CaptchaConfig {
    fn default() -> Self {
        Self {
            site_key: String::new(),
            secret: String::new(),
            verify_url: "https://api.hcaptcha.com/siteverify".to_string(),
        }
    }
}

/// Discord session check on the `token` cookie.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AuthConfig {
    /// Require a valid session cookie on claims.
    pub enabled: bool,

    /// Guild member endpoint queried with the bearer token.
    pub member_url: String,

    /// OAuth client id handed to the frontend.
    pub discord_client_id: String,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            member_url: "https://discord.com/api/users/@me/guilds/404643249798512652/member"
                .to_string(),
            discord_client_id: String::new(),
        }
    }
}

/// Blockchain integration configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct BlockchainConfig {
    /// JSON-RPC endpoint URL.
    pub rpc_url: String,

    /// Chain ID (e.g., 1 for Ethereum mainnet, 31337 for local Anvil).
    pub chain_id: u64,

    /// RPC request timeout in seconds.
    pub rpc_timeout_secs: u64,

    /// Maximum gas price in gwei (protection against spikes).
    pub max_gas_price_gwei: u64,
}

impl Default for BlockchainConfig {
    fn default() -> Self {
        Self {
            rpc_url: "http://localhost:8545".to_string(),
            chain_id: 31337,
            rpc_timeout_secs: 10,
            max_gas_price_gwei: 500,
        }
    }
}

/// Timeout configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Request timeout (total time for request/response) in seconds.
    pub request_secs: u64,

    /// Timeout for outbound captcha and session checks, in seconds.
    pub outbound_secs: u64,
}

impl TimeoutConfig {
    pub fn outbound(&self) -> Duration {
        Duration::from_secs(self.outbound_secs)
    }
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            request_secs: 30,
            outbound_secs: 5,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}
