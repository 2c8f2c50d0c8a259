//! Configuration validation.
//!
//! Serde handles syntax; this module checks value ranges and cross-field
//! constraints. Every problem is reported, not just the first.

use std::net::SocketAddr;
use thiserror::Error;

use crate::config::schema::FaucetConfig;

/// A single semantic problem in the configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{field}: {message}")]
pub struct ValidationError {
    pub field: &'static str,
    pub message: String,
}

impl ValidationError {
    fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

/// Validate a parsed configuration.
pub fn validate_config(config: &FaucetConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::new(
            "listener.bind_address",
            format!("'{}' is not a socket address", config.listener.bind_address),
        ));
    }

    if config.faucet.payout == 0 {
        errors.push(ValidationError::new("faucet.payout", "must be greater than zero"));
    }

    if config.faucet.transfer_timeout_secs == 0 {
        errors.push(ValidationError::new(
            "faucet.transfer_timeout_secs",
            "must be greater than zero",
        ));
    }

    if let Err(e) = config.blockchain.rpc_url.parse::<url::Url>() {
        errors.push(ValidationError::new(
            "blockchain.rpc_url",
            format!("invalid URL '{}': {}", config.blockchain.rpc_url, e),
        ));
    }

    if config.timeouts.request_secs == 0 {
        errors.push(ValidationError::new(
            "timeouts.request_secs",
            "must be greater than zero",
        ));
    }

    if config.timeouts.outbound_secs == 0 {
        errors.push(ValidationError::new(
            "timeouts.outbound_secs",
            "must be greater than zero",
        ));
    }

    // The inner timeouts must fire first so a slow claim ends in a response
    // the limiter can see, not a cancelled request.
    let request_secs = config.timeouts.request_secs;
    if request_secs > 0 && request_secs <= config.faucet.transfer_timeout_secs {
        errors.push(ValidationError::new(
            "timeouts.request_secs",
            format!(
                "must exceed faucet.transfer_timeout_secs ({})",
                config.faucet.transfer_timeout_secs
            ),
        ));
    }
    if request_secs > 0 && request_secs <= config.timeouts.outbound_secs {
        errors.push(ValidationError::new(
            "timeouts.request_secs",
            format!(
                "must exceed timeouts.outbound_secs ({})",
                config.timeouts.outbound_secs
            ),
        ));
    }

    if config.captcha.enabled() && config.captcha.site_key.is_empty() {
        errors.push(ValidationError::new(
            "captcha.site_key",
            "required when a captcha secret is set",
        ));
    }

    if config.observability.metrics_enabled
        && config
            .observability
            .metrics_address
            .parse::<SocketAddr>()
            .is_err()
    {
        errors.push(ValidationError::new(
            "observability.metrics_address",
            format!(
                "'{}' is not a socket address",
                config.observability.metrics_address
            ),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
