//! Metrics collection and exposition.
//!
//! # Metrics
//! - `faucet_admissions_total` (counter): limiter decisions by `decision`
//! - `faucet_rollbacks_total` (counter): cooldowns released after a failed claim
//! - `faucet_claims_total` (counter): payouts by `outcome`
//! - `faucet_cooldown_entries` (gauge): keys currently cooling down

use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;

/// Install the Prometheus recorder and its scrape listener.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_admission(decision: &'static str) {
    metrics::counter!("faucet_admissions_total", "decision" => decision).increment(1);
}

pub fn record_rollback() {
    metrics::counter!("faucet_rollbacks_total").increment(1);
}

pub fn record_claim(outcome: &'static str) {
    metrics::counter!("faucet_claims_total", "outcome" => outcome).increment(1);
}

pub fn record_cooldown_entries(count: usize) {
    metrics::gauge!("faucet_cooldown_entries").set(count as f64);
}
