//! Endpoint handlers.

use axum::{
    body::Body,
    extract::State,
    http::{Request, StatusCode},
    response::{IntoResponse, Response},
    Extension, Json,
};
use serde_json::json;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::blockchain::types::BlockchainError;
use crate::blockchain::units::ether_to_wei;
use crate::http::request::{remote_addr, ClaimIdentity};
use crate::http::response::{ClaimResponse, InfoResponse};
use crate::http::server::AppState;
use crate::observability::metrics;
use crate::security::client_ip::{resolve_client_ip, X_FORWARDED_FOR, X_REAL_IP};

/// Send the configured payout to the validated claim address.
pub async fn claim_handler(
    State(state): State<AppState>,
    Extension(identity): Extension<ClaimIdentity>,
) -> Response {
    let settings = &state.config.faucet;
    let value = ether_to_wei(settings.payout);

    let result = match tokio::time::timeout(
        settings.transfer_timeout(),
        state.transfer.transfer(identity.address, value),
    )
    .await
    {
        Ok(result) => result,
        Err(_) => Err(BlockchainError::Timeout(settings.transfer_timeout_secs)),
    };

    match result {
        Ok(tx_hash) => {
            metrics::record_claim("success");
            tracing::info!(tx_hash = %tx_hash, address = %identity.address, "Transaction sent successfully");
            (
                StatusCode::OK,
                Json(ClaimResponse {
                    msg: format!("Txhash: {tx_hash}"),
                }),
            )
                .into_response()
        }
        Err(e) => {
            metrics::record_claim("failure");
            tracing::error!(error = %e, address = %identity.address, "Failed to send transaction");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ClaimResponse { msg: e.to_string() }),
            )
                .into_response()
        }
    }
}

/// Faucet details, echoing the addressing headers the server saw.
pub async fn info_handler(State(state): State<AppState>, request: Request<Body>) -> Json<InfoResponse> {
    let config = &state.config;
    let headers = request.headers();
    let remote = remote_addr(request.extensions());
    let header_str = |name: &str| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string()
    };

    Json(InfoResponse {
        account: state.transfer.sender().to_string(),
        network: config.faucet.network.clone(),
        payout: config.faucet.payout.to_string(),
        symbol: config.faucet.symbol.clone(),
        hcaptcha_site_key: config.captcha.site_key.clone(),
        forward: header_str(X_FORWARDED_FOR),
        real_ip: header_str(X_REAL_IP),
        client_ip: resolve_client_ip(config.client_ip.trusted_proxy_count, headers, &remote),
        remote_addr: remote,
        discord_client_id: config.auth.discord_client_id.clone(),
    })
}

pub async fn health_handler() -> impl IntoResponse {
    let timestamp = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or_default();
    Json(json!({
        "status": "healthy",
        "timestamp": timestamp,
    }))
}
