//! JSON response envelopes.

use serde::{Deserialize, Serialize};

/// Envelope for claim outcomes and every error the claim chain produces.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClaimResponse {
    pub msg: String,
}

/// Faucet details for the frontend, plus what the server saw of the caller.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InfoResponse {
    pub account: String,
    pub network: String,
    pub payout: String,
    pub symbol: String,
    #[serde(rename = "hcaptcha_sitekey", skip_serializing_if = "String::is_empty", default)]
    pub hcaptcha_site_key: String,
    #[serde(skip_serializing_if = "String::is_empty", default)]
    pub remote_addr: String,
    #[serde(skip_serializing_if = "String::is_empty", default)]
    pub forward: String,
    #[serde(skip_serializing_if = "String::is_empty", default)]
    pub real_ip: String,
    pub client_ip: String,
    pub discord_client_id: String,
}
