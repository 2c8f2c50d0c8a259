//! Shared utilities for integration tests.
#![allow(dead_code)]

use alloy::primitives::{Address, TxHash, U256};
use axum::{
    body::Body,
    extract::ConnectInfo,
    http::{Request, Response},
    Router,
};
use faucet_gate::blockchain::{BlockchainError, BlockchainResult, Transfer};
use faucet_gate::config::FaucetConfig;
use faucet_gate::http::{HttpServer, Services};
use faucet_gate::security::{CaptchaVerifier, CooldownLimiter, SessionValidator};
use futures_util::future::BoxFuture;
use serde_json::Value;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceExt;

pub const ALICE: &str = "0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266";
pub const BOB: &str = "0x70997970C51812dc3A010C7d01b50e0d17dc79C8";
pub const CAROL: &str = "0x3C44CdDdB6a900fa2b585dd299e03d12FA4293BC";
pub const FAUCET_ACCOUNT: &str = "0x90F79bf6EB2c4f870365E785982E1f101E93b906";

/// How a [`MockTransfer`] answers.
#[derive(Debug, Clone, Copy)]
pub enum TransferMode {
    Succeed,
    Fail,
    Delay(Duration),
}

/// Transfer collaborator that never touches a chain.
pub struct MockTransfer {
    mode: TransferMode,
    calls: AtomicUsize,
}

impl MockTransfer {
    pub fn new(mode: TransferMode) -> Arc<Self> {
        Arc::new(Self {
            mode,
            calls: AtomicUsize::new(0),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Transfer for MockTransfer {
    fn sender(&self) -> Address {
        FAUCET_ACCOUNT.parse().unwrap()
    }

    fn transfer(&self, _to: Address, _value: U256) -> BoxFuture<'_, BlockchainResult<TxHash>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let mode = self.mode;
        Box::pin(async move {
            match mode {
                TransferMode::Succeed => Ok(TxHash::repeat_byte(0xab)),
                TransferMode::Fail => Err(BlockchainError::Rpc("insufficient funds".to_string())),
                TransferMode::Delay(delay) => {
                    tokio::time::sleep(delay).await;
                    Ok(TxHash::repeat_byte(0xcd))
                }
            }
        })
    }
}

/// Captcha verifier with a fixed answer.
pub struct StaticCaptcha(pub bool);

impl CaptchaVerifier for StaticCaptcha {
    fn verify<'a>(&'a self, _token: &'a str) -> BoxFuture<'a, bool> {
        let ok = self.0;
        Box::pin(async move { ok })
    }
}

/// Session validator that accepts exactly one token.
pub struct StaticSession(pub &'static str);

impl SessionValidator for StaticSession {
    fn validate<'a>(&'a self, token: &'a str) -> BoxFuture<'a, bool> {
        let ok = token == self.0;
        Box::pin(async move { ok })
    }
}

/// Config suitable for tests: short transfer timeout, given claim interval.
pub fn test_config(interval_mins: u64) -> FaucetConfig {
    let mut config = FaucetConfig::default();
    config.listener.bind_address = "127.0.0.1:0".to_string();
    config.faucet.interval_mins = interval_mins;
    config.faucet.transfer_timeout_secs = 1;
    config.timeouts.request_secs = 10;
    config
}

pub fn services(transfer: Arc<MockTransfer>) -> Services {
    Services {
        transfer,
        captcha: None,
        session: None,
    }
}

/// In-process faucet plus a handle on its limiter.
pub struct TestApp {
    pub router: Router,
    pub limiter: Arc<CooldownLimiter>,
}

impl TestApp {
    pub fn new(config: FaucetConfig, services: Services) -> Self {
        let server = HttpServer::new(config, services);
        let limiter = server.limiter().clone();
        Self {
            router: server.into_router(),
            limiter,
        }
    }

    pub async fn send(&self, mut request: Request<Body>) -> Response<Body> {
        let peer: SocketAddr = "127.0.0.1:40000".parse().unwrap();
        request.extensions_mut().insert(ConnectInfo(peer));
        self.router.clone().oneshot(request).await.unwrap()
    }

    /// POST a claim for `address` as if it came from `client_ip`.
    pub async fn claim(&self, address: &str, client_ip: &str) -> Response<Body> {
        self.send(claim_request(address, client_ip)).await
    }
}

pub fn claim_request(address: &str, client_ip: &str) -> Request<Body> {
    raw_claim(&format!(r#"{{"address":"{address}"}}"#), client_ip)
}

pub fn raw_claim(body: &str, client_ip: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/api/claim")
        .header("content-type", "application/json")
        .header("x-forwarded-for", client_ip)
        .body(Body::from(body.to_string()))
        .unwrap()
}

pub async fn json_body(response: Response<Body>) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

pub async fn msg(response: Response<Body>) -> String {
    json_body(response).await["msg"]
        .as_str()
        .unwrap_or_default()
        .to_string()
}
