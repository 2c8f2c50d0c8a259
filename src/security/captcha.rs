//! hCaptcha gate on the claim chain.

use axum::{
    body::Body,
    extract::State,
    http::{Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use futures_util::future::BoxFuture;
use serde::Deserialize;
use std::sync::Arc;

use crate::config::CaptchaConfig;
use crate::http::response::ClaimResponse;

pub const CAPTCHA_HEADER: &str = "h-captcha-response";

/// Verifies a captcha response token.
pub trait CaptchaVerifier: Send + Sync {
    fn verify<'a>(&'a self, token: &'a str) -> BoxFuture<'a, bool>;
}

/// Verifier backed by the hCaptcha siteverify endpoint.
pub struct HCaptchaVerifier {
    client: reqwest::Client,
    verify_url: String,
    site_key: String,
    secret: String,
}

#[derive(Deserialize)]
struct SiteVerifyResponse {
    success: bool,
    #[serde(default, rename = "error-codes")]
    error_codes: Vec<String>,
}

impl HCaptchaVerifier {
    pub fn new(client: reqwest::Client, config: &CaptchaConfig) -> Self {
        Self {
            client,
            verify_url: config.verify_url.clone(),
            site_key: config.site_key.clone(),
            secret: config.secret.clone(),
        }
    }

    async fn siteverify(&self, token: &str) -> Result<SiteVerifyResponse, reqwest::Error> {
        self.client
            .post(&self.verify_url)
            .form(&[
                ("secret", self.secret.as_str()),
                ("response", token),
                ("sitekey", self.site_key.as_str()),
            ])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await
    }
}

impl CaptchaVerifier for HCaptchaVerifier {
    fn verify<'a>(&'a self, token: &'a str) -> BoxFuture<'a, bool> {
        Box::pin(async move {
            if token.is_empty() {
                return false;
            }
            match self.siteverify(token).await {
                Ok(res) => {
                    if !res.success {
                        tracing::debug!(errors = ?res.error_codes, "Captcha rejected");
                    }
                    res.success
                }
                Err(e) => {
                    tracing::warn!(error = %e, "Captcha verification request failed");
                    false
                }
            }
        })
    }
}

/// State for the captcha middleware. No verifier means the check is off.
#[derive(Clone, Default)]
pub struct CaptchaState {
    pub verifier: Option<Arc<dyn CaptchaVerifier>>,
}

pub async fn captcha_middleware(
    State(state): State<CaptchaState>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let Some(verifier) = state.verifier else {
        return next.run(request).await;
    };

    let token = request
        .headers()
        .get(CAPTCHA_HEADER)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();

    if !verifier.verify(token).await {
        return (
            StatusCode::TOO_MANY_REQUESTS,
            Json(ClaimResponse {
                msg: "Captcha verification failed, please try again".to_string(),
            }),
        )
            .into_response();
    }

    next.run(request).await
}
