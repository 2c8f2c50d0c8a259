//! Session cookie gate on the claim chain.
//!
//! The login flow that issues the `token` cookie lives outside this service;
//! here the token is only checked against the Discord guild-member endpoint.

use axum::{
    body::Body,
    extract::State,
    http::{header, HeaderMap, Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use futures_util::future::BoxFuture;
use serde::Deserialize;
use std::sync::Arc;

use crate::config::AuthConfig;
use crate::http::response::ClaimResponse;

pub const SESSION_COOKIE: &str = "token";

const INVALID_LOGIN: &str = "Invalid login. Please authenticate with discord first";

/// Validates a session token issued by the login flow.
pub trait SessionValidator: Send + Sync {
    fn validate<'a>(&'a self, token: &'a str) -> BoxFuture<'a, bool>;
}

/// Accepts tokens whose owner is a non-pending member of the configured guild.
pub struct DiscordSessionValidator {
    client: reqwest::Client,
    member_url: String,
}

#[derive(Deserialize)]
struct GuildMember {
    #[serde(default)]
    pending: bool,
}

impl DiscordSessionValidator {
    pub fn new(client: reqwest::Client, config: &AuthConfig) -> Self {
        Self {
            client,
            member_url: config.member_url.clone(),
        }
    }
}

impl SessionValidator for DiscordSessionValidator {
    fn validate<'a>(&'a self, token: &'a str) -> BoxFuture<'a, bool> {
        Box::pin(async move {
            let res = match self.client.get(&self.member_url).bearer_auth(token).send().await {
                Ok(res) => res,
                Err(e) => {
                    tracing::warn!(error = %e, "Session check request failed");
                    return false;
                }
            };

            if res.status() != reqwest::StatusCode::OK {
                return false;
            }

            match res.json::<GuildMember>().await {
                Ok(member) => !member.pending,
                Err(e) => {
                    tracing::error!(error = %e, "Malformed guild member response");
                    false
                }
            }
        })
    }
}

/// State for the session middleware. No validator means the check is off.
#[derive(Clone, Default)]
pub struct SessionState {
    pub validator: Option<Arc<dyn SessionValidator>>,
}

/// Value of the named cookie in the request's `Cookie` headers.
pub fn cookie_value<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, _)| *key == name)
        .map(|(_, value)| value)
}

fn unauthorized() -> Response {
    (
        StatusCode::UNAUTHORIZED,
        Json(ClaimResponse {
            msg: INVALID_LOGIN.to_string(),
        }),
    )
        .into_response()
}

pub async fn session_middleware(
    State(state): State<SessionState>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let Some(validator) = state.validator else {
        return next.run(request).await;
    };

    let Some(token) = cookie_value(request.headers(), SESSION_COOKIE) else {
        return unauthorized();
    };

    if !validator.validate(token).await {
        return unauthorized();
    }

    next.run(request).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_cookie_value() {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::COOKIE,
            HeaderValue::from_static("theme=dark; token=abc123; lang=en"),
        );
        assert_eq!(cookie_value(&headers, "token"), Some("abc123"));
        assert_eq!(cookie_value(&headers, "lang"), Some("en"));
        assert_eq!(cookie_value(&headers, "missing"), None);
    }

    #[test]
    fn test_cookie_value_across_headers() {
        let mut headers = HeaderMap::new();
        headers.append(header::COOKIE, HeaderValue::from_static("a=1"));
        headers.append(header::COOKIE, HeaderValue::from_static("token=xyz"));
        assert_eq!(cookie_value(&headers, "token"), Some("xyz"));
    }
}
