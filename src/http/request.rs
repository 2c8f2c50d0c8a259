//! Request handling: request IDs, claim body decoding, address validation.

use alloy::primitives::Address;
use axum::{
    body::{Body, Bytes},
    extract::ConnectInfo,
    http::{header, Extensions, HeaderValue, Request, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use futures_util::StreamExt;
use serde::Deserialize;
use serde_json::error::Category;
use std::net::SocketAddr;
use thiserror::Error;
use tower_http::request_id::{MakeRequestId, RequestId};
use uuid::Uuid;

use crate::blockchain::address::parse_checksummed_address;
use crate::http::response::ClaimResponse;

/// Header carrying the per-request correlation ID.
pub const X_REQUEST_ID: &str = "x-request-id";

/// Largest claim body accepted, in bytes.
pub const MAX_BODY_BYTES: usize = 1024;

/// Generates a UUID v4 request ID for requests that arrive without one.
#[derive(Debug, Clone, Copy, Default)]
pub struct UuidRequestId;

impl MakeRequestId for UuidRequestId {
    fn make_request_id<B>(&mut self, _request: &Request<B>) -> Option<RequestId> {
        HeaderValue::from_str(&Uuid::new_v4().to_string())
            .ok()
            .map(RequestId::new)
    }
}

/// A request the faucet refuses before any rate limiting happens.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct MalformedRequest {
    pub status: StatusCode,
    pub message: String,
}

impl MalformedRequest {
    fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
        }
    }
}

impl IntoResponse for MalformedRequest {
    fn into_response(self) -> Response {
        (self.status, Json(ClaimResponse { msg: self.message })).into_response()
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ClaimRequest {
    #[serde(default)]
    address: String,
}

/// Validated claim attached to the request for downstream handlers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClaimIdentity {
    pub address: Address,
}

/// Decode and validate a claim body.
///
/// The body is buffered and put back so the rest of the chain can still read it.
pub async fn read_claim(
    request: Request<Body>,
) -> Result<(Request<Body>, ClaimIdentity), MalformedRequest> {
    let (parts, body) = request.into_parts();

    let declared_len = parts
        .headers
        .get(header::CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse::<usize>().ok());
    if declared_len.is_some_and(|len| len > MAX_BODY_BYTES) {
        return Err(too_large());
    }

    let bytes = read_capped(body).await?;
    let identity = parse_claim(&bytes)?;
    Ok((Request::from_parts(parts, Body::from(bytes)), identity))
}

/// Buffer at most [`MAX_BODY_BYTES`], answering 413 for anything longer.
async fn read_capped(body: Body) -> Result<Bytes, MalformedRequest> {
    let mut stream = body.into_data_stream();
    let mut buf = Vec::new();
    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(|_| MalformedRequest::bad_request("Unable to read request body"))?;
        if buf.len() + chunk.len() > MAX_BODY_BYTES {
            return Err(too_large());
        }
        buf.extend_from_slice(&chunk);
    }
    Ok(Bytes::from(buf))
}

/// Validate a buffered claim body.
pub fn parse_claim(body: &[u8]) -> Result<ClaimIdentity, MalformedRequest> {
    let claim: ClaimRequest = decode_json_body(body)?;
    let address = parse_checksummed_address(&claim.address)
        .ok_or_else(|| MalformedRequest::bad_request("invalid address"))?;
    Ok(ClaimIdentity { address })
}

fn too_large() -> MalformedRequest {
    MalformedRequest {
        status: StatusCode::PAYLOAD_TOO_LARGE,
        message: format!("Request body must not be larger than {}KB", MAX_BODY_BYTES / 1024),
    }
}

/// Decode a JSON body, mapping failures to client-facing messages.
pub fn decode_json_body<T>(body: &[u8]) -> Result<T, MalformedRequest>
where
    T: for<'de> Deserialize<'de>,
{
    if body.iter().all(u8::is_ascii_whitespace) {
        return Err(MalformedRequest::bad_request("Request body must not be empty"));
    }

    serde_json::from_slice(body).map_err(|e| {
        let message = match e.classify() {
            Category::Syntax => format!(
                "Request body contains badly-formed JSON (at position {})",
                e.column()
            ),
            Category::Eof => "Request body contains badly-formed JSON".to_string(),
            Category::Data => match unknown_field(&e.to_string()) {
                Some(field) => format!("Request body contains unknown field \"{field}\""),
                None => format!(
                    "Request body contains an invalid value (at position {})",
                    e.column()
                ),
            },
            Category::Io => "Unable to read request body".to_string(),
        };
        MalformedRequest::bad_request(message)
    })
}

/// Pull the field name out of serde's "unknown field `x`, expected ..." message.
fn unknown_field(message: &str) -> Option<&str> {
    let rest = message.strip_prefix("unknown field `")?;
    rest.split_once('`').map(|(field, _)| field)
}

/// Peer address recorded by the listener, as `ip:port`. Empty when the
/// server was not started with connect info.
pub fn remote_addr(extensions: &Extensions) -> String {
    extensions
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.to_string())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    const ADDRESS: &str = "0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266";

    fn message(body: &str) -> (StatusCode, String) {
        let err = parse_claim(body.as_bytes()).unwrap_err();
        (err.status, err.message)
    }

    #[test]
    fn test_valid_claim() {
        let identity = parse_claim(format!(r#"{{"address":"{ADDRESS}"}}"#).as_bytes()).unwrap();
        assert_eq!(identity.address.to_string(), ADDRESS);
    }

    #[test]
    fn test_empty_body() {
        assert_eq!(
            message(""),
            (StatusCode::BAD_REQUEST, "Request body must not be empty".to_string())
        );
        assert_eq!(message("  \n").1, "Request body must not be empty");
    }

    #[test]
    fn test_syntax_error_reports_position() {
        let (status, msg) = message(r#"{"address" "0x"}"#);
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(
            msg.starts_with("Request body contains badly-formed JSON (at position "),
            "{msg}"
        );
    }

    #[test]
    fn test_truncated_json() {
        assert_eq!(
            message(r#"{"address": "#).1,
            "Request body contains badly-formed JSON"
        );
    }

    #[test]
    fn test_unknown_field() {
        assert_eq!(
            message(r#"{"address": "0x", "amount": 5}"#).1,
            "Request body contains unknown field \"amount\""
        );
    }

    #[test]
    fn test_invalid_value() {
        let msg = message(r#"{"address": 42}"#).1;
        assert!(
            msg.starts_with("Request body contains an invalid value (at position "),
            "{msg}"
        );
    }

    #[test]
    fn test_invalid_address() {
        assert_eq!(message(r#"{"address": "0x1234"}"#).1, "invalid address");
        assert_eq!(message("{}").1, "invalid address");
        // Valid hex but not checksummed.
        let lower = format!(r#"{{"address":"{}"}}"#, ADDRESS.to_lowercase());
        assert_eq!(message(&lower).1, "invalid address");
    }

    #[tokio::test]
    async fn test_read_claim_restores_body() {
        let body = format!(r#"{{"address":"{ADDRESS}"}}"#);
        let request = Request::post("/api/claim").body(Body::from(body.clone())).unwrap();

        let (request, identity) = read_claim(request).await.unwrap();
        assert_eq!(identity.address.to_string(), ADDRESS);

        let bytes = axum::body::to_bytes(request.into_body(), usize::MAX).await.unwrap();
        assert_eq!(bytes, body.as_bytes());
    }

    #[tokio::test]
    async fn test_read_claim_rejects_oversized_body() {
        let body = format!(r#"{{"address":"{}"}}"#, "a".repeat(2048));
        let request = Request::post("/api/claim")
            .header(header::CONTENT_LENGTH, body.len())
            .body(Body::from(body))
            .unwrap();

        let err = read_claim(request).await.unwrap_err();
        assert_eq!(err.status, StatusCode::PAYLOAD_TOO_LARGE);
        assert_eq!(err.message, "Request body must not be larger than 1KB");
    }

    #[tokio::test]
    async fn test_read_claim_caps_undeclared_length() {
        let body = " ".repeat(MAX_BODY_BYTES + 1);
        let request = Request::post("/api/claim").body(Body::from(body)).unwrap();

        let err = read_claim(request).await.unwrap_err();
        assert_eq!(err.status, StatusCode::PAYLOAD_TOO_LARGE);
    }

    #[test]
    fn test_remote_addr() {
        let mut extensions = Extensions::new();
        assert_eq!(remote_addr(&extensions), "");

        extensions.insert(ConnectInfo("203.0.113.5:4100".parse::<SocketAddr>().unwrap()));
        assert_eq!(remote_addr(&extensions), "203.0.113.5:4100");
    }
}
