//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection (peer address recorded as ConnectInfo)
//!     → server.rs (Axum setup, request ID, trace, timeout)
//!     → POST /api/claim:
//!         request.rs (body cap, JSON decode, EIP-55 address)
//!         → security::rate_limit (dual-key cooldown, rollback on failure)
//!         → security::captcha → security::session
//!         → handlers.rs (payout transfer)
//!     → response.rs (JSON envelopes)
//! ```

pub mod handlers;
pub mod request;
pub mod response;
pub mod server;

pub use request::{ClaimIdentity, MalformedRequest, UuidRequestId, X_REQUEST_ID};
pub use response::{ClaimResponse, InfoResponse};
pub use server::{AppState, HttpServer, Services};
