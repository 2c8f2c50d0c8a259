//! Admission control for payout claims.
//!
//! # Data Flow
//! ```text
//! POST /api/claim:
//!     → rate_limit.rs (validate address, resolve client IP via client_ip.rs,
//!                      check + record cooldown in store.rs)
//!     → captcha.rs (hCaptcha token)
//!     → session.rs (session cookie)
//!     → claim handler (payout)
//!     ← rate_limit.rs releases the cooldown if the response is not a success
//! ```
//!
//! # Design Decisions
//! - Cooldowns are keyed on both the payout address and the client IP
//! - A failed claim never costs the caller a cooldown window
//! - Forwarding headers are only trusted up to the configured proxy depth

pub mod captcha;
pub mod client_ip;
pub mod rate_limit;
pub mod session;
pub mod store;

pub use captcha::{CaptchaState, CaptchaVerifier, HCaptchaVerifier};
pub use client_ip::resolve_client_ip;
pub use rate_limit::{CooldownLimiter, Decision, IdentityPair, Rejection, Reservation};
pub use session::{DiscordSessionValidator, SessionState, SessionValidator};
pub use store::{CooldownStore, TtlStore};
