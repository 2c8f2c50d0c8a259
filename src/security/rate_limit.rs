//! Dual-key cooldown limiter for payout claims.
//!
//! A claim is keyed twice: by the payout address and by the resolved client
//! IP. Either key being on cooldown blocks the claim. Admission records both
//! keys; a claim that does not end in success releases them again.

use axum::{
    body::Body,
    extract::State,
    http::{header, HeaderMap, HeaderValue, Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::time::Instant;

use crate::http::request::{read_claim, remote_addr};
use crate::http::response::ClaimResponse;
use crate::observability::metrics;
use crate::security::client_ip::resolve_client_ip;
use crate::security::store::{CooldownStore, TtlStore};

/// The two keys a claim is rate limited on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdentityPair {
    /// Payout address declared by the caller.
    pub primary: String,
    /// Client IP resolved from the connection.
    pub secondary: String,
}

/// Cooldown entries recorded by one admission.
///
/// Empty when rate limiting is disabled. Dropping a reservation without
/// [`commit`](Reservation::commit) rolls both entries back, so a claim that
/// is cancelled or times out mid-flight does not cost a cooldown window.
#[must_use = "dropping a reservation releases its cooldown"]
pub struct Reservation<'a, S: CooldownStore = TtlStore> {
    held: Option<Held<'a, S>>,
}

struct Held<'a, S: CooldownStore> {
    store: &'a S,
    identity: IdentityPair,
    /// Deadlines written at admission, primary then secondary.
    deadlines: [Instant; 2],
}

impl<'a, S: CooldownStore> Reservation<'a, S> {
    fn disabled() -> Self {
        Self { held: None }
    }

    pub fn identity(&self) -> Option<&IdentityPair> {
        self.held.as_ref().map(|held| &held.identity)
    }

    /// Keep the entries until they expire on their own.
    pub fn commit(mut self) {
        if let Some(held) = self.held.take() {
            tracing::info!(
                address = %held.identity.primary,
                client_ip = %held.identity.secondary,
                "Cooldown started"
            );
        }
    }

    /// Release the entries now.
    pub fn release(self) {}
}

impl<S: CooldownStore> Drop for Reservation<'_, S> {
    fn drop(&mut self) {
        let Some(held) = self.held.take() else {
            return;
        };

        // Entries re-admitted after this one expired belong to someone else.
        let [primary, secondary] = held.deadlines;
        held.store.remove_if_deadline(&held.identity.primary, primary);
        held.store.remove_if_deadline(&held.identity.secondary, secondary);
        metrics::record_rollback();
        tracing::debug!(
            address = %held.identity.primary,
            client_ip = %held.identity.secondary,
            "Claim did not succeed, cooldown released"
        );
    }
}

impl<S: CooldownStore> std::fmt::Debug for Reservation<'_, S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Reservation")
            .field("identity", &self.identity())
            .finish()
    }
}

/// A claim turned away because one of its keys is cooling down.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rejection {
    pub key: String,
    pub retry_after: Duration,
}

impl Rejection {
    pub fn message(&self) -> String {
        format!(
            "You have exceeded the rate limit for {}. Please wait {} before you try again",
            self.key,
            format_rounded(self.retry_after)
        )
    }

    /// Whole seconds for the `Retry-After` header, rounded up, at least one.
    pub fn retry_after_secs(&self) -> u64 {
        let secs = self.retry_after.as_secs() + u64::from(self.retry_after.subsec_nanos() > 0);
        secs.max(1)
    }
}

impl IntoResponse for Rejection {
    fn into_response(self) -> Response {
        let retry_after = HeaderValue::from(self.retry_after_secs());
        let body = Json(ClaimResponse {
            msg: self.message(),
        });
        (
            StatusCode::TOO_MANY_REQUESTS,
            [(header::RETRY_AFTER, retry_after)],
            body,
        )
            .into_response()
    }
}

#[derive(Debug)]
pub enum Decision<'a, S: CooldownStore = TtlStore> {
    Proceed(Reservation<'a, S>),
    Rejected(Rejection),
}

/// Round to the nearest second and render as `1h2m3s` / `4m0s` / `5s`.
pub fn format_rounded(d: Duration) -> String {
    let secs = (d.as_millis() + 500) / 1000;
    let (h, m, s) = (secs / 3600, (secs % 3600) / 60, secs % 60);
    if h > 0 {
        format!("{h}h{m}m{s}s")
    } else if m > 0 {
        format!("{m}m{s}s")
    } else {
        format!("{s}s")
    }
}

/// Cooldown limiter over a shared TTL store.
pub struct CooldownLimiter<S = TtlStore> {
    /// Serializes check-then-insert so two racers cannot both see a fresh key.
    admission: Mutex<()>,
    store: S,
    cooldown: Duration,
    trusted_proxy_count: usize,
}

impl CooldownLimiter<TtlStore> {
    pub fn new(trusted_proxy_count: usize, cooldown: Duration) -> Self {
        Self::with_store(TtlStore::new(), trusted_proxy_count, cooldown)
    }
}

impl<S: CooldownStore> CooldownLimiter<S> {
    pub fn with_store(store: S, trusted_proxy_count: usize, cooldown: Duration) -> Self {
        Self {
            admission: Mutex::new(()),
            store,
            cooldown,
            trusted_proxy_count,
        }
    }

    pub fn is_enabled(&self) -> bool {
        !self.cooldown.is_zero()
    }

    pub fn cooldown(&self) -> Duration {
        self.cooldown
    }

    pub fn trusted_proxy_count(&self) -> usize {
        self.trusted_proxy_count
    }

    /// Number of keys currently held by the store.
    pub fn tracked_keys(&self) -> usize {
        self.store.len()
    }

    pub(crate) fn store(&self) -> &S {
        &self.store
    }

    /// Admit a claim for `primary`, keyed secondarily on the client IP
    /// resolved from `headers` and `remote_addr`.
    pub fn admit(&self, primary: &str, headers: &HeaderMap, remote_addr: &str) -> Decision<'_, S> {
        if !self.is_enabled() {
            return Decision::Proceed(Reservation::disabled());
        }
        let secondary = resolve_client_ip(self.trusted_proxy_count, headers, remote_addr);
        self.admit_pair(primary, &secondary)
    }

    /// Admit a claim for an already resolved key pair.
    pub fn admit_pair(&self, primary: &str, secondary: &str) -> Decision<'_, S> {
        if !self.is_enabled() {
            return Decision::Proceed(Reservation::disabled());
        }

        let _guard = self
            .admission
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        for key in [primary, secondary] {
            if let Some(retry_after) = self.store.remaining(key) {
                metrics::record_admission("rejected");
                return Decision::Rejected(Rejection {
                    key: key.to_string(),
                    retry_after,
                });
            }
        }

        let deadlines = [
            self.store.insert(primary, self.cooldown),
            self.store.insert(secondary, self.cooldown),
        ];
        metrics::record_admission("proceed");

        Decision::Proceed(Reservation {
            held: Some(Held {
                store: &self.store,
                identity: IdentityPair {
                    primary: primary.to_string(),
                    secondary: secondary.to_string(),
                },
                deadlines,
            }),
        })
    }

    /// Close out a reservation once the protected action has finished.
    ///
    /// A non-success outcome removes both keys so the failed attempt does not
    /// cost the caller a cooldown window.
    pub fn settle(&self, reservation: Reservation<'_, S>, success: bool) {
        if success {
            reservation.commit();
        } else {
            reservation.release();
        }
    }
}

/// Middleware wrapping the claim chain with address validation and cooldowns.
///
/// Validation runs before any limiter bookkeeping. The downstream response is
/// returned unchanged; only its status decides whether the cooldown sticks.
/// If this future is dropped first (request timeout, client gone) the
/// reservation is dropped with it and the cooldown is released.
pub async fn rate_limit_middleware(
    State(limiter): State<Arc<CooldownLimiter>>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let (mut request, identity) = match read_claim(request).await {
        Ok(read) => read,
        Err(malformed) => return malformed.into_response(),
    };

    let remote = remote_addr(request.extensions());
    let primary = identity.address.to_string();

    let reservation = match limiter.admit(&primary, request.headers(), &remote) {
        Decision::Proceed(reservation) => reservation,
        Decision::Rejected(rejection) => {
            tracing::warn!(
                key = %rejection.key,
                retry_after = ?rejection.retry_after,
                "Rate limit exceeded"
            );
            return rejection.into_response();
        }
    };

    request.extensions_mut().insert(identity);
    let response = next.run(request).await;
    limiter.settle(reservation, response.status().is_success());
    response
}
