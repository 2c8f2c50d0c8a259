//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create the Axum router with the claim, info and health endpoints
//! - Wrap `/api/claim` in the admission chain (cooldown, captcha, session)
//! - Wire up ambient middleware (request ID, tracing, request timeout)
//! - Serve with peer addresses recorded and graceful shutdown

use axum::{
    middleware::from_fn_with_state,
    routing::{get, post},
    Router,
};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower::ServiceBuilder;
use tower_http::{
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::blockchain::Transfer;
use crate::config::FaucetConfig;
use crate::http::handlers::{claim_handler, health_handler, info_handler};
use crate::http::request::UuidRequestId;
use crate::security::captcha::{captcha_middleware, CaptchaState, CaptchaVerifier};
use crate::security::rate_limit::{rate_limit_middleware, CooldownLimiter};
use crate::security::session::{session_middleware, SessionState, SessionValidator};

const SWEEP_PERIOD: Duration = Duration::from_secs(60);

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub transfer: Arc<dyn Transfer>,
    pub config: Arc<FaucetConfig>,
}

/// External collaborators the server delegates to. `None` turns the
/// corresponding check off.
#[derive(Clone)]
pub struct Services {
    pub transfer: Arc<dyn Transfer>,
    pub captcha: Option<Arc<dyn CaptchaVerifier>>,
    pub session: Option<Arc<dyn SessionValidator>>,
}

/// HTTP server for the faucet.
pub struct HttpServer {
    router: Router,
    config: Arc<FaucetConfig>,
    limiter: Arc<CooldownLimiter>,
}

impl HttpServer {
    pub fn new(config: FaucetConfig, services: Services) -> Self {
        let config = Arc::new(config);
        let limiter = Arc::new(CooldownLimiter::new(
            config.client_ip.trusted_proxy_count,
            config.faucet.cooldown(),
        ));

        if !limiter.is_enabled() {
            tracing::warn!("Claim interval is zero, rate limiting disabled");
        }

        let router = Self::build_router(config.clone(), services, limiter.clone());
        Self {
            router,
            config,
            limiter,
        }
    }

    /// Build the Axum router with all middleware layers.
    ///
    /// Layers on `/api/claim` run outermost-last: the cooldown limiter sees
    /// the request first and the final status of everything inside it.
    #[allow(deprecated)]
    fn build_router(
        config: Arc<FaucetConfig>,
        services: Services,
        limiter: Arc<CooldownLimiter>,
    ) -> Router {
        let request_timeout = Duration::from_secs(config.timeouts.request_secs);
        let state = AppState {
            transfer: services.transfer,
            config,
        };
        let captcha = CaptchaState {
            verifier: services.captcha,
        };
        let session = SessionState {
            validator: services.session,
        };

        let claim = post(claim_handler)
            .layer(from_fn_with_state(session, session_middleware))
            .layer(from_fn_with_state(captcha, captcha_middleware))
            .layer(from_fn_with_state(limiter, rate_limit_middleware));

        Router::new()
            .route("/api/claim", claim)
            .route("/api/info", get(info_handler))
            .route("/health", get(health_handler))
            .with_state(state)
            .layer(
                ServiceBuilder::new()
                    .layer(SetRequestIdLayer::x_request_id(UuidRequestId))
                    .layer(TraceLayer::new_for_http())
                    .layer(PropagateRequestIdLayer::x_request_id())
                    .layer(TimeoutLayer::new(request_timeout)),
            )
    }

    /// The router, for driving the service in-process.
    pub fn into_router(self) -> Router {
        self.router
    }

    /// Run the server until `shutdown` fires, then drain in-flight requests.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            interval = ?self.limiter.cooldown(),
            trusted_proxy_count = self.limiter.trusted_proxy_count(),
            "HTTP server starting"
        );

        let sweeper = self
            .limiter
            .store()
            .spawn_sweeper(SWEEP_PERIOD, shutdown.resubscribe());

        let app = self.router.into_make_service_with_connect_info::<SocketAddr>();

        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
            })
            .await?;

        sweeper.abort();
        tracing::info!("HTTP server stopped");
        Ok(())
    }

    pub fn config(&self) -> &FaucetConfig {
        &self.config
    }

    pub fn limiter(&self) -> &Arc<CooldownLimiter> {
        &self.limiter
    }
}
