//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Build the shared services (rate limiter, CSRF, text improver)
//! - Create the Axum Router with all API handlers
//! - Wire up middleware (tracing, request ID, timeout, padding, headers)
//! - Run the limiter sweeper alongside the server
//! - Serve until the shutdown signal fires

use std::any::Any;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::Body,
    http::{Response, StatusCode},
    middleware,
    routing::{get, post},
    Json, Router,
};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::{
    catch_panic::CatchPanicLayer,
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::api;
use crate::config::ApiConfig;
use crate::http::middleware::{constant_latency, record_metrics, LatencyPadding};
use crate::http::response::{method_not_allowed, not_found, ErrorBody, GENERIC_FAILURE};
use crate::improve::{PlaceholderImprover, TextImprover};
use crate::security::headers::with_security_headers;
use crate::security::{Clock, CsrfService, RateLimiter, SystemClock};

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<ApiConfig>,
    pub rate_limiter: Arc<RateLimiter>,
    pub csrf: Arc<CsrfService>,
    pub improver: Arc<dyn TextImprover>,
    pub clock: Arc<dyn Clock>,
}

impl AppState {
    /// Build every service from `config`, reading time from `clock`.
    pub fn new(config: ApiConfig, clock: Arc<dyn Clock>) -> Self {
        let rate_limiter = Arc::new(RateLimiter::from_config(&config.rate_limit, clock.clone()));
        let csrf = Arc::new(CsrfService::from_config(&config.csrf, clock.clone()));
        Self {
            config: Arc::new(config),
            rate_limiter,
            csrf,
            improver: Arc::new(PlaceholderImprover),
            clock,
        }
    }

    /// Swap the text improvement backend.
    pub fn with_improver(mut self, improver: Arc<dyn TextImprover>) -> Self {
        self.improver = improver;
        self
    }
}

/// HTTP server for the API.
pub struct HttpServer {
    router: Router,
    state: AppState,
}

impl HttpServer {
    /// Create a new HTTP server with the given configuration.
    pub fn new(config: ApiConfig) -> Self {
        Self::with_state(AppState::new(config, Arc::new(SystemClock)))
    }

    pub fn with_state(state: AppState) -> Self {
        let router = build_router(state.clone());
        Self { router, state }
    }

    /// Run the server, accepting connections on the given listener.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        let sweeper = self.state.rate_limiter.spawn_sweeper(
            Duration::from_secs(self.state.config.rate_limit.sweep_interval_secs),
            shutdown.resubscribe(),
        );

        let app = self.router.into_make_service_with_connect_info::<SocketAddr>();

        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Shutdown signal received");
            })
            .await?;

        if let Err(e) = sweeper.await {
            tracing::warn!(error = %e, "Rate limit sweeper ended abnormally");
        }
        tracing::info!("HTTP server stopped");
        Ok(())
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }
}

/// Build the Axum router with all middleware layers.
#[allow(deprecated)]
pub fn build_router(state: AppState) -> Router {
    let padding = LatencyPadding::from_config(&state.config.latency);
    let request_timeout = Duration::from_secs(state.config.timeouts.request_secs);

    let padded = Router::new()
        .route(
            "/api/contact",
            post(api::contact::submit_contact).fallback(method_not_allowed),
        )
        .route(
            "/api/improve-text",
            post(api::improve_text::improve_text).fallback(method_not_allowed),
        )
        .route(
            "/api/rate-limit",
            get(api::rate_limit::rate_limit_status).fallback(method_not_allowed),
        )
        .route_layer(middleware::from_fn_with_state(padding, constant_latency));

    let router = Router::new()
        .route(
            "/api/csrf-token",
            get(api::csrf::issue_token).fallback(method_not_allowed),
        )
        .route("/api/csrf", get(api::csrf::issue_token).fallback(method_not_allowed))
        .route("/api/health", get(api::health::health).fallback(method_not_allowed))
        .merge(padded)
        .route_layer(middleware::from_fn(record_metrics))
        .fallback(not_found)
        .with_state(state);

    let router = router
        .layer(CatchPanicLayer::custom(panic_response))
        .layer(TimeoutLayer::new(request_timeout));

    // Headers wrap the panic and timeout layers so their responses carry them too.
    with_security_headers(router)
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(TraceLayer::new_for_http())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
}

fn panic_response(panic: Box<dyn Any + Send + 'static>) -> Response<Body> {
    let detail = panic
        .downcast_ref::<String>()
        .map(String::as_str)
        .or_else(|| panic.downcast_ref::<&str>().copied())
        .unwrap_or("unknown panic");
    tracing::error!(panic = detail, "Handler panicked");

    let body = ErrorBody {
        error: GENERIC_FAILURE.to_string(),
    };
    let mut response = axum::response::IntoResponse::into_response(Json(body));
    *response.status_mut() = StatusCode::INTERNAL_SERVER_ERROR;
    response
}
