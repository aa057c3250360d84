//! chat-relay - a minimal chat-completions relay
//!
//! Forwards chat-completion requests from browser front-ends to an upstream LLM API, injecting
//! the server-held API key so it never reaches the client. An optional shared access token
//! guards the relay itself, and every response carries CORS headers.

use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::middleware;
use axum::routing::{get, post};
use axum_prometheus::{
    GenericMetricLayer, Handle, PrometheusMetricLayerBuilder,
    metrics_exporter_prometheus::PrometheusHandle,
};
use std::borrow::Cow;
use std::sync::Arc;
use tracing::{info, instrument};

pub mod auth;
pub mod client;
pub mod cors;
pub mod errors;
pub mod handlers;
pub mod models;
pub mod upstream;

use auth::ConstantTimeString;
use client::{HttpClient, HyperClient, PoolConfig};
use handlers::{chat_completions, health, not_found};
use upstream::Upstream;

/// The main application state: the HTTP client plus the immutable relay configuration
#[derive(Clone, Debug)]
pub struct AppState<T: HttpClient> {
    pub http_client: T,
    pub upstream: Arc<Upstream>,
    /// When set, `/api/chat` requires `Authorization: Bearer {token}`.
    pub access_token: Option<ConstantTimeString>,
    /// Largest accepted request body. Unlimited when unset.
    pub max_body_bytes: Option<usize>,
}

impl AppState<HyperClient> {
    /// Create a new AppState with the default Hyper client
    pub fn new(upstream: Upstream, access_token: Option<String>, pool: PoolConfig) -> Self {
        Self::with_client(upstream, access_token, client::create_hyper_client(pool))
    }
}

impl<T: HttpClient> AppState<T> {
    /// Create a new AppState with a custom HTTP client (useful for testing).
    ///
    /// An empty access token counts as no token.
    pub fn with_client(upstream: Upstream, access_token: Option<String>, http_client: T) -> Self {
        Self {
            http_client,
            upstream: Arc::new(upstream),
            access_token: access_token
                .filter(|token| !token.is_empty())
                .map(ConstantTimeString::from),
            max_body_bytes: None,
        }
    }

    /// Caps request bodies at `max_body_bytes`; `None` removes the cap.
    pub fn with_max_body_bytes(mut self, max_body_bytes: Option<usize>) -> Self {
        self.max_body_bytes = max_body_bytes;
        self
    }
}

/// Build the main router for the relay
/// This creates routes for:
/// - `POST /api/chat` - Relays chat completions upstream
/// - `GET /api/health` - Liveness check
///
/// `OPTIONS` on any path is answered as a CORS preflight; everything else is a 404. Request
/// bodies are only capped when `AppState::max_body_bytes` is set.
#[instrument(skip(state))]
pub fn build_router<T: HttpClient + Clone + Send + Sync + 'static>(state: AppState<T>) -> Router {
    info!("Building router");
    let body_limit = match state.max_body_bytes {
        Some(limit) => DefaultBodyLimit::max(limit),
        None => DefaultBodyLimit::disable(),
    };
    Router::new()
        .route(
            "/api/chat",
            post(chat_completions::<T>).fallback(not_found),
        )
        .route(
            "/api/health",
            get(health).head(not_found).fallback(not_found),
        )
        .fallback(not_found)
        .layer(body_limit)
        .layer(middleware::map_response(cors::standard_headers))
        .layer(middleware::from_fn(cors::handle_preflight))
        .with_state(state)
}

/// Builds a router for the metrics endpoint.
#[instrument(skip(handle))]
pub fn build_metrics_router(handle: PrometheusHandle) -> Router {
    info!("Building metrics router");
    Router::new().route(
        "/metrics",
        axum::routing::get(move || async move { handle.render() }),
    )
}

type MetricsLayerAndHandle = (
    GenericMetricLayer<'static, PrometheusHandle, Handle>,
    PrometheusHandle,
);

/// Builds a layer and handle for prometheus metrics collection.
///
/// Installs a process-wide recorder, so call it at most once per process.
pub fn build_metrics_layer_and_handle(
    prefix: impl Into<Cow<'static, str>>,
) -> MetricsLayerAndHandle {
    info!("Building metrics layer");
    PrometheusMetricLayerBuilder::new()
        .with_prefix(prefix)
        .enable_response_body_size(true)
        .with_endpoint_label_type(axum_prometheus::EndpointLabel::Exact)
        .with_default_metrics()
        .build_pair()
}
