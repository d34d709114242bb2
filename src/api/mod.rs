//! # API: HTTP Server
//!
//! Axum server exposing the workout completion endpoint plus health, readiness
//! and Prometheus endpoints. Handlers share an [`AppState`] holding the
//! completion workflow (with its injected collaborators), the token verifier
//! and the metrics registry.

pub(crate) mod middleware_auth;
mod routes_health;
mod routes_workouts;

use anyhow::Result;
use axum::extract::Request;
use axum::http::{HeaderValue, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::Router;
use std::any::Any;
use std::sync::Arc;
use std::time::Duration;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::{Any as AnyOrigin, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use tracing::{error, info, Instrument};

use crate::auth::AuthConfig;
use crate::completion::{Dispatch, SideEffectRunner, WorkoutCompletion};
use crate::db::Database;
use crate::error::ApiError;
use crate::prom_metrics::{self, Metrics};
use crate::store::Collaborators;

pub struct AppState {
    pub completion: WorkoutCompletion,
    pub auth: AuthConfig,
    pub prom_metrics: Metrics,
}

impl AppState {
    /// Build state around explicit collaborators.
    pub fn new(collaborators: Collaborators, auth: AuthConfig, dispatch: Dispatch) -> Arc<Self> {
        let prom_metrics = Metrics::new();
        let side_effects =
            SideEffectRunner::new(dispatch, prom_metrics.side_effect_failures.clone());
        Arc::new(AppState {
            completion: WorkoutCompletion::new(collaborators, side_effects),
            auth,
            prom_metrics,
        })
    }

    /// Build state with every collaborator backed by PostgreSQL.
    pub fn with_db(db: Database, auth: AuthConfig, dispatch: Dispatch) -> Arc<Self> {
        Self::new(Collaborators::from_database(db), auth, dispatch)
    }
}

/// Server settings resolved from the command line / environment.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub port: u16,
    pub max_connections: u32,
    pub auth: AuthConfig,
    pub side_effects: Dispatch,
}

/// Middleware that records HTTP request duration into the Prometheus histogram,
/// generates (or propagates) a request ID for correlation, and wraps the
/// request in a tracing span using `.instrument()` for proper async propagation.
async fn metrics_middleware(
    axum::extract::State(state): axum::extract::State<Arc<AppState>>,
    req: Request,
    next: Next,
) -> Response {
    let request_id = req
        .headers()
        .get("x-request-id")
        .and_then(|v| v.to_str().ok())
        .map(|s| s.to_string())
        .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());
    let method = req.method().to_string();
    let raw_path = req.uri().path().to_string();
    let norm_path = normalize_path(&raw_path);
    let start = std::time::Instant::now();

    let span = tracing::info_span!(
        "request",
        request_id = %request_id,
        method = %method,
        path = %raw_path,
    );
    let mut response = next.run(req).instrument(span).await;

    state
        .prom_metrics
        .http_request_duration
        .get_or_create(&prom_metrics::HttpLabel {
            method,
            path: norm_path,
        })
        .observe(start.elapsed().as_secs_f64());

    if let Ok(value) = HeaderValue::from_str(&request_id) {
        response.headers_mut().insert("x-request-id", value);
    }
    response
}

/// Normalize URL path to collapse high-cardinality segments (UUIDs, numeric IDs)
/// into placeholders, preventing histogram label explosion.
fn normalize_path(path: &str) -> String {
    path.split('/')
        .map(|seg| {
            if seg.is_empty() {
                seg.to_string()
            } else if seg.chars().all(|c| c.is_ascii_digit()) {
                ":id".to_string()
            } else if crate::completion::request::is_uuid_shaped(seg) {
                ":uuid".to_string()
            } else {
                seg.to_string()
            }
        })
        .collect::<Vec<_>>()
        .join("/")
}

/// Last-resort handler: a panicking request still gets the JSON envelope.
fn panic_response(panic: Box<dyn Any + Send + 'static>) -> Response {
    let detail = panic
        .downcast_ref::<String>()
        .map(String::as_str)
        .or_else(|| panic.downcast_ref::<&str>().copied())
        .unwrap_or("unknown panic payload");
    error!(panic = detail, "request handler panicked");
    ApiError::Internal("Internal server error".to_string()).into_response()
}

pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route(
            "/api/workouts/complete",
            post(routes_workouts::handler_complete_workout),
        )
        .route("/healthz", get(routes_health::handler_healthz))
        .route("/readyz", get(routes_health::handler_readyz))
        .route("/metrics", get(routes_health::handler_metrics))
        .layer(
            CorsLayer::new()
                .allow_origin(AnyOrigin)
                .allow_methods(AnyOrigin)
                .allow_headers(AnyOrigin),
        )
        .layer(CatchPanicLayer::custom(panic_response))
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            metrics_middleware,
        ))
        .layer(TraceLayer::new_for_http())
        .layer(RequestBodyLimitLayer::new(1024 * 1024))
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            Duration::from_secs(30),
        ))
        .with_state(state)
}

pub async fn run(database_url: &str, config: ServerConfig) -> Result<()> {
    let database = Database::connect(database_url, config.max_connections).await?;
    if !config.auth.verifies_signatures() {
        tracing::warn!("no JWT secret configured: token signatures are NOT verified");
    }
    let state = AppState::with_db(database, config.auth, config.side_effects);
    let app = build_router(state);

    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], config.port));
    info!(port = config.port, side_effects = ?config.side_effects, "coachhub API running");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    info!("coachhub API shut down gracefully");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = tokio::signal::ctrl_c();
    #[cfg(unix)]
    {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                tokio::select! { _ = ctrl_c => info!("received SIGINT, shutting down"), _ = sigterm.recv() => info!("received SIGTERM, shutting down") }
            }
            Err(e) => {
                error!(error = %e, "failed to install SIGTERM handler");
                ctrl_c.await.ok();
                info!("received SIGINT, shutting down");
            }
        }
    }
    #[cfg(not(unix))]
    {
        ctrl_c.await.ok();
        info!("received SIGINT, shutting down");
    }
}
