//! # evl-api — HTTP Gateway for the Evidence Ledger
//!
//! Exposes the versioned evidence store over HTTP. Uploads are digested
//! in-flight, appended as new immutable versions, and can later be
//! re-verified against any stored version.
//!
//! ## API Surface
//!
//! | Path                                   | Module                 |
//! |----------------------------------------|------------------------|
//! | `/saveEvidence`, `/queryEvidence/*`, `/queryEvidenceHistory/*`, `/queryAllEvidence`, `/verifyEvidence/*` | [`routes::evidence`] |
//! | `/health/liveness`, `/health/readiness`| this module            |
//! | `/metrics`                             | this module            |
//!
//! ## Middleware Stack (execution order)
//!
//! ```text
//! CorsLayer → TraceLayer → MetricsMiddleware → DefaultBodyLimit → Handler
//! ```

pub mod error;
pub mod logging;
pub mod middleware;
pub mod routes;
pub mod state;

use std::net::SocketAddr;

use axum::extract::{DefaultBodyLimit, State};
use axum::http::{header, HeaderValue, Method, StatusCode};
use axum::middleware::from_fn;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Extension, Router};
use evl_ledger::Ledger;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::middleware::metrics::ApiMetrics;
use crate::state::AppState;

/// Key read by the readiness probe. Never written.
const READINESS_PROBE_KEY: &str = "__readiness__";

/// Assemble the full application router with all routes and middleware.
///
/// Health probes and `/metrics` sit outside the metrics middleware so
/// scrapes do not count as traffic.
pub fn app(state: AppState) -> Router {
    let metrics = ApiMetrics::new();
    let metrics_on = state.config.metrics_enabled;

    let mut api = routes::evidence::router()
        .layer(DefaultBodyLimit::max(state.config.max_upload_bytes));

    if metrics_on {
        api = api
            .layer(from_fn(middleware::metrics::metrics_middleware))
            .layer(Extension(metrics.clone()));
    }

    let api = api
        .layer(TraceLayer::new_for_http())
        .with_state(state.clone());

    let mut probes = Router::new()
        .route("/health/liveness", get(liveness))
        .route("/health/readiness", get(readiness));

    if metrics_on {
        probes = probes
            .route("/metrics", get(render_metrics))
            .layer(Extension(metrics));
    }

    let probes = probes.with_state(state.clone());

    Router::new()
        .merge(probes)
        .merge(api)
        .layer(cors_layer(&state.config.cors_origin))
}

/// Browser access for the configured frontend origin.
fn cors_layer(origin: &str) -> CorsLayer {
    let layer = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([header::ORIGIN, header::CONTENT_TYPE, header::AUTHORIZATION]);
    match HeaderValue::from_str(origin) {
        Ok(value) => layer.allow_origin(value),
        Err(_) => {
            tracing::warn!(origin, "invalid CORS origin; cross-origin requests will be refused");
            layer
        }
    }
}

/// Bind to the configured port and serve until Ctrl-C.
pub async fn serve(state: AppState) -> std::io::Result<()> {
    let addr = SocketAddr::from(([0, 0, 0, 0], state.config.port));
    let app = app(state);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("evidence API listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("failed to listen for shutdown signal: {e}");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutdown signal received");
}

/// GET /health/liveness — the process is up.
async fn liveness() -> &'static str {
    "ok"
}

/// GET /health/readiness — the ledger answers a point read.
async fn readiness(State(state): State<AppState>) -> impl IntoResponse {
    let store = state.store.clone();
    let probe =
        tokio::task::spawn_blocking(move || store.ledger().get(READINESS_PROBE_KEY)).await;
    match probe {
        Ok(Ok(_)) => (StatusCode::OK, "ready"),
        Ok(Err(e)) => {
            tracing::warn!(error = %e, "readiness probe failed");
            (StatusCode::SERVICE_UNAVAILABLE, "ledger unavailable")
        }
        Err(e) => {
            tracing::warn!(error = %e, "readiness probe task failed");
            (StatusCode::SERVICE_UNAVAILABLE, "ledger unavailable")
        }
    }
}

/// GET /metrics — counters plus a pull-model gauge of stored versions.
async fn render_metrics(
    State(state): State<AppState>,
    Extension(metrics): Extension<ApiMetrics>,
) -> impl IntoResponse {
    let store = state.store.clone();
    let records = match tokio::task::spawn_blocking(move || store.ledger().scan("", "")).await {
        Ok(Ok(entries)) => Some(entries.len()),
        Ok(Err(e)) => {
            tracing::warn!(error = %e, "could not count evidence records");
            None
        }
        Err(e) => {
            tracing::warn!(error = %e, "metrics scan task failed");
            None
        }
    };
    (
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        metrics.render(records),
    )
}
