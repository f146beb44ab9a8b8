//! # Request Metrics
//!
//! Lightweight request metrics using atomic counters, rendered in the
//! Prometheus text exposition format by the `/metrics` handler.

use std::fmt::Write;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use axum::extract::Request;
use axum::middleware::Next;
use axum::response::Response;

/// Shared metrics state.
#[derive(Debug, Clone, Default)]
pub struct ApiMetrics {
    request_count: Arc<AtomicU64>,
    error_count: Arc<AtomicU64>,
}

impl ApiMetrics {
    /// Create a new metrics instance.
    pub fn new() -> Self {
        Self::default()
    }

    /// Return current request count.
    pub fn requests(&self) -> u64 {
        self.request_count.load(Ordering::Relaxed)
    }

    /// Return current error count.
    pub fn errors(&self) -> u64 {
        self.error_count.load(Ordering::Relaxed)
    }

    fn record(&self, failed: bool) {
        self.request_count.fetch_add(1, Ordering::Relaxed);
        if failed {
            self.error_count.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Render counters, plus the evidence record gauge when known.
    pub fn render(&self, evidence_records: Option<usize>) -> String {
        let mut out = String::new();
        push_metric(
            &mut out,
            "evl_http_requests_total",
            "counter",
            "HTTP requests handled by the evidence API.",
            self.requests(),
        );
        push_metric(
            &mut out,
            "evl_http_errors_total",
            "counter",
            "HTTP requests answered with a 4xx or 5xx status.",
            self.errors(),
        );
        if let Some(records) = evidence_records {
            push_metric(
                &mut out,
                "evl_evidence_records",
                "gauge",
                "Evidence versions stored on the ledger.",
                records as u64,
            );
        }
        out
    }
}

fn push_metric(out: &mut String, name: &str, kind: &str, help: &str, value: u64) {
    // Writing to a String cannot fail.
    let _ = writeln!(out, "# HELP {name} {help}");
    let _ = writeln!(out, "# TYPE {name} {kind}");
    let _ = writeln!(out, "{name} {value}");
}

/// Middleware that increments request and error counters.
pub async fn metrics_middleware(request: Request, next: Next) -> Response {
    let metrics = request.extensions().get::<ApiMetrics>().cloned();

    let response = next.run(request).await;

    if let Some(m) = metrics {
        let status = response.status();
        m.record(status.is_client_error() || status.is_server_error());
    }

    response
}
