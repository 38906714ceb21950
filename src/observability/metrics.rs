//! Metrics collection and exposition.
//!
//! # Metrics
//! - `proxy_requests_total` (counter): requests by method, status, route
//! - `proxy_request_duration_seconds` (histogram): latency by route
//! - `proxy_translations_total` (counter): rewrites by language and outcome
//! - `proxy_translation_rules_applied` (histogram): rule count per rewrite
//!
//! The `lang` label only carries keys that had a rule file. Anything else is
//! recorded as [`UNKNOWN_LANGUAGE`], since the key comes straight from the
//! request path.
//!
//! Recording is a no-op until an exporter is installed, so library users and
//! tests pay nothing.

use std::net::SocketAddr;
use std::time::Instant;

use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

/// Label for translation attempts whose language had no rule set.
pub const UNKNOWN_LANGUAGE: &str = "unknown";

/// Install the Prometheus exporter with an HTTP listener on `addr`.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()?;
    tracing::info!(address = %addr, "Metrics endpoint listening");
    Ok(())
}

/// Record a completed proxied request.
pub fn record_request(method: &str, status: u16, route: &str, start: Instant) {
    metrics::counter!(
        "proxy_requests_total",
        "method" => method.to_string(),
        "status" => status.to_string(),
        "route" => route.to_string()
    )
    .increment(1);
    metrics::histogram!("proxy_request_duration_seconds", "route" => route.to_string())
        .record(start.elapsed().as_secs_f64());
}

/// Record the outcome of a translation attempt.
pub fn record_translation(language: &str, outcome: &'static str, rules: usize) {
    metrics::counter!(
        "proxy_translations_total",
        "lang" => language.to_string(),
        "outcome" => outcome
    )
    .increment(1);
    metrics::histogram!("proxy_translation_rules_applied", "lang" => language.to_string())
        .record(rules as f64);
}
