//! Prometheus metrics helpers.
//!
//! Metrics are optional for a clone run. When no recorder is installed the
//! `metrics` macros are no-ops, so crawl code records unconditionally.
//!
//! # Usage
//!
//! ```rust,ignore
//! use rekey_core::metrics::{init_metrics, start_metrics_server};
//!
//! let handle = init_metrics()?;
//! start_metrics_server(9091, handle).await?;
//! ```
//!
//! # Metric Naming Conventions
//!
//! - Prefix: `rekey_`
//! - Suffix: `_total` for counters
//! - Labels: only `relay`, whose cardinality is bounded by the relay list

use axum::{Router, routing::get};
use metrics::{describe_counter, describe_gauge};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use std::net::SocketAddr;

use crate::error::{Error, Result};

/// Events fetched from a relay (label: relay).
pub const EVENTS_FETCHED: &str = "rekey_events_fetched_total";
/// Replies dropped by the filter (label: relay).
pub const EVENTS_SKIPPED: &str = "rekey_events_skipped_total";
/// Re-signed events handed to the relay (label: relay).
pub const EVENTS_PUBLISHED: &str = "rekey_events_published_total";
/// Publish hand-offs that failed (label: relay).
pub const PUBLISH_FAILURES: &str = "rekey_publish_failures_total";
/// Pages requested (label: relay).
pub const PAGES: &str = "rekey_pages_total";
/// Pool notifications dropped because the receiver fell behind (label: relay).
pub const NOTIFICATIONS_LAGGED: &str = "rekey_notifications_lagged_total";
/// Pages that ended before EOSE and were requested again (label: relay).
pub const PAGES_RETRIED: &str = "rekey_pages_retried_total";
/// Relay crawls currently running.
pub const ACTIVE_CRAWLS: &str = "rekey_active_crawls";
/// Relay crawls that could not start or stopped early (label: reason).
pub const CRAWL_FAILURES: &str = "rekey_crawl_failures_total";

/// Install the Prometheus recorder and register metric descriptions.
///
/// Fails if a recorder is already installed.
pub fn init_metrics() -> Result<PrometheusHandle> {
    let handle = PrometheusBuilder::new()
        .install_recorder()
        .map_err(|e| Error::Metrics(e.to_string()))?;

    register_metrics();

    Ok(handle)
}

/// Like [`init_metrics`] but returns `None` if a recorder is already installed.
pub fn try_init_metrics() -> Option<PrometheusHandle> {
    init_metrics().ok()
}

/// Serve `/metrics` on `port` in a background task.
///
/// Binds before returning so a taken port is reported to the caller.
pub async fn start_metrics_server(port: u16, handle: PrometheusHandle) -> Result<SocketAddr> {
    let app = Router::new().route(
        "/metrics",
        get(move || {
            let handle = handle.clone();
            async move { handle.render() }
        }),
    );

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    let local_addr = listener.local_addr()?;
    tracing::info!("Metrics server listening on http://{}/metrics", local_addr);

    tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app).await {
            tracing::error!("Metrics server stopped: {}", e);
        }
    });

    Ok(local_addr)
}

fn register_metrics() {
    describe_counter!(EVENTS_FETCHED, "Events fetched from relays");
    describe_counter!(EVENTS_SKIPPED, "Reply events dropped before re-signing");
    describe_counter!(
        EVENTS_PUBLISHED,
        "Re-signed events handed to the source relay"
    );
    describe_counter!(
        PUBLISH_FAILURES,
        "Re-signed events the transport refused to send"
    );
    describe_counter!(PAGES, "History pages requested");
    describe_counter!(
        NOTIFICATIONS_LAGGED,
        "Relay pool notifications dropped by a lagging receiver"
    );
    describe_counter!(PAGES_RETRIED, "History pages cut off before EOSE");
    describe_gauge!(ACTIVE_CRAWLS, "Relay crawls currently running");
    describe_counter!(
        CRAWL_FAILURES,
        "Relay crawls that failed to connect or subscribe"
    );
}

/// Increment a per-relay counter.
#[inline]
pub fn increment_relay(name: &'static str, relay: &str, count: u64) {
    metrics::counter!(name, "relay" => relay.to_string()).increment(count);
}
