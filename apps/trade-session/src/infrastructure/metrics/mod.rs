//! Prometheus Metrics Module
//!
//! Exposes session metrics in Prometheus format.
//!
//! # Metrics Categories
//!
//! - **Credentials**: Token renewals by outcome
//! - **Instruments**: Resolver lookups by outcome, catalog size
//! - **Orders**: Orders submitted by side
//! - **Gateway**: Failed calls and call latency by method
//!
//! # Integration
//!
//! When a listener port is configured, metrics are served at `/metrics`
//! by the exporter's built-in HTTP listener. Without a recorder installed
//! every recording function is a no-op.

use std::net::{Ipv4Addr, SocketAddr};
use std::sync::OnceLock;
use std::time::Duration;

use metrics::{counter, describe_counter, describe_gauge, describe_histogram, gauge, histogram};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use parking_lot::Mutex;

use crate::domain::trading::OrderSide;

// =============================================================================
// Global Metrics Handle
// =============================================================================

static INSTALLED: OnceLock<Option<PrometheusHandle>> = OnceLock::new();

// Serializes first-time installation.
static INSTALL_LOCK: Mutex<()> = parking_lot::const_mutex(());

/// Error type for metrics setup.
#[derive(Debug, thiserror::Error)]
pub enum MetricsError {
    /// Failed to install the recorder or start the listener.
    #[error("metrics installation error: {0}")]
    Installation(String),
}

/// Initialize the Prometheus metrics recorder.
///
/// With a non-zero `port` the exporter serves `/metrics` on
/// `0.0.0.0:port` and no handle is returned. With `port` 0 only the
/// recorder is installed and the returned handle renders on demand.
/// Calling this again returns the result of the first call.
///
/// # Errors
///
/// Returns an error if the recorder or the listener cannot be installed.
pub fn init_metrics(port: u16) -> Result<Option<PrometheusHandle>, MetricsError> {
    let _guard = INSTALL_LOCK.lock();
    if let Some(installed) = INSTALLED.get() {
        return Ok(installed.clone());
    }

    let handle = if port == 0 {
        let handle = PrometheusBuilder::new()
            .install_recorder()
            .map_err(|e| MetricsError::Installation(e.to_string()))?;
        Some(handle)
    } else {
        let addr = SocketAddr::from((Ipv4Addr::UNSPECIFIED, port));
        PrometheusBuilder::new()
            .with_http_listener(addr)
            .install()
            .map_err(|e| MetricsError::Installation(e.to_string()))?;
        tracing::info!(%addr, "Prometheus metrics exporter started");
        None
    };

    register_metrics();
    Ok(INSTALLED.get_or_init(|| handle).clone())
}

/// Get the Prometheus handle for rendering metrics.
///
/// Returns `None` if metrics were not initialized or are served by the
/// HTTP listener.
#[must_use]
pub fn get_metrics_handle() -> Option<PrometheusHandle> {
    INSTALLED.get().cloned().flatten()
}

// =============================================================================
// Metric Registration
// =============================================================================

fn register_metrics() {
    describe_counter!(
        "trade_session_token_refresh_total",
        "Background token renewals by outcome"
    );
    describe_counter!(
        "trade_session_instrument_lookups_total",
        "Instrument resolver lookups by outcome"
    );
    describe_counter!(
        "trade_session_catalog_loads_total",
        "Completed bulk instrument catalog loads"
    );
    describe_gauge!(
        "trade_session_catalog_instruments",
        "Instruments in the search index after the last catalog load"
    );
    describe_counter!(
        "trade_session_orders_submitted_total",
        "Orders accepted by the gateway, by side"
    );
    describe_counter!(
        "trade_session_gateway_failures_total",
        "Failed gateway calls by method"
    );
    describe_histogram!(
        "trade_session_gateway_call_seconds",
        "Gateway call latency by method"
    );
}

// =============================================================================
// Metric Recording Functions
// =============================================================================

/// Outcome labels for instrument lookups.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LookupOutcome {
    /// Served from the cache.
    Hit,
    /// Resolved through the gateway and cached.
    Resolved,
    /// Gateway lookup failed; best-known value returned.
    Degraded,
}

impl LookupOutcome {
    const fn as_str(self) -> &'static str {
        match self {
            Self::Hit => "hit",
            Self::Resolved => "resolved",
            Self::Degraded => "degraded",
        }
    }
}

/// Record a background token renewal.
pub fn record_token_refresh(success: bool) {
    let outcome = if success { "success" } else { "failure" };
    counter!("trade_session_token_refresh_total", "outcome" => outcome).increment(1);
}

/// Record an instrument lookup.
pub fn record_instrument_lookup(outcome: LookupOutcome) {
    counter!(
        "trade_session_instrument_lookups_total",
        "outcome" => outcome.as_str()
    )
    .increment(1);
}

/// Record a completed catalog load.
#[allow(clippy::cast_precision_loss)]
pub fn record_catalog_load(count: usize) {
    counter!("trade_session_catalog_loads_total").increment(1);
    gauge!("trade_session_catalog_instruments").set(count as f64);
}

/// Record an order accepted by the gateway.
pub fn record_order_submitted(side: OrderSide) {
    let side = match side {
        OrderSide::Buy => "buy",
        OrderSide::Sell => "sell",
    };
    counter!("trade_session_orders_submitted_total", "side" => side).increment(1);
}

/// Record a failed gateway call.
pub fn record_gateway_failure(method: &'static str) {
    counter!("trade_session_gateway_failures_total", "method" => method).increment(1);
}

/// Record gateway call latency.
pub fn record_gateway_latency(method: &'static str, duration: Duration) {
    histogram!("trade_session_gateway_call_seconds", "method" => method)
        .record(duration.as_secs_f64());
}

// =============================================================================
// Tests
// =============================================================================
