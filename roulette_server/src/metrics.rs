//! Prometheus metrics for monitoring roulette server health.
//!
//! Metrics are exposed in Prometheus text format on a dedicated listener.
//!
//! # Metrics Categories
//!
//! - **WebSocket Metrics**: Active connections, messages sent/received
//! - **Betting Metrics**: Accepted and rejected bets
//! - **Settlement Metrics**: Settlements delivered and their net change
//!
//! # Example Usage
//!
//! ```rust,no_run
//! use roulette_server::metrics;
//! use std::net::SocketAddr;
//!
//! let addr: SocketAddr = "127.0.0.1:9090".parse().unwrap();
//! metrics::init_metrics(addr).unwrap();
//!
//! metrics::websocket_connections_active(10);
//! ```

use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;

/// Initialize Prometheus metrics exporter.
///
/// Metrics will be available at `http://<addr>/metrics`.
///
/// # Returns
///
/// Result indicating success or error message
pub fn init_metrics(addr: SocketAddr) -> Result<(), String> {
    PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()
        .map_err(|e| format!("Failed to install Prometheus exporter: {}", e))
}

// ============================================================================
// WebSocket Metrics
// ============================================================================

/// Set current active WebSocket connections count.
pub fn websocket_connections_active(count: usize) {
    metrics::gauge!("websocket_connections_active").set(count as f64);
}

/// Increment total WebSocket connections counter.
pub fn websocket_connections_total() {
    metrics::counter!("websocket_connections_total").increment(1);
}

/// Increment WebSocket messages sent counter.
pub fn websocket_messages_sent() {
    metrics::counter!("websocket_messages_sent").increment(1);
}

/// Increment WebSocket messages received counter.
pub fn websocket_messages_received() {
    metrics::counter!("websocket_messages_received").increment(1);
}

// ============================================================================
// Betting Metrics
// ============================================================================

/// Increment accepted bets counter.
pub fn bets_accepted_total() {
    metrics::counter!("bets_accepted_total").increment(1);
}

/// Increment rejected requests counter, labelled by rejection kind.
pub fn bets_rejected_total(reason: &'static str) {
    metrics::counter!("bets_rejected_total", "reason" => reason).increment(1);
}

// ============================================================================
// Settlement Metrics
// ============================================================================

/// Record one settlement and its net change.
pub fn settlement_delivered(net_change: i64) {
    metrics::counter!("settlements_total").increment(1);
    metrics::histogram!("settlement_net_change_credits").record(net_change as f64);
}

// ============================================================================
// Rate Limiting Metrics
// ============================================================================

/// Increment rate limit hits counter.
pub fn rate_limit_hits_total(window: &'static str) {
    metrics::counter!("rate_limit_hits_total", "window" => window).increment(1);
}
