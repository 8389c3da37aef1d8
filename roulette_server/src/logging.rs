//! Structured logging configuration.
//!
//! The round engine logs through the `log` facade; those records are picked
//! up by the same subscriber as the server's own `tracing` events.

use roulette::{BetError, ParticipantId};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize structured logging
///
/// Log levels are configurable via the `RUST_LOG` env var.
///
/// # Example
///
/// ```no_run
/// use roulette_server::logging;
///
/// #[tokio::main]
/// async fn main() {
///     logging::init();
///     tracing::info!("Server starting");
/// }
/// ```
pub fn init() {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,hyper=warn,tower_http=warn"));

    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_target(true)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .init();

    tracing::info!("Structured logging initialized");
}

/// Log a participant connecting or disconnecting
///
/// # Arguments
///
/// * `participant_id` - Participant the event is about
/// * `connected` - `true` on connect, `false` on disconnect
/// * `active` - Connections open after this event
pub fn log_connection(participant_id: ParticipantId, connected: bool, active: usize) {
    tracing::info!(
        participant_id = participant_id,
        connected = connected,
        active_connections = active,
        "WebSocket {}",
        if connected { "connected" } else { "disconnected" }
    );
}

/// Log a request the table refused
pub fn log_rejection(participant_id: ParticipantId, request: &str, reason: &BetError) {
    tracing::debug!(
        participant_id = participant_id,
        request = request,
        reason = reason.kind(),
        "Request rejected: {}",
        reason
    );
}

/// Log a settlement delivered to a participant
pub fn log_settlement(participant_id: ParticipantId, net_change: i64, balance: u64) {
    tracing::debug!(
        participant_id = participant_id,
        net_change = net_change,
        balance = balance,
        "Settlement delivered"
    );
}
