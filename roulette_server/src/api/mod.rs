//! HTTP/WebSocket API for the roulette server.
//!
//! # Architecture
//!
//! The API is built with:
//! - **Axum**: Async web framework for HTTP/WebSocket
//! - **Tower**: CORS middleware
//! - **Actor Model**: Round state owned by a single table actor task
//!
//! # Modules
//!
//! - [`round`]: Read-only views of the wheel layout and round in progress
//! - [`websocket`]: Live round events and participant commands
//! - [`rate_limiter`]: Per-connection inbound message limits
//!
//! # Endpoints Overview
//!
//! ```text
//! GET /health          - Server health status
//! GET /api/v1/wheel    - Wheel order, colors and payout multipliers
//! GET /api/v1/round    - Public round snapshot
//! GET /ws              - WebSocket for one participant
//! ```
//!
//! # Example Usage
//!
//! ```rust,no_run
//! use roulette::{TableActor, TableConfig};
//! use roulette_server::api::{AppState, create_router};
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//!
//! let config = TableConfig::default();
//! let (actor, handle) = TableActor::new(config.clone());
//! tokio::spawn(actor.run());
//!
//! let app = create_router(AppState::new(handle, config));
//! let listener = tokio::net::TcpListener::bind("0.0.0.0:3000").await?;
//! axum::serve(listener, app).await?;
//! # Ok(())
//! # }
//! ```
//!
//! # CORS
//!
//! CORS is configured permissively for development. In production, configure
//! appropriate origins, methods, and headers.

pub mod rate_limiter;
pub mod round;
pub mod websocket;

use axum::{
    Router,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json},
    routing::get,
};
use roulette::{TableConfig, TableHandle};
use serde_json::json;
use std::sync::{
    Arc,
    atomic::{AtomicUsize, Ordering},
};
use tower_http::cors::CorsLayer;

/// Application state shared across all HTTP handlers and WebSocket connections.
///
/// # Fields
///
/// - `table`: Handle to the table actor
/// - `config`: Table settings the actor was started with
/// - `connections`: Currently open WebSocket connections
#[derive(Clone)]
pub struct AppState {
    pub table: TableHandle,
    pub config: Arc<TableConfig>,
    pub connections: Arc<AtomicUsize>,
}

impl AppState {
    pub fn new(table: TableHandle, config: TableConfig) -> Self {
        Self {
            table,
            config: Arc::new(config),
            connections: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn active_connections(&self) -> usize {
        self.connections.load(Ordering::Relaxed)
    }
}

/// Create the complete API router with all endpoints and middleware.
pub fn create_router(state: AppState) -> Router {
    let v1_routes = Router::new()
        .route("/wheel", get(round::wheel_layout))
        .route("/round", get(round::round_state));

    Router::new()
        .route("/health", get(health_check))
        .route("/ws", get(websocket::websocket_handler))
        .nest("/api/v1", v1_routes)
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Health check endpoint for monitoring and load balancers.
///
/// Returns `200 OK` while the table actor answers, `503 Service Unavailable`
/// once it has stopped.
///
/// ```bash
/// curl http://localhost:6969/health
/// # {"status":"healthy","round_id":3,"participants":2,"timestamp":"2026-01-01T10:30:00Z",...}
/// ```
async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    let table_state = state.table.state().await.ok();
    let healthy = table_state.is_some();

    let status_code = if healthy {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let response = json!({
        "status": if healthy { "healthy" } else { "unhealthy" },
        "version": env!("CARGO_PKG_VERSION"),
        "table": state.config.name,
        "round_id": table_state.as_ref().map(|s| s.round_id),
        "participants": table_state.as_ref().map(|s| s.participant_count),
        "connections": state.active_connections(),
        "timestamp": chrono::Utc::now().to_rfc3339(),
    });

    (status_code, Json(response))
}
