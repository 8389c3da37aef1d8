//! Read-only round endpoints.

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use log::error;
use roulette::game::WheelLayoutView;
use serde_json::json;

use super::AppState;

/// Wheel order, color tables and payout multipliers.
///
/// Clients use this to draw the wheel and to animate the ball onto
/// `wheel_position` from `spin_resolved`.
pub async fn wheel_layout() -> Json<WheelLayoutView> {
    Json(WheelLayoutView::new())
}

/// Public snapshot of the round in progress.
pub async fn round_state(State(state): State<AppState>) -> Response {
    match state.table.state().await {
        Ok(table_state) => Json(table_state).into_response(),
        Err(e) => {
            error!("Failed to read round state: {}", e);
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({ "error": e.to_string() })),
            )
                .into_response()
        }
    }
}
