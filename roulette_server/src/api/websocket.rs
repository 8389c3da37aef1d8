//! WebSocket handler for live round participation.
//!
//! Each connection is one participant. The table actor pushes round events
//! to the connection; the connection forwards participant commands to the
//! actor and reports refusals back as `bet_rejected`.
//!
//! # Connection Flow
//!
//! 1. Client connects via `GET /ws`
//! 2. Server joins the table; the first message is a `round_snapshot`
//! 3. Server spawns a send task forwarding table events to the socket
//! 4. The receive loop parses commands and forwards them to the table
//! 5. On disconnect, the send task is stopped and the participant leaves
//!
//! # Client Messages
//!
//! ```javascript
//! ws.send(JSON.stringify({ type: "place_bet", bet_key: "single_17", amount: 25 }));
//! ws.send(JSON.stringify({ type: "clear_bets" }));
//! ws.send(JSON.stringify({ type: "repeat_last_bets" }));
//! ```
//!
//! # Server Messages
//!
//! Every server message carries a `type` tag: `round_snapshot`, `tick`,
//! `spin_started`, `spin_resolved`, `bet_accepted`, `bets_cleared`,
//! `balance_changed`, `settlement_result`, `bet_rejected` or `error`.

use axum::{
    extract::{
        State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    response::Response,
};
use futures_util::{SinkExt, StreamExt};
use log::{error, warn};
use roulette::{
    BetKey, ParticipantId, TableEvent,
    table::{TableError, TableResponse},
};
use serde::{Deserialize, Serialize};
use std::sync::atomic::Ordering;
use tokio::sync::mpsc;

use super::{AppState, rate_limiter::MessageLimiter};
use crate::{logging, metrics};

/// Client messages received via WebSocket
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    /// Stake `amount` on a wire bet key such as `red` or `single_17`
    PlaceBet { bet_key: String, amount: i64 },
    /// Refund all stakes of the current round
    ClearBets,
    /// Re-place the previous round's bets
    RepeatLastBets,
}

impl ClientMessage {
    fn name(&self) -> &'static str {
        match self {
            ClientMessage::PlaceBet { .. } => "place_bet",
            ClientMessage::ClearBets => "clear_bets",
            ClientMessage::RepeatLastBets => "repeat_last_bets",
        }
    }
}

/// Gateway-level errors that are not bet rejections
#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ServerResponse {
    Error { message: String },
}

/// Upgrade HTTP connection to WebSocket for one participant.
pub async fn websocket_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

/// Handle an established WebSocket connection.
async fn handle_socket(socket: WebSocket, state: AppState) {
    let (mut sender, mut receiver) = socket.split();

    let (events_tx, mut events_rx) = mpsc::channel::<TableEvent>(state.config.event_buffer);
    let (response_tx, mut response_rx) = mpsc::channel::<String>(8);

    let participant_id = match state.table.join(events_tx.clone()).await {
        Ok(id) => id,
        Err(e) => {
            error!("Failed to join table: {}", e);
            let _ = sender.close().await;
            return;
        }
    };

    let active = state.connections.fetch_add(1, Ordering::Relaxed) + 1;
    metrics::websocket_connections_total();
    metrics::websocket_connections_active(active);
    logging::log_connection(participant_id, true, active);

    // Spawn task to forward table events and gateway responses
    let send_task = tokio::spawn(async move {
        loop {
            let json = tokio::select! {
                Some(event) = events_rx.recv() => {
                    record_outbound(participant_id, &event);
                    match serde_json::to_string(&event) {
                        Ok(json) => json,
                        Err(e) => {
                            error!("Failed to serialize event: {}", e);
                            continue;
                        }
                    }
                }
                Some(json) = response_rx.recv() => json,
                else => break,
            };

            if sender.send(Message::Text(json.into())).await.is_err() {
                break;
            }
            metrics::websocket_messages_sent();
        }
    });

    let mut limiter = MessageLimiter::default();

    // Receive messages from client
    while let Some(msg) = receiver.next().await {
        match msg {
            Ok(Message::Text(text)) => {
                metrics::websocket_messages_received();

                if let Err(limited) = limiter.check() {
                    warn!(
                        "{} rate limit exceeded for participant {}. Blocking message.",
                        limited.label(),
                        participant_id
                    );
                    metrics::rate_limit_hits_total(limited.label());
                    if send_error(&response_tx, limited.message()).await.is_err() {
                        break;
                    }
                    continue;
                }

                let client_msg = match serde_json::from_str::<ClientMessage>(&text) {
                    Ok(client_msg) => client_msg,
                    Err(e) => {
                        warn!("Failed to parse client message: {}", e);
                        if send_error(&response_tx, "Invalid message format").await.is_err() {
                            break;
                        }
                        continue;
                    }
                };

                let request = client_msg.name();
                match handle_client_message(client_msg, participant_id, &state).await {
                    Ok(TableResponse::Success) => {}
                    Ok(TableResponse::Rejected(reason)) => {
                        logging::log_rejection(participant_id, request, &reason);
                        metrics::bets_rejected_total(reason.kind());
                        if events_tx.send(TableEvent::BetRejected { reason }).await.is_err() {
                            break;
                        }
                    }
                    Err(e) => {
                        error!("Table unavailable for participant {}: {}", participant_id, e);
                        let _ = send_error(&response_tx, "Table unavailable").await;
                        break;
                    }
                }
            }
            Ok(Message::Close(_)) => break,
            Err(e) => {
                warn!("WebSocket error for participant {}: {}", participant_id, e);
                break;
            }
            _ => {}
        }
    }

    // Cleanup - the account is discarded on disconnect
    send_task.abort();
    if let Err(e) = state.table.leave(participant_id).await {
        warn!("Failed to leave table for participant {}: {}", participant_id, e);
    }

    let active = state.connections.fetch_sub(1, Ordering::Relaxed).saturating_sub(1);
    metrics::websocket_connections_active(active);
    logging::log_connection(participant_id, false, active);
}

/// Forward a parsed command to the table actor.
///
/// Malformed bet keys are refused here, before reaching the table.
async fn handle_client_message(
    msg: ClientMessage,
    participant_id: ParticipantId,
    state: &AppState,
) -> Result<TableResponse, TableError> {
    match msg {
        ClientMessage::PlaceBet { bet_key, amount } => match bet_key.parse::<BetKey>() {
            Ok(bet_key) => state.table.place_bet(participant_id, bet_key, amount).await,
            Err(reason) => Ok(TableResponse::Rejected(reason)),
        },
        ClientMessage::ClearBets => state.table.clear_bets(participant_id).await,
        ClientMessage::RepeatLastBets => state.table.repeat_last_bets(participant_id).await,
    }
}

fn record_outbound(participant_id: ParticipantId, event: &TableEvent) {
    match event {
        TableEvent::BetAccepted { .. } => metrics::bets_accepted_total(),
        TableEvent::SettlementResult {
            net_change,
            balance,
            ..
        } => {
            metrics::settlement_delivered(*net_change);
            logging::log_settlement(participant_id, *net_change, *balance);
        }
        _ => {}
    }
}

async fn send_error(
    response_tx: &mpsc::Sender<String>,
    message: &str,
) -> Result<(), mpsc::error::SendError<String>> {
    let response = ServerResponse::Error {
        message: message.to_string(),
    };
    match serde_json::to_string(&response) {
        Ok(json) => response_tx.send(json).await,
        Err(e) => {
            error!("Failed to serialize response: {}", e);
            Ok(())
        }
    }
}
