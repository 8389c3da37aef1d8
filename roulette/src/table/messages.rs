//! Table actor message types.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tokio::sync::{mpsc, oneshot};

use crate::game::{
    entities::{BetKey, Credits, ParticipantId, RoundId, WheelNumber},
    errors::BetError,
    ledger::BetLedger,
    round::Phase,
    wheel::Color,
};

/// Messages that can be sent to a TableActor
#[derive(Debug)]
pub enum TableMessage {
    /// Connect a participant. The actor creates a fresh account, registers
    /// `events` and replies with the assigned id.
    Join {
        events: mpsc::Sender<TableEvent>,
        response: oneshot::Sender<ParticipantId>,
    },

    /// Disconnect a participant, discarding the account
    Leave { participant_id: ParticipantId },

    /// Stake credits on a bet key
    PlaceBet {
        participant_id: ParticipantId,
        bet_key: BetKey,
        amount: i64,
        response: oneshot::Sender<TableResponse>,
    },

    /// Refund every stake of the current round
    ClearBets {
        participant_id: ParticipantId,
        response: oneshot::Sender<TableResponse>,
    },

    /// Re-place the previous round's bets
    RepeatLastBets {
        participant_id: ParticipantId,
        response: oneshot::Sender<TableResponse>,
    },

    /// Get the public round state
    GetState {
        response: oneshot::Sender<TableStateResponse>,
    },

    /// Internal: Advance the round clock (called by timer)
    Tick,

    /// Stop the actor
    Shutdown,
}

/// Response from participant operations
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TableResponse {
    /// Operation applied
    Success,

    /// Operation refused, nothing changed
    Rejected(BetError),
}

impl TableResponse {
    /// Check if response is success
    pub fn is_success(&self) -> bool {
        matches!(self, TableResponse::Success)
    }

    /// Get error message if response is error
    pub fn error_message(&self) -> Option<String> {
        match self {
            TableResponse::Rejected(e) => Some(e.to_string()),
            TableResponse::Success => None,
        }
    }
}

impl From<Result<(), BetError>> for TableResponse {
    fn from(result: Result<(), BetError>) -> Self {
        match result {
            Ok(()) => TableResponse::Success,
            Err(e) => TableResponse::Rejected(e),
        }
    }
}

/// Public table state
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableStateResponse {
    /// Table name
    pub table_name: String,

    /// Round in progress
    pub round_id: RoundId,

    /// Current phase
    pub phase: Phase,

    /// Seconds left in the phase
    pub countdown: u32,

    /// Whether new bets are accepted
    pub betting_open: bool,

    /// Connected participants
    pub participant_count: usize,

    /// Past winning numbers, most recent first
    pub recent_numbers: Vec<WheelNumber>,
}

/// Events pushed to participants
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TableEvent {
    /// Sent once, right after joining
    RoundSnapshot {
        participant_id: ParticipantId,
        balance: Credits,
        phase: Phase,
        countdown: u32,
        betting_open: bool,
        bets: BetLedger,
        recent_numbers: Vec<WheelNumber>,
    },

    /// Clock tick, every second in both phases
    Tick { countdown: u32, phase: Phase },

    /// Betting ended and the wheel is spinning
    SpinStarted { spin_duration_ms: u64 },

    /// Where the ball landed
    SpinResolved {
        winning_number: WheelNumber,
        wheel_position: usize,
        color: Color,
    },

    BetAccepted { bet_key: BetKey, new_stake: Credits },

    BetsCleared,

    BalanceChanged { balance: Credits },

    /// Once per participant per round
    SettlementResult {
        balance: Credits,
        net_change: i64,
        per_bet_settlement: BTreeMap<BetKey, Credits>,
    },

    BetRejected { reason: BetError },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tick_wire_format() {
        let json = serde_json::to_value(TableEvent::Tick {
            countdown: 12,
            phase: Phase::Betting,
        })
        .unwrap();
        assert_eq!(
            json,
            serde_json::json!({"type": "tick", "countdown": 12, "phase": "betting"})
        );
    }

    #[test]
    fn test_settlement_keys_use_wire_names() {
        let mut per_bet = BTreeMap::new();
        per_bet.insert(BetKey::single(7).unwrap(), 360);
        per_bet.insert(BetKey::Red, 100);
        let json = serde_json::to_value(TableEvent::SettlementResult {
            balance: 1400,
            net_change: 400,
            per_bet_settlement: per_bet.clone(),
        })
        .unwrap();
        assert_eq!(json["per_bet_settlement"]["single_7"], 360);
        assert_eq!(json["per_bet_settlement"]["red"], 100);

        let back: TableEvent = serde_json::from_value(json).unwrap();
        assert!(matches!(
            back,
            TableEvent::SettlementResult { per_bet_settlement, .. } if per_bet_settlement == per_bet
        ));
    }

    #[test]
    fn test_rejection_carries_reason() {
        let json = serde_json::to_value(TableEvent::BetRejected {
            reason: BetError::WindowClosed,
        })
        .unwrap();
        assert_eq!(json["type"], "bet_rejected");
        assert_eq!(json["reason"]["kind"], "window_closed");
    }

    #[test]
    fn test_response_helpers() {
        assert!(TableResponse::Success.is_success());
        let rejected = TableResponse::from(Err(BetError::NoPriorBets));
        assert!(!rejected.is_success());
        assert!(rejected.error_message().unwrap().contains("previous round"));
    }
}
