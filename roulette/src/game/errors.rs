//! Round engine error types.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::{
    entities::{Credits, ParticipantId, RoundId},
    round::Phase,
};

/// Participant-facing rejections. None of these mutate any state.
#[derive(Clone, Debug, Deserialize, Eq, Error, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum BetError {
    #[error("invalid bet: {reason}")]
    InvalidBet { reason: String },
    #[error("insufficient funds: need {required}, have {available}")]
    InsufficientFunds {
        required: Credits,
        available: Credits,
    },
    #[error("betting is closed")]
    WindowClosed,
    #[error("no bets from the previous round to repeat")]
    NoPriorBets,
    #[error("round {round_id} already settled")]
    AlreadySettled { round_id: RoundId },
    #[error("participant {participant_id} is not at the table")]
    UnknownParticipant { participant_id: ParticipantId },
}

impl BetError {
    /// Stable snake_case name, matching the serialized `kind` tag.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::InvalidBet { .. } => "invalid_bet",
            Self::InsufficientFunds { .. } => "insufficient_funds",
            Self::WindowClosed => "window_closed",
            Self::NoPriorBets => "no_prior_bets",
            Self::AlreadySettled { .. } => "already_settled",
            Self::UnknownParticipant { .. } => "unknown_participant",
        }
    }
}

/// Faults inside a clock tick. Logged by the table, never sent to
/// participants.
#[derive(Debug, Eq, Error, PartialEq)]
pub enum RoundError {
    #[error("countdown {countdown} out of range for {phase} phase")]
    CountdownOutOfRange { phase: Phase, countdown: u32 },
    #[error("spinning phase has no winning number")]
    MissingWinningNumber,
    #[error("tick panicked: {0}")]
    Panicked(String),
}

pub type BetResult<T> = Result<T, BetError>;
