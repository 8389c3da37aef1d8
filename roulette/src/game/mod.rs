//! Roulette round engine: odds table, bets, ledger, payouts and the round
//! state machine.

pub mod entities;
pub mod errors;
pub mod ledger;
pub mod payout;
pub mod round;
pub mod wheel;

pub use entities::{
    BetKey, BetKind, Credits, DEFAULT_STARTING_BALANCE, MAX_STARTING_BALANCE, ParticipantId,
    RoundId, Section, WheelNumber,
};
pub use errors::{BetError, BetResult, RoundError};
pub use ledger::{BetLedger, ParticipantAccount};
pub use payout::{Settlement, resolve};
pub use round::{BettingWindow, Phase, RoundState, RoundTimings, Transition};
pub use wheel::{Color, WHEEL_NUMBERS, WheelLayoutView, color_of, wheel_position};
