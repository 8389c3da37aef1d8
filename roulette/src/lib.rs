//! # Roulette
//!
//! A live European roulette round engine built around a single shared clock.
//!
//! Every connected participant plays the same round. The round alternates
//! between a betting phase and a spinning phase:
//!
//! - **Betting**: countdown from 30; stakes may be placed, cleared or repeated
//!   until the countdown reaches the lockout threshold
//! - **Locked**: the last seconds of betting, where requests are rejected
//! - **Spinning**: the winning number is drawn and held for the spin animation,
//!   after which every participant is settled at once
//!
//! ## Core Modules
//!
//! - [`game`]: Wheel layout, bet keys, ledgers, payout resolution and the round state machine
//! - [`table`]: The table actor that owns the clock and all participant accounts
//!
//! ## Example
//!
//! ```
//! use roulette::{BetKey, BetLedger, WheelNumber, resolve};
//!
//! let ledger: BetLedger = [(BetKey::Red, 100), (BetKey::single(7).unwrap(), 10)]
//!     .into_iter()
//!     .collect();
//! let settlement = resolve(&ledger, WheelNumber::new(7).unwrap());
//! assert_eq!(settlement.total_return, 200 + 360);
//! ```

/// Core game logic: wheel, bets, ledger, payouts and rounds.
pub mod game;
pub use game::{
    BetError, BetKey, BetKind, BetLedger, BettingWindow, Color, Credits, ParticipantAccount,
    ParticipantId, Phase, RoundId, RoundState, Section, Settlement, WheelNumber, resolve,
};

/// Table actor and its message protocol.
pub mod table;
pub use table::{TableActor, TableConfig, TableEvent, TableHandle};
