//! Shared round state machine.
//!
//! The round alternates between a betting phase and a spinning phase. The
//! betting phase closes to new bets once the countdown reaches the lockout
//! threshold, before the wheel actually spins.

use serde::{Deserialize, Serialize};
use std::{collections::VecDeque, fmt};

use super::{
    entities::{RoundId, WheelNumber},
    errors::RoundError,
};

/// Number of past winning numbers kept for display.
pub const RECENT_NUMBERS_LEN: usize = 15;

#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    Betting,
    Spinning,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Betting => write!(f, "betting"),
            Self::Spinning => write!(f, "spinning"),
        }
    }
}

/// Whether requests that touch stakes are accepted right now.
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BettingWindow {
    Open,
    /// Still in the betting phase, but inside the lockout threshold.
    Locked,
    Spinning,
}

impl BettingWindow {
    pub fn is_open(self) -> bool {
        self == Self::Open
    }
}

/// Phase lengths, in ticks.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct RoundTimings {
    pub betting_secs: u32,
    pub lockout_secs: u32,
    pub spin_secs: u32,
}

impl Default for RoundTimings {
    fn default() -> Self {
        Self {
            betting_secs: 30,
            lockout_secs: 5,
            spin_secs: 5,
        }
    }
}

/// What a single tick did to the round.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Transition {
    /// Countdown moved, phase unchanged.
    Countdown,
    /// Betting ended and the winning number was drawn.
    SpinStarted { winning_number: WheelNumber },
    /// The spin finished; `round_id` must now be settled.
    SpinResolved {
        round_id: RoundId,
        winning_number: WheelNumber,
    },
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct RoundState {
    phase: Phase,
    countdown: u32,
    winning_number: Option<WheelNumber>,
    round_id: RoundId,
    recent_numbers: VecDeque<WheelNumber>,
}

impl RoundState {
    pub fn new(timings: &RoundTimings) -> Self {
        Self {
            phase: Phase::Betting,
            countdown: timings.betting_secs,
            winning_number: None,
            round_id: 1,
            recent_numbers: VecDeque::with_capacity(RECENT_NUMBERS_LEN),
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn countdown(&self) -> u32 {
        self.countdown
    }

    pub fn winning_number(&self) -> Option<WheelNumber> {
        self.winning_number
    }

    /// Round currently being played.
    pub fn round_id(&self) -> RoundId {
        self.round_id
    }

    /// Most recent first.
    pub fn recent_numbers(&self) -> impl Iterator<Item = WheelNumber> + '_ {
        self.recent_numbers.iter().copied()
    }

    pub fn window(&self, timings: &RoundTimings) -> BettingWindow {
        match self.phase {
            Phase::Spinning => BettingWindow::Spinning,
            Phase::Betting if self.countdown > timings.lockout_secs => BettingWindow::Open,
            Phase::Betting => BettingWindow::Locked,
        }
    }

    /// Verify the state-machine invariants.
    pub fn check(&self, timings: &RoundTimings) -> Result<(), RoundError> {
        let limit = match self.phase {
            Phase::Betting => timings.betting_secs,
            Phase::Spinning => timings.spin_secs,
        };
        if self.countdown == 0 || self.countdown > limit {
            return Err(RoundError::CountdownOutOfRange {
                phase: self.phase,
                countdown: self.countdown,
            });
        }
        if self.phase == Phase::Spinning && self.winning_number.is_none() {
            return Err(RoundError::MissingWinningNumber);
        }
        Ok(())
    }

    /// Re-derive a valid state after a fault. Spin without a number falls
    /// back to a fresh betting phase for the same round.
    pub fn repair(&mut self, timings: &RoundTimings) {
        match self.phase {
            Phase::Spinning if self.winning_number.is_none() => {
                self.phase = Phase::Betting;
                self.countdown = timings.betting_secs;
            }
            Phase::Spinning => {
                self.countdown = self.countdown.clamp(1, timings.spin_secs.max(1));
            }
            Phase::Betting => {
                self.winning_number = None;
                self.countdown = self.countdown.clamp(1, timings.betting_secs.max(1));
            }
        }
    }

    /// Advance one tick. `draw` is called once, when betting ends.
    pub fn advance<F>(&mut self, timings: &RoundTimings, draw: F) -> Result<Transition, RoundError>
    where
        F: FnOnce() -> WheelNumber,
    {
        self.check(timings)?;

        let remaining = self.countdown - 1;
        if remaining > 0 {
            self.countdown = remaining;
            return Ok(Transition::Countdown);
        }

        match self.phase {
            Phase::Betting => {
                let winning_number = draw();
                self.winning_number = Some(winning_number);
                self.phase = Phase::Spinning;
                self.countdown = timings.spin_secs;
                Ok(Transition::SpinStarted { winning_number })
            }
            Phase::Spinning => {
                let winning_number = self
                    .winning_number
                    .take()
                    .ok_or(RoundError::MissingWinningNumber)?;
                let round_id = self.round_id;

                self.recent_numbers.push_front(winning_number);
                self.recent_numbers.truncate(RECENT_NUMBERS_LEN);
                self.round_id += 1;
                self.phase = Phase::Betting;
                self.countdown = timings.betting_secs;

                Ok(Transition::SpinResolved {
                    round_id,
                    winning_number,
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn timings() -> RoundTimings {
        RoundTimings::default()
    }

    fn seven() -> WheelNumber {
        WheelNumber::new(7).unwrap()
    }

    #[test]
    fn test_new_round_is_open() {
        let state = RoundState::new(&timings());
        assert_eq!(state.phase(), Phase::Betting);
        assert_eq!(state.countdown(), 30);
        assert_eq!(state.window(&timings()), BettingWindow::Open);
        assert_eq!(state.winning_number(), None);
    }

    #[test]
    fn test_lockout_before_spin() {
        let t = timings();
        let mut state = RoundState::new(&t);
        for _ in 0..24 {
            assert_eq!(state.advance(&t, seven).unwrap(), Transition::Countdown);
        }
        assert_eq!(state.countdown(), 6);
        assert!(state.window(&t).is_open());

        state.advance(&t, seven).unwrap();
        assert_eq!(state.countdown(), 5);
        assert_eq!(state.phase(), Phase::Betting);
        assert_eq!(state.window(&t), BettingWindow::Locked);
    }

    #[test]
    fn test_full_cycle() {
        let t = timings();
        let mut state = RoundState::new(&t);
        for _ in 0..29 {
            state.advance(&t, || panic!("drawn too early")).unwrap();
        }
        assert_eq!(state.countdown(), 1);

        assert_eq!(
            state.advance(&t, seven).unwrap(),
            Transition::SpinStarted {
                winning_number: seven()
            }
        );
        assert_eq!(state.phase(), Phase::Spinning);
        assert_eq!(state.countdown(), 5);
        assert_eq!(state.winning_number(), Some(seven()));
        assert_eq!(state.window(&t), BettingWindow::Spinning);

        for _ in 0..4 {
            assert_eq!(state.advance(&t, seven).unwrap(), Transition::Countdown);
        }
        assert_eq!(
            state.advance(&t, seven).unwrap(),
            Transition::SpinResolved {
                round_id: 1,
                winning_number: seven()
            }
        );
        assert_eq!(state.phase(), Phase::Betting);
        assert_eq!(state.countdown(), 30);
        assert_eq!(state.winning_number(), None);
        assert_eq!(state.round_id(), 2);
        assert_eq!(state.recent_numbers().collect::<Vec<_>>(), vec![seven()]);
    }

    #[test]
    fn test_recent_numbers_are_bounded() {
        let t = RoundTimings {
            betting_secs: 1,
            lockout_secs: 0,
            spin_secs: 1,
        };
        let mut state = RoundState::new(&t);
        for i in 0..40u8 {
            let n = WheelNumber::new(i % 37).unwrap();
            state.advance(&t, || n).unwrap();
            state.advance(&t, || n).unwrap();
        }
        let recent: Vec<_> = state.recent_numbers().collect();
        assert_eq!(recent.len(), RECENT_NUMBERS_LEN);
        assert_eq!(recent[0], WheelNumber::new(39 % 37).unwrap());
    }

    #[test]
    fn test_corrupt_state_is_rejected_then_repaired() {
        let t = timings();
        let mut state = RoundState::new(&t);
        state.countdown = 0;
        let before = state.clone();
        assert!(matches!(
            state.advance(&t, seven),
            Err(RoundError::CountdownOutOfRange { .. })
        ));
        assert_eq!(state, before);

        state.repair(&t);
        assert!(state.check(&t).is_ok());
        assert_eq!(state.countdown(), 1);
    }

    #[test]
    fn test_spin_without_number_repairs_to_betting() {
        let t = timings();
        let mut state = RoundState::new(&t);
        state.phase = Phase::Spinning;
        state.countdown = 3;
        assert_eq!(state.check(&t), Err(RoundError::MissingWinningNumber));

        state.repair(&t);
        assert_eq!(state.phase(), Phase::Betting);
        assert_eq!(state.countdown(), 30);
        assert!(state.check(&t).is_ok());
    }
}
