//! Fixed wheel layout and color classification.
//!
//! The same tables are served to clients so wheel animation and color
//! rendering always agree with resolved outcomes.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::{
    entities::{BetKind, WheelNumber},
    errors::BetError,
};

/// Number of pockets on a single-zero wheel.
pub const POCKET_COUNT: usize = 37;

/// Physical pocket order, clockwise starting at zero.
pub const WHEEL_NUMBERS: [u8; POCKET_COUNT] = [
    0, 32, 15, 19, 4, 21, 2, 25, 17, 34, 6, 27, 13, 36, 11, 30, 8, 23, 10, 5, 24, 16, 33, 1, 20,
    14, 31, 9, 22, 18, 29, 7, 28, 12, 35, 3, 26,
];

pub const RED_NUMBERS: [u8; 18] = [
    1, 3, 5, 7, 9, 12, 14, 16, 18, 19, 21, 23, 25, 27, 30, 32, 34, 36,
];

pub const BLACK_NUMBERS: [u8; 18] = [
    2, 4, 6, 8, 10, 11, 13, 15, 17, 20, 22, 24, 26, 28, 29, 31, 33, 35,
];

#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Color {
    Red,
    Black,
    /// Zero.
    Green,
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let repr = match self {
            Self::Red => "red",
            Self::Black => "black",
            Self::Green => "green",
        };
        write!(f, "{repr}")
    }
}

/// Color of a pocket. Zero is the only green pocket.
pub fn color_of(number: WheelNumber) -> Color {
    let n = number.value();
    if RED_NUMBERS.contains(&n) {
        Color::Red
    } else if BLACK_NUMBERS.contains(&n) {
        Color::Black
    } else {
        Color::Green
    }
}

/// Index of a number in [`WHEEL_NUMBERS`].
pub fn wheel_position(number: WheelNumber) -> usize {
    WHEEL_NUMBERS
        .iter()
        .position(|&n| n == number.value())
        // Every WheelNumber is on the wheel; the layout test enforces that.
        .unwrap_or(0)
}

/// Number sitting at a wheel position.
pub fn number_at(position: usize) -> Result<WheelNumber, BetError> {
    let value = WHEEL_NUMBERS
        .get(position)
        .copied()
        .ok_or_else(|| BetError::InvalidBet {
            reason: format!("wheel position {position} out of range"),
        })?;
    WheelNumber::new(value)
}

/// Serializable copy of the odds table for clients.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct WheelLayoutView {
    pub wheel_numbers: Vec<u8>,
    pub red_numbers: Vec<u8>,
    pub black_numbers: Vec<u8>,
    pub payouts: Vec<PayoutEntry>,
}

#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct PayoutEntry {
    pub kind: BetKind,
    pub multiplier: u64,
}

impl WheelLayoutView {
    pub fn new() -> Self {
        Self {
            wheel_numbers: WHEEL_NUMBERS.to_vec(),
            red_numbers: RED_NUMBERS.to_vec(),
            black_numbers: BLACK_NUMBERS.to_vec(),
            payouts: BetKind::ALL
                .iter()
                .map(|&kind| PayoutEntry {
                    kind,
                    multiplier: kind.multiplier(),
                })
                .collect(),
        }
    }
}

impl Default for WheelLayoutView {
    fn default() -> Self {
        Self::new()
    }
}
