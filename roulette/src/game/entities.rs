use rand::Rng;
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

use super::{
    errors::BetError,
    wheel::{Color, color_of},
};

/// Currency units. Balances never go negative.
pub type Credits = u64;

/// Identifier of a connected participant, assigned by the table on join.
pub type ParticipantId = u64;

/// Sequence number of a round, starting at 1.
pub type RoundId = u64;

pub const DEFAULT_STARTING_BALANCE: Credits = 1000;

/// Largest configurable starting balance.
pub const MAX_STARTING_BALANCE: Credits = 1_000_000_000_000;

/// A pocket on the wheel, always within `0..=36`.
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct WheelNumber(u8);

impl WheelNumber {
    pub const ZERO: Self = Self(0);
    pub const MAX: u8 = 36;

    pub fn new(value: u8) -> Result<Self, BetError> {
        if value > Self::MAX {
            return Err(BetError::InvalidBet {
                reason: format!("number {value} is not on the wheel"),
            });
        }
        Ok(Self(value))
    }

    /// Uniform draw over all 37 pockets.
    pub fn random<R: Rng + ?Sized>(rng: &mut R) -> Self {
        Self(rng.random_range(0..=Self::MAX))
    }

    pub fn value(self) -> u8 {
        self.0
    }

    pub fn is_zero(self) -> bool {
        self.0 == 0
    }

    pub fn is_even(self) -> bool {
        !self.is_zero() && self.0 % 2 == 0
    }

    pub fn is_odd(self) -> bool {
        self.0 % 2 == 1
    }

    pub fn color(self) -> Color {
        color_of(self)
    }

    /// Dozen containing this number; `None` for zero.
    pub fn dozen(self) -> Option<Section> {
        match self.0 {
            1..=12 => Some(Section::First),
            13..=24 => Some(Section::Second),
            25..=36 => Some(Section::Third),
            _ => None,
        }
    }

    /// Column on the betting grid; multiples of three are in the third
    /// column. `None` for zero.
    pub fn column(self) -> Option<Section> {
        if self.is_zero() {
            return None;
        }
        match self.0 % 3 {
            1 => Some(Section::First),
            2 => Some(Section::Second),
            _ => Some(Section::Third),
        }
    }
}

impl TryFrom<u8> for WheelNumber {
    type Error = BetError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<WheelNumber> for u8 {
    fn from(number: WheelNumber) -> Self {
        number.0
    }
}

impl fmt::Display for WheelNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One of the three dozens or columns.
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
pub enum Section {
    First,
    Second,
    Third,
}

impl Section {
    pub const ALL: [Self; 3] = [Self::First, Self::Second, Self::Third];

    /// Parse a 1-based index as used on the wire.
    pub fn from_index(index: u8) -> Result<Self, BetError> {
        match index {
            1 => Ok(Self::First),
            2 => Ok(Self::Second),
            3 => Ok(Self::Third),
            _ => Err(BetError::InvalidBet {
                reason: format!("section {index} must be 1, 2 or 3"),
            }),
        }
    }

    pub fn index(self) -> u8 {
        match self {
            Self::First => 1,
            Self::Second => 2,
            Self::Third => 3,
        }
    }
}

/// Payout class of a bet.
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BetKind {
    Single,
    Dozen,
    Column,
    Red,
    Black,
    Even,
    Odd,
    Low,
    High,
}

impl BetKind {
    pub const ALL: [Self; 9] = [
        Self::Single,
        Self::Dozen,
        Self::Column,
        Self::Red,
        Self::Black,
        Self::Even,
        Self::Odd,
        Self::Low,
        Self::High,
    ];

    /// Winnings per unit staked, excluding the returned stake.
    pub const fn multiplier(self) -> u64 {
        match self {
            Self::Single => 35,
            Self::Dozen | Self::Column => 2,
            Self::Red | Self::Black | Self::Even | Self::Odd | Self::Low | Self::High => 1,
        }
    }

    fn as_str(self) -> &'static str {
        match self {
            Self::Single => "single",
            Self::Dozen => "dozen",
            Self::Column => "column",
            Self::Red => "red",
            Self::Black => "black",
            Self::Even => "even",
            Self::Odd => "odd",
            Self::Low => "low",
            Self::High => "high",
        }
    }
}

impl fmt::Display for BetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A wager target. Written on the wire as `single_17`, `dozen_2`,
/// `column_3`, `red`, `black`, `even`, `odd`, `low` or `high`.
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
#[serde(try_from = "String", into = "String")]
pub enum BetKey {
    Single(WheelNumber),
    Dozen(Section),
    Column(Section),
    Red,
    Black,
    Even,
    Odd,
    Low,
    High,
}

impl BetKey {
    pub fn single(number: u8) -> Result<Self, BetError> {
        WheelNumber::new(number).map(Self::Single)
    }

    pub fn dozen(index: u8) -> Result<Self, BetError> {
        Section::from_index(index).map(Self::Dozen)
    }

    pub fn column(index: u8) -> Result<Self, BetError> {
        Section::from_index(index).map(Self::Column)
    }

    pub fn kind(&self) -> BetKind {
        match self {
            Self::Single(_) => BetKind::Single,
            Self::Dozen(_) => BetKind::Dozen,
            Self::Column(_) => BetKind::Column,
            Self::Red => BetKind::Red,
            Self::Black => BetKind::Black,
            Self::Even => BetKind::Even,
            Self::Odd => BetKind::Odd,
            Self::Low => BetKind::Low,
            Self::High => BetKind::High,
        }
    }

    /// Every key a participant can bet on.
    pub fn all() -> Vec<Self> {
        let mut keys: Vec<Self> = (0..=WheelNumber::MAX)
            .map(|n| Self::Single(WheelNumber(n)))
            .collect();
        keys.extend(Section::ALL.into_iter().map(Self::Dozen));
        keys.extend(Section::ALL.into_iter().map(Self::Column));
        keys.extend([
            Self::Red,
            Self::Black,
            Self::Even,
            Self::Odd,
            Self::Low,
            Self::High,
        ]);
        keys
    }
}

impl fmt::Display for BetKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Single(n) => write!(f, "single_{n}"),
            Self::Dozen(s) => write!(f, "dozen_{}", s.index()),
            Self::Column(s) => write!(f, "column_{}", s.index()),
            other => write!(f, "{}", other.kind()),
        }
    }
}

impl FromStr for BetKey {
    type Err = BetError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || BetError::InvalidBet {
            reason: format!("unknown bet key '{s}'"),
        };
        // Only the canonical spelling: no sign, no leading zeros
        let parse_index = |raw: &str| match raw.parse::<u8>() {
            Ok(index) if raw == index.to_string() => Ok(index),
            _ => Err(invalid()),
        };

        match s.split_once('_') {
            Some(("single", n)) => Self::single(parse_index(n)?),
            Some(("dozen", d)) => Self::dozen(parse_index(d)?),
            Some(("column", c)) => Self::column(parse_index(c)?),
            Some(_) => Err(invalid()),
            None => match s {
                "red" => Ok(Self::Red),
                "black" => Ok(Self::Black),
                "even" => Ok(Self::Even),
                "odd" => Ok(Self::Odd),
                "low" => Ok(Self::Low),
                "high" => Ok(Self::High),
                _ => Err(invalid()),
            },
        }
    }
}

impl TryFrom<String> for BetKey {
    type Error = BetError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<BetKey> for String {
    fn from(key: BetKey) -> Self {
        key.to_string()
    }
}
