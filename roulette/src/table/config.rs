//! Table configuration models.

use serde::{Deserialize, Serialize};

use crate::game::{
    DEFAULT_STARTING_BALANCE, MAX_STARTING_BALANCE, entities::Credits, round::RoundTimings,
};

/// Table configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableConfig {
    /// Table name
    pub name: String,

    /// Length of the betting phase in seconds (default: 30)
    pub betting_window_secs: u32,

    /// Bets close once the countdown is at or below this (default: 5)
    pub lockout_secs: u32,

    /// Spin animation length sent to clients (default: 4500)
    pub spin_duration_ms: u64,

    /// Balance given to every new participant (default: 1000)
    pub starting_balance: Credits,

    /// Clock tick period (default: 1000)
    pub tick_interval_ms: u64,

    /// Outbound event queue per participant
    pub event_buffer: usize,
}

impl Default for TableConfig {
    fn default() -> Self {
        Self {
            name: "Roulette".to_string(),
            betting_window_secs: 30,
            lockout_secs: 5,
            spin_duration_ms: 4500,
            starting_balance: DEFAULT_STARTING_BALANCE,
            tick_interval_ms: 1000,
            event_buffer: 64,
        }
    }
}

impl TableConfig {
    /// Validate configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.betting_window_secs == 0 {
            return Err("Betting window must be at least one second".to_string());
        }

        if self.lockout_secs >= self.betting_window_secs {
            return Err("Lockout must be shorter than the betting window".to_string());
        }

        if self.spin_duration_ms == 0 {
            return Err("Spin duration must be positive".to_string());
        }

        if self.tick_interval_ms == 0 {
            return Err("Tick interval must be positive".to_string());
        }

        if self.starting_balance == 0 {
            return Err("Starting balance must be positive".to_string());
        }

        if self.starting_balance > MAX_STARTING_BALANCE {
            return Err(format!("Starting balance must not exceed {MAX_STARTING_BALANCE}"));
        }

        if self.event_buffer == 0 {
            return Err("Event buffer must hold at least one event".to_string());
        }

        Ok(())
    }

    /// Whole ticks the wheel is held spinning, rounded up
    pub fn spin_secs(&self) -> u32 {
        let secs = self.spin_duration_ms.div_ceil(1000).max(1);
        u32::try_from(secs).unwrap_or(u32::MAX)
    }

    /// Phase lengths for the round state machine
    pub fn timings(&self) -> RoundTimings {
        RoundTimings {
            betting_secs: self.betting_window_secs,
            lockout_secs: self.lockout_secs,
            spin_secs: self.spin_secs(),
        }
    }
}
