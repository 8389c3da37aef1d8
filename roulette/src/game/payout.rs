//! Maps a winning number onto a participant's bets.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::{
    entities::{BetKey, Credits, WheelNumber},
    ledger::BetLedger,
    wheel::Color,
};

/// Outcome of one ledger against one winning number.
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct Settlement {
    pub total_staked: Credits,
    /// Stake plus winnings over every winning bet.
    pub total_return: Credits,
    /// Return per winning bet. Losing bets are absent.
    pub per_bet: BTreeMap<BetKey, Credits>,
}

impl Settlement {
    /// Signed balance change, clamped to the `i64` range.
    pub fn net_change(&self) -> i64 {
        let net = i128::from(self.total_return) - i128::from(self.total_staked);
        i64::try_from(net).unwrap_or(if net < 0 { i64::MIN } else { i64::MAX })
    }

    pub fn is_win(&self, key: &BetKey) -> bool {
        self.per_bet.contains_key(key)
    }
}

/// Whether `key` wins when the ball lands on `winning`.
pub fn wins(key: &BetKey, winning: WheelNumber) -> bool {
    match key {
        BetKey::Single(n) => *n == winning,
        BetKey::Red => winning.color() == Color::Red,
        BetKey::Black => winning.color() == Color::Black,
        BetKey::Even => winning.is_even(),
        BetKey::Odd => winning.is_odd(),
        BetKey::Low => (1..=18).contains(&winning.value()),
        BetKey::High => (19..=36).contains(&winning.value()),
        BetKey::Dozen(section) => winning.dozen() == Some(*section),
        BetKey::Column(section) => winning.column() == Some(*section),
    }
}

/// Return for a winning stake: the stake comes back with its winnings.
pub fn winning_return(key: &BetKey, stake: Credits) -> Credits {
    stake
        .saturating_mul(key.kind().multiplier())
        .saturating_add(stake)
}

/// Resolve every stake in `ledger` against `winning`.
pub fn resolve(ledger: &BetLedger, winning: WheelNumber) -> Settlement {
    let mut settlement = Settlement {
        total_staked: ledger.total_staked(),
        ..Settlement::default()
    };

    for (key, &stake) in ledger.iter() {
        if stake == 0 || !wins(key, winning) {
            continue;
        }
        let payout = winning_return(key, stake);
        settlement.total_return = settlement.total_return.saturating_add(payout);
        settlement.per_bet.insert(*key, payout);
    }

    settlement
}
