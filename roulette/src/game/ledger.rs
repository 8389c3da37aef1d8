//! Per-participant balance and bet bookkeeping.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::{
    entities::{BetKey, Credits, RoundId},
    errors::{BetError, BetResult},
    payout::Settlement,
    round::BettingWindow,
};

/// Stakes keyed by bet. Every stored stake is positive.
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
#[serde(transparent)]
pub struct BetLedger {
    stakes: BTreeMap<BetKey, Credits>,
}

impl BetLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stake_on(&self, key: &BetKey) -> Credits {
        self.stakes.get(key).copied().unwrap_or(0)
    }

    pub fn total_staked(&self) -> Credits {
        self.stakes.values().sum()
    }

    pub fn is_empty(&self) -> bool {
        self.stakes.is_empty()
    }

    pub fn len(&self) -> usize {
        self.stakes.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&BetKey, &Credits)> {
        self.stakes.iter()
    }

    /// Adds `amount` onto the stake for `key` and returns the new stake.
    /// Zero amounts are ignored.
    fn add(&mut self, key: BetKey, amount: Credits) -> Credits {
        if amount == 0 {
            return self.stake_on(&key);
        }
        let stake = self.stakes.entry(key).or_insert(0);
        *stake += amount;
        *stake
    }
}

impl FromIterator<(BetKey, Credits)> for BetLedger {
    fn from_iter<I: IntoIterator<Item = (BetKey, Credits)>>(iter: I) -> Self {
        let mut ledger = Self::new();
        for (key, amount) in iter {
            ledger.add(key, amount);
        }
        ledger
    }
}

/// State of one connected participant.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ParticipantAccount {
    balance: Credits,
    bets: BetLedger,
    last_bets: BetLedger,
    last_settled_round: Option<RoundId>,
}

impl ParticipantAccount {
    pub fn new(starting_balance: Credits) -> Self {
        Self {
            balance: starting_balance,
            bets: BetLedger::new(),
            last_bets: BetLedger::new(),
            last_settled_round: None,
        }
    }

    pub fn balance(&self) -> Credits {
        self.balance
    }

    pub fn bets(&self) -> &BetLedger {
        &self.bets
    }

    pub fn last_bets(&self) -> &BetLedger {
        &self.last_bets
    }

    pub fn last_settled_round(&self) -> Option<RoundId> {
        self.last_settled_round
    }

    /// Stake `amount` on `key`. Returns the accumulated stake on that key.
    pub fn place_bet(
        &mut self,
        window: BettingWindow,
        key: BetKey,
        amount: Credits,
    ) -> BetResult<Credits> {
        if !window.is_open() {
            return Err(BetError::WindowClosed);
        }
        if amount == 0 {
            return Err(BetError::InvalidBet {
                reason: "amount must be positive".to_string(),
            });
        }
        if amount > self.balance {
            return Err(BetError::InsufficientFunds {
                required: amount,
                available: self.balance,
            });
        }

        self.balance -= amount;
        Ok(self.bets.add(key, amount))
    }

    /// Refund every current stake. Returns the refunded amount.
    pub fn clear_bets(&mut self, window: BettingWindow) -> BetResult<Credits> {
        if !window.is_open() {
            return Err(BetError::WindowClosed);
        }
        Ok(self.refund_current())
    }

    /// Replace the current bets with the previous round's bets.
    ///
    /// Stakes already on the table are refunded first, so the funds check
    /// covers the balance plus those stakes.
    pub fn repeat_last_bets(&mut self, window: BettingWindow) -> BetResult<&BetLedger> {
        if !window.is_open() {
            return Err(BetError::WindowClosed);
        }
        if self.last_bets.is_empty() {
            return Err(BetError::NoPriorBets);
        }

        let required = self.last_bets.total_staked();
        let available = self.balance + self.bets.total_staked();
        if required > available {
            return Err(BetError::InsufficientFunds {
                required,
                available,
            });
        }

        self.refund_current();
        self.balance -= required;
        self.bets = self.last_bets.clone();
        Ok(&self.bets)
    }

    /// Credit a resolved round. Each round settles at most once.
    pub fn settle_round(&mut self, round_id: RoundId, settlement: &Settlement) -> BetResult<()> {
        if self.last_settled_round == Some(round_id) {
            return Err(BetError::AlreadySettled { round_id });
        }

        self.balance = self.balance.saturating_add(settlement.total_return);
        self.last_bets = std::mem::take(&mut self.bets);
        self.last_settled_round = Some(round_id);
        Ok(())
    }

    fn refund_current(&mut self) -> Credits {
        let refund = self.bets.total_staked();
        self.balance += refund;
        self.bets = BetLedger::new();
        refund
    }
}
