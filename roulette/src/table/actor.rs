//! Round clock actor with async message handling.
//!
//! A single actor owns the shared round state and every participant
//! account. Its inbox orders all requests against clock ticks, so a window
//! check and the debit that follows can never straddle a phase change.

use super::{
    config::TableConfig,
    errors::TableError,
    messages::{TableEvent, TableMessage, TableResponse, TableStateResponse},
};
use crate::game::{
    entities::{BetKey, Credits, ParticipantId, RoundId, WheelNumber},
    errors::{BetError, RoundError},
    ledger::ParticipantAccount,
    payout::resolve,
    round::{RoundState, RoundTimings, Transition},
    wheel::{color_of, wheel_position},
};
use rand::{SeedableRng, rngs::StdRng};
use std::{
    any::Any,
    collections::{HashMap, VecDeque},
    panic::{self, AssertUnwindSafe},
};
use tokio::{
    sync::{mpsc, oneshot},
    time::{Duration, Instant, MissedTickBehavior, interval_at},
};

/// Table actor handle for sending messages
#[derive(Clone)]
pub struct TableHandle {
    sender: mpsc::Sender<TableMessage>,
}

impl TableHandle {
    /// Create a new table handle
    pub fn new(sender: mpsc::Sender<TableMessage>) -> Self {
        Self { sender }
    }

    /// Send a message to the table
    pub async fn send(&self, message: TableMessage) -> Result<(), TableError> {
        self.sender
            .send(message)
            .await
            .map_err(|_| TableError::Closed)
    }

    /// Connect a participant; events arrive on `events`
    pub async fn join(
        &self,
        events: mpsc::Sender<TableEvent>,
    ) -> Result<ParticipantId, TableError> {
        let (tx, rx) = oneshot::channel();
        self.send(TableMessage::Join {
            events,
            response: tx,
        })
        .await?;
        rx.await.map_err(|_| TableError::NoResponse)
    }

    pub async fn leave(&self, participant_id: ParticipantId) -> Result<(), TableError> {
        self.send(TableMessage::Leave { participant_id }).await
    }

    pub async fn place_bet(
        &self,
        participant_id: ParticipantId,
        bet_key: BetKey,
        amount: i64,
    ) -> Result<TableResponse, TableError> {
        let (tx, rx) = oneshot::channel();
        self.send(TableMessage::PlaceBet {
            participant_id,
            bet_key,
            amount,
            response: tx,
        })
        .await?;
        rx.await.map_err(|_| TableError::NoResponse)
    }

    pub async fn clear_bets(
        &self,
        participant_id: ParticipantId,
    ) -> Result<TableResponse, TableError> {
        let (tx, rx) = oneshot::channel();
        self.send(TableMessage::ClearBets {
            participant_id,
            response: tx,
        })
        .await?;
        rx.await.map_err(|_| TableError::NoResponse)
    }

    pub async fn repeat_last_bets(
        &self,
        participant_id: ParticipantId,
    ) -> Result<TableResponse, TableError> {
        let (tx, rx) = oneshot::channel();
        self.send(TableMessage::RepeatLastBets {
            participant_id,
            response: tx,
        })
        .await?;
        rx.await.map_err(|_| TableError::NoResponse)
    }

    /// Get current table state
    pub async fn state(&self) -> Result<TableStateResponse, TableError> {
        let (tx, rx) = oneshot::channel();
        self.send(TableMessage::GetState { response: tx }).await?;
        rx.await.map_err(|_| TableError::NoResponse)
    }

    /// Advance the clock by one tick outside the timer
    pub async fn tick(&self) -> Result<(), TableError> {
        self.send(TableMessage::Tick).await
    }

    pub async fn shutdown(&self) -> Result<(), TableError> {
        self.send(TableMessage::Shutdown).await
    }
}

/// Events held back for one participant while their channel is full
const BACKLOG_LIMIT: usize = 64;

/// A connected participant
struct Participant {
    account: ParticipantAccount,
    events: mpsc::Sender<TableEvent>,
    /// Events waiting for channel capacity, oldest first
    backlog: VecDeque<TableEvent>,
}

impl Participant {
    fn new(account: ParticipantAccount, events: mpsc::Sender<TableEvent>) -> Self {
        Self {
            account,
            events,
            backlog: VecDeque::new(),
        }
    }

    /// Send an event, keeping order behind any backlog.
    ///
    /// Ticks are dropped when the channel is full; every other event waits
    /// in the backlog. Returns `false` once the participant must be removed.
    fn deliver(&mut self, participant_id: ParticipantId, event: TableEvent) -> bool {
        if !self.flush(participant_id) {
            return false;
        }
        if !self.backlog.is_empty() {
            return self.hold(participant_id, event);
        }

        match self.events.try_send(event) {
            Ok(_) => true,
            Err(mpsc::error::TrySendError::Full(event)) => self.hold(participant_id, event),
            Err(mpsc::error::TrySendError::Closed(_)) => {
                log::debug!("Participant {} disconnected, removing", participant_id);
                false
            }
        }
    }

    fn flush(&mut self, participant_id: ParticipantId) -> bool {
        while let Some(event) = self.backlog.pop_front() {
            match self.events.try_send(event) {
                Ok(_) => {}
                Err(mpsc::error::TrySendError::Full(event)) => {
                    self.backlog.push_front(event);
                    return true;
                }
                Err(mpsc::error::TrySendError::Closed(_)) => {
                    log::debug!("Participant {} disconnected, removing", participant_id);
                    return false;
                }
            }
        }
        true
    }

    fn hold(&mut self, participant_id: ParticipantId, event: TableEvent) -> bool {
        if matches!(event, TableEvent::Tick { .. }) {
            log::warn!("Participant {} channel full, dropping tick", participant_id);
            return true;
        }
        if self.backlog.len() >= BACKLOG_LIMIT {
            log::warn!("Participant {} too far behind, removing", participant_id);
            return false;
        }
        self.backlog.push_back(event);
        true
    }
}

/// Source of winning numbers
type Draw = fn(&mut StdRng) -> WheelNumber;

/// Table actor driving the shared round clock
pub struct TableActor {
    /// Table configuration
    config: TableConfig,

    /// Phase lengths derived from the configuration
    timings: RoundTimings,

    /// Shared round state (sole writer)
    round: RoundState,

    /// Message inbox
    inbox: mpsc::Receiver<TableMessage>,

    /// Connected participants
    participants: HashMap<ParticipantId, Participant>,

    /// Next participant ID
    next_participant_id: ParticipantId,

    /// Winning number source
    rng: StdRng,

    /// Draws one number from `rng`
    draw: Draw,

    /// Is table closed
    is_closed: bool,
}

impl TableActor {
    /// Create a new table actor
    ///
    /// # Returns
    ///
    /// * `(TableActor, TableHandle)` - Actor and handle for sending messages
    pub fn new(config: TableConfig) -> (Self, TableHandle) {
        Self::with_rng(config, StdRng::from_os_rng())
    }

    /// Create a table whose draws are reproducible
    pub fn with_seed(config: TableConfig, seed: u64) -> (Self, TableHandle) {
        Self::with_rng(config, StdRng::seed_from_u64(seed))
    }

    fn with_rng(config: TableConfig, rng: StdRng) -> (Self, TableHandle) {
        let (sender, inbox) = mpsc::channel(100);
        let timings = config.timings();

        let actor = Self {
            round: RoundState::new(&timings),
            timings,
            config,
            inbox,
            participants: HashMap::new(),
            next_participant_id: 1,
            rng,
            draw: random_draw,
            is_closed: false,
        };

        (actor, TableHandle::new(sender))
    }

    /// Run the table actor event loop
    pub async fn run(mut self) {
        log::info!(
            "Table '{}' starting: {}s betting, {}s lockout, {}ms spin",
            self.config.name,
            self.config.betting_window_secs,
            self.config.lockout_secs,
            self.config.spin_duration_ms
        );

        let period = Duration::from_millis(self.config.tick_interval_ms);
        let mut tick_interval = interval_at(Instant::now() + period, period);
        tick_interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                message = self.inbox.recv() => {
                    match message {
                        Some(message) => self.handle_message(message),
                        // Every handle is gone
                        None => break,
                    }

                    if self.is_closed {
                        break;
                    }
                }

                _ = tick_interval.tick() => {
                    self.tick();
                }
            }
        }

        log::info!("Table '{}' closed", self.config.name);
    }

    /// Handle a table message
    fn handle_message(&mut self, message: TableMessage) {
        match message {
            TableMessage::Join { events, response } => {
                let participant_id = self.handle_join(events);
                let _ = response.send(participant_id);
            }

            TableMessage::Leave { participant_id } => {
                self.handle_leave(participant_id);
            }

            TableMessage::PlaceBet {
                participant_id,
                bet_key,
                amount,
                response,
            } => {
                let result = self.handle_place_bet(participant_id, bet_key, amount);
                let _ = response.send(result.into());
            }

            TableMessage::ClearBets {
                participant_id,
                response,
            } => {
                let result = self.handle_clear_bets(participant_id);
                let _ = response.send(result.into());
            }

            TableMessage::RepeatLastBets {
                participant_id,
                response,
            } => {
                let result = self.handle_repeat_last_bets(participant_id);
                let _ = response.send(result.into());
            }

            TableMessage::GetState { response } => {
                let _ = response.send(self.get_state());
            }

            TableMessage::Tick => {
                self.tick();
            }

            TableMessage::Shutdown => {
                self.is_closed = true;
            }
        }
    }

    fn handle_join(&mut self, events: mpsc::Sender<TableEvent>) -> ParticipantId {
        let participant_id = self.next_participant_id;
        self.next_participant_id += 1;

        let account = ParticipantAccount::new(self.config.starting_balance);
        let snapshot = TableEvent::RoundSnapshot {
            participant_id,
            balance: account.balance(),
            phase: self.round.phase(),
            countdown: self.round.countdown(),
            betting_open: self.round.window(&self.timings).is_open(),
            bets: account.bets().clone(),
            recent_numbers: self.round.recent_numbers().collect(),
        };

        self.participants
            .insert(participant_id, Participant::new(account, events));
        self.emit(participant_id, snapshot);

        log::info!(
            "Participant {} joined table '{}' ({} connected)",
            participant_id,
            self.config.name,
            self.participants.len()
        );

        participant_id
    }

    fn handle_leave(&mut self, participant_id: ParticipantId) {
        if let Some(participant) = self.participants.remove(&participant_id) {
            log::info!(
                "Participant {} left with balance {} ({} staked this round)",
                participant_id,
                participant.account.balance(),
                participant.account.bets().total_staked()
            );
        }
    }

    fn account_mut(
        &mut self,
        participant_id: ParticipantId,
    ) -> Result<&mut ParticipantAccount, BetError> {
        self.participants
            .get_mut(&participant_id)
            .map(|p| &mut p.account)
            .ok_or(BetError::UnknownParticipant { participant_id })
    }

    fn handle_place_bet(
        &mut self,
        participant_id: ParticipantId,
        bet_key: BetKey,
        amount: i64,
    ) -> Result<(), BetError> {
        let window = self.round.window(&self.timings);
        // Negative amounts are rejected by the ledger as non-positive
        let amount = Credits::try_from(amount).unwrap_or(0);

        let account = self.account_mut(participant_id)?;
        let new_stake = account.place_bet(window, bet_key, amount)?;
        let balance = account.balance();

        log::debug!(
            "Participant {} staked {} on {} (now {})",
            participant_id,
            amount,
            bet_key,
            new_stake
        );

        self.emit(participant_id, TableEvent::BetAccepted { bet_key, new_stake });
        self.emit(participant_id, TableEvent::BalanceChanged { balance });
        Ok(())
    }

    fn handle_clear_bets(&mut self, participant_id: ParticipantId) -> Result<(), BetError> {
        let window = self.round.window(&self.timings);

        let account = self.account_mut(participant_id)?;
        let refund = account.clear_bets(window)?;
        let balance = account.balance();

        self.emit(participant_id, TableEvent::BetsCleared);
        if refund > 0 {
            self.emit(participant_id, TableEvent::BalanceChanged { balance });
        }
        Ok(())
    }

    fn handle_repeat_last_bets(&mut self, participant_id: ParticipantId) -> Result<(), BetError> {
        let window = self.round.window(&self.timings);

        let account = self.account_mut(participant_id)?;
        let accepted: Vec<TableEvent> = account
            .repeat_last_bets(window)?
            .iter()
            .map(|(&bet_key, &new_stake)| TableEvent::BetAccepted { bet_key, new_stake })
            .collect();
        let balance = account.balance();

        self.emit(participant_id, TableEvent::BetsCleared);
        for event in accepted {
            self.emit(participant_id, event);
        }
        self.emit(participant_id, TableEvent::BalanceChanged { balance });
        Ok(())
    }

    /// Get current table state
    fn get_state(&self) -> TableStateResponse {
        TableStateResponse {
            table_name: self.config.name.clone(),
            round_id: self.round.round_id(),
            phase: self.round.phase(),
            countdown: self.round.countdown(),
            betting_open: self.round.window(&self.timings).is_open(),
            participant_count: self.participants.len(),
            recent_numbers: self.round.recent_numbers().collect(),
        }
    }

    /// Advance the round clock (called periodically)
    ///
    /// The step runs on a copy of the round state and is committed only when
    /// it succeeds. A failed or panicking step leaves the previous state in
    /// place; the tick broadcast still goes out.
    fn tick(&mut self) {
        let mut next = self.round.clone();
        let timings = self.timings;
        let draw = self.draw;
        let rng = &mut self.rng;

        let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
            next.advance(&timings, || draw(rng))
        }))
        .unwrap_or_else(|payload| Err(RoundError::Panicked(panic_message(payload.as_ref()))));

        match outcome {
            Ok(transition) => {
                self.round = next;
                self.apply_transition(transition);
            }
            Err(e) => {
                log::error!("Table '{}': tick aborted: {}", self.config.name, e);
                if self.round.check(&self.timings).is_err() {
                    self.round.repair(&self.timings);
                    log::warn!(
                        "Table '{}': round state re-derived as {} with {}s left",
                        self.config.name,
                        self.round.phase(),
                        self.round.countdown()
                    );
                }
            }
        }

        self.broadcast(TableEvent::Tick {
            countdown: self.round.countdown(),
            phase: self.round.phase(),
        });
    }

    fn apply_transition(&mut self, transition: Transition) {
        match transition {
            Transition::Countdown => {}

            Transition::SpinStarted { winning_number } => {
                log::debug!(
                    "Table '{}' round {}: spinning, drew {}",
                    self.config.name,
                    self.round.round_id(),
                    winning_number
                );
                self.broadcast(TableEvent::SpinStarted {
                    spin_duration_ms: self.config.spin_duration_ms,
                });
            }

            Transition::SpinResolved {
                round_id,
                winning_number,
            } => {
                log::info!(
                    "Table '{}' round {}: ball landed on {} {}",
                    self.config.name,
                    round_id,
                    color_of(winning_number),
                    winning_number
                );
                self.broadcast(TableEvent::SpinResolved {
                    winning_number,
                    wheel_position: wheel_position(winning_number),
                    color: color_of(winning_number),
                });
                self.settle_all(round_id, winning_number);
            }
        }
    }

    /// Settle every connected participant for `round_id`
    fn settle_all(&mut self, round_id: RoundId, winning_number: WheelNumber) {
        let mut table_staked: Credits = 0;
        let mut table_returned: Credits = 0;
        let mut disconnected = Vec::new();

        for (&participant_id, participant) in self.participants.iter_mut() {
            let settlement = resolve(participant.account.bets(), winning_number);

            if let Err(e) = participant.account.settle_round(round_id, &settlement) {
                log::warn!(
                    "Participant {} not settled for round {}: {}",
                    participant_id,
                    round_id,
                    e
                );
                continue;
            }

            table_staked = table_staked.saturating_add(settlement.total_staked);
            table_returned = table_returned.saturating_add(settlement.total_return);

            let balance = participant.account.balance();
            let mut events = vec![TableEvent::SettlementResult {
                balance,
                net_change: settlement.net_change(),
                per_bet_settlement: settlement.per_bet,
            }];
            if settlement.total_return > 0 {
                events.push(TableEvent::BalanceChanged { balance });
            }

            for event in events {
                if !participant.deliver(participant_id, event) {
                    disconnected.push(participant_id);
                    break;
                }
            }
        }

        for participant_id in disconnected {
            self.handle_leave(participant_id);
        }

        log::debug!(
            "Table '{}' round {} settled: {} staked, {} returned",
            self.config.name,
            round_id,
            table_staked,
            table_returned
        );
    }

    /// Send an event to one participant, dropping them if disconnected
    fn emit(&mut self, participant_id: ParticipantId, event: TableEvent) {
        let connected = match self.participants.get_mut(&participant_id) {
            Some(participant) => participant.deliver(participant_id, event),
            None => return,
        };
        if !connected {
            self.handle_leave(participant_id);
        }
    }

    /// Broadcast an event to all participants
    fn broadcast(&mut self, event: TableEvent) {
        self.participants.retain(|&participant_id, participant| {
            participant.deliver(participant_id, event.clone())
        });
    }
}

fn random_draw(rng: &mut StdRng) -> WheelNumber {
    WheelNumber::random(rng)
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::round::Phase;

    /// Ticks only arrive through `TableHandle::tick`.
    fn manual_clock_config() -> TableConfig {
        TableConfig {
            tick_interval_ms: 3_600_000,
            event_buffer: 512,
            ..Default::default()
        }
    }

    async fn spawn_table() -> TableHandle {
        let (actor, handle) = TableActor::with_seed(manual_clock_config(), 7);
        tokio::spawn(actor.run());
        handle
    }

    async fn connect(handle: &TableHandle) -> (ParticipantId, mpsc::Receiver<TableEvent>) {
        let (tx, rx) = mpsc::channel(512);
        let id = handle.join(tx).await.unwrap();
        (id, rx)
    }

    async fn ticks(handle: &TableHandle, n: usize) {
        for _ in 0..n {
            handle.tick().await.unwrap();
        }
        // Round trip so every tick has been processed
        handle.state().await.unwrap();
    }

    fn drain(rx: &mut mpsc::Receiver<TableEvent>) -> Vec<TableEvent> {
        let mut events = Vec::new();
        while let Ok(event) = rx.try_recv() {
            events.push(event);
        }
        events
    }

    #[tokio::test]
    async fn test_join_sends_snapshot() {
        let handle = spawn_table().await;
        let (id, mut rx) = connect(&handle).await;

        let events = drain(&mut rx);
        assert_eq!(
            events,
            vec![TableEvent::RoundSnapshot {
                participant_id: id,
                balance: 1000,
                phase: Phase::Betting,
                countdown: 30,
                betting_open: true,
                bets: Default::default(),
                recent_numbers: vec![],
            }]
        );
    }

    #[tokio::test]
    async fn test_place_bet_emits_events() {
        let handle = spawn_table().await;
        let (id, mut rx) = connect(&handle).await;
        drain(&mut rx);

        let response = handle.place_bet(id, BetKey::Red, 50).await.unwrap();
        assert!(response.is_success());
        let response = handle.place_bet(id, BetKey::Red, 25).await.unwrap();
        assert!(response.is_success());

        let events = drain(&mut rx);
        assert_eq!(
            events,
            vec![
                TableEvent::BetAccepted {
                    bet_key: BetKey::Red,
                    new_stake: 50
                },
                TableEvent::BalanceChanged { balance: 950 },
                TableEvent::BetAccepted {
                    bet_key: BetKey::Red,
                    new_stake: 75
                },
                TableEvent::BalanceChanged { balance: 925 },
            ]
        );
    }

    #[tokio::test]
    async fn test_negative_amount_is_invalid() {
        let handle = spawn_table().await;
        let (id, mut rx) = connect(&handle).await;
        drain(&mut rx);

        let response = handle.place_bet(id, BetKey::Odd, -10).await.unwrap();
        assert!(matches!(
            response,
            TableResponse::Rejected(BetError::InvalidBet { .. })
        ));
        assert!(drain(&mut rx).is_empty());
    }

    #[tokio::test]
    async fn test_lockout_rejects_bets() {
        let handle = spawn_table().await;
        let (id, mut rx) = connect(&handle).await;

        ticks(&handle, 24).await;
        assert!(handle.state().await.unwrap().betting_open);
        ticks(&handle, 1).await;

        let state = handle.state().await.unwrap();
        assert_eq!(state.phase, Phase::Betting);
        assert_eq!(state.countdown, 5);
        assert!(!state.betting_open);

        drain(&mut rx);
        for response in [
            handle.place_bet(id, BetKey::Red, 10).await.unwrap(),
            handle.clear_bets(id).await.unwrap(),
            handle.repeat_last_bets(id).await.unwrap(),
        ] {
            assert_eq!(response, TableResponse::Rejected(BetError::WindowClosed));
        }
        assert!(drain(&mut rx).is_empty());
    }

    #[tokio::test]
    async fn test_full_round_settles_every_participant() {
        let handle = spawn_table().await;
        let (alice, mut alice_rx) = connect(&handle).await;
        let (bob, mut bob_rx) = connect(&handle).await;

        handle.place_bet(alice, BetKey::Red, 50).await.unwrap();
        handle
            .place_bet(alice, BetKey::single(7).unwrap(), 10)
            .await
            .unwrap();
        handle.place_bet(bob, BetKey::Even, 20).await.unwrap();

        drain(&mut alice_rx);
        drain(&mut bob_rx);

        // 30 betting ticks + 5 spinning ticks
        ticks(&handle, 35).await;

        let alice_events = drain(&mut alice_rx);
        let bob_events = drain(&mut bob_rx);

        let tick_count = alice_events
            .iter()
            .filter(|e| matches!(e, TableEvent::Tick { .. }))
            .count();
        assert_eq!(tick_count, 35);

        let spinning_ticks = alice_events
            .iter()
            .filter(|e| {
                matches!(
                    e,
                    TableEvent::Tick {
                        phase: Phase::Spinning,
                        ..
                    }
                )
            })
            .count();
        assert_eq!(spinning_ticks, 5);

        let winning = alice_events
            .iter()
            .find_map(|e| match e {
                TableEvent::SpinResolved { winning_number, .. } => Some(*winning_number),
                _ => None,
            })
            .expect("spin resolved");

        assert!(alice_events.contains(&TableEvent::SpinStarted {
            spin_duration_ms: 4500
        }));

        let expected_alice: crate::game::ledger::BetLedger =
            [(BetKey::Red, 50), (BetKey::single(7).unwrap(), 10)]
                .into_iter()
                .collect();
        let expected = resolve(&expected_alice, winning);

        let settlement = alice_events
            .iter()
            .find_map(|e| match e {
                TableEvent::SettlementResult {
                    balance,
                    net_change,
                    ..
                } => Some((*balance, *net_change)),
                _ => None,
            })
            .expect("alice settled");
        assert_eq!(settlement.0, 940 + expected.total_return);
        assert_eq!(settlement.1, expected.net_change());

        let bob_settlements = bob_events
            .iter()
            .filter(|e| matches!(e, TableEvent::SettlementResult { .. }))
            .count();
        assert_eq!(bob_settlements, 1);

        let state = handle.state().await.unwrap();
        assert_eq!(state.round_id, 2);
        assert_eq!(state.phase, Phase::Betting);
        assert_eq!(state.countdown, 30);
        assert_eq!(state.recent_numbers, vec![winning]);

        // Last round is now repeatable
        let response = handle.repeat_last_bets(alice).await.unwrap();
        assert!(response.is_success());
        let response = handle.repeat_last_bets(bob).await.unwrap();
        assert!(response.is_success());
    }

    #[tokio::test]
    async fn test_participant_without_bets_still_settles() {
        let handle = spawn_table().await;
        let (_id, mut rx) = connect(&handle).await;
        ticks(&handle, 35).await;

        let events = drain(&mut rx);
        assert!(events.contains(&TableEvent::SettlementResult {
            balance: 1000,
            net_change: 0,
            per_bet_settlement: Default::default(),
        }));
    }

    #[tokio::test]
    async fn test_unknown_participant() {
        let handle = spawn_table().await;
        let response = handle.place_bet(99, BetKey::Red, 10).await.unwrap();
        assert_eq!(
            response,
            TableResponse::Rejected(BetError::UnknownParticipant { participant_id: 99 })
        );
    }

    #[tokio::test]
    async fn test_leave_and_dropped_receivers() {
        let handle = spawn_table().await;
        let (alice, _alice_rx) = connect(&handle).await;
        let (_bob, bob_rx) = connect(&handle).await;
        assert_eq!(handle.state().await.unwrap().participant_count, 2);

        handle.leave(alice).await.unwrap();
        assert_eq!(handle.state().await.unwrap().participant_count, 1);

        // Bob's receiver is dropped; the next tick unregisters him
        drop(bob_rx);
        ticks(&handle, 1).await;
        assert_eq!(handle.state().await.unwrap().participant_count, 0);
    }

    #[tokio::test]
    async fn test_shutdown_closes_handle() {
        let (actor, handle) = TableActor::with_seed(manual_clock_config(), 1);
        let task = tokio::spawn(actor.run());
        handle.shutdown().await.unwrap();
        task.await.unwrap();
        assert_eq!(handle.state().await, Err(TableError::Closed));
    }

    #[tokio::test]
    async fn test_timer_drives_clock() {
        let config = TableConfig {
            tick_interval_ms: 10,
            ..manual_clock_config()
        };
        let (actor, handle) = TableActor::with_seed(config, 3);
        tokio::spawn(actor.run());
        let (_id, mut rx) = connect(&handle).await;

        let mut saw_tick = false;
        for _ in 0..3 {
            if let Some(TableEvent::Tick { .. }) = rx.recv().await {
                saw_tick = true;
                break;
            }
        }
        assert!(saw_tick);
    }

    #[tokio::test]
    async fn test_faulted_tick_repairs_and_still_broadcasts() {
        let (mut actor, _handle) = TableActor::with_seed(manual_clock_config(), 5);
        let (tx, mut rx) = mpsc::channel(16);
        actor.handle_join(tx);
        drain(&mut rx);

        // Countdown of 30 is out of range for a 10 second betting phase
        actor.timings.betting_secs = 10;
        assert!(actor.round.check(&actor.timings).is_err());

        actor.tick();
        assert!(actor.round.check(&actor.timings).is_ok());
        assert_eq!(actor.round.phase(), Phase::Betting);
        assert_eq!(actor.round.countdown(), 10);
        assert_eq!(
            drain(&mut rx),
            vec![TableEvent::Tick {
                countdown: 10,
                phase: Phase::Betting
            }]
        );
    }

    fn failing_draw(_: &mut StdRng) -> WheelNumber {
        panic!("draw failed")
    }

    #[tokio::test]
    async fn test_panicking_draw_keeps_state_and_broadcasts() {
        let (mut actor, _handle) = TableActor::with_seed(manual_clock_config(), 5);
        let (tx, mut rx) = mpsc::channel(64);
        actor.handle_join(tx);

        for _ in 0..29 {
            actor.tick();
        }
        drain(&mut rx);
        let before = actor.round.clone();
        assert_eq!(before.countdown(), 1);

        // The next tick reaches zero and draws
        actor.draw = failing_draw;
        actor.tick();
        assert_eq!(actor.round, before);
        assert_eq!(
            drain(&mut rx),
            vec![TableEvent::Tick {
                countdown: 1,
                phase: Phase::Betting
            }]
        );

        actor.draw = random_draw;
        actor.tick();
        assert_eq!(actor.round.phase(), Phase::Spinning);
        assert!(
            drain(&mut rx).contains(&TableEvent::SpinStarted {
                spin_duration_ms: 4500
            })
        );
    }

    #[tokio::test]
    async fn test_full_channel_still_receives_settlement() {
        let handle = spawn_table().await;
        let (tx, mut rx) = mpsc::channel(8);
        let id = handle.join(tx).await.unwrap();
        handle.place_bet(id, BetKey::Red, 10).await.unwrap();

        // Nothing is read for a whole round
        ticks(&handle, 35).await;
        let mut events = drain(&mut rx);
        assert_eq!(events.len(), 8);
        assert_eq!(handle.state().await.unwrap().participant_count, 1);

        // The next delivery sends the held events first, in order
        ticks(&handle, 1).await;
        let late = drain(&mut rx);
        assert!(matches!(late[0], TableEvent::SpinStarted { .. }));
        assert!(matches!(late[1], TableEvent::SpinResolved { .. }));
        assert!(matches!(late[2], TableEvent::SettlementResult { .. }));
        assert!(matches!(late.last(), Some(TableEvent::Tick { countdown: 29, .. })));
        events.extend(late);

        let settlements = events
            .iter()
            .filter(|e| matches!(e, TableEvent::SettlementResult { .. }))
            .count();
        assert_eq!(settlements, 1);
    }

    #[test]
    fn test_backlog_drops_ticks_and_overflows() {
        let (tx, _rx) = mpsc::channel(1);
        let mut participant = Participant::new(ParticipantAccount::new(1000), tx);

        assert!(participant.deliver(1, TableEvent::BetsCleared));
        assert!(participant.deliver(
            1,
            TableEvent::Tick {
                countdown: 3,
                phase: Phase::Betting
            }
        ));
        assert!(participant.backlog.is_empty());

        for balance in 0..BACKLOG_LIMIT as Credits {
            assert!(participant.deliver(1, TableEvent::BalanceChanged { balance }));
        }
        assert_eq!(participant.backlog.len(), BACKLOG_LIMIT);
        assert!(!participant.deliver(1, TableEvent::BetsCleared));
    }

    #[test]
    fn test_backlog_flushes_in_order() {
        let (tx, mut rx) = mpsc::channel(2);
        let mut participant = Participant::new(ParticipantAccount::new(1000), tx);

        for balance in 0..4 {
            assert!(participant.deliver(1, TableEvent::BalanceChanged { balance }));
        }
        assert_eq!(participant.backlog.len(), 2);

        drain(&mut rx);
        assert!(participant.deliver(1, TableEvent::BetsCleared));
        assert_eq!(
            drain(&mut rx),
            vec![
                TableEvent::BalanceChanged { balance: 2 },
                TableEvent::BalanceChanged { balance: 3 },
            ]
        );
        assert_eq!(
            participant.backlog.iter().cloned().collect::<Vec<_>>(),
            vec![TableEvent::BetsCleared]
        );
    }

    #[test]
    fn test_panic_message_extraction() {
        let payload: Box<dyn Any + Send> = Box::new("boom");
        assert_eq!(panic_message(payload.as_ref()), "boom");
        let payload: Box<dyn Any + Send> = Box::new(String::from("bang"));
        assert_eq!(panic_message(payload.as_ref()), "bang");
        let payload: Box<dyn Any + Send> = Box::new(5u8);
        assert_eq!(panic_message(payload.as_ref()), "unknown panic");
    }
}
