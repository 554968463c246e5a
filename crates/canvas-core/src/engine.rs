//! The canvas engine: one owned state object behind one lock.
//!
//! [`CanvasEngine`] holds the round clock, participant ledger, cell grid,
//! placement gate, and boost audit log in a single [`CanvasState`] guarded
//! by one mutex. Every operation runs its whole read-modify-write sequence
//! under that lock:
//!
//! 1. advance the round clock if due (publishing `round_advanced`),
//! 2. validate and apply the operation's mutation,
//! 3. publish the resulting event,
//! 4. return a value snapshot.
//!
//! Locking the grid and the gate separately would let two placements from
//! the same participant interleave and both pass the round check, so they
//! are never split.
//!
//! Events are published before the state lock is released. That keeps the
//! event stream in exactly the order operations committed. Listeners are
//! non-blocking (see [`crate::bus`]), so this never stalls writers on a
//! slow observer.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use canvas_ledger::{BoostAudit, LedgerError, ParticipantLedger};
use canvas_types::{
    BoostRecord, CanvasEvent, CanvasSnapshot, Cell, Color, Participant, ParticipantId,
    ParticipantSnapshot, RoundState, TransactionId,
};
use chrono::{DateTime, TimeDelta, Utc};
use tracing::{debug, info};

use crate::boost::BoostLevel;
use crate::bus::{EventBus, EventListener, Subscription};
use crate::clock::{ClockError, RoundClock};
use crate::config::{CanvasConfig, ConfigError};
use crate::error::CanvasError;
use crate::gate::PlacementGate;
use crate::grid::CellGrid;
use crate::seed::SeedPlan;
use crate::time::{SystemTime, TimeSource};

/// Fixed canvas rules for one engine instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineSettings {
    /// Grid dimension N.
    pub grid_size: u32,
    /// Round length.
    pub round_duration: TimeDelta,
    /// Tokens granted at first registration.
    pub initial_balance: u32,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            grid_size: 32,
            round_duration: TimeDelta::milliseconds(60_000),
            initial_balance: 5,
        }
    }
}

impl EngineSettings {
    /// Derive settings from the loaded configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] if the configuration is out of range.
    pub fn from_config(config: &CanvasConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            grid_size: config.grid_size,
            round_duration: config.round_duration()?,
            initial_balance: config.initial_balance,
        })
    }
}

/// Everything the engine mutates. Only ever touched under the engine lock.
#[derive(Debug)]
struct CanvasState {
    clock: RoundClock,
    ledger: ParticipantLedger,
    grid: CellGrid,
    gate: PlacementGate,
    audit: BoostAudit,
}

/// The canvas state engine.
///
/// Share it across request handlers with an [`Arc`].
pub struct CanvasEngine {
    state: Mutex<CanvasState>,
    bus: EventBus,
    time: Arc<dyn TimeSource>,
}

impl core::fmt::Debug for CanvasEngine {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("CanvasEngine")
            .field("state", &self.state)
            .field("bus", &self.bus)
            .finish_non_exhaustive()
    }
}

impl CanvasEngine {
    /// Create an engine whose round 1 starts now, per `time`.
    ///
    /// # Errors
    ///
    /// Returns [`ClockError`] if the round duration is not positive.
    pub fn new(settings: EngineSettings, time: Arc<dyn TimeSource>) -> Result<Self, ClockError> {
        let clock = RoundClock::new(settings.round_duration, time.now())?;
        info!(
            grid_size = settings.grid_size,
            round_duration_ms = settings.round_duration.num_milliseconds(),
            initial_balance = settings.initial_balance,
            "canvas engine created"
        );
        Ok(Self {
            state: Mutex::new(CanvasState {
                clock,
                ledger: ParticipantLedger::new(settings.initial_balance),
                grid: CellGrid::new(settings.grid_size),
                gate: PlacementGate::new(),
                audit: BoostAudit::new(),
            }),
            bus: EventBus::new(),
            time,
        })
    }

    /// Create an engine on wall-clock time.
    ///
    /// # Errors
    ///
    /// Returns [`ClockError`] if the round duration is not positive.
    pub fn with_system_time(settings: EngineSettings) -> Result<Self, ClockError> {
        Self::new(settings, Arc::new(SystemTime))
    }

    fn lock(&self) -> MutexGuard<'_, CanvasState> {
        // Every critical section validates before it mutates, so a poisoned
        // lock still guards consistent state.
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Advance the round if due and publish the transition.
    fn advance_clock(&self, state: &mut CanvasState, now: DateTime<Utc>) {
        if let Some(advance) = state.clock.advance_if_due(now) {
            info!(round = advance.round, ends_at = %advance.ends_at, "round advanced");
            self.bus.publish(
                CanvasEvent::RoundAdvanced {
                    round: advance.round,
                    ends_at: advance.ends_at,
                },
                now,
            );
        }
    }

    // -----------------------------------------------------------------------
    // Mutations
    // -----------------------------------------------------------------------

    /// Register a participant, or return the existing record unchanged.
    ///
    /// Publishes `participant_joined` only for a new participant. Never
    /// fails.
    pub fn register(&self, id: &ParticipantId, display_name: &str) -> Participant {
        let now = self.time.now();
        let mut state = self.lock();
        self.advance_clock(&mut state, now);

        let registration = state.ledger.register(id, display_name, now);
        if registration.created {
            info!(participant_id = %id, display_name, "participant joined");
            self.bus.publish(
                CanvasEvent::ParticipantJoined {
                    id: id.clone(),
                    display_name: registration.participant.display_name.clone(),
                },
                now,
            );
        }
        registration.participant
    }

    /// Place a cell, replacing whatever occupied the coordinate.
    ///
    /// # Errors
    ///
    /// In check order: [`CanvasError::NotRegistered`],
    /// [`CanvasError::OutOfBounds`], [`CanvasError::RoundExhausted`]. On
    /// error the grid and gate are unchanged.
    pub fn place(
        &self,
        id: &ParticipantId,
        x: i64,
        y: i64,
        color: Color,
    ) -> Result<Cell, CanvasError> {
        let now = self.time.now();
        let mut state = self.lock();
        self.advance_clock(&mut state, now);

        let result = Self::apply_place(&mut state, id, x, y, color, now);
        match &result {
            Ok(cell) => {
                info!(
                    participant_id = %id,
                    x = cell.x,
                    y = cell.y,
                    color = %cell.color,
                    round = cell.round,
                    "pixel placed"
                );
                self.bus
                    .publish(CanvasEvent::PixelPlaced { cell: cell.clone() }, now);
            }
            Err(e) => debug!(participant_id = %id, x, y, kind = e.kind(), "placement rejected"),
        }
        result
    }

    fn apply_place(
        state: &mut CanvasState,
        id: &ParticipantId,
        x: i64,
        y: i64,
        color: Color,
        now: DateTime<Utc>,
    ) -> Result<Cell, CanvasError> {
        let owner_name = state
            .ledger
            .get(id)
            .map(|p| p.display_name.clone())
            .ok_or_else(|| CanvasError::NotRegistered {
                participant_id: id.clone(),
            })?;

        let coord = state
            .grid
            .coord(x, y)
            .ok_or_else(|| CanvasError::OutOfBounds {
                x,
                y,
                grid_size: state.grid.size(),
            })?;

        let round = state.clock.current_round();
        if !state.gate.may_place(id, round) {
            return Err(CanvasError::RoundExhausted { round });
        }

        let cell = Cell {
            x: coord.x,
            y: coord.y,
            color,
            owner_id: id.clone(),
            owner_name,
            intensity: 0,
            placed_at: now,
            round,
        };
        state.grid.place(cell.clone());
        state.gate.record(id, round);
        Ok(cell)
    }

    /// Spend `level` tokens to raise a cell's intensity by `level`,
    /// saturating at 3.
    ///
    /// Any registered participant may boost any cell. Boosting does not use
    /// up the round's placement. The full cost is charged even when the
    /// cell is already at the cap. `transaction_id` is recorded in the
    /// audit log as given.
    ///
    /// # Errors
    ///
    /// In check order: [`CanvasError::NotRegistered`],
    /// [`CanvasError::NoCellAtPosition`], [`CanvasError::InvalidLevel`],
    /// [`CanvasError::InsufficientBalance`]. On error neither the balance
    /// nor the cell is changed.
    pub fn boost(
        &self,
        id: &ParticipantId,
        x: i64,
        y: i64,
        level: i64,
        transaction_id: TransactionId,
    ) -> Result<Cell, CanvasError> {
        let now = self.time.now();
        let mut state = self.lock();
        self.advance_clock(&mut state, now);

        let result = Self::apply_boost(&mut state, id, x, y, level, transaction_id, now);
        match &result {
            Ok(cell) => {
                info!(
                    participant_id = %id,
                    x = cell.x,
                    y = cell.y,
                    level,
                    intensity = cell.intensity,
                    "pixel boosted"
                );
                self.bus
                    .publish(CanvasEvent::PixelBoosted { cell: cell.clone() }, now);
            }
            Err(e) => debug!(participant_id = %id, x, y, level, kind = e.kind(), "boost rejected"),
        }
        result
    }

    fn apply_boost(
        state: &mut CanvasState,
        id: &ParticipantId,
        x: i64,
        y: i64,
        level: i64,
        transaction_id: TransactionId,
        now: DateTime<Utc>,
    ) -> Result<Cell, CanvasError> {
        if !state.ledger.contains(id) {
            return Err(CanvasError::NotRegistered {
                participant_id: id.clone(),
            });
        }

        let coord = state
            .grid
            .coord(x, y)
            .filter(|c| state.grid.get(*c).is_some())
            .ok_or(CanvasError::NoCellAtPosition { x, y })?;

        let level = BoostLevel::try_from(level)?;
        let cost = level.cost();

        let cell = state
            .grid
            .get_mut(coord)
            .ok_or_else(|| CanvasError::no_cell(coord))?;

        state.ledger.debit(id, cost).map_err(|e| match e {
            LedgerError::InsufficientBalance { balance, amount } => {
                CanvasError::InsufficientBalance {
                    balance,
                    cost: amount,
                }
            }
            LedgerError::UnknownParticipant(participant_id) => {
                CanvasError::NotRegistered { participant_id }
            }
        })?;

        cell.intensity = level.apply(cell.intensity);
        let boosted = cell.clone();

        state.audit.append(BoostRecord {
            participant_id: id.clone(),
            coord,
            level: level.get(),
            cost,
            transaction_id,
            round: state.clock.current_round(),
            at: now,
        });

        Ok(boosted)
    }

    /// Load founding participants and pre-existing cells.
    ///
    /// Publishes nothing and consumes no placement slots. Cells outside the
    /// grid are skipped. In-bounds cells are placed even when their owner is
    /// not a registered participant. Returns the number of cells placed.
    pub fn seed(&self, plan: &SeedPlan) -> usize {
        let now = self.time.now();
        let mut state = self.lock();

        for (id, name) in &plan.participants {
            state.ledger.register(id, name, now);
        }

        let mut placed = 0_usize;
        for cell in &plan.cells {
            let in_bounds = state
                .grid
                .coord(i64::from(cell.x), i64::from(cell.y))
                .is_some();
            if in_bounds {
                state.grid.place(cell.clone());
                placed = placed.saturating_add(1);
            }
        }

        info!(
            participants = plan.participants.len(),
            cells = placed,
            "canvas seeded"
        );
        placed
    }

    // -----------------------------------------------------------------------
    // Reads
    // -----------------------------------------------------------------------

    /// Consistent snapshot of the whole canvas.
    pub fn canvas_snapshot(&self) -> CanvasSnapshot {
        let now = self.time.now();
        let mut state = self.lock();
        self.advance_clock(&mut state, now);

        let size = state.grid.size();
        CanvasSnapshot {
            width: size,
            height: size,
            cells: state.grid.cells().cloned().collect(),
            current_round: state.clock.current_round(),
            round_ends_at: state.clock.round_ends_at(),
            total_cells_placed: widen(state.grid.len()),
            participant_count: widen(state.ledger.len()),
            last_seq: self.bus.last_seq(),
        }
    }

    /// Consistent snapshot of one participant, or `None` if unknown.
    pub fn participant_snapshot(&self, id: &ParticipantId) -> Option<ParticipantSnapshot> {
        let now = self.time.now();
        let mut state = self.lock();
        self.advance_clock(&mut state, now);

        let balance = state.ledger.balance(id)?;
        let round = state.clock.current_round();
        Some(ParticipantSnapshot {
            balance,
            cells_owned: widen(state.grid.owned_by(id)),
            can_place_this_round: state.gate.may_place(id, round),
            last_placed_round: state.gate.last_placed_round(id),
        })
    }

    /// Look up a participant record.
    pub fn participant(&self, id: &ParticipantId) -> Option<Participant> {
        self.lock().ledger.get(id).cloned()
    }

    /// Current round state, after advancing if due.
    pub fn round_state(&self) -> RoundState {
        let now = self.time.now();
        let mut state = self.lock();
        self.advance_clock(&mut state, now);
        state.clock.state()
    }

    /// Boosts paid for by `id`, oldest first.
    pub fn boost_history(&self, id: &ParticipantId) -> Vec<BoostRecord> {
        self.lock().audit.boosts_by(id).cloned().collect()
    }

    /// Grid dimension N.
    pub fn grid_size(&self) -> u32 {
        self.lock().grid.size()
    }

    /// The current time, per this engine's time source.
    pub fn now(&self) -> DateTime<Utc> {
        self.time.now()
    }

    // -----------------------------------------------------------------------
    // Events
    // -----------------------------------------------------------------------

    /// Register an event listener. Dropping the handle unsubscribes.
    pub fn subscribe(&self, listener: impl EventListener + 'static) -> Subscription {
        self.bus.subscribe(listener)
    }

    /// Register an event listener and return the sequence number of the
    /// last event published before it, read atomically with the
    /// registration.
    pub fn subscribe_at(&self, listener: impl EventListener + 'static) -> (Subscription, u64) {
        self.bus.subscribe_at(listener)
    }

    /// The engine's event bus.
    pub const fn bus(&self) -> &EventBus {
        &self.bus
    }
}

fn widen(n: usize) -> u64 {
    u64::try_from(n).unwrap_or(u64::MAX)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Mutex as StdMutex;

    use canvas_types::EventEnvelope;

    use super::*;
    use crate::bus::ListenerError;
    use crate::time::ManualTime;

    fn engine() -> (CanvasEngine, Arc<ManualTime>) {
        let time = Arc::new(ManualTime::new(Utc::now()));
        let engine = CanvasEngine::new(EngineSettings::default(), time.clone()).unwrap();
        (engine, time)
    }

    fn pid(s: &str) -> ParticipantId {
        ParticipantId::new(s)
    }

    fn tx() -> TransactionId {
        TransactionId::new("tx_test")
    }

    fn record_events(engine: &CanvasEngine) -> (Arc<StdMutex<Vec<EventEnvelope>>>, Subscription) {
        let log = Arc::new(StdMutex::new(Vec::new()));
        let sink = Arc::clone(&log);
        let sub = engine.subscribe(move |e: &EventEnvelope| -> Result<(), ListenerError> {
            sink.lock().unwrap().push(e.clone());
            Ok(())
        });
        (log, sub)
    }

    #[test]
    fn place_then_same_round_is_exhausted() {
        let (engine, time) = engine();
        engine.register(&pid("u1"), "One");

        let cell = engine.place(&pid("u1"), 5, 5, Color::Red).unwrap();
        assert_eq!((cell.x, cell.y, cell.color, cell.intensity, cell.round), (5, 5, Color::Red, 0, 1));

        let err = engine.place(&pid("u1"), 6, 6, Color::Lime).unwrap_err();
        assert_eq!(err, CanvasError::RoundExhausted { round: 1 });
        assert_eq!(engine.canvas_snapshot().cells.len(), 1);

        time.advance(TimeDelta::milliseconds(60_000));
        let cell = engine.place(&pid("u1"), 6, 6, Color::Lime).unwrap();
        assert_eq!(cell.round, 2);
    }

    #[test]
    fn unknown_participant_cannot_place() {
        let (engine, _) = engine();
        let err = engine.place(&pid("ghost"), 1, 1, Color::Red).unwrap_err();
        assert_eq!(
            err,
            CanvasError::NotRegistered {
                participant_id: pid("ghost")
            }
        );
    }

    #[test]
    fn out_of_bounds_leaves_grid_and_gate_untouched() {
        let (engine, _) = engine();
        engine.register(&pid("u1"), "One");
        for (x, y) in [(32, 0), (0, 32), (-1, 0), (0, -7)] {
            let err = engine.place(&pid("u1"), x, y, Color::White).unwrap_err();
            assert_eq!(err.kind(), "out_of_bounds");
        }
        assert!(engine.canvas_snapshot().cells.is_empty());
        assert!(engine.participant_snapshot(&pid("u1")).unwrap().can_place_this_round);
    }

    #[test]
    fn not_registered_is_checked_before_bounds() {
        let (engine, _) = engine();
        let err = engine.place(&pid("ghost"), 99, 99, Color::Red).unwrap_err();
        assert_eq!(err.kind(), "not_registered");
    }

    #[test]
    fn last_writer_wins_and_takes_ownership() {
        let (engine, _) = engine();
        engine.register(&pid("u1"), "One");
        engine.register(&pid("u2"), "Two");
        engine.place(&pid("u1"), 3, 3, Color::Red).unwrap();
        engine.boost(&pid("u1"), 3, 3, 2, tx()).unwrap();
        engine.place(&pid("u2"), 3, 3, Color::Blue).unwrap();

        let snapshot = engine.canvas_snapshot();
        assert_eq!(snapshot.cells.len(), 1);
        let cell = snapshot.cells.first().unwrap();
        assert_eq!(cell.owner_id, pid("u2"));
        assert_eq!(cell.owner_name, "Two");
        assert_eq!(cell.color, Color::Blue);
        assert_eq!(cell.intensity, 0);
        assert_eq!(engine.participant_snapshot(&pid("u1")).unwrap().cells_owned, 0);
    }

    #[test]
    fn boost_debits_and_saturates() {
        let (engine, _) = engine();
        engine.register(&pid("u1"), "One");
        engine.register(&pid("u2"), "Two");
        engine.place(&pid("u1"), 5, 5, Color::Red).unwrap();

        let cell = engine.boost(&pid("u2"), 5, 5, 2, tx()).unwrap();
        assert_eq!(cell.intensity, 2);
        assert_eq!(engine.participant_snapshot(&pid("u2")).unwrap().balance, 3);

        let cell = engine.boost(&pid("u2"), 5, 5, 2, tx()).unwrap();
        assert_eq!(cell.intensity, 3);
        assert_eq!(engine.participant_snapshot(&pid("u2")).unwrap().balance, 1);
        assert_eq!(cell.owner_id, pid("u1"));
    }

    #[test]
    fn boost_at_cap_still_charges_full_cost() {
        let (engine, _) = engine();
        engine.register(&pid("u1"), "One");
        engine.place(&pid("u1"), 0, 0, Color::Red).unwrap();
        engine.boost(&pid("u1"), 0, 0, 3, tx()).unwrap();
        let cell = engine.boost(&pid("u1"), 0, 0, 1, tx()).unwrap();
        assert_eq!(cell.intensity, 3);
        assert_eq!(engine.participant_snapshot(&pid("u1")).unwrap().balance, 1);
    }

    #[test]
    fn insufficient_balance_changes_nothing() {
        let (engine, _) = engine();
        engine.register(&pid("u1"), "One");
        engine.place(&pid("u1"), 1, 1, Color::Red).unwrap();
        engine.boost(&pid("u1"), 1, 1, 3, tx()).unwrap();
        engine.boost(&pid("u1"), 1, 1, 1, tx()).unwrap();

        let err = engine.boost(&pid("u1"), 1, 1, 2, tx()).unwrap_err();
        assert_eq!(err, CanvasError::InsufficientBalance { balance: 1, cost: 2 });
        assert_eq!(engine.participant_snapshot(&pid("u1")).unwrap().balance, 1);
        assert_eq!(engine.boost_history(&pid("u1")).len(), 2);
    }

    #[test]
    fn boost_check_order() {
        let (engine, _) = engine();
        assert_eq!(
            engine.boost(&pid("ghost"), 0, 0, 9, tx()).unwrap_err().kind(),
            "not_registered"
        );
        engine.register(&pid("u1"), "One");
        assert_eq!(
            engine.boost(&pid("u1"), 0, 0, 9, tx()).unwrap_err().kind(),
            "no_cell_at_position"
        );
        assert_eq!(
            engine.boost(&pid("u1"), -4, 100, 1, tx()).unwrap_err().kind(),
            "no_cell_at_position"
        );
        engine.place(&pid("u1"), 0, 0, Color::Red).unwrap();
        assert_eq!(
            engine.boost(&pid("u1"), 0, 0, 0, tx()).unwrap_err(),
            CanvasError::InvalidLevel { level: 0 }
        );
        assert_eq!(
            engine.boost(&pid("u1"), 0, 0, 4, tx()).unwrap_err(),
            CanvasError::InvalidLevel { level: 4 }
        );
    }

    #[test]
    fn boost_does_not_consume_placement_slot() {
        let (engine, _) = engine();
        engine.register(&pid("u1"), "One");
        engine.register(&pid("u2"), "Two");
        engine.place(&pid("u1"), 2, 2, Color::Red).unwrap();
        engine.boost(&pid("u2"), 2, 2, 1, tx()).unwrap();
        assert!(engine.participant_snapshot(&pid("u2")).unwrap().can_place_this_round);
        assert!(engine.place(&pid("u2"), 4, 4, Color::Gold).is_ok());
    }

    #[test]
    fn boost_records_transaction_for_audit() {
        let (engine, _) = engine();
        engine.register(&pid("u1"), "One");
        engine.place(&pid("u1"), 2, 2, Color::Red).unwrap();
        engine
            .boost(&pid("u1"), 2, 2, 2, TransactionId::new("tx_42"))
            .unwrap();
        let history = engine.boost_history(&pid("u1"));
        assert_eq!(history.len(), 1);
        let record = history.first().unwrap();
        assert_eq!(record.transaction_id, TransactionId::new("tx_42"));
        assert_eq!(record.cost, 2);
        assert_eq!(record.round, 1);
    }

    #[test]
    fn registration_is_idempotent_and_announced_once() {
        let (engine, _) = engine();
        let (log, _sub) = record_events(&engine);
        engine.register(&pid("A"), "Name1");
        let again = engine.register(&pid("A"), "Name2");
        assert_eq!(again.display_name, "Name1");
        assert_eq!(engine.canvas_snapshot().participant_count, 1);

        let names: Vec<&str> = log.lock().unwrap().iter().map(|e| e.event.name()).collect();
        assert_eq!(names, vec!["participant_joined"]);
    }

    #[test]
    fn events_follow_commit_order() {
        let (engine, time) = engine();
        let (log, _sub) = record_events(&engine);

        engine.register(&pid("u1"), "One");
        engine.place(&pid("u1"), 1, 1, Color::Red).unwrap();
        engine.boost(&pid("u1"), 1, 1, 1, tx()).unwrap();
        let _ = engine.place(&pid("u1"), 2, 2, Color::Red);
        time.advance(TimeDelta::milliseconds(60_000));
        engine.place(&pid("u1"), 2, 2, Color::Red).unwrap();

        let log = log.lock().unwrap();
        let names: Vec<&str> = log.iter().map(|e| e.event.name()).collect();
        assert_eq!(
            names,
            vec![
                "participant_joined",
                "pixel_placed",
                "pixel_boosted",
                "round_advanced",
                "pixel_placed"
            ]
        );
        let seqs: Vec<u64> = log.iter().map(|e| e.seq).collect();
        assert_eq!(seqs, vec![1, 2, 3, 4, 5]);
    }

    #[test]
    fn reads_advance_the_round_once_per_interval() {
        let (engine, time) = engine();
        let (log, _sub) = record_events(&engine);
        let start = engine.round_state();

        time.advance(TimeDelta::milliseconds(60_000));
        for _ in 0..5 {
            let snapshot = engine.canvas_snapshot();
            assert_eq!(snapshot.current_round, 2);
            assert_eq!(
                snapshot.round_ends_at,
                start
                    .round_ends_at
                    .checked_add_signed(TimeDelta::milliseconds(60_000))
                    .unwrap()
            );
        }
        assert_eq!(log.lock().unwrap().len(), 1);
    }

    #[test]
    fn failed_operation_still_publishes_round_advance() {
        let (engine, time) = engine();
        let (log, _sub) = record_events(&engine);
        time.advance(TimeDelta::minutes(3));
        assert!(engine.place(&pid("ghost"), 0, 0, Color::Red).is_err());
        let names: Vec<&str> = log.lock().unwrap().iter().map(|e| e.event.name()).collect();
        assert_eq!(names, vec!["round_advanced"]);
        assert_eq!(engine.round_state().current_round, 2);
    }

    #[test]
    fn participant_snapshot_reflects_standing() {
        let (engine, time) = engine();
        assert!(engine.participant_snapshot(&pid("u1")).is_none());
        engine.register(&pid("u1"), "One");

        let fresh = engine.participant_snapshot(&pid("u1")).unwrap();
        assert_eq!(fresh.balance, 5);
        assert_eq!(fresh.cells_owned, 0);
        assert!(fresh.can_place_this_round);
        assert_eq!(fresh.last_placed_round, 0);

        engine.place(&pid("u1"), 0, 0, Color::Red).unwrap();
        let placed = engine.participant_snapshot(&pid("u1")).unwrap();
        assert_eq!(placed.cells_owned, 1);
        assert!(!placed.can_place_this_round);
        assert_eq!(placed.last_placed_round, 1);

        time.advance(TimeDelta::milliseconds(60_000));
        assert!(engine.participant_snapshot(&pid("u1")).unwrap().can_place_this_round);
    }

    #[test]
    fn seed_skips_out_of_bounds_and_keeps_unknown_owners() {
        let (engine, _) = engine();
        let now = engine.now();
        let cell = |x: u32, owner: &str| Cell {
            x,
            y: 0,
            color: Color::Red,
            owner_id: pid(owner),
            owner_name: owner.to_owned(),
            intensity: 0,
            placed_at: now,
            round: 0,
        };
        let plan = SeedPlan {
            participants: vec![(pid("founder"), "Founder".to_owned())],
            cells: vec![cell(1, "founder"), cell(2, "stranger"), cell(32, "founder")],
        };
        let (log, _sub) = record_events(&engine);

        assert_eq!(engine.seed(&plan), 2);

        let snapshot = engine.canvas_snapshot();
        let owners: Vec<_> = snapshot.cells.iter().map(|c| (c.x, c.owner_id.as_str())).collect();
        assert_eq!(owners, vec![(1, "founder"), (2, "stranger")]);
        assert_eq!(snapshot.participant_count, 1);
        assert!(engine.participant(&pid("stranger")).is_none());
        assert!(log.lock().unwrap().is_empty());
    }

    #[test]
    fn snapshot_carries_last_seq() {
        let (engine, _) = engine();
        assert_eq!(engine.canvas_snapshot().last_seq, 0);
        engine.register(&pid("u1"), "One");
        engine.place(&pid("u1"), 0, 0, Color::Red).unwrap();
        assert_eq!(engine.canvas_snapshot().last_seq, 2);
    }
}
