//! Round clock for the shared canvas.
//!
//! The clock is the single source of truth for which round it is. It is a
//! pure function of wall-clock time and the round duration: there is no
//! timer task. Every operation calls [`RoundClock::advance_if_due`] first,
//! so the round flips lazily on the first access after it has elapsed.
//!
//! # Catch-up
//!
//! One call advances at most one round, and the new round starts at the
//! time of that call. If the canvas sat idle for ten round lengths, the
//! next access moves the round number up by exactly one and starts a fresh
//! full-length round. Backlogged rounds collapse into the current one;
//! nobody could have placed in them anyway.

use canvas_types::RoundState;
use chrono::{DateTime, TimeDelta, Utc};

/// Errors that can occur when building a clock.
#[derive(Debug, thiserror::Error)]
pub enum ClockError {
    /// The round duration is zero or negative.
    #[error("round duration must be positive, got {0}")]
    NonPositiveDuration(TimeDelta),
}

/// A round transition produced by [`RoundClock::advance_if_due`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoundAdvance {
    /// The new round number.
    pub round: u64,
    /// When the new round ends.
    pub ends_at: DateTime<Utc>,
}

/// Tracks the current round and when it started.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoundClock {
    /// Current round, starting at 1. Never decreases.
    current_round: u64,
    /// When the current round started.
    round_started_at: DateTime<Utc>,
    /// Fixed round length.
    round_duration: TimeDelta,
}

impl RoundClock {
    /// Start round 1 at `started_at`.
    ///
    /// # Errors
    ///
    /// Returns [`ClockError::NonPositiveDuration`] if `round_duration` is
    /// not strictly positive.
    pub fn new(round_duration: TimeDelta, started_at: DateTime<Utc>) -> Result<Self, ClockError> {
        if round_duration <= TimeDelta::zero() {
            return Err(ClockError::NonPositiveDuration(round_duration));
        }
        Ok(Self {
            current_round: 1,
            round_started_at: started_at,
            round_duration,
        })
    }

    /// Advance one round if the current one has run its full length.
    ///
    /// Returns the transition when one happened. Calling again within the
    /// same interval is a no-op, however many times it is called.
    pub fn advance_if_due(&mut self, now: DateTime<Utc>) -> Option<RoundAdvance> {
        let elapsed = now.signed_duration_since(self.round_started_at);
        if elapsed < self.round_duration {
            return None;
        }

        self.current_round = self.current_round.saturating_add(1);
        self.round_started_at = now;

        Some(RoundAdvance {
            round: self.current_round,
            ends_at: self.round_ends_at(),
        })
    }

    /// The current round number.
    pub const fn current_round(&self) -> u64 {
        self.current_round
    }

    /// When the current round started.
    pub const fn round_started_at(&self) -> DateTime<Utc> {
        self.round_started_at
    }

    /// The fixed round length.
    pub const fn round_duration(&self) -> TimeDelta {
        self.round_duration
    }

    /// `round_started_at + round_duration`.
    pub fn round_ends_at(&self) -> DateTime<Utc> {
        self.round_started_at
            .checked_add_signed(self.round_duration)
            .unwrap_or(DateTime::<Utc>::MAX_UTC)
    }

    /// Point-in-time view of the clock.
    pub fn state(&self) -> RoundState {
        RoundState {
            current_round: self.current_round,
            round_started_at: self.round_started_at,
            round_ends_at: self.round_ends_at(),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn minute() -> TimeDelta {
        TimeDelta::milliseconds(60_000)
    }

    fn make_clock(start: DateTime<Utc>) -> RoundClock {
        RoundClock::new(minute(), start).unwrap()
    }

    #[test]
    fn clock_starts_at_round_one() {
        let start = Utc::now();
        let clock = make_clock(start);
        assert_eq!(clock.current_round(), 1);
        assert_eq!(clock.round_started_at(), start);
        assert_eq!(clock.round_ends_at(), start + minute());
    }

    #[test]
    fn no_advance_before_duration() {
        let start = Utc::now();
        let mut clock = make_clock(start);
        let almost = start + TimeDelta::milliseconds(59_999);
        assert!(clock.advance_if_due(almost).is_none());
        assert_eq!(clock.current_round(), 1);
    }

    #[test]
    fn advances_exactly_at_duration() {
        let start = Utc::now();
        let mut clock = make_clock(start);
        let due = start + minute();
        let advance = clock.advance_if_due(due).unwrap();
        assert_eq!(advance.round, 2);
        assert_eq!(advance.ends_at, due + minute());
        assert_eq!(clock.round_started_at(), due);
    }

    #[test]
    fn repeated_checks_in_one_interval_advance_once() {
        let start = Utc::now();
        let mut clock = make_clock(start);
        let due = start + minute();
        assert!(clock.advance_if_due(due).is_some());
        for ms in [0, 1, 10_000, 59_999] {
            assert!(clock.advance_if_due(due + TimeDelta::milliseconds(ms)).is_none());
        }
        assert_eq!(clock.current_round(), 2);
    }

    #[test]
    fn long_idle_collapses_to_one_advance() {
        let start = Utc::now();
        let mut clock = make_clock(start);
        let much_later = start + TimeDelta::minutes(10);
        let advance = clock.advance_if_due(much_later).unwrap();
        assert_eq!(advance.round, 2);
        assert_eq!(clock.round_ends_at(), much_later + minute());
    }

    #[test]
    fn time_going_backwards_is_a_no_op() {
        let start = Utc::now();
        let mut clock = make_clock(start);
        assert!(clock.advance_if_due(start - TimeDelta::hours(1)).is_none());
        assert_eq!(clock.current_round(), 1);
    }

    #[test]
    fn ends_at_tracks_start_after_every_check() {
        let start = Utc::now();
        let mut clock = make_clock(start);
        let mut now = start;
        let mut last_round = clock.current_round();
        for step in [15_000, 45_000, 1, 70_000, 30_000, 30_000] {
            now += TimeDelta::milliseconds(step);
            let _ = clock.advance_if_due(now);
            assert!(clock.current_round() >= last_round);
            last_round = clock.current_round();
            assert_eq!(clock.round_ends_at(), clock.round_started_at() + minute());
        }
        assert_eq!(clock.current_round(), 4);
    }

    #[test]
    fn non_positive_duration_is_rejected() {
        assert!(RoundClock::new(TimeDelta::zero(), Utc::now()).is_err());
        assert!(RoundClock::new(TimeDelta::milliseconds(-5), Utc::now()).is_err());
    }

    #[test]
    fn state_reports_current_round() {
        let start = Utc::now();
        let clock = make_clock(start);
        let state = clock.state();
        assert_eq!(state.current_round, 1);
        assert_eq!(state.round_ends_at, start + minute());
    }
}
