//! Core entity structs for the shared canvas.
//!
//! Covers participants, cells, the round state, the boost audit record,
//! the two snapshot read views, and the curator's advisory output.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::ids::{ParticipantId, SuggestionId, TransactionId};
use crate::palette::Color;

// ---------------------------------------------------------------------------
// Coordinates
// ---------------------------------------------------------------------------

/// An in-bounds grid coordinate. Identity of a [`Cell`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct Coord {
    /// Column, `0..grid_size`.
    pub x: u32,
    /// Row, `0..grid_size`.
    pub y: u32,
}

impl Coord {
    /// Build a coordinate from already-validated components.
    pub const fn new(x: u32, y: u32) -> Self {
        Self { x, y }
    }
}

impl core::fmt::Display for Coord {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "({},{})", self.x, self.y)
    }
}

// ---------------------------------------------------------------------------
// Participant
// ---------------------------------------------------------------------------

/// A registered participant.
///
/// Created on first registration and never deleted. The display name is
/// fixed by the first registration. The balance starts at the configured
/// initial grant and only decreases, through boosts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct Participant {
    /// Verified participant id.
    pub id: ParticipantId,
    /// Name shown next to the participant's cells.
    pub display_name: String,
    /// Remaining boost tokens.
    pub balance: u32,
    /// When the participant first registered.
    pub created_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Cell
// ---------------------------------------------------------------------------

/// A single coloured unit at a grid coordinate.
///
/// Placement always replaces a cell wholesale. Boosting is the only
/// in-place mutation and only raises `intensity`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct Cell {
    /// Column.
    pub x: u32,
    /// Row.
    pub y: u32,
    /// Palette colour.
    pub color: Color,
    /// Participant who last placed here.
    pub owner_id: ParticipantId,
    /// Owner's display name at placement time.
    pub owner_name: String,
    /// Boost intensity, 0 (unboosted) to 3.
    pub intensity: u8,
    /// When the cell was placed.
    pub placed_at: DateTime<Utc>,
    /// Round the cell was placed in (0 for seeded art).
    pub round: u64,
}

impl Cell {
    /// The coordinate this cell occupies.
    pub const fn coord(&self) -> Coord {
        Coord::new(self.x, self.y)
    }

    /// Whether the cell has been boosted at least once.
    pub const fn is_boosted(&self) -> bool {
        self.intensity > 0
    }
}

// ---------------------------------------------------------------------------
// Rounds
// ---------------------------------------------------------------------------

/// Point-in-time view of the round clock.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct RoundState {
    /// Current round, starting at 1.
    pub current_round: u64,
    /// When the current round started.
    pub round_started_at: DateTime<Utc>,
    /// `round_started_at + round duration`.
    pub round_ends_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Boost audit
// ---------------------------------------------------------------------------

/// Audit record of one successful boost.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct BoostRecord {
    /// Participant who paid for the boost.
    pub participant_id: ParticipantId,
    /// Boosted cell.
    pub coord: Coord,
    /// Requested level (1-3).
    pub level: u8,
    /// Tokens debited.
    pub cost: u32,
    /// Payment authorizer's transaction id, recorded as given.
    pub transaction_id: TransactionId,
    /// Round in which the boost happened.
    pub round: u64,
    /// When the boost happened.
    pub at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Snapshots
// ---------------------------------------------------------------------------

/// Consistent point-in-time read of the whole canvas.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct CanvasSnapshot {
    /// Grid width in cells.
    pub width: u32,
    /// Grid height in cells.
    pub height: u32,
    /// Every placed cell, in no particular order.
    pub cells: Vec<Cell>,
    /// Current round.
    pub current_round: u64,
    /// When the current round ends.
    pub round_ends_at: DateTime<Utc>,
    /// Number of occupied coordinates.
    pub total_cells_placed: u64,
    /// Number of registered participants.
    pub participant_count: u64,
    /// Sequence number of the last event published before this snapshot
    /// was taken (0 if none). Stream observers resume after it.
    pub last_seq: u64,
}

/// Consistent point-in-time read of one participant's standing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct ParticipantSnapshot {
    /// Remaining boost tokens.
    pub balance: u32,
    /// Cells currently owned on the grid.
    pub cells_owned: u64,
    /// Whether a placement would pass the round gate right now.
    pub can_place_this_round: bool,
    /// Last round the participant placed in (0 if never).
    pub last_placed_round: u64,
}

// ---------------------------------------------------------------------------
// Curator output
// ---------------------------------------------------------------------------

/// An advisory placement hint. Never applied automatically.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct Suggestion {
    /// Suggestion id.
    pub id: SuggestionId,
    /// Suggested column.
    pub x: u32,
    /// Suggested row.
    pub y: u32,
    /// Suggested colour.
    pub color: Color,
    /// Human-readable justification.
    pub reason: String,
    /// Confidence in `[0.6, 0.9)`.
    pub confidence: f64,
    /// When the suggestion was produced.
    pub created_at: DateTime<Utc>,
}

/// The curator's reading of the canvas.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct CanvasNarrative {
    /// One-sentence story about the canvas.
    pub story: String,
    /// Up to three placement hints.
    pub suggestions: Vec<Suggestion>,
    /// Pattern phrase woven into the story.
    pub pattern_detected: Option<String>,
    /// Summary of the dominant colours.
    pub community_style: String,
    /// When the analysis ran.
    pub last_analysis: DateTime<Utc>,
}
