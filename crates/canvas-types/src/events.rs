//! Domain events published to canvas observers.
//!
//! Events are immutable value snapshots. Each one is wrapped in an
//! [`EventEnvelope`] carrying a publish-order sequence number so
//! observers can detect gaps and resynchronise from a snapshot.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::ids::ParticipantId;
use crate::structs::Cell;

/// A state change committed against the canvas.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
#[ts(export, export_to = "bindings/")]
pub enum CanvasEvent {
    /// The round clock moved to a new round.
    RoundAdvanced {
        /// The new round number.
        round: u64,
        /// When the new round ends.
        ends_at: DateTime<Utc>,
    },
    /// A participant registered for the first time.
    ParticipantJoined {
        /// The new participant.
        id: ParticipantId,
        /// Their display name.
        display_name: String,
    },
    /// A cell was placed (possibly replacing another).
    PixelPlaced {
        /// The placed cell.
        cell: Cell,
    },
    /// A cell's intensity was raised.
    PixelBoosted {
        /// The boosted cell after the boost.
        cell: Cell,
    },
}

impl CanvasEvent {
    /// The wire name of this event kind.
    pub const fn name(&self) -> &'static str {
        match self {
            Self::RoundAdvanced { .. } => "round_advanced",
            Self::ParticipantJoined { .. } => "participant_joined",
            Self::PixelPlaced { .. } => "pixel_placed",
            Self::PixelBoosted { .. } => "pixel_boosted",
        }
    }
}

/// A published event with its sequence number and publish time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct EventEnvelope {
    /// Strictly increasing, starting at 1.
    pub seq: u64,
    /// When the event was published.
    pub at: DateTime<Utc>,
    /// The event itself.
    #[serde(flatten)]
    pub event: CanvasEvent,
}
