//! Shared type definitions for the shared canvas.
//!
//! This crate is the single source of truth for all types that cross a
//! crate or wire boundary. Types defined here flow downstream to
//! `TypeScript` via `ts-rs` for the rendering surface.
//!
//! # Modules
//!
//! - [`ids`] -- Opaque participant/transaction ids and suggestion ids
//! - [`palette`] -- The fixed twenty-colour palette
//! - [`structs`] -- Participants, cells, rounds, snapshots, curator output
//! - [`events`] -- Domain events and the sequenced envelope

pub mod events;
pub mod ids;
pub mod palette;
pub mod structs;

// Re-export all public types at crate root for convenience.
pub use events::{CanvasEvent, EventEnvelope};
pub use ids::{ParticipantId, SuggestionId, TransactionId};
pub use palette::{Color, ColorParseError, PALETTE};
pub use structs::{
    BoostRecord, CanvasNarrative, CanvasSnapshot, Cell, Coord, Participant, ParticipantSnapshot,
    RoundState, Suggestion,
};
