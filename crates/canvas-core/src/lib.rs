//! Round clock, placement rules, and the canvas engine.
//!
//! This crate owns every mutation of the shared canvas. A
//! [`CanvasEngine`] serializes registrations, placements, and boosts
//! behind one lock and publishes each committed change on its
//! [`EventBus`] in commit order.
//!
//! # Modules
//!
//! - [`boost`] -- Boost level validation and intensity arithmetic.
//! - [`bus`] -- In-process publish/subscribe with listener isolation.
//! - [`clock`] -- Lazily advanced round clock.
//! - [`config`] -- Configuration loading from `canvas-config.yaml`.
//! - [`curator`] -- Advisory placement hints and canvas narrative.
//! - [`engine`] -- The [`CanvasEngine`] itself.
//! - [`error`] -- Caller-facing [`CanvasError`].
//! - [`gate`] -- One placement per participant per round.
//! - [`grid`] -- Bounded sparse cell storage.
//! - [`seed`] -- Demo artwork for a fresh canvas.
//! - [`time`] -- Injectable time sources.
//!
//! [`CanvasEngine`]: engine::CanvasEngine
//! [`EventBus`]: bus::EventBus
//! [`CanvasError`]: error::CanvasError

pub mod boost;
pub mod bus;
pub mod clock;
pub mod config;
pub mod curator;
pub mod engine;
pub mod error;
pub mod gate;
pub mod grid;
pub mod seed;
pub mod time;

pub use engine::{CanvasEngine, EngineSettings};
pub use error::CanvasError;
