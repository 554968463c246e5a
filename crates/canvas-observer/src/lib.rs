//! HTTP surface for the shared canvas.
//!
//! This crate provides an Axum server that exposes:
//!
//! - **REST endpoints** for registering, placing, boosting, and reading
//!   the canvas and participant standing
//! - **`WebSocket` endpoint** (`/ws/events`) and **SSE endpoint**
//!   (`/api/events`) streaming committed canvas events in order
//! - **Curator endpoint** (`/api/curator`) with advisory suggestions
//! - **Minimal HTML status page** (`GET /`)
//!
//! # Architecture
//!
//! Handlers hold an `Arc<CanvasEngine>` and call it synchronously. The
//! engine serializes every mutation behind one lock, so the HTTP layer
//! carries no state of its own beyond per-connection event feeds. Each
//! stream connection owns a bounded queue subscribed to the engine's
//! event bus; a connection that overflows is dropped and must resync
//! from `GET /api/canvas`.

pub mod error;
pub mod handlers;
pub mod router;
pub mod server;
pub mod sse;
pub mod startup;
pub mod state;
pub mod stream;
pub mod ws;

pub use router::build_router;
pub use server::{ServerError, start_server};
pub use state::{AppState, StreamSettings};
