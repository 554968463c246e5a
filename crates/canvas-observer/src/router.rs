//! Axum router construction for the canvas server.
//!
//! Assembles all routes (REST, `WebSocket`, SSE) into a single [`Router`]
//! with CORS and request tracing middleware.

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::state::AppState;
use crate::{handlers, sse, ws};

/// Build the complete Axum router.
///
/// The router includes:
/// - `GET /` -- minimal HTML status page
/// - `GET /api/health` -- liveness probe
/// - `GET /api/canvas` -- canvas snapshot
/// - `POST /api/register` -- register a participant
/// - `GET /api/participants/{id}` -- participant standing
/// - `POST /api/place` -- place a cell
/// - `POST /api/boost` -- boost a cell
/// - `GET /api/curator` -- curator suggestions
/// - `GET /api/events` -- SSE event stream
/// - `GET /ws/events` -- `WebSocket` event stream
///
/// CORS allows any origin so browser clients on other hosts can connect.
pub fn build_router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        // Status page
        .route("/", get(handlers::index))
        // Streams
        .route("/ws/events", get(ws::ws_events))
        .route("/api/events", get(sse::sse_events))
        // REST API
        .route("/api/health", get(handlers::health))
        .route("/api/canvas", get(handlers::get_canvas))
        .route("/api/register", post(handlers::register))
        .route("/api/participants/{id}", get(handlers::get_participant))
        .route("/api/place", post(handlers::place))
        .route("/api/boost", post(handlers::boost))
        .route("/api/curator", get(handlers::curator))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
