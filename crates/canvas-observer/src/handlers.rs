//! REST endpoint handlers for the canvas server.
//!
//! Every handler is a thin adapter: decode the request, validate the
//! fields the engine cannot see (colour spelling, transaction id), call one
//! engine operation, and encode the result.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `GET` | `/` | Minimal HTML status page |
//! | `GET` | `/api/health` | Liveness probe |
//! | `GET` | `/api/canvas` | Full canvas snapshot |
//! | `POST` | `/api/register` | Register a verified participant |
//! | `GET` | `/api/participants/{id}` | Participant standing |
//! | `POST` | `/api/place` | Place one cell |
//! | `POST` | `/api/boost` | Spend tokens to boost a cell |
//! | `GET` | `/api/curator` | Advisory suggestions and narrative |

use std::sync::Arc;

use axum::Json;
use axum::extract::{FromRequest, Path, State};
use axum::response::{Html, IntoResponse};
use canvas_core::curator;
use canvas_types::{
    CanvasNarrative, CanvasSnapshot, Cell, Color, Participant, ParticipantId,
    ParticipantSnapshot, TransactionId,
};
use serde::{Deserialize, Serialize};

use crate::error::ObserverError;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Request and response bodies
// ---------------------------------------------------------------------------

/// JSON body extractor whose rejections use the [`ObserverError`] body.
#[derive(Debug, FromRequest)]
#[from_request(via(Json), rejection(ObserverError))]
pub struct ApiJson<T>(pub T);

/// Body of `POST /api/register`.
#[derive(Debug, Clone, Deserialize)]
pub struct RegisterRequest {
    /// Verified external identity.
    pub participant_id: String,
    /// Name shown next to owned cells. Defaults to the participant id.
    #[serde(default)]
    pub display_name: String,
}

/// Body of `POST /api/place`.
#[derive(Debug, Clone, Deserialize)]
pub struct PlaceRequest {
    /// Acting participant.
    pub participant_id: String,
    /// Column.
    pub x: i64,
    /// Row.
    pub y: i64,
    /// Palette colour as `#RRGGBB`.
    pub color: String,
}

/// Body of `POST /api/boost`.
#[derive(Debug, Clone, Deserialize)]
pub struct BoostRequest {
    /// Paying participant.
    pub participant_id: String,
    /// Column.
    pub x: i64,
    /// Row.
    pub y: i64,
    /// Boost level, 1 to 3.
    pub level: i64,
    /// Payment transaction reference, recorded for audit.
    #[serde(default)]
    pub transaction_id: Option<String>,
}

/// Response of `POST /api/register`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterResponse {
    /// The participant record.
    pub participant: Participant,
    /// The participant's standing.
    pub state: ParticipantSnapshot,
}

/// Response of `POST /api/place` and `POST /api/boost`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CellResponse {
    /// The affected cell after the operation.
    pub cell: Cell,
    /// The acting participant's standing after the operation.
    pub state: ParticipantSnapshot,
}

/// Participant ids are compared after trimming surrounding whitespace.
fn participant_id(raw: &str) -> ParticipantId {
    ParticipantId::new(raw.trim())
}

fn standing(state: &AppState, id: &ParticipantId) -> Result<ParticipantSnapshot, ObserverError> {
    state
        .engine
        .participant_snapshot(id)
        .ok_or_else(|| ObserverError::Internal(format!("participant {id} vanished")))
}

// ---------------------------------------------------------------------------
// GET / -- minimal HTML status page
// ---------------------------------------------------------------------------

/// Serve a minimal HTML page showing canvas status and API links.
pub async fn index(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let snapshot = state.engine.canvas_snapshot();
    let round = snapshot.current_round;
    let ends_at = snapshot.round_ends_at.format("%H:%M:%S UTC");
    let size = snapshot.width;
    let cells = snapshot.total_cells_placed;
    let participants = snapshot.participant_count;
    let last_seq = snapshot.last_seq;

    Html(format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="utf-8">
    <title>Shared Canvas</title>
    <style>
        body {{
            background: #0d1117;
            color: #c9d1d9;
            font-family: 'Cascadia Code', 'Fira Code', 'Consolas', monospace;
            padding: 2rem;
            max-width: 800px;
            margin: 0 auto;
        }}
        h1 {{ color: #ff69b4; margin-bottom: 0.25rem; }}
        .subtitle {{ color: #8b949e; margin-top: 0; }}
        .metric {{
            display: inline-block;
            background: #161b22;
            border: 1px solid #30363d;
            border-radius: 6px;
            padding: 1rem 1.5rem;
            margin: 0.5rem 0.5rem 0.5rem 0;
            min-width: 120px;
        }}
        .metric .label {{ color: #8b949e; font-size: 0.85rem; }}
        .metric .value {{ color: #ff69b4; font-size: 1.5rem; font-weight: bold; }}
        a {{ color: #58a6ff; text-decoration: none; }}
        ul {{ list-style: none; padding: 0; }}
        li {{ padding: 0.3rem 0; }}
        .status {{ color: #3fb950; font-weight: bold; }}
        hr {{ border: none; border-top: 1px solid #30363d; margin: 1.5rem 0; }}
    </style>
</head>
<body>
    <h1>Shared Canvas</h1>
    <p class="subtitle">One cell per person per round</p>

    <p>Status: <span class="status">RUNNING</span></p>

    <div>
        <div class="metric">
            <div class="label">Round</div>
            <div class="value">{round}</div>
        </div>
        <div class="metric">
            <div class="label">Round ends</div>
            <div class="value">{ends_at}</div>
        </div>
        <div class="metric">
            <div class="label">Grid</div>
            <div class="value">{size}x{size}</div>
        </div>
        <div class="metric">
            <div class="label">Cells</div>
            <div class="value">{cells}</div>
        </div>
        <div class="metric">
            <div class="label">Participants</div>
            <div class="value">{participants}</div>
        </div>
        <div class="metric">
            <div class="label">Last event</div>
            <div class="value">#{last_seq}</div>
        </div>
    </div>

    <hr>

    <h2>API Endpoints</h2>
    <ul>
        <li>GET <a href="/api/health">/api/health</a> -- Liveness probe</li>
        <li>GET <a href="/api/canvas">/api/canvas</a> -- Canvas snapshot</li>
        <li>POST /api/register -- Register a participant</li>
        <li>GET /api/participants/{{id}} -- Participant standing</li>
        <li>POST /api/place -- Place a cell</li>
        <li>POST /api/boost -- Boost a cell</li>
        <li>GET <a href="/api/curator">/api/curator</a> -- Curator suggestions</li>
        <li>GET <a href="/api/events">/api/events</a> -- Server-sent event stream</li>
    </ul>

    <h2>WebSocket</h2>
    <ul>
        <li><code>ws://host:port/ws/events</code> -- Live canvas events</li>
    </ul>
</body>
</html>"#
    ))
}

// ---------------------------------------------------------------------------
// GET /api/health
// ---------------------------------------------------------------------------

/// Liveness probe with the current round.
pub async fn health(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let round = state.engine.round_state();
    Json(serde_json::json!({
        "status": "ok",
        "current_round": round.current_round,
        "round_ends_at": round.round_ends_at,
    }))
}

// ---------------------------------------------------------------------------
// GET /api/canvas
// ---------------------------------------------------------------------------

/// Return a consistent snapshot of the whole canvas.
pub async fn get_canvas(State(state): State<Arc<AppState>>) -> Json<CanvasSnapshot> {
    Json(state.engine.canvas_snapshot())
}

// ---------------------------------------------------------------------------
// POST /api/register
// ---------------------------------------------------------------------------

/// Register a participant whose identity was verified upstream.
///
/// Idempotent: a repeat registration returns the existing record.
///
/// # Errors
///
/// [`ObserverError::InvalidRequest`] for a blank participant id.
pub async fn register(
    State(state): State<Arc<AppState>>,
    ApiJson(req): ApiJson<RegisterRequest>,
) -> Result<Json<RegisterResponse>, ObserverError> {
    let id = participant_id(&req.participant_id);
    if id.is_blank() {
        return Err(ObserverError::InvalidRequest(
            "participant_id must not be blank".to_owned(),
        ));
    }
    let display_name = match req.display_name.trim() {
        "" => id.as_str().to_owned(),
        name => name.to_owned(),
    };

    let participant = state.engine.register(&id, &display_name);
    let standing = standing(&state, &id)?;
    Ok(Json(RegisterResponse {
        participant,
        state: standing,
    }))
}

// ---------------------------------------------------------------------------
// GET /api/participants/{id}
// ---------------------------------------------------------------------------

/// Return one participant's standing.
///
/// # Errors
///
/// [`ObserverError::NotFound`] if the participant never registered.
pub async fn get_participant(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<ParticipantSnapshot>, ObserverError> {
    let id = participant_id(&id);
    state
        .engine
        .participant_snapshot(&id)
        .map(Json)
        .ok_or_else(|| ObserverError::NotFound(format!("participant {id}")))
}

// ---------------------------------------------------------------------------
// POST /api/place
// ---------------------------------------------------------------------------

/// Place one cell for the acting participant.
///
/// # Errors
///
/// [`ObserverError::InvalidRequest`] for an undecodable body,
/// [`ObserverError::InvalidColor`] for a non-palette colour, otherwise any
/// [`canvas_core::CanvasError`] the engine returns.
pub async fn place(
    State(state): State<Arc<AppState>>,
    ApiJson(req): ApiJson<PlaceRequest>,
) -> Result<Json<CellResponse>, ObserverError> {
    let color: Color = req.color.parse()?;
    let id = participant_id(&req.participant_id);

    let cell = state.engine.place(&id, req.x, req.y, color)?;
    let standing = standing(&state, &id)?;
    Ok(Json(CellResponse {
        cell,
        state: standing,
    }))
}

// ---------------------------------------------------------------------------
// POST /api/boost
// ---------------------------------------------------------------------------

/// Spend tokens to raise a cell's intensity.
///
/// # Errors
///
/// [`ObserverError::MissingTransaction`] without a transaction id,
/// otherwise any [`canvas_core::CanvasError`] the engine returns.
pub async fn boost(
    State(state): State<Arc<AppState>>,
    ApiJson(req): ApiJson<BoostRequest>,
) -> Result<Json<CellResponse>, ObserverError> {
    let transaction_id = req
        .transaction_id
        .map(TransactionId::new)
        .filter(|tx| !tx.is_blank())
        .ok_or(ObserverError::MissingTransaction)?;
    let id = participant_id(&req.participant_id);

    let cell = state
        .engine
        .boost(&id, req.x, req.y, req.level, transaction_id)?;
    let standing = standing(&state, &id)?;
    Ok(Json(CellResponse {
        cell,
        state: standing,
    }))
}

// ---------------------------------------------------------------------------
// GET /api/curator
// ---------------------------------------------------------------------------

/// Advisory suggestions and a narrative for the current canvas.
pub async fn curator(State(state): State<Arc<AppState>>) -> Json<CanvasNarrative> {
    let snapshot = state.engine.canvas_snapshot();
    let mut rng = rand::rng();
    Json(curator::analyze(
        &snapshot.cells,
        snapshot.width,
        &mut rng,
        state.engine.now(),
    ))
}
