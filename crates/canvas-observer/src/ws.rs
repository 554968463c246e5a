//! `WebSocket` handler for real-time canvas events.
//!
//! Clients connect to `GET /ws/events`. The first text frame is
//! `{"type":"connected",...}`; after that each committed canvas event
//! arrives as one JSON text frame, with `{"type":"hb"}` frames on the
//! keep-alive interval.
//!
//! If a client falls behind far enough to overflow its queue, the
//! connection is closed. The client should reconnect and reload
//! `GET /api/canvas`.

use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket};
use axum::extract::{State, WebSocketUpgrade};
use axum::response::IntoResponse;
use tracing::{debug, warn};

use crate::state::AppState;
use crate::stream::{EventFeed, StreamFrame};

/// Upgrade an HTTP request to a `WebSocket` connection and begin
/// streaming canvas events.
///
/// # Route
///
/// `GET /ws/events`
pub async fn ws_events(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_ws(socket, state))
}

async fn send_frame(socket: &mut WebSocket, frame: &StreamFrame) -> bool {
    let json = match frame.to_json() {
        Ok(j) => j,
        Err(e) => {
            warn!("Failed to serialize stream frame: {e}");
            return true;
        }
    };
    socket.send(Message::Text(json.into())).await.is_ok()
}

/// Handle the `WebSocket` lifecycle: subscribe to the event bus and
/// forward each frame until either side goes away.
async fn handle_ws(mut socket: WebSocket, state: Arc<AppState>) {
    debug!("WebSocket client connected");

    let (mut feed, connected) = EventFeed::open(&state);
    if !send_frame(&mut socket, &connected).await {
        debug!("WebSocket client disconnected before handshake completed");
        return;
    }

    loop {
        tokio::select! {
            frame = feed.next() => {
                let Some(frame) = frame else {
                    debug!("Event feed dropped by bus, closing WebSocket");
                    let _ = socket.send(Message::Close(None)).await;
                    return;
                };
                if !send_frame(&mut socket, &frame).await {
                    debug!("WebSocket client disconnected (send failed)");
                    return;
                }
            }
            msg = socket.recv() => {
                match msg {
                    Some(Ok(Message::Close(_))) | None => {
                        debug!("WebSocket client disconnected");
                        return;
                    }
                    Some(Ok(Message::Ping(data))) => {
                        if socket.send(Message::Pong(data)).await.is_err() {
                            debug!("WebSocket client disconnected (pong failed)");
                            return;
                        }
                    }
                    Some(Err(e)) => {
                        debug!("WebSocket error: {e}");
                        return;
                    }
                    _ => {
                        // Clients have nothing to say on this channel.
                    }
                }
            }
        }
    }
}
