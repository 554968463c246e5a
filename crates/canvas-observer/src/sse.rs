//! Server-Sent Events endpoint for browsers without `WebSocket` support.
//!
//! `GET /api/events` carries the same frames as `/ws/events`, one per SSE
//! `data:` line. The stream ends when the feed is dropped by the bus;
//! client disconnects drop the stream and with it the subscription.

use std::convert::Infallible;
use std::sync::Arc;

use axum::extract::State;
use axum::response::sse::{Event, Sse};
use futures::stream::{self, Stream, StreamExt};

use crate::state::AppState;
use crate::stream::{EventFeed, StreamFrame};

fn to_sse(frame: &StreamFrame) -> Option<Event> {
    match frame.to_json() {
        Ok(json) => Some(Event::default().data(json)),
        Err(e) => {
            tracing::warn!("Failed to serialize stream frame: {e}");
            None
        }
    }
}

/// Open an SSE event stream.
///
/// # Route
///
/// `GET /api/events`
pub async fn sse_events(
    State(state): State<Arc<AppState>>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let (feed, connected) = EventFeed::open(&state);

    let frames = stream::unfold(feed, |mut feed| async move {
        let frame = feed.next().await?;
        Some((frame, feed))
    });

    let events = stream::iter([connected])
        .chain(frames)
        .filter_map(|frame| async move { to_sse(&frame).map(Ok) });

    Sse::new(events)
}
