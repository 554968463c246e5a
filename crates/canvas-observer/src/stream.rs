//! Per-connection event feed shared by the `WebSocket` and SSE endpoints.
//!
//! An [`EventFeed`] owns a bus [`Subscription`] backed by a bounded queue
//! and a keep-alive timer. Dropping the feed unsubscribes and stops the
//! timer, so a handler only has to drop it when the client goes away.
//!
//! A connection that cannot keep up overflows its queue. The bus then
//! drops the listener, the queue closes, and [`EventFeed::next`] returns
//! `None` once the buffered events are drained. Clients are expected to
//! reconnect and resynchronise from `GET /api/canvas`.

use canvas_core::bus::{ChannelListener, Subscription};
use canvas_types::EventEnvelope;
use tokio::sync::mpsc;
use tokio::time::{Instant, Interval, MissedTickBehavior};

use crate::state::AppState;

/// One message on an event stream.
#[derive(Debug, Clone, PartialEq)]
pub enum StreamFrame {
    /// First message on every connection.
    Connected {
        /// Sequence number of the newest event published before the
        /// connection was established.
        last_seq: u64,
    },
    /// Keep-alive.
    Heartbeat,
    /// A committed canvas event.
    Event(EventEnvelope),
}

impl StreamFrame {
    /// Wire encoding: `{"type":"connected",...}`, `{"type":"hb"}`, or the
    /// event envelope itself.
    ///
    /// # Errors
    ///
    /// Returns a [`serde_json::Error`] if the envelope cannot be encoded.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        match self {
            Self::Connected { last_seq } => serde_json::to_string(&serde_json::json!({
                "type": "connected",
                "last_seq": last_seq,
            })),
            Self::Heartbeat => Ok(String::from(r#"{"type":"hb"}"#)),
            Self::Event(envelope) => serde_json::to_string(envelope),
        }
    }
}

/// A live subscription to the canvas event stream.
#[derive(Debug)]
pub struct EventFeed {
    subscription: Subscription,
    rx: mpsc::Receiver<EventEnvelope>,
    heartbeat: Interval,
}

impl EventFeed {
    /// Subscribe to the engine's bus and return the feed together with the
    /// `connected` frame to send first.
    pub fn open(state: &AppState) -> (Self, StreamFrame) {
        let (listener, rx) = ChannelListener::channel(state.streams.event_buffer);
        let (subscription, last_seq) = state.engine.subscribe_at(listener);

        let period = state.streams.keepalive;
        let first = Instant::now().checked_add(period).unwrap_or_else(Instant::now);
        let mut heartbeat = tokio::time::interval_at(first, period);
        heartbeat.set_missed_tick_behavior(MissedTickBehavior::Delay);

        tracing::debug!(subscription = %subscription.id(), last_seq, "event stream opened");
        (
            Self {
                subscription,
                rx,
                heartbeat,
            },
            StreamFrame::Connected { last_seq },
        )
    }

    /// Wait for the next event or heartbeat.
    ///
    /// Returns `None` when the bus has dropped this feed.
    pub async fn next(&mut self) -> Option<StreamFrame> {
        tokio::select! {
            envelope = self.rx.recv() => envelope.map(StreamFrame::Event),
            _ = self.heartbeat.tick() => Some(StreamFrame::Heartbeat),
        }
    }
}

impl Drop for EventFeed {
    fn drop(&mut self) {
        tracing::debug!(subscription = %self.subscription.id(), "event stream closed");
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::panic)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use canvas_core::time::ManualTime;
    use canvas_core::{CanvasEngine, EngineSettings};
    use canvas_types::ParticipantId;
    use chrono::Utc;

    use super::*;
    use crate::state::StreamSettings;

    fn state(keepalive: Duration, event_buffer: usize) -> AppState {
        let time = Arc::new(ManualTime::new(Utc::now()));
        let engine = CanvasEngine::new(EngineSettings::default(), time).unwrap();
        AppState::new(Arc::new(engine)).with_streams(StreamSettings {
            keepalive,
            event_buffer,
        })
    }

    #[test]
    fn frames_encode_with_type_tag() {
        assert_eq!(
            StreamFrame::Connected { last_seq: 3 }.to_json().unwrap(),
            r#"{"last_seq":3,"type":"connected"}"#
        );
        assert_eq!(StreamFrame::Heartbeat.to_json().unwrap(), r#"{"type":"hb"}"#);
    }

    #[tokio::test]
    async fn feed_forwards_events() {
        let state = state(Duration::from_secs(3600), 8);
        let (mut feed, connected) = EventFeed::open(&state);
        assert_eq!(connected, StreamFrame::Connected { last_seq: 0 });

        state.engine.register(&ParticipantId::new("u1"), "One");
        match feed.next().await.unwrap() {
            StreamFrame::Event(envelope) => {
                assert_eq!(envelope.seq, 1);
                assert_eq!(envelope.event.name(), "participant_joined");
            }
            other => panic!("expected event, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn connected_frame_never_repeats_a_queued_event() {
        let state = state(Duration::from_secs(3600), 1024);
        let engine = Arc::clone(&state.engine);
        let writer = std::thread::spawn(move || {
            for n in 0..300 {
                engine.register(&ParticipantId::new(format!("w{n}")), "Writer");
            }
        });

        for n in 0..30 {
            let (mut feed, connected) = EventFeed::open(&state);
            let StreamFrame::Connected { last_seq } = connected else {
                panic!("expected connected frame, got {connected:?}");
            };
            state.engine.register(&ParticipantId::new(format!("r{n}")), "Reader");
            match feed.next().await.unwrap() {
                StreamFrame::Event(envelope) => {
                    assert_eq!(envelope.seq, last_seq.saturating_add(1));
                }
                other => panic!("expected event, got {other:?}"),
            }
        }

        writer.join().unwrap();
    }

    #[tokio::test]
    async fn feed_emits_heartbeats() {
        let state = state(Duration::from_millis(20), 8);
        let (mut feed, _) = EventFeed::open(&state);
        assert_eq!(feed.next().await, Some(StreamFrame::Heartbeat));
    }

    #[tokio::test]
    async fn overflowing_feed_is_dropped_then_closes() {
        let state = state(Duration::from_secs(3600), 1);
        let (mut feed, _) = EventFeed::open(&state);
        state.engine.register(&ParticipantId::new("u1"), "One");
        state.engine.register(&ParticipantId::new("u2"), "Two");
        assert_eq!(state.engine.bus().listener_count(), 0);

        assert!(matches!(feed.next().await, Some(StreamFrame::Event(_))));
        assert_eq!(feed.next().await, None);
    }

    #[tokio::test]
    async fn dropping_feed_unsubscribes() {
        let state = state(Duration::from_secs(3600), 8);
        let (feed, _) = EventFeed::open(&state);
        assert_eq!(state.engine.bus().listener_count(), 1);
        drop(feed);
        assert_eq!(state.engine.bus().listener_count(), 0);
    }
}
