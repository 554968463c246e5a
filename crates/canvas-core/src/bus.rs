//! Best-effort fan-out of canvas events.
//!
//! The [`EventBus`] is an explicit subscriber registry. Publishing
//! delivers synchronously to every listener in registration order. A
//! listener that returns an error or panics is removed on the spot and
//! never called again; nothing is retried and nothing is reported back to
//! the publisher or to the other listeners.
//!
//! Each published event is stamped with a sequence number, so an observer
//! that was dropped (or missed messages) can tell and resynchronise from a
//! snapshot.
//!
//! Listeners run while the bus lock is held and must not call back into
//! the bus. They should be quick and non-blocking: the
//! [`ChannelListener`] used by streaming connections only ever does a
//! `try_send`.

use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::{Arc, Mutex, PoisonError, Weak};

use canvas_types::{CanvasEvent, EventEnvelope};
use chrono::{DateTime, Utc};
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tracing::{debug, warn};

/// Why a listener refused a delivery.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ListenerError {
    /// The listener's queue is full; it fell too far behind.
    #[error("listener lagged behind")]
    Lagged,

    /// The receiving side has gone away.
    #[error("listener disconnected")]
    Disconnected,

    /// Any other delivery failure.
    #[error("delivery failed: {0}")]
    Failed(String),
}

/// Receives published events.
pub trait EventListener: Send + Sync {
    /// Handle one event. An error removes this listener from the bus.
    ///
    /// # Errors
    ///
    /// Any [`ListenerError`]; the bus treats all of them alike.
    fn on_event(&self, envelope: &EventEnvelope) -> Result<(), ListenerError>;
}

impl<F> EventListener for F
where
    F: Fn(&EventEnvelope) -> Result<(), ListenerError> + Send + Sync,
{
    fn on_event(&self, envelope: &EventEnvelope) -> Result<(), ListenerError> {
        self(envelope)
    }
}

/// Forwards events into a bounded channel without ever waiting.
///
/// When the channel is full the listener fails with
/// [`ListenerError::Lagged`] and is dropped by the bus, which closes the
/// channel; the receiving side sees the end of the stream once it has
/// drained what was queued.
#[derive(Debug, Clone)]
pub struct ChannelListener {
    tx: mpsc::Sender<EventEnvelope>,
}

impl ChannelListener {
    /// Wrap the sending half of a channel.
    pub const fn new(tx: mpsc::Sender<EventEnvelope>) -> Self {
        Self { tx }
    }

    /// A listener plus the receiver it feeds, with room for `capacity`
    /// undelivered events.
    pub fn channel(capacity: usize) -> (Self, mpsc::Receiver<EventEnvelope>) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        (Self::new(tx), rx)
    }
}

impl EventListener for ChannelListener {
    fn on_event(&self, envelope: &EventEnvelope) -> Result<(), ListenerError> {
        self.tx.try_send(envelope.clone()).map_err(|e| match e {
            TrySendError::Full(_) => ListenerError::Lagged,
            TrySendError::Closed(_) => ListenerError::Disconnected,
        })
    }
}

/// Identifies one registration on the bus.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SubscriptionId(u64);

impl core::fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "sub-{}", self.0)
    }
}

/// Registry state guarded by the bus mutex.
#[derive(Default)]
struct BusInner {
    /// Next subscription id to hand out.
    next_id: u64,
    /// Sequence number of the last published event.
    last_seq: u64,
    /// Listeners in registration order.
    listeners: Vec<(SubscriptionId, Box<dyn EventListener>)>,
}

impl BusInner {
    fn remove(&mut self, id: SubscriptionId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(sid, _)| *sid != id);
        self.listeners.len() != before
    }
}

/// Fan-out broadcaster for [`CanvasEvent`]s.
#[derive(Clone, Default)]
pub struct EventBus {
    inner: Arc<Mutex<BusInner>>,
}

impl core::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let inner = self.lock();
        f.debug_struct("EventBus")
            .field("listeners", &inner.listeners.len())
            .field("last_seq", &inner.last_seq)
            .finish()
    }
}

impl EventBus {
    /// A bus with no listeners.
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, BusInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Register a listener. It receives every event published after this
    /// call until the returned handle is dropped or the listener fails.
    pub fn subscribe(&self, listener: impl EventListener + 'static) -> Subscription {
        self.subscribe_at(listener).0
    }

    /// Register a listener and return the sequence number of the last event
    /// it will not see. Its first delivery carries the next number.
    pub fn subscribe_at(&self, listener: impl EventListener + 'static) -> (Subscription, u64) {
        let mut inner = self.lock();
        let id = SubscriptionId(inner.next_id);
        inner.next_id = inner.next_id.saturating_add(1);
        inner.listeners.push((id, Box::new(listener)));
        let last_seq = inner.last_seq;
        debug!(subscription = %id, last_seq, listeners = inner.listeners.len(), "listener subscribed");

        let subscription = Subscription {
            id,
            bus: Arc::downgrade(&self.inner),
        };
        (subscription, last_seq)
    }

    /// Remove a listener. Returns `false` if it was already gone.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let removed = self.lock().remove(id);
        if removed {
            debug!(subscription = %id, "listener unsubscribed");
        }
        removed
    }

    /// Publish an event to every current listener, in registration order.
    ///
    /// Failing listeners are removed. Returns the sequenced envelope that
    /// was delivered.
    pub fn publish(&self, event: CanvasEvent, at: DateTime<Utc>) -> EventEnvelope {
        let mut inner = self.lock();
        inner.last_seq = inner.last_seq.saturating_add(1);

        let envelope = EventEnvelope {
            seq: inner.last_seq,
            at,
            event,
        };

        inner.listeners.retain(|(id, listener)| {
            match catch_unwind(AssertUnwindSafe(|| listener.on_event(&envelope))) {
                Ok(Ok(())) => true,
                Ok(Err(e)) => {
                    warn!(subscription = %id, seq = envelope.seq, error = %e, "dropping failed listener");
                    false
                }
                Err(_panic) => {
                    warn!(subscription = %id, seq = envelope.seq, "dropping panicked listener");
                    false
                }
            }
        });

        envelope
    }

    /// Sequence number of the last published event (0 if none).
    pub fn last_seq(&self) -> u64 {
        self.lock().last_seq
    }

    /// Number of registered listeners.
    pub fn listener_count(&self) -> usize {
        self.lock().listeners.len()
    }
}

/// Handle to a registration. Dropping it unsubscribes.
#[derive(Debug)]
#[must_use = "dropping a Subscription unsubscribes the listener immediately"]
pub struct Subscription {
    id: SubscriptionId,
    bus: Weak<Mutex<BusInner>>,
}

impl Subscription {
    /// The registration id.
    pub const fn id(&self) -> SubscriptionId {
        self.id
    }

    /// Unsubscribe now. Equivalent to dropping the handle.
    pub fn unsubscribe(self) {
        drop(self);
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(inner) = self.bus.upgrade() {
            let removed = inner
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .remove(self.id);
            if removed {
                debug!(subscription = %self.id, "listener unsubscribed on drop");
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::panic)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use canvas_types::ParticipantId;

    use super::*;

    fn joined(name: &str) -> CanvasEvent {
        CanvasEvent::ParticipantJoined {
            id: ParticipantId::new(name),
            display_name: name.to_owned(),
        }
    }

    #[test]
    fn delivers_in_registration_order() {
        let bus = EventBus::new();
        let log = Arc::new(Mutex::new(Vec::new()));

        let first_log = Arc::clone(&log);
        let _first = bus.subscribe(move |e: &EventEnvelope| -> Result<(), ListenerError> {
            first_log.lock().unwrap().push(("first", e.seq));
            Ok(())
        });
        let second_log = Arc::clone(&log);
        let _second = bus.subscribe(move |e: &EventEnvelope| -> Result<(), ListenerError> {
            second_log.lock().unwrap().push(("second", e.seq));
            Ok(())
        });

        bus.publish(joined("a"), Utc::now());
        bus.publish(joined("b"), Utc::now());

        let log = log.lock().unwrap();
        assert_eq!(
            *log,
            vec![("first", 1), ("second", 1), ("first", 2), ("second", 2)]
        );
    }

    #[test]
    fn failing_listener_is_dropped_and_others_still_receive() {
        let bus = EventBus::new();
        let failing_calls = Arc::new(AtomicUsize::new(0));
        let healthy_calls = Arc::new(AtomicUsize::new(0));

        let f = Arc::clone(&failing_calls);
        let _bad = bus.subscribe(move |_: &EventEnvelope| -> Result<(), ListenerError> {
            f.fetch_add(1, Ordering::SeqCst);
            Err(ListenerError::Failed("boom".to_owned()))
        });
        let h = Arc::clone(&healthy_calls);
        let _good = bus.subscribe(move |_: &EventEnvelope| -> Result<(), ListenerError> {
            h.fetch_add(1, Ordering::SeqCst);
            Ok(())
        });

        bus.publish(joined("a"), Utc::now());
        bus.publish(joined("b"), Utc::now());

        assert_eq!(failing_calls.load(Ordering::SeqCst), 1);
        assert_eq!(healthy_calls.load(Ordering::SeqCst), 2);
        assert_eq!(bus.listener_count(), 1);
    }

    #[test]
    fn panicking_listener_is_dropped() {
        let bus = EventBus::new();
        let _bad = bus.subscribe(|_: &EventEnvelope| -> Result<(), ListenerError> {
            panic!("listener blew up")
        });
        let envelope = bus.publish(joined("a"), Utc::now());
        assert_eq!(envelope.seq, 1);
        assert_eq!(bus.listener_count(), 0);
    }

    #[test]
    fn dropping_subscription_unsubscribes() {
        let bus = EventBus::new();
        let calls = Arc::new(AtomicUsize::new(0));
        let c = Arc::clone(&calls);
        let sub = bus.subscribe(move |_: &EventEnvelope| -> Result<(), ListenerError> {
            c.fetch_add(1, Ordering::SeqCst);
            Ok(())
        });
        bus.publish(joined("a"), Utc::now());
        sub.unsubscribe();
        bus.publish(joined("b"), Utc::now());

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(bus.listener_count(), 0);
    }

    #[test]
    fn explicit_unsubscribe_by_id() {
        let bus = EventBus::new();
        let sub = bus.subscribe(|_: &EventEnvelope| -> Result<(), ListenerError> { Ok(()) });
        assert!(bus.unsubscribe(sub.id()));
        assert!(!bus.unsubscribe(sub.id()));
        drop(sub);
        assert_eq!(bus.listener_count(), 0);
    }

    #[test]
    fn sequence_numbers_increase_without_listeners() {
        let bus = EventBus::new();
        assert_eq!(bus.last_seq(), 0);
        assert_eq!(bus.publish(joined("a"), Utc::now()).seq, 1);
        assert_eq!(bus.publish(joined("b"), Utc::now()).seq, 2);
        assert_eq!(bus.last_seq(), 2);
    }

    #[test]
    fn channel_listener_forwards_and_lags_out() {
        let bus = EventBus::new();
        let (listener, mut rx) = ChannelListener::channel(1);
        let _sub = bus.subscribe(listener);

        bus.publish(joined("a"), Utc::now());
        // Queue is full: this delivery fails and the listener is dropped.
        bus.publish(joined("b"), Utc::now());
        assert_eq!(bus.listener_count(), 0);

        assert_eq!(rx.try_recv().unwrap().seq, 1);
        // Sender was dropped with the listener, so the channel is closed.
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn subscribe_at_reports_the_seq_before_first_delivery() {
        let bus = EventBus::new();
        bus.publish(joined("early"), Utc::now());

        let publisher = {
            let bus = bus.clone();
            std::thread::spawn(move || {
                for _ in 0..500 {
                    bus.publish(joined("busy"), Utc::now());
                }
            })
        };

        for _ in 0..50 {
            let (listener, mut rx) = ChannelListener::channel(1024);
            let (sub, last_seq) = bus.subscribe_at(listener);
            bus.publish(joined("marker"), Utc::now());
            let first = rx.try_recv().unwrap();
            assert_eq!(first.seq, last_seq.saturating_add(1));
            drop(sub);
        }

        publisher.join().unwrap();
    }

    #[test]
    fn channel_listener_fails_when_receiver_gone() {
        let (listener, rx) = ChannelListener::channel(4);
        drop(rx);
        let envelope = EventEnvelope {
            seq: 1,
            at: Utc::now(),
            event: joined("a"),
        };
        assert_eq!(listener.on_event(&envelope), Err(ListenerError::Disconnected));
    }
}
