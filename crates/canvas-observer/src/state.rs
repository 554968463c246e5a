//! Shared application state for the canvas HTTP server.
//!
//! [`AppState`] holds the engine handle and the per-stream settings. It is
//! wrapped in an [`Arc`] and injected through Axum's `State` extractor.
//! Handlers never hold engine state across an `.await`; every engine call
//! is a short synchronous critical section.

use std::sync::Arc;
use std::time::Duration;

use canvas_core::CanvasEngine;
use canvas_core::config::AppConfig;

/// Default keep-alive interval for event streams.
pub const DEFAULT_KEEPALIVE: Duration = Duration::from_secs(30);

/// Default per-stream event queue capacity.
pub const DEFAULT_EVENT_BUFFER: usize = 256;

/// Settings applied to every event stream connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreamSettings {
    /// Interval between `hb` messages.
    pub keepalive: Duration,
    /// Bounded queue size per connection. A connection whose queue fills is
    /// dropped from the bus and closed.
    pub event_buffer: usize,
}

impl Default for StreamSettings {
    fn default() -> Self {
        Self {
            keepalive: DEFAULT_KEEPALIVE,
            event_buffer: DEFAULT_EVENT_BUFFER,
        }
    }
}

impl StreamSettings {
    /// Derive stream settings from the loaded configuration.
    pub const fn from_config(config: &AppConfig) -> Self {
        Self {
            keepalive: Duration::from_secs(config.server.keepalive_secs),
            event_buffer: config.canvas.event_buffer,
        }
    }
}

/// Shared state for the Axum application.
#[derive(Debug, Clone)]
pub struct AppState {
    /// The canvas engine.
    pub engine: Arc<CanvasEngine>,
    /// Event stream settings.
    pub streams: StreamSettings,
}

impl AppState {
    /// Wrap an engine with default stream settings.
    pub fn new(engine: Arc<CanvasEngine>) -> Self {
        Self {
            engine,
            streams: StreamSettings::default(),
        }
    }

    /// Replace the stream settings.
    #[must_use]
    pub const fn with_streams(mut self, streams: StreamSettings) -> Self {
        self.streams = streams;
        self
    }
}
