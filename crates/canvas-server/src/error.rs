//! Error types for the canvas server binary.
//!
//! [`AppError`] is the top-level error type that wraps every failure mode
//! during startup and serving.

/// Top-level error for the canvas server binary.
///
/// Each variant wraps a specific subsystem error, providing a single
/// error type that `main` can propagate with `?`.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// Configuration loading failed.
    #[error("config error: {source}")]
    Config {
        /// The underlying config error.
        #[from]
        source: canvas_core::config::ConfigError,
    },

    /// Round clock initialization failed.
    #[error("clock error: {source}")]
    Clock {
        /// The underlying clock error.
        #[from]
        source: canvas_core::clock::ClockError,
    },

    /// The HTTP server failed to start.
    #[error("server error: {source}")]
    Startup {
        /// The underlying startup error.
        #[from]
        source: canvas_observer::startup::StartupError,
    },

    /// The server task ended abnormally.
    #[error("server task failed: {source}")]
    Join {
        /// The underlying join error.
        #[from]
        source: tokio::task::JoinError,
    },

    /// The logging subscriber could not be installed.
    #[error("logging error: {message}")]
    Logging {
        /// Description of the failure.
        message: String,
    },
}
