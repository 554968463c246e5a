//! Server startup helper for the canvas binary.
//!
//! Provides [`spawn_server`] which binds eagerly and then launches the
//! HTTP + `WebSocket` server on a background Tokio task, so bind failures
//! surface to the caller instead of being logged from inside the task.
//!
//! # Usage
//!
//! ```rust,ignore
//! use canvas_observer::startup::spawn_server;
//!
//! let (addr, handle) = spawn_server(&config.server, state, shutdown).await?;
//! handle.await?;
//! ```

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use canvas_core::config::ServerConfig;
use tokio::task::JoinHandle;

use crate::server::{ServerError, bind, start_server};
use crate::state::AppState;

/// Errors that can occur when spawning the server.
#[derive(Debug, thiserror::Error)]
pub enum StartupError {
    /// The server failed to bind or start.
    #[error("server start error: {0}")]
    Server(#[from] ServerError),
}

/// Bind `config`'s address and serve on a background task until
/// `shutdown` resolves.
///
/// Returns the bound address (useful with port 0) and the task handle.
///
/// # Errors
///
/// Returns [`StartupError::Server`] if the address cannot be bound.
pub async fn spawn_server(
    config: &ServerConfig,
    state: Arc<AppState>,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> Result<(SocketAddr, JoinHandle<()>), StartupError> {
    let listener = bind(config).await?;
    let addr = listener.local_addr().map_err(|e| {
        StartupError::Server(ServerError::Bind(format!("no local address: {e}")))
    })?;

    let handle = tokio::spawn(async move {
        if let Err(e) = start_server(listener, state, shutdown).await {
            tracing::error!(error = %e, "Canvas server exited with error");
        }
    });

    tracing::info!(%addr, "Canvas server spawned on background task");

    Ok((addr, handle))
}
