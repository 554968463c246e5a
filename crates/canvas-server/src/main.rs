//! Canvas server binary.
//!
//! Loads configuration, builds the canvas engine, optionally seeds demo
//! artwork, and serves the HTTP + `WebSocket` API until `Ctrl-C`.
//!
//! # Startup Sequence
//!
//! 1. Load configuration from `canvas-config.yaml` (or `CANVAS_CONFIG`)
//! 2. Initialize structured logging (tracing)
//! 3. Create the canvas engine on wall-clock time
//! 4. Seed demo artwork if enabled
//! 5. Bind and serve until `Ctrl-C`

mod error;

use std::path::PathBuf;
use std::sync::Arc;

use canvas_core::config::AppConfig;
use canvas_core::seed::demo_art;
use canvas_core::{CanvasEngine, EngineSettings};
use canvas_observer::startup::spawn_server;
use canvas_observer::state::{AppState, StreamSettings};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::error::AppError;

/// Default configuration file, relative to the working directory.
const DEFAULT_CONFIG_PATH: &str = "canvas-config.yaml";

/// Application entry point.
///
/// # Errors
///
/// Returns an error if configuration, startup, or serving fails.
#[tokio::main]
async fn main() -> Result<(), AppError> {
    // 1. Load configuration. Logging depends on it, so failures here are
    //    reported by the returned error alone.
    let (config, config_source) = load_config()?;

    // 2. Initialize structured logging.
    init_logging(&config)?;
    info!(source = %config_source, "canvas-server starting");
    info!(
        grid_size = config.canvas.grid_size,
        round_duration_ms = config.canvas.round_duration_ms,
        initial_balance = config.canvas.initial_balance,
        seed_demo_art = config.canvas.seed_demo_art,
        "Configuration loaded"
    );

    // 3. Create the engine.
    let settings = EngineSettings::from_config(&config.canvas)?;
    let engine = Arc::new(CanvasEngine::with_system_time(settings)?);

    // 4. Seed demo artwork.
    if config.canvas.seed_demo_art {
        let placed = engine.seed(&demo_art(settings.grid_size, engine.now()));
        info!(cells = placed, "Demo artwork seeded");
    }

    // 5. Serve until Ctrl-C.
    let state = Arc::new(
        AppState::new(Arc::clone(&engine)).with_streams(StreamSettings::from_config(&config)),
    );
    let (addr, handle) = spawn_server(&config.server, state, shutdown_signal()).await?;
    info!(%addr, "Canvas server started");

    handle.await?;
    info!("canvas-server stopped");
    Ok(())
}

/// Load configuration from `CANVAS_CONFIG` or `canvas-config.yaml`.
///
/// A missing file is not an error: defaults are used, with environment
/// overrides still applied.
fn load_config() -> Result<(AppConfig, String), AppError> {
    let path = std::env::var_os("CANVAS_CONFIG")
        .map_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH), PathBuf::from);
    if path.exists() {
        let config = AppConfig::from_file(&path)?;
        Ok((config, path.display().to_string()))
    } else {
        let mut config = AppConfig::default();
        config.server.apply_env_overrides()?;
        Ok((config, String::from("defaults")))
    }
}

/// Install the global tracing subscriber.
///
/// `RUST_LOG` wins over `logging.level`.
fn init_logging(config: &AppConfig) -> Result<(), AppError> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.logging.level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true);
    let result = if config.logging.json {
        builder.json().try_init()
    } else {
        builder.try_init()
    };
    result.map_err(|e| AppError::Logging {
        message: e.to_string(),
    })
}

/// Resolve when the process receives `Ctrl-C`.
async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("Shutdown signal received"),
        Err(e) => {
            warn!(error = %e, "Failed to listen for Ctrl-C; serving until killed");
            std::future::pending::<()>().await;
        }
    }
}
