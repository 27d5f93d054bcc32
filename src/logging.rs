// src/logging.rs

//! Logging setup for `launchwatch` using `tracing` + `tracing-subscriber`.
//!
//! Level resolution order:
//! 1. `--log-level` CLI flag (if provided)
//! 2. `LAUNCHWATCH_LOG` environment variable (e.g. "info", "debug")
//! 3. default `info`
//!
//! Everything goes to STDERR: the worker owns its own log files and stdout
//! stays clean for shell pipelines.

use anyhow::Result;
use tracing_subscriber::fmt;

use crate::cli::LogLevel;

/// Initialise the global logging subscriber.
///
/// Call once at startup, before the runtime is wired up.
pub fn init_logging(cli_level: Option<LogLevel>) -> Result<()> {
    let level = cli_level
        .map(tracing::Level::from)
        .or_else(level_from_env)
        .unwrap_or(tracing::Level::INFO);

    fmt()
        .with_max_level(level)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    Ok(())
}

fn level_from_env() -> Option<tracing::Level> {
    std::env::var("LAUNCHWATCH_LOG")
        .ok()
        .and_then(|raw| raw.trim().parse().ok())
}
