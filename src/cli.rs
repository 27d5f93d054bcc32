// src/cli.rs

//! CLI argument parsing using `clap`.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};

/// Command-line arguments for `launchwatch`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "launchwatch",
    version,
    about = "Provision a Python environment, launch a worker and watch it to completion.",
    long_about = None
)]
pub struct CliArgs {
    /// Pass the literal `rebuild` to force a rebuild of the virtualenv.
    ///
    /// Any other value (or none) keeps an existing `venv/` as-is.
    pub mode: Option<String>,

    /// Working directory: where `venv/`, `requirements.txt` and the worker's
    /// sentinel files live.
    #[arg(long, value_name = "PATH", default_value = ".")]
    pub workdir: PathBuf,

    /// Environment file sourced before launching the worker.
    ///
    /// Default: `~/oci-dev/env/oci.env`.
    #[arg(long, value_name = "PATH")]
    pub env_file: Option<PathBuf>,

    /// Worker command line, run through `sh -c` inside the working directory.
    #[arg(long, value_name = "CMD", default_value = "python3 main.py")]
    pub worker: String,

    /// How long to wait for a startup sentinel before giving up.
    #[arg(long, value_name = "SECS", default_value_t = 120)]
    pub startup_timeout_secs: u64,

    /// Interval between sentinel checks during startup.
    #[arg(long, value_name = "SECS", default_value_t = 5)]
    pub poll_interval_secs: u64,

    /// Interval between liveness checks once the worker is up.
    #[arg(long, value_name = "SECS", default_value_t = 60)]
    pub monitor_interval_secs: u64,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `LAUNCHWATCH_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<LogLevel> for tracing::Level {
    fn from(lvl: LogLevel) -> Self {
        match lvl {
            LogLevel::Error => tracing::Level::ERROR,
            LogLevel::Warn => tracing::Level::WARN,
            LogLevel::Info => tracing::Level::INFO,
            LogLevel::Debug => tracing::Level::DEBUG,
            LogLevel::Trace => tracing::Level::TRACE,
        }
    }
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}
