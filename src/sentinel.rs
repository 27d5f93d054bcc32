// src/sentinel.rs

//! Startup sentinels: the files the worker writes to report how its launch
//! went.
//!
//! The worker communicates exclusively through its working directory. Three
//! well-known files are watched after spawn:
//!
//! - `ERROR_IN_CONFIG.log`: the worker rejected its configuration.
//! - `INSTANCE_CREATED`: the worker finished its job during startup.
//! - `launch_instance.log`: the worker reached its main loop and is writing
//!   its launch log.
//!
//! A file only counts once it has content. The worker touches some of these
//! before writing to them, so an empty file means "in progress", not "done".

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use tokio::time::Instant;
use tracing::{debug, warn};

/// Name of the sentinel reporting a configuration error.
pub const ERROR_SENTINEL: &str = "ERROR_IN_CONFIG.log";
/// Name of the sentinel reporting that the instance was created.
pub const CREATED_SENTINEL: &str = "INSTANCE_CREATED";
/// Name of the launch log the worker streams once it is up.
pub const RUNNING_SENTINEL: &str = "launch_instance.log";

/// How a worker's startup went, as told by its sentinel files.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartupOutcome {
    /// `ERROR_IN_CONFIG.log` has content: bad config, the worker will not
    /// make progress.
    ConfigError,
    /// `INSTANCE_CREATED` has content: the job finished during startup.
    Created,
    /// `launch_instance.log` has content: the worker is in its main loop.
    Running,
}

impl StartupOutcome {
    pub fn is_success(self) -> bool {
        !matches!(self, StartupOutcome::ConfigError)
    }
}

/// Result of watching the sentinels for one startup window.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StartupDecision {
    /// A sentinel became conclusive within the deadline. `detail` is a
    /// trimmed excerpt of the file that decided it.
    Observed {
        outcome: StartupOutcome,
        detail: String,
    },
    /// Nothing conclusive appeared within the deadline.
    TimedOut { waited: Duration },
}

/// Absolute locations of the three sentinels for one working directory.
#[derive(Debug, Clone)]
pub struct SentinelPaths {
    pub error: PathBuf,
    pub created: PathBuf,
    pub running: PathBuf,
}

impl SentinelPaths {
    pub fn new(workdir: &Path) -> Self {
        Self {
            error: workdir.join(ERROR_SENTINEL),
            created: workdir.join(CREATED_SENTINEL),
            running: workdir.join(RUNNING_SENTINEL),
        }
    }

    /// Remove leftovers from a previous run so a stale file cannot be
    /// mistaken for this run's outcome.
    pub fn clear(&self) {
        for path in [&self.error, &self.created, &self.running] {
            match fs::remove_file(path) {
                Ok(()) => debug!(path = %path.display(), "removed stale sentinel"),
                Err(err) if err.kind() == io::ErrorKind::NotFound => {}
                Err(err) => {
                    warn!(path = %path.display(), error = %err, "could not remove sentinel")
                }
            }
        }
    }

    /// One non-blocking check of all three files.
    pub fn observe(&self) -> Option<(StartupOutcome, String)> {
        let error = read_nonempty(&self.error);
        let created = read_nonempty(&self.created);
        let running = read_nonempty(&self.running);

        let outcome = resolve_outcome(error.is_some(), created.is_some(), running.is_some())?;
        let detail = match outcome {
            StartupOutcome::ConfigError => error,
            StartupOutcome::Created => created,
            StartupOutcome::Running => running,
        };

        Some((outcome, detail.unwrap_or_default()))
    }
}

/// Rank simultaneous sentinels. Error beats created beats running; `None`
/// when nothing conclusive has appeared yet.
pub fn resolve_outcome(error: bool, created: bool, running: bool) -> Option<StartupOutcome> {
    if error {
        Some(StartupOutcome::ConfigError)
    } else if created {
        Some(StartupOutcome::Created)
    } else if running {
        Some(StartupOutcome::Running)
    } else {
        None
    }
}

/// Poll the sentinels until one is conclusive or `timeout` has elapsed.
///
/// Checks immediately, then once per `interval`, so the decision lands at
/// most one interval past the deadline.
pub async fn wait_for_initial_status(
    paths: &SentinelPaths,
    timeout: Duration,
    interval: Duration,
) -> StartupDecision {
    let started = Instant::now();

    loop {
        if let Some((outcome, detail)) = paths.observe() {
            debug!(?outcome, "sentinel observed");
            return StartupDecision::Observed {
                outcome,
                detail: excerpt(&detail),
            };
        }

        let waited = started.elapsed();
        if waited >= timeout {
            return StartupDecision::TimedOut { waited };
        }

        tokio::time::sleep(interval).await;
    }
}

/// Trim sentinel content down to something that fits in a chat message.
pub fn excerpt(content: &str) -> String {
    const MAX_LINES: usize = 6;
    const MAX_CHARS: usize = 400;

    let mut out = String::new();
    for line in content.lines().take(MAX_LINES) {
        if !out.is_empty() {
            out.push('\n');
        }
        out.push_str(line);
        if out.len() >= MAX_CHARS {
            break;
        }
    }

    if out.len() > MAX_CHARS {
        let mut cut = MAX_CHARS;
        while !out.is_char_boundary(cut) {
            cut -= 1;
        }
        out.truncate(cut);
        out.push('…');
    }

    out.trim_end().to_string()
}

/// Read a sentinel, treating absent and zero-length files alike.
fn read_nonempty(path: &Path) -> Option<String> {
    let bytes = fs::read(path).ok()?;
    if bytes.is_empty() {
        return None;
    }
    Some(String::from_utf8_lossy(&bytes).into_owned())
}
