// src/config/settings.rs

//! Resolved run settings derived from the CLI.

use std::path::PathBuf;
use std::time::Duration;

use tracing::warn;

use crate::cli::CliArgs;
use crate::errors::{LaunchwatchError, Result};

/// The positional mode argument that forces a virtualenv rebuild.
pub const REBUILD_MODE: &str = "rebuild";

/// Location of the env file relative to the invoking user's home.
const DEFAULT_ENV_FILE: &str = "oci-dev/env/oci.env";

/// Everything the supervisor needs to know for one run.
#[derive(Debug, Clone)]
pub struct Settings {
    /// Directory holding `venv/`, `requirements.txt` and the sentinel files.
    pub workdir: PathBuf,
    /// Env file sourced into the worker's environment.
    pub env_file: PathBuf,
    /// Worker command line, run through `sh -c`.
    pub worker_command: String,
    /// Rebuild the virtualenv even if one already exists.
    pub force_rebuild: bool,
    /// Deadline for startup classification.
    pub startup_timeout: Duration,
    /// Sentinel polling interval during startup.
    pub poll_interval: Duration,
    /// Liveness polling interval while monitoring.
    pub monitor_interval: Duration,
}

impl Settings {
    pub fn from_cli(args: &CliArgs) -> Result<Self> {
        let force_rebuild = match args.mode.as_deref() {
            Some(REBUILD_MODE) => true,
            Some(other) => {
                warn!(mode = %other, "unrecognised mode argument, ignoring");
                false
            }
            None => false,
        };

        let env_file = match &args.env_file {
            Some(path) => path.clone(),
            None => default_env_file()?,
        };

        Ok(Self {
            workdir: args.workdir.clone(),
            env_file,
            worker_command: args.worker.clone(),
            force_rebuild,
            startup_timeout: Duration::from_secs(args.startup_timeout_secs),
            poll_interval: Duration::from_secs(args.poll_interval_secs),
            monitor_interval: Duration::from_secs(args.monitor_interval_secs),
        })
    }

    /// `venv/` inside the working directory.
    pub fn venv_dir(&self) -> PathBuf {
        self.workdir.join("venv")
    }

    /// `requirements.txt` inside the working directory.
    pub fn requirements(&self) -> PathBuf {
        self.workdir.join("requirements.txt")
    }
}

fn default_env_file() -> Result<PathBuf> {
    let home = std::env::var_os("HOME").ok_or_else(|| {
        LaunchwatchError::ConfigError("HOME is not set and no --env-file was given".to_string())
    })?;

    Ok(PathBuf::from(home).join(DEFAULT_ENV_FILE))
}
