// src/provision.rs

//! Provisioning of the worker's Python runtime environment.
//!
//! A run owns a `venv/` directory inside the working directory. When it is
//! absent (or a rebuild is forced) the environment is built from scratch:
//! system packages best-effort through `apt-get`, then `python3 -m venv`,
//! then the venv's own `pip` installs `requirements.txt`. The venv and pip
//! steps are mandatory; a failure there aborts the run before any worker is
//! spawned.

use std::path::{Path, PathBuf};
use std::process::Stdio;

use tokio::process::Command;
use tracing::{debug, info, warn};

use crate::errors::{LaunchwatchError, Result};

/// Directory name of the virtualenv inside the working directory.
pub const VENV_DIR: &str = "venv";
/// Dependency manifest consumed by pip.
pub const REQUIREMENTS_FILE: &str = "requirements.txt";

/// One subprocess invocation of the provisioning plan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedStep {
    /// Short human name used in logs and error messages.
    pub name: &'static str,
    pub program: String,
    pub args: Vec<String>,
    /// Best-effort steps may fail (or be absent on the host entirely)
    /// without aborting provisioning.
    pub best_effort: bool,
}

/// The ordered steps that build a fresh environment in `workdir`.
///
/// `workdir` should be absolute so the venv's own `pip` resolves no matter
/// what the child processes chdir to.
pub fn provision_plan(workdir: &Path) -> Vec<PlannedStep> {
    let venv = workdir.join(VENV_DIR);
    let pip = venv.join("bin").join("pip");

    vec![
        PlannedStep {
            name: "apt-get update",
            program: "apt-get".to_string(),
            args: vec!["update".to_string(), "-y".to_string()],
            best_effort: true,
        },
        PlannedStep {
            name: "apt-get install",
            program: "apt-get".to_string(),
            args: vec![
                "install".to_string(),
                "-y".to_string(),
                "python3-venv".to_string(),
                "python3-pip".to_string(),
            ],
            best_effort: true,
        },
        PlannedStep {
            name: "create venv",
            program: "python3".to_string(),
            args: vec![
                "-m".to_string(),
                "venv".to_string(),
                venv.display().to_string(),
            ],
            best_effort: false,
        },
        PlannedStep {
            name: "upgrade pip",
            program: pip.display().to_string(),
            args: vec![
                "install".to_string(),
                "--upgrade".to_string(),
                "pip".to_string(),
            ],
            best_effort: false,
        },
        PlannedStep {
            name: "install requirements",
            program: pip.display().to_string(),
            args: vec![
                "install".to_string(),
                "-r".to_string(),
                REQUIREMENTS_FILE.to_string(),
            ],
            best_effort: false,
        },
    ]
}

/// Whether provisioning must run at all.
pub fn needs_provision(venv_dir: &Path, force: bool) -> bool {
    force || !venv_dir.is_dir()
}

/// Make sure `workdir` holds a usable virtualenv, building or rebuilding it
/// as needed.
///
/// Blocking by nature: nothing else may proceed on a half-built
/// environment, so each step runs to completion before the next.
pub async fn ensure_environment(workdir: &Path, force: bool) -> Result<()> {
    let workdir = workdir.canonicalize()?;
    let venv = workdir.join(VENV_DIR);

    if !needs_provision(&venv, force) {
        info!(venv = %venv.display(), "virtualenv present, skipping provisioning");
        return Ok(());
    }

    if venv.exists() {
        info!(venv = %venv.display(), "rebuild requested, removing virtualenv");
        tokio::fs::remove_dir_all(&venv).await?;
    }

    for step in provision_plan(&workdir) {
        run_step(&workdir, &step).await?;
    }

    info!(venv = %venv.display(), "virtualenv provisioned");
    Ok(())
}

async fn run_step(workdir: &Path, step: &PlannedStep) -> Result<()> {
    info!(step = step.name, program = %step.program, "running provisioning step");

    let output = Command::new(&step.program)
        .args(&step.args)
        .current_dir(workdir)
        .stdin(Stdio::null())
        .output()
        .await;

    match output {
        Ok(out) if out.status.success() => {
            debug!(step = step.name, "provisioning step succeeded");
            Ok(())
        }
        Ok(out) => {
            let stderr = String::from_utf8_lossy(&out.stderr);
            let reason = format!(
                "exit {}: {}",
                out.status.code().unwrap_or(-1),
                tail(&stderr)
            );
            step_failed(step, reason)
        }
        Err(err) => step_failed(step, err.to_string()),
    }
}

fn step_failed(step: &PlannedStep, reason: String) -> Result<()> {
    if step.best_effort {
        warn!(step = step.name, reason = %reason, "best-effort step failed, continuing");
        Ok(())
    } else {
        Err(LaunchwatchError::Provision {
            step: step.name.to_string(),
            reason,
        })
    }
}

/// Last few lines of a step's stderr, enough to tell what went wrong.
fn tail(text: &str) -> String {
    const KEEP: usize = 5;
    let lines: Vec<&str> = text.lines().collect();
    let start = lines.len().saturating_sub(KEEP);
    lines[start..].join("\n")
}

/// The environment overlay a shell would get from `source venv/bin/activate`.
///
/// Spawned processes receive `VIRTUAL_ENV` plus a `PATH` with the venv's
/// `bin/` in front, which is all activation actually does.
#[derive(Debug, Clone)]
pub struct Activation {
    venv: PathBuf,
}

impl Activation {
    pub fn new(venv_dir: impl Into<PathBuf>) -> Self {
        Self {
            venv: venv_dir.into(),
        }
    }

    /// Activation for `venv_dir` resolved to its canonical path, so the
    /// overlay keeps pointing at the venv no matter what directory the
    /// worker changes into. Falls back to the path as given when it does
    /// not resolve.
    pub fn resolved(venv_dir: &Path) -> Self {
        match venv_dir.canonicalize() {
            Ok(venv) => Self { venv },
            Err(err) => {
                warn!(
                    path = %venv_dir.display(),
                    error = %err,
                    "cannot resolve venv path, using it as given"
                );
                Self::new(venv_dir)
            }
        }
    }

    pub fn venv_dir(&self) -> &Path {
        &self.venv
    }

    /// Variables to lay over a child's inherited environment.
    pub fn env_overlay(&self) -> Vec<(String, String)> {
        let bin = self.venv.join("bin");
        let path = match std::env::var("PATH") {
            Ok(current) => format!("{}:{}", bin.display(), current),
            Err(_) => bin.display().to_string(),
        };

        vec![
            ("VIRTUAL_ENV".to_string(), self.venv.display().to_string()),
            ("PATH".to_string(), path),
        ]
    }
}
