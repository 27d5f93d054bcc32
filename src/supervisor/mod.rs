// src/supervisor/mod.rs

//! The supervision engine.
//!
//! Lifecycle decisions live in a pure state machine ([`core`]); everything
//! that touches the OS (subprocesses, sentinel files, signals, webhooks) is
//! behind the [`SupervisorBackend`] trait and driven by the async shell in
//! [`runtime`]. OS signals enter the loop as ordinary events through
//! [`signals`].

use std::path::PathBuf;

use crate::sentinel::StartupDecision;

/// Lifecycle phases of one supervised run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Clearing leftovers from previous runs.
    Init,
    /// Building (or reusing) the virtualenv.
    Preparing,
    /// Applying the venv activation overlay.
    Activating,
    /// Sourcing the env file.
    LoadingConfig,
    /// Launching the worker.
    Spawning,
    /// Waiting for a startup sentinel.
    Classifying,
    /// Worker is up; watching for its exit.
    Monitoring,
    /// Terminal: the run failed and unwound.
    FailedExit,
    /// Terminal: the run completed.
    Done,
}

/// Events flowing into the supervisor loop from the backend and from
/// signal handlers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SupervisorEvent {
    /// Kick-off, sent once when the loop starts.
    Started,
    /// Stale sentinels are gone.
    SentinelsCleared,
    /// The virtualenv is ready to use.
    EnvironmentReady,
    /// The virtualenv could not be built.
    ProvisioningFailed { reason: String },
    /// The activation overlay is in place.
    EnvironmentActivated,
    /// The env file was sourced.
    ConfigLoaded,
    /// The env file is absent or unreadable.
    ConfigMissing { path: PathBuf },
    /// The worker process is up.
    WorkerSpawned { pid: u32 },
    /// The worker process could not be started.
    SpawnFailed { reason: String },
    /// The startup watch reached a verdict.
    StartupDecided { decision: StartupDecision },
    /// The monitored worker left the process table.
    WorkerExited,
    /// SIGINT or SIGTERM arrived.
    InterruptRequested,
    /// SIGTSTP arrived.
    SuspendRequested,
    /// SIGCONT arrived.
    ResumeRequested,
}

/// Commands the pure core hands back to the IO shell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SupervisorCommand {
    /// Delete sentinel files from previous runs.
    ClearSentinels,
    /// Build the virtualenv if needed (always when `force`).
    PrepareEnvironment { force: bool },
    /// Apply the venv activation overlay to future spawns.
    ActivateEnvironment,
    /// Drop the activation overlay.
    DeactivateEnvironment,
    /// Source the env file and refresh notification channels.
    LoadWorkerConfig,
    /// Launch the worker, detached.
    SpawnWorker,
    /// Start polling sentinels for the startup verdict.
    WatchStartup,
    /// Start watching the worker's pid until it exits.
    MonitorWorker { pid: u32 },
    /// SIGTERM the worker's process group.
    TerminateWorker { pid: u32 },
    /// SIGSTOP the worker's process group.
    StopWorker { pid: u32 },
    /// SIGCONT the worker's process group.
    ResumeWorker { pid: u32 },
    /// Fan a message out to the notification channels.
    Notify { message: String },
    /// Stop the supervisor itself with SIGSTOP.
    SuspendSelf,
    /// Finish the run with this process exit code.
    Exit { code: i32 },
}

/// What one core step decided: commands for the shell, and whether the
/// loop keeps going.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoreStep {
    pub commands: Vec<SupervisorCommand>,
    pub keep_running: bool,
}

impl CoreStep {
    /// A step that issues no commands and keeps the loop alive.
    pub fn idle() -> Self {
        Self {
            commands: Vec::new(),
            keep_running: true,
        }
    }
}

pub mod backend;
pub mod core;
pub mod runtime;
pub mod signals;

pub use backend::{RealSupervisorBackend, SupervisorBackend};
pub use core::SupervisorCore;
pub use runtime::SupervisorRuntime;
