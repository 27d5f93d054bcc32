// src/lib.rs

pub mod cli;
pub mod config;
pub mod errors;
pub mod logging;
pub mod notify;
pub mod provision;
pub mod sentinel;
pub mod supervisor;
pub mod worker;

use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::cli::CliArgs;
use crate::config::Settings;
use crate::errors::{Error, Result};
use crate::notify::{ChannelConfig, Notifier};
use crate::supervisor::{
    RealSupervisorBackend, SupervisorCore, SupervisorEvent, SupervisorRuntime, signals,
};

/// High-level entry point used by `main.rs`.
///
/// Resolves settings from the CLI and drives one supervised run to its
/// process exit code.
pub async fn run(args: CliArgs) -> Result<i32> {
    let settings = Settings::from_cli(&args)?;
    run_supervised(settings).await
}

/// Drive one supervised lifecycle with already-resolved settings.
///
/// Split out from [`run`] so integration tests can hand in sub-second
/// intervals and temp directories directly.
pub async fn run_supervised(settings: Settings) -> Result<i32> {
    info!(
        workdir = %settings.workdir.display(),
        worker = %settings.worker_command,
        force_rebuild = settings.force_rebuild,
        "starting supervised run"
    );

    // Supervisor event channel.
    let (event_tx, event_rx) = mpsc::channel::<SupervisorEvent>(16);

    // Signal handlers go in before anything is spawned.
    signals::spawn_signal_adapters(event_tx.clone())?;

    // Channels may already be resolvable from the process env; the env
    // file refines them later.
    let notifier = Notifier::new(ChannelConfig::from_process_env())?;
    debug!(channels = ?notifier.channels().active(), "initial notification channels");

    let backend = RealSupervisorBackend::new(settings.clone(), notifier, event_tx.clone());

    // Construct the pure core (single source of truth for semantics).
    let core = SupervisorCore::new(settings.force_rebuild);

    // Seed the loop.
    event_tx
        .send(SupervisorEvent::Started)
        .await
        .map_err(Error::from)?;

    // Async IO shell around the core.
    let runtime = SupervisorRuntime::new(core, event_rx, backend);
    runtime.run().await
}
