// src/supervisor/backend.rs

//! Pluggable supervision backend.
//!
//! The runtime talks to a [`SupervisorBackend`] instead of touching the OS
//! directly, so tests can drive the whole lifecycle with a fake that spawns
//! no processes and calls no webhooks. [`RealSupervisorBackend`] is the
//! production implementation.

use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use nix::sys::signal::{self, Signal};
use tokio::process::Child;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::config::{EnvFile, Settings};
use crate::errors::{Error, Result};
use crate::notify::{ChannelConfig, Notifier};
use crate::provision::{self, Activation};
use crate::sentinel::{self, SentinelPaths};
use crate::supervisor::{SupervisorCommand, SupervisorEvent};
use crate::worker;

/// Grace given to in-flight notifications once the run is over.
const NOTIFY_SETTLE_GRACE: Duration = Duration::from_secs(5);

/// Trait abstracting how supervisor commands touch the outside world.
///
/// Failures the lifecycle should react to (a venv that will not build, a
/// worker that will not spawn) are reported back as events, not as `Err`;
/// `Err` is reserved for faults that leave no sensible way to keep the
/// loop going.
pub trait SupervisorBackend: Send {
    /// Carry out one command from the core.
    fn execute(
        &mut self,
        command: SupervisorCommand,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>>;

    /// One-shot cleanup after the loop has stopped.
    fn settle(&mut self) -> Pin<Box<dyn Future<Output = ()> + Send + '_>> {
        Box::pin(async {})
    }
}

/// Production backend: real subprocesses, real files, real webhooks.
pub struct RealSupervisorBackend {
    settings: Settings,
    paths: SentinelPaths,
    notifier: Notifier,
    event_tx: mpsc::Sender<SupervisorEvent>,
    activation: Option<Activation>,
    env_file: Option<EnvFile>,
    child: Option<Child>,
}

impl RealSupervisorBackend {
    pub fn new(
        settings: Settings,
        notifier: Notifier,
        event_tx: mpsc::Sender<SupervisorEvent>,
    ) -> Self {
        let paths = SentinelPaths::new(&settings.workdir);
        Self {
            settings,
            paths,
            notifier,
            event_tx,
            activation: None,
            env_file: None,
            child: None,
        }
    }

    async fn emit(&self, event: SupervisorEvent) -> Result<()> {
        self.event_tx.send(event).await.map_err(Error::from)?;
        Ok(())
    }

    async fn clear_sentinels(&self) -> Result<()> {
        self.paths.clear();
        self.emit(SupervisorEvent::SentinelsCleared).await
    }

    async fn prepare_environment(&self, force: bool) -> Result<()> {
        match provision::ensure_environment(&self.settings.workdir, force).await {
            Ok(()) => self.emit(SupervisorEvent::EnvironmentReady).await,
            Err(err) => {
                self.emit(SupervisorEvent::ProvisioningFailed {
                    reason: err.to_string(),
                })
                .await
            }
        }
    }

    async fn activate_environment(&mut self) -> Result<()> {
        let activation = Activation::resolved(&self.settings.venv_dir());
        info!(venv = %activation.venv_dir().display(), "activating virtualenv");
        self.activation = Some(activation);
        self.emit(SupervisorEvent::EnvironmentActivated).await
    }

    fn deactivate_environment(&mut self) {
        if let Some(activation) = self.activation.take() {
            info!(venv = %activation.venv_dir().display(), "deactivated virtualenv");
        }
    }

    async fn load_worker_config(&mut self) -> Result<()> {
        let path = self.settings.env_file.clone();
        match EnvFile::load(&path) {
            Ok(env_file) => {
                info!(
                    path = %path.display(),
                    vars = env_file.vars().len(),
                    "sourced env file"
                );

                // Process env wins over the file, matching what an already
                // exported variable does to `source`.
                let channels = ChannelConfig::resolve(|key| {
                    std::env::var(key)
                        .ok()
                        .or_else(|| env_file.get(key).map(str::to_string))
                });
                info!(channels = ?channels.active(), "notification channels resolved");
                self.notifier.set_channels(channels);

                self.env_file = Some(env_file);
                self.emit(SupervisorEvent::ConfigLoaded).await
            }
            Err(err) => {
                warn!(path = %path.display(), error = %err, "cannot source env file");
                self.emit(SupervisorEvent::ConfigMissing { path }).await
            }
        }
    }

    async fn spawn_worker(&mut self) -> Result<()> {
        let mut env: Vec<(String, String)> = Vec::new();
        if let Some(activation) = &self.activation {
            env.extend(activation.env_overlay());
        }
        if let Some(env_file) = &self.env_file {
            env.extend(env_file.vars().iter().cloned());
        }

        match worker::spawn(&self.settings.worker_command, &self.settings.workdir, &env) {
            Ok(child) => match child.id() {
                Some(pid) => {
                    info!(pid, cmd = %self.settings.worker_command, "worker spawned");
                    self.child = Some(child);
                    self.emit(SupervisorEvent::WorkerSpawned { pid }).await
                }
                None => {
                    self.emit(SupervisorEvent::SpawnFailed {
                        reason: "worker pid unavailable".to_string(),
                    })
                    .await
                }
            },
            Err(err) => {
                self.emit(SupervisorEvent::SpawnFailed {
                    reason: err.to_string(),
                })
                .await
            }
        }
    }

    fn watch_startup(&self) {
        let paths = self.paths.clone();
        let timeout = self.settings.startup_timeout;
        let interval = self.settings.poll_interval;
        let tx = self.event_tx.clone();

        tokio::spawn(async move {
            let decision = sentinel::wait_for_initial_status(&paths, timeout, interval).await;
            let _ = tx.send(SupervisorEvent::StartupDecided { decision }).await;
        });
    }

    fn monitor_worker(&mut self, pid: u32) {
        let child = self.child.take();
        let interval = self.settings.monitor_interval;
        let tx = self.event_tx.clone();

        tokio::spawn(async move {
            worker::watch_until_exit(child, pid, interval).await;
            let _ = tx.send(SupervisorEvent::WorkerExited).await;
        });
    }

    fn suspend_self(&self) {
        info!("suspending supervisor, send SIGCONT to resume");
        if let Err(err) = signal::raise(Signal::SIGSTOP) {
            warn!(error = %err, "could not suspend");
        }
    }
}

impl SupervisorBackend for RealSupervisorBackend {
    fn execute(
        &mut self,
        command: SupervisorCommand,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>> {
        Box::pin(async move {
            debug!(?command, "executing command");
            match command {
                SupervisorCommand::ClearSentinels => self.clear_sentinels().await,
                SupervisorCommand::PrepareEnvironment { force } => {
                    self.prepare_environment(force).await
                }
                SupervisorCommand::ActivateEnvironment => self.activate_environment().await,
                SupervisorCommand::DeactivateEnvironment => {
                    self.deactivate_environment();
                    Ok(())
                }
                SupervisorCommand::LoadWorkerConfig => self.load_worker_config().await,
                SupervisorCommand::SpawnWorker => self.spawn_worker().await,
                SupervisorCommand::WatchStartup => {
                    self.watch_startup();
                    Ok(())
                }
                SupervisorCommand::MonitorWorker { pid } => {
                    self.monitor_worker(pid);
                    Ok(())
                }
                SupervisorCommand::TerminateWorker { pid } => {
                    worker::terminate_group(pid);
                    Ok(())
                }
                SupervisorCommand::StopWorker { pid } => {
                    worker::stop_group(pid);
                    Ok(())
                }
                SupervisorCommand::ResumeWorker { pid } => {
                    worker::resume_group(pid);
                    Ok(())
                }
                SupervisorCommand::Notify { message } => {
                    self.notifier.notify(&message);
                    Ok(())
                }
                SupervisorCommand::SuspendSelf => {
                    self.suspend_self();
                    Ok(())
                }
                // The runtime records the code itself; nothing to do here.
                SupervisorCommand::Exit { .. } => Ok(()),
            }
        })
    }

    fn settle(&mut self) -> Pin<Box<dyn Future<Output = ()> + Send + '_>> {
        Box::pin(async move {
            self.notifier.settle(NOTIFY_SETTLE_GRACE).await;
        })
    }
}
