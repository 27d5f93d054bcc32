use std::future::Future;
use std::path::PathBuf;
use std::pin::Pin;
use std::sync::{Arc, Mutex};

use tokio::sync::mpsc;

use launchwatch::errors::Result;
use launchwatch::sentinel::{StartupDecision, StartupOutcome};
use launchwatch::supervisor::{SupervisorBackend, SupervisorCommand, SupervisorEvent};

/// Scripted answers for the lifecycle steps a fake run goes through.
///
/// The default script is the happy path: provisioning succeeds, the env
/// file loads, the worker spawns as pid 4242, startup classifies as
/// running, and the monitor reports the exit as soon as monitoring starts.
/// Override individual steps to steer a test down another path.
#[derive(Debug, Clone)]
pub struct FakeScript {
    pub provisioning_error: Option<String>,
    pub config_missing: bool,
    pub spawn_error: Option<String>,
    /// `None` holds the startup verdict so a test can inject its own
    /// `StartupDecided` (or a signal) while the core is classifying.
    pub startup_decision: Option<StartupDecision>,
    /// When false, `MonitorWorker` never reports an exit; the test injects
    /// `WorkerExited` (or a signal) itself.
    pub finish_monitor_immediately: bool,
    pub worker_pid: u32,
}

impl Default for FakeScript {
    fn default() -> Self {
        Self {
            provisioning_error: None,
            config_missing: false,
            spawn_error: None,
            startup_decision: Some(StartupDecision::Observed {
                outcome: StartupOutcome::Running,
                detail: "instance launching".to_string(),
            }),
            finish_monitor_immediately: true,
            worker_pid: 4242,
        }
    }
}

/// A fake backend that:
/// - records every command it is asked to execute
/// - drives the loop forward by answering with scripted events.
///
/// No processes, no files, no HTTP.
pub struct FakeBackend {
    event_tx: mpsc::Sender<SupervisorEvent>,
    script: FakeScript,
    executed: Arc<Mutex<Vec<SupervisorCommand>>>,
}

impl FakeBackend {
    pub fn new(
        event_tx: mpsc::Sender<SupervisorEvent>,
        script: FakeScript,
        executed: Arc<Mutex<Vec<SupervisorCommand>>>,
    ) -> Self {
        Self {
            event_tx,
            script,
            executed,
        }
    }

    fn response(&self, command: &SupervisorCommand) -> Option<SupervisorEvent> {
        match command {
            SupervisorCommand::ClearSentinels => Some(SupervisorEvent::SentinelsCleared),
            SupervisorCommand::PrepareEnvironment { .. } => {
                Some(match &self.script.provisioning_error {
                    Some(reason) => SupervisorEvent::ProvisioningFailed {
                        reason: reason.clone(),
                    },
                    None => SupervisorEvent::EnvironmentReady,
                })
            }
            SupervisorCommand::ActivateEnvironment => Some(SupervisorEvent::EnvironmentActivated),
            SupervisorCommand::LoadWorkerConfig => Some(if self.script.config_missing {
                SupervisorEvent::ConfigMissing {
                    path: PathBuf::from("/nonexistent/oci.env"),
                }
            } else {
                SupervisorEvent::ConfigLoaded
            }),
            SupervisorCommand::SpawnWorker => Some(match &self.script.spawn_error {
                Some(reason) => SupervisorEvent::SpawnFailed {
                    reason: reason.clone(),
                },
                None => SupervisorEvent::WorkerSpawned {
                    pid: self.script.worker_pid,
                },
            }),
            SupervisorCommand::WatchStartup => self
                .script
                .startup_decision
                .clone()
                .map(|decision| SupervisorEvent::StartupDecided { decision }),
            SupervisorCommand::MonitorWorker { .. } => self
                .script
                .finish_monitor_immediately
                .then_some(SupervisorEvent::WorkerExited),
            _ => None,
        }
    }
}

impl SupervisorBackend for FakeBackend {
    fn execute(
        &mut self,
        command: SupervisorCommand,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>> {
        let response = self.response(&command);
        let tx = self.event_tx.clone();
        let executed = Arc::clone(&self.executed);

        Box::pin(async move {
            {
                let mut guard = executed.lock().unwrap();
                guard.push(command);
            }

            if let Some(event) = response {
                tx.send(event).await.map_err(anyhow::Error::from)?;
            }
            Ok(())
        })
    }
}
