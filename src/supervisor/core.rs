// src/supervisor/core.rs

//! Pure lifecycle state machine.
//!
//! Consumes [`SupervisorEvent`]s and produces [`CoreStep`]s: an updated
//! phase plus the commands the IO shell should run next. No channels, no
//! Tokio types, no IO, so every path through the lifecycle (including the
//! signal ones) is unit-testable with plain function calls.

use std::path::PathBuf;

use crate::sentinel::{ERROR_SENTINEL, StartupDecision, StartupOutcome};
use crate::supervisor::{CoreStep, Phase, SupervisorCommand, SupervisorEvent};

/// Pure supervisor state.
///
/// The core is the only writer of the worker pid; commands carry the pid
/// out to the shell so no other state is shared with signal handlers.
#[derive(Debug)]
pub struct SupervisorCore {
    phase: Phase,
    worker_pid: Option<u32>,
    env_active: bool,
    force_rebuild: bool,
}

impl SupervisorCore {
    pub fn new(force_rebuild: bool) -> Self {
        Self {
            phase: Phase::Init,
            worker_pid: None,
            env_active: false,
            force_rebuild,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn worker_pid(&self) -> Option<u32> {
        self.worker_pid
    }

    /// Handle a single event, updating core state and returning the
    /// resulting commands for the IO shell.
    pub fn step(&mut self, event: SupervisorEvent) -> CoreStep {
        match event {
            SupervisorEvent::Started => self.on_started(),
            SupervisorEvent::SentinelsCleared => self.on_sentinels_cleared(),
            SupervisorEvent::EnvironmentReady => self.on_environment_ready(),
            SupervisorEvent::ProvisioningFailed { reason } => self.on_provisioning_failed(reason),
            SupervisorEvent::EnvironmentActivated => self.on_environment_activated(),
            SupervisorEvent::ConfigLoaded => self.on_config_loaded(),
            SupervisorEvent::ConfigMissing { path } => self.on_config_missing(path),
            SupervisorEvent::WorkerSpawned { pid } => self.on_worker_spawned(pid),
            SupervisorEvent::SpawnFailed { reason } => self.on_spawn_failed(reason),
            SupervisorEvent::StartupDecided { decision } => self.on_startup_decided(decision),
            SupervisorEvent::WorkerExited => self.on_worker_exited(),
            SupervisorEvent::InterruptRequested => self.on_interrupt(),
            SupervisorEvent::SuspendRequested => self.on_suspend(),
            SupervisorEvent::ResumeRequested => self.on_resume(),
        }
    }

    fn on_started(&mut self) -> CoreStep {
        if self.phase != Phase::Init {
            return CoreStep::idle();
        }
        self.continue_with(vec![SupervisorCommand::ClearSentinels])
    }

    fn on_sentinels_cleared(&mut self) -> CoreStep {
        if self.phase != Phase::Init {
            return CoreStep::idle();
        }
        self.phase = Phase::Preparing;
        self.continue_with(vec![SupervisorCommand::PrepareEnvironment {
            force: self.force_rebuild,
        }])
    }

    fn on_environment_ready(&mut self) -> CoreStep {
        if self.phase != Phase::Preparing {
            return CoreStep::idle();
        }
        self.phase = Phase::Activating;
        self.continue_with(vec![SupervisorCommand::ActivateEnvironment])
    }

    fn on_provisioning_failed(&mut self, reason: String) -> CoreStep {
        if self.phase != Phase::Preparing {
            return CoreStep::idle();
        }
        self.fail(format!("⚠️ Environment setup failed: {reason}"))
    }

    fn on_environment_activated(&mut self) -> CoreStep {
        if self.phase != Phase::Activating {
            return CoreStep::idle();
        }
        self.env_active = true;
        self.phase = Phase::LoadingConfig;
        self.continue_with(vec![SupervisorCommand::LoadWorkerConfig])
    }

    fn on_config_loaded(&mut self) -> CoreStep {
        if self.phase != Phase::LoadingConfig {
            return CoreStep::idle();
        }
        self.phase = Phase::Spawning;
        self.continue_with(vec![SupervisorCommand::SpawnWorker])
    }

    fn on_config_missing(&mut self, path: PathBuf) -> CoreStep {
        if self.phase != Phase::LoadingConfig {
            return CoreStep::idle();
        }
        self.fail(format!(
            "⚠️ Env file not found at {}. Aborting launch.",
            path.display()
        ))
    }

    fn on_worker_spawned(&mut self, pid: u32) -> CoreStep {
        if self.phase != Phase::Spawning {
            return CoreStep::idle();
        }
        self.worker_pid = Some(pid);
        self.phase = Phase::Classifying;
        self.continue_with(vec![SupervisorCommand::WatchStartup])
    }

    fn on_spawn_failed(&mut self, reason: String) -> CoreStep {
        if self.phase != Phase::Spawning {
            return CoreStep::idle();
        }
        self.fail(format!("⚠️ Could not launch the worker: {reason}"))
    }

    fn on_startup_decided(&mut self, decision: StartupDecision) -> CoreStep {
        if self.phase != Phase::Classifying {
            return CoreStep::idle();
        }
        match decision {
            StartupDecision::Observed {
                outcome: StartupOutcome::ConfigError,
                detail,
            } => self.fail(with_detail(
                &format!("🚨 Startup failed. {ERROR_SENTINEL} reported:"),
                &detail,
            )),
            StartupDecision::Observed {
                outcome: StartupOutcome::Created,
                detail,
            } => self.monitor_with(with_detail("🎉 Instance created!", &detail)),
            StartupDecision::Observed {
                outcome: StartupOutcome::Running,
                detail,
            } => self.monitor_with(with_detail(
                "🚀 Worker is up and launching the instance.",
                &detail,
            )),
            StartupDecision::TimedOut { waited } => self.fail(format!(
                "🚨 No startup signal from the worker after {}s. Terminating it.",
                waited.as_secs()
            )),
        }
    }

    fn on_worker_exited(&mut self) -> CoreStep {
        if self.phase != Phase::Monitoring {
            return CoreStep::idle();
        }
        self.complete("✅ Worker finished. Supervision complete.".to_string())
    }

    fn on_interrupt(&mut self) -> CoreStep {
        if self.is_terminal() {
            return CoreStep::idle();
        }
        let message = if self.worker_pid.is_some() {
            "🛑 Supervisor interrupted. Terminating the worker."
        } else {
            "🛑 Supervisor interrupted before the worker started."
        };
        self.fail(message.to_string())
    }

    fn on_suspend(&mut self) -> CoreStep {
        if self.is_terminal() {
            return CoreStep::idle();
        }
        let mut commands = vec![SupervisorCommand::Notify {
            message: "⏸️ Supervisor suspended. Send SIGCONT to resume.".to_string(),
        }];
        if let Some(pid) = self.worker_pid {
            commands.push(SupervisorCommand::StopWorker { pid });
        }
        commands.push(SupervisorCommand::SuspendSelf);
        self.continue_with(commands)
    }

    fn on_resume(&mut self) -> CoreStep {
        if self.is_terminal() {
            return CoreStep::idle();
        }
        match self.worker_pid {
            Some(pid) => self.continue_with(vec![SupervisorCommand::ResumeWorker { pid }]),
            None => CoreStep::idle(),
        }
    }

    fn is_terminal(&self) -> bool {
        matches!(self.phase, Phase::FailedExit | Phase::Done)
    }

    fn continue_with(&self, commands: Vec<SupervisorCommand>) -> CoreStep {
        CoreStep {
            commands,
            keep_running: true,
        }
    }

    /// Move to monitoring, announcing the startup outcome first.
    fn monitor_with(&mut self, message: String) -> CoreStep {
        let Some(pid) = self.worker_pid else {
            return self.fail("🚨 Lost track of the worker during startup.".to_string());
        };
        self.phase = Phase::Monitoring;
        self.continue_with(vec![
            SupervisorCommand::Notify { message },
            SupervisorCommand::MonitorWorker { pid },
        ])
    }

    /// Unwind after a fatal problem: stop the worker if one is up, tell the
    /// channels, undo activation, exit non-zero.
    fn fail(&mut self, message: String) -> CoreStep {
        self.phase = Phase::FailedExit;

        let mut commands = Vec::new();
        if let Some(pid) = self.worker_pid.take() {
            commands.push(SupervisorCommand::TerminateWorker { pid });
        }
        commands.push(SupervisorCommand::Notify { message });
        if self.env_active {
            self.env_active = false;
            commands.push(SupervisorCommand::DeactivateEnvironment);
        }
        commands.push(SupervisorCommand::Exit { code: 1 });

        CoreStep {
            commands,
            keep_running: false,
        }
    }

    /// Wrap up a successful run.
    fn complete(&mut self, message: String) -> CoreStep {
        self.phase = Phase::Done;
        self.worker_pid = None;

        let mut commands = vec![SupervisorCommand::Notify { message }];
        if self.env_active {
            self.env_active = false;
            commands.push(SupervisorCommand::DeactivateEnvironment);
        }
        commands.push(SupervisorCommand::Exit { code: 0 });

        CoreStep {
            commands,
            keep_running: false,
        }
    }
}

fn with_detail(base: &str, detail: &str) -> String {
    if detail.is_empty() {
        base.to_string()
    } else {
        format!("{base}\n{detail}")
    }
}
