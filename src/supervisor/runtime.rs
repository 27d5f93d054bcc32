// src/supervisor/runtime.rs

use std::fmt;

use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::errors::Result;

use super::core::SupervisorCore;
use super::{SupervisorBackend, SupervisorCommand, SupervisorEvent};

/// Drives the lifecycle state machine in response to [`SupervisorEvent`]s,
/// delegating actual work to a [`SupervisorBackend`].
///
/// This is a pure IO shell around [`SupervisorCore`], which holds all the
/// lifecycle semantics. The shell reads events from the channel, feeds the
/// core, executes the commands it gets back and records the exit code the
/// core decided on.
pub struct SupervisorRuntime<B: SupervisorBackend> {
    core: SupervisorCore,
    event_rx: mpsc::Receiver<SupervisorEvent>,
    backend: B,
    exit_code: Option<i32>,
}

impl<B: SupervisorBackend> fmt::Debug for SupervisorRuntime<B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SupervisorRuntime")
            .field("core", &self.core)
            .finish_non_exhaustive()
    }
}

impl<B: SupervisorBackend> SupervisorRuntime<B> {
    pub fn new(
        core: SupervisorCore,
        event_rx: mpsc::Receiver<SupervisorEvent>,
        backend: B,
    ) -> Self {
        Self {
            core,
            event_rx,
            backend,
            exit_code: None,
        }
    }

    /// Main event loop. Resolves to the process exit code once the core
    /// declares the run over.
    pub async fn run(mut self) -> Result<i32> {
        info!("supervisor runtime started");

        loop {
            let event = match self.event_rx.recv().await {
                Some(event) => event,
                None => {
                    warn!("event channel closed before the run finished");
                    break;
                }
            };

            debug!(?event, "runtime received event");
            let before = self.core.phase();

            let step = self.core.step(event);

            let after = self.core.phase();
            if before != after {
                info!(from = ?before, to = ?after, "phase changed");
            }

            for command in step.commands {
                self.execute_command(command).await?;
            }

            if !step.keep_running {
                break;
            }
        }

        self.backend.settle().await;

        let code = self.exit_code.unwrap_or(1);
        info!(code, "runtime exiting");
        Ok(code)
    }

    /// Execute a single command from the core.
    async fn execute_command(&mut self, command: SupervisorCommand) -> Result<()> {
        match command {
            SupervisorCommand::Exit { code } => {
                // The core also flips keep_running; here we only record the
                // code for the caller.
                self.exit_code = Some(code);
                Ok(())
            }
            other => self.backend.execute(other).await,
        }
    }
}
