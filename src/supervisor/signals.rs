// src/supervisor/signals.rs

//! OS signals as supervisor events.
//!
//! One detached task owns the four signal streams and forwards each
//! delivery into the event channel, where the core decides what to do.
//! Handlers are installed before anything is spawned, so an early Ctrl-C
//! still unwinds through the ordinary interrupt path.
//!
//! SIGTSTP and SIGCONT are listened for explicitly: the worker sits in its
//! own process group, so terminal job control on the supervisor alone would
//! leave the worker running (or stopped forever after a resume).

use tokio::signal::unix::{SignalKind, signal};
use tokio::sync::mpsc;
use tracing::debug;

use crate::errors::Result;
use crate::supervisor::SupervisorEvent;

/// Install the handlers and spawn the forwarding task.
pub fn spawn_signal_adapters(event_tx: mpsc::Sender<SupervisorEvent>) -> Result<()> {
    let mut interrupt = signal(SignalKind::interrupt())?;
    let mut terminate = signal(SignalKind::terminate())?;
    let mut tstp = signal(SignalKind::from_raw(libc::SIGTSTP))?;
    let mut cont = signal(SignalKind::from_raw(libc::SIGCONT))?;

    tokio::spawn(async move {
        loop {
            let event = tokio::select! {
                received = interrupt.recv() => {
                    received.map(|_| SupervisorEvent::InterruptRequested)
                }
                received = terminate.recv() => {
                    received.map(|_| SupervisorEvent::InterruptRequested)
                }
                received = tstp.recv() => {
                    received.map(|_| SupervisorEvent::SuspendRequested)
                }
                received = cont.recv() => {
                    received.map(|_| SupervisorEvent::ResumeRequested)
                }
            };

            let Some(event) = event else {
                debug!("signal stream closed");
                return;
            };

            debug!(?event, "forwarding signal");
            if event_tx.send(event).await.is_err() {
                return;
            }
        }
    });

    Ok(())
}
