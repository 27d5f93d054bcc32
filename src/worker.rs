// src/worker.rs

//! The worker process: detached spawn, group signalling and the exit watch.

use std::path::Path;
use std::process::Stdio;
use std::time::Duration;

use anyhow::{Context, Result};
use nix::sys::signal::{self, Signal};
use nix::unistd::Pid;
use tokio::process::{Child, Command};
use tracing::{debug, info, warn};

/// Launch `command_line` through `sh -c` in `workdir`, detached.
///
/// The child goes into its own process group with all stdio on /dev/null,
/// like a `nohup`'d daemon: it keeps running if the supervisor's terminal
/// goes away, and group signals reach any children it spawns itself.
/// `env` is laid over the inherited environment; later entries win.
pub fn spawn(command_line: &str, workdir: &Path, env: &[(String, String)]) -> Result<Child> {
    let mut cmd = Command::new("sh");
    cmd.arg("-c")
        .arg(command_line)
        .current_dir(workdir)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .process_group(0);

    for (key, value) in env {
        cmd.env(key, value);
    }

    cmd.spawn()
        .with_context(|| format!("spawning worker `{command_line}`"))
}

/// Ask the worker group to shut down.
pub fn terminate_group(pid: u32) {
    signal_group(pid, Signal::SIGTERM);
}

/// Pause the worker group.
pub fn stop_group(pid: u32) {
    signal_group(pid, Signal::SIGSTOP);
}

/// Wake a previously stopped worker group.
pub fn resume_group(pid: u32) {
    signal_group(pid, Signal::SIGCONT);
}

/// Send `sig` to the worker's whole process group. Best-effort: a group
/// that is already gone is not an error.
fn signal_group(pid: u32, sig: Signal) {
    let pgid = Pid::from_raw(pid as i32);
    match signal::killpg(pgid, sig) {
        Ok(()) => debug!(pid, signal = %sig, "signalled worker group"),
        Err(nix::errno::Errno::ESRCH) => debug!(pid, signal = %sig, "worker group already gone"),
        Err(err) => warn!(pid, signal = %sig, error = %err, "could not signal worker group"),
    }
}

/// Whether `pid` still exists in the process table.
///
/// Signal 0 probes without delivering anything; EPERM still means "exists".
pub fn is_alive(pid: u32) -> bool {
    match signal::kill(Pid::from_raw(pid as i32), None) {
        Ok(()) => true,
        Err(nix::errno::Errno::EPERM) => true,
        Err(_) => false,
    }
}

/// Watch the worker until it leaves the process table, polling once per
/// `interval`.
///
/// The supervisor is the worker's parent, so while a handle is held
/// `try_wait` both detects and reaps the exit; a zombie would otherwise
/// count as alive forever. Without a handle, liveness comes from signal 0.
pub async fn watch_until_exit(mut child: Option<Child>, pid: u32, interval: Duration) {
    info!(pid, "monitoring worker until exit");

    loop {
        match child.as_mut() {
            Some(handle) => match handle.try_wait() {
                Ok(Some(status)) => {
                    info!(pid, exit = %status, "worker exited");
                    return;
                }
                Ok(None) => {}
                Err(err) => {
                    warn!(pid, error = %err, "worker wait failed, falling back to probing");
                    child = None;
                }
            },
            None => {
                if !is_alive(pid) {
                    info!(pid, "worker no longer in process table");
                    return;
                }
            }
        }

        tokio::time::sleep(interval).await;
    }
}
