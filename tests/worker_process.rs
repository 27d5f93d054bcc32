// tests/worker_process.rs

//! Real process spawning and group signalling. Workers here are tiny
//! `sh` one-liners confined to temp directories.

use std::error::Error;
use std::fs;
use std::time::Duration;

use launchwatch::worker::{
    is_alive, resume_group, spawn, stop_group, terminate_group, watch_until_exit,
};
use launchwatch_test_utils::init_tracing;
use tempfile::TempDir;
use tokio::time::timeout;

type TestResult = Result<(), Box<dyn Error>>;

#[tokio::test]
async fn worker_runs_inside_the_workdir() -> TestResult {
    init_tracing();
    let dir = TempDir::new()?;

    let mut child = spawn("echo hello > out.txt", dir.path(), &[])?;
    let status = child.wait().await?;

    assert!(status.success());
    let out = fs::read_to_string(dir.path().join("out.txt"))?;
    assert_eq!(out.trim(), "hello");
    Ok(())
}

#[tokio::test]
async fn env_overlay_reaches_the_worker() -> TestResult {
    init_tracing();
    let dir = TempDir::new()?;
    let env = vec![("LAUNCH_MARKER".to_string(), "it-works".to_string())];

    let mut child = spawn("echo \"$LAUNCH_MARKER\" > marker.txt", dir.path(), &env)?;
    child.wait().await?;

    let out = fs::read_to_string(dir.path().join("marker.txt"))?;
    assert_eq!(out.trim(), "it-works");
    Ok(())
}

#[tokio::test]
async fn liveness_probe_tracks_the_process_table() -> TestResult {
    init_tracing();
    let dir = TempDir::new()?;

    let mut child = spawn("sleep 10", dir.path(), &[])?;
    let pid = child.id().ok_or("worker pid unavailable")?;

    assert!(is_alive(pid));

    terminate_group(pid);
    let status = timeout(Duration::from_secs(5), child.wait()).await??;
    assert!(!status.success());

    // Reaped and gone: the probe must flip.
    assert!(!is_alive(pid));
    Ok(())
}

#[tokio::test]
async fn watch_reaps_and_returns_when_the_worker_exits() -> TestResult {
    init_tracing();
    let dir = TempDir::new()?;

    let child = spawn("sleep 0.2", dir.path(), &[])?;
    let pid = child.id().ok_or("worker pid unavailable")?;

    timeout(
        Duration::from_secs(5),
        watch_until_exit(Some(child), pid, Duration::from_millis(20)),
    )
    .await?;
    Ok(())
}

#[tokio::test]
async fn termination_takes_out_the_whole_group() -> TestResult {
    init_tracing();
    let dir = TempDir::new()?;

    // The worker forks a grandchild; a plain kill of the leader would
    // leave it running.
    let child = spawn("sleep 30 & sleep 30", dir.path(), &[])?;
    let pid = child.id().ok_or("worker pid unavailable")?;

    terminate_group(pid);
    timeout(
        Duration::from_secs(5),
        watch_until_exit(Some(child), pid, Duration::from_millis(20)),
    )
    .await?;
    Ok(())
}

#[tokio::test]
async fn stop_and_resume_leave_the_worker_alive() -> TestResult {
    init_tracing();
    let dir = TempDir::new()?;

    let mut child = spawn("sleep 10", dir.path(), &[])?;
    let pid = child.id().ok_or("worker pid unavailable")?;

    stop_group(pid);
    assert!(is_alive(pid), "a stopped worker is paused, not gone");

    resume_group(pid);
    assert!(is_alive(pid));

    terminate_group(pid);
    timeout(Duration::from_secs(5), child.wait()).await??;
    Ok(())
}

#[tokio::test]
async fn signalling_a_reaped_worker_is_harmless() -> TestResult {
    init_tracing();
    let dir = TempDir::new()?;

    let mut child = spawn("true", dir.path(), &[])?;
    let pid = child.id().ok_or("worker pid unavailable")?;
    child.wait().await?;

    // Logs and moves on. No panic, no error surfaced.
    terminate_group(pid);
    stop_group(pid);
    resume_group(pid);
    Ok(())
}
