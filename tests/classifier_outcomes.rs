// tests/classifier_outcomes.rs

//! Sentinel classification against real files in temp directories.

use std::error::Error;
use std::time::Duration;

use launchwatch::sentinel::{
    CREATED_SENTINEL, ERROR_SENTINEL, RUNNING_SENTINEL, SentinelPaths, StartupDecision,
    StartupOutcome, excerpt, resolve_outcome, wait_for_initial_status,
};
use launchwatch_test_utils::{init_tracing, write_file};
use proptest::prelude::*;
use tempfile::TempDir;

type TestResult = Result<(), Box<dyn Error>>;

#[test]
fn error_beats_created_and_running() -> TestResult {
    init_tracing();
    let dir = TempDir::new()?;
    write_file(dir.path(), ERROR_SENTINEL, "ERROR: bad region");
    write_file(dir.path(), CREATED_SENTINEL, "done");
    write_file(dir.path(), RUNNING_SENTINEL, "attempt 1");

    let paths = SentinelPaths::new(dir.path());
    let (outcome, detail) = paths.observe().ok_or("expected a verdict")?;

    assert_eq!(outcome, StartupOutcome::ConfigError);
    assert!(detail.contains("bad region"));
    Ok(())
}

#[test]
fn created_beats_running() -> TestResult {
    let dir = TempDir::new()?;
    write_file(dir.path(), CREATED_SENTINEL, "instance ocid1.instance.oc1");
    write_file(dir.path(), RUNNING_SENTINEL, "attempt 1");

    let paths = SentinelPaths::new(dir.path());
    let (outcome, detail) = paths.observe().ok_or("expected a verdict")?;

    assert_eq!(outcome, StartupOutcome::Created);
    assert!(detail.contains("ocid1"));
    Ok(())
}

#[test]
fn empty_sentinel_files_do_not_count() -> TestResult {
    let dir = TempDir::new()?;
    write_file(dir.path(), ERROR_SENTINEL, "");
    write_file(dir.path(), RUNNING_SENTINEL, "worker booted");

    let paths = SentinelPaths::new(dir.path());
    let (outcome, _) = paths.observe().ok_or("expected a verdict")?;

    assert_eq!(outcome, StartupOutcome::Running);
    Ok(())
}

#[test]
fn nothing_observed_before_files_exist() -> TestResult {
    let dir = TempDir::new()?;
    let paths = SentinelPaths::new(dir.path());

    assert!(paths.observe().is_none());
    Ok(())
}

#[test]
fn clear_removes_leftovers_from_a_previous_run() -> TestResult {
    init_tracing();
    let dir = TempDir::new()?;
    write_file(dir.path(), ERROR_SENTINEL, "stale");
    write_file(dir.path(), CREATED_SENTINEL, "stale");
    write_file(dir.path(), RUNNING_SENTINEL, "stale");

    let paths = SentinelPaths::new(dir.path());
    paths.clear();
    assert!(paths.observe().is_none());

    // Clearing an already clean directory is fine too.
    paths.clear();
    Ok(())
}

#[tokio::test]
async fn waits_until_a_sentinel_appears() -> TestResult {
    init_tracing();
    let dir = TempDir::new()?;
    let paths = SentinelPaths::new(dir.path());

    let workdir = dir.path().to_path_buf();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(80)).await;
        write_file(&workdir, RUNNING_SENTINEL, "worker booted");
    });

    let decision = wait_for_initial_status(
        &paths,
        Duration::from_secs(2),
        Duration::from_millis(20),
    )
    .await;

    assert_eq!(
        decision,
        StartupDecision::Observed {
            outcome: StartupOutcome::Running,
            detail: "worker booted".to_string(),
        }
    );
    Ok(())
}

#[tokio::test]
async fn silence_times_out_close_to_the_deadline() -> TestResult {
    init_tracing();
    let dir = TempDir::new()?;
    let paths = SentinelPaths::new(dir.path());

    let wall = std::time::Instant::now();
    let decision = wait_for_initial_status(
        &paths,
        Duration::from_millis(200),
        Duration::from_millis(25),
    )
    .await;
    let elapsed = wall.elapsed();

    match decision {
        StartupDecision::TimedOut { waited } => {
            assert!(waited >= Duration::from_millis(200));
        }
        other => panic!("expected a timeout, got {other:?}"),
    }
    // The decision must land soon after the deadline, not whole polls later.
    assert!(elapsed < Duration::from_millis(1500), "took {elapsed:?}");
    Ok(())
}

#[test]
fn detail_is_excerpted_to_a_few_lines() -> TestResult {
    let dir = TempDir::new()?;
    let long: String = (1..=20)
        .map(|n| format!("line {n}\n"))
        .collect();
    write_file(dir.path(), ERROR_SENTINEL, &long);

    let paths = SentinelPaths::new(dir.path());
    let (_, raw) = paths.observe().ok_or("expected a verdict")?;

    let detail = excerpt(&raw);
    assert!(detail.lines().count() <= 6);
    assert!(detail.starts_with("line 1"));
    Ok(())
}

#[test]
fn excerpt_truncates_oversized_content() {
    let huge = "x".repeat(1000);
    let out = excerpt(&huge);

    assert!(out.ends_with('…'));
    assert!(out.chars().count() <= 401);
}

#[test]
fn excerpt_of_empty_content_is_empty() {
    assert_eq!(excerpt(""), "");
}

#[test]
fn success_covers_created_and_running_only() {
    assert!(StartupOutcome::Created.is_success());
    assert!(StartupOutcome::Running.is_success());
    assert!(!StartupOutcome::ConfigError.is_success());
}

proptest! {
    #[test]
    fn error_flag_always_wins(created in any::<bool>(), running in any::<bool>()) {
        prop_assert_eq!(
            resolve_outcome(true, created, running),
            Some(StartupOutcome::ConfigError)
        );
    }

    #[test]
    fn created_outranks_running(running in any::<bool>()) {
        prop_assert_eq!(
            resolve_outcome(false, true, running),
            Some(StartupOutcome::Created)
        );
    }

    #[test]
    fn verdict_exists_iff_any_flag_is_set(
        error in any::<bool>(),
        created in any::<bool>(),
        running in any::<bool>(),
    ) {
        let verdict = resolve_outcome(error, created, running);
        prop_assert_eq!(verdict.is_none(), !error && !created && !running);
    }
}
