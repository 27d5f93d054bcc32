// tests/env_file.rs

//! Dotenv-style parsing and loading of the worker's env file.

use std::error::Error;

use launchwatch::config::EnvFile;
use launchwatch::config::env_file::parse;
use launchwatch::errors::LaunchwatchError;
use launchwatch_test_utils::write_file;
use tempfile::TempDir;

type TestResult = Result<(), Box<dyn Error>>;

#[test]
fn parses_plain_assignments() {
    let vars = parse("TELEGRAM_POST=https://api.telegram.org/bot123/sendMessage\nTELEGRAM_USER_ID=42\n");
    assert_eq!(
        vars,
        vec![
            (
                "TELEGRAM_POST".to_string(),
                "https://api.telegram.org/bot123/sendMessage".to_string()
            ),
            ("TELEGRAM_USER_ID".to_string(), "42".to_string()),
        ]
    );
}

#[test]
fn skips_comments_and_blank_lines() {
    let vars = parse("# oracle credentials\n\nREGION=eu-stockholm-1\n   \n# done\n");
    assert_eq!(vars, vec![("REGION".to_string(), "eu-stockholm-1".to_string())]);
}

#[test]
fn strips_the_export_prefix() {
    let vars = parse("export DISCORD_WEBHOOK=https://discord.example/hook\n");
    assert_eq!(vars[0].0, "DISCORD_WEBHOOK");
    assert_eq!(vars[0].1, "https://discord.example/hook");
}

#[test]
fn strips_matching_quotes_only() {
    let vars = parse("A=\"quoted value\"\nB='single'\nC=\"mismatched'\nD=\"\n");
    assert_eq!(vars[0].1, "quoted value");
    assert_eq!(vars[1].1, "single");
    assert_eq!(vars[2].1, "\"mismatched'");
    assert_eq!(vars[3].1, "\"");
}

#[test]
fn skips_lines_without_an_assignment() {
    let vars = parse("not an assignment\nKEY=value\n");
    assert_eq!(vars.len(), 1);
    assert_eq!(vars[0].0, "KEY");
}

#[test]
fn last_assignment_wins_on_lookup() {
    let vars = parse("KEY=first\nKEY=second\n");
    assert_eq!(vars.len(), 2);

    let dir = TempDir::new().unwrap();
    let path = write_file(dir.path(), "oci.env", "KEY=first\nKEY=second\n");
    let file = EnvFile::load(&path).unwrap();
    assert_eq!(file.get("KEY"), Some("second"));
}

#[test]
fn load_keeps_declaration_order() -> TestResult {
    let dir = TempDir::new()?;
    let path = write_file(
        dir.path(),
        "oci.env",
        "export TELEGRAM_POST=https://t.example\n# comment\nTELEGRAM_USER_ID='42'\n",
    );

    let file = EnvFile::load(&path)?;
    assert_eq!(file.path(), path.as_path());
    assert_eq!(
        file.vars(),
        &[
            ("TELEGRAM_POST".to_string(), "https://t.example".to_string()),
            ("TELEGRAM_USER_ID".to_string(), "42".to_string()),
        ]
    );
    Ok(())
}

#[test]
fn load_of_a_missing_file_is_an_error() {
    let dir = TempDir::new().unwrap();
    let missing = dir.path().join("no-such.env");

    let err = EnvFile::load(&missing).unwrap_err();
    assert!(matches!(err, LaunchwatchError::EnvFileNotFound(path) if path == missing));
}

#[test]
fn lookup_of_an_unknown_key_is_none() -> TestResult {
    let dir = TempDir::new()?;
    let path = write_file(dir.path(), "oci.env", "KEY=value\n");

    let file = EnvFile::load(&path)?;
    assert_eq!(file.get("OTHER"), None);
    Ok(())
}
