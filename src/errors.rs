// src/errors.rs
//! Error types for launchwatch.

use std::path::PathBuf;

use thiserror::Error;

/// Top-level error type for the launchwatch CLI.
#[derive(Error, Debug)]
pub enum LaunchwatchError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Environment file not found: {}", .0.display())]
    EnvFileNotFound(PathBuf),

    #[error("Provisioning step `{step}` failed: {reason}")]
    Provision { step: String, reason: String },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub use anyhow::Error;

/// Convenience result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, LaunchwatchError>;
