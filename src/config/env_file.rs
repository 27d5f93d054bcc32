// src/config/env_file.rs

//! Sourcing of `KEY=VALUE` environment files.
//!
//! The worker's credentials and notification endpoints live in a small
//! shell-style env file (by default `~/oci-dev/env/oci.env`). The accepted
//! dialect is the usual dotenv one: one `KEY=VALUE` per line, `#` comments,
//! blank lines, an optional `export ` prefix and optional single or double
//! quotes around the value. Values are taken literally, no interpolation.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::errors::{LaunchwatchError, Result};

/// A parsed environment file, preserving declaration order.
#[derive(Debug, Clone, Default)]
pub struct EnvFile {
    path: PathBuf,
    vars: Vec<(String, String)>,
}

impl EnvFile {
    /// Read and parse the file at `path`.
    ///
    /// A missing or unreadable file is an error: the worker cannot run
    /// without its credentials.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path)
            .map_err(|_| LaunchwatchError::EnvFileNotFound(path.to_path_buf()))?;

        Ok(Self {
            path: path.to_path_buf(),
            vars: parse(&contents),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// All variables in declaration order.
    pub fn vars(&self) -> &[(String, String)] {
        &self.vars
    }

    /// Look up a variable. The last assignment wins, like `source` would.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.vars
            .iter()
            .rev()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }
}

/// Parse dotenv-style contents into key/value pairs.
///
/// Lines that do not look like assignments are skipped with a debug log
/// rather than rejected; env files in the wild accumulate junk.
pub fn parse(contents: &str) -> Vec<(String, String)> {
    let mut vars = Vec::new();

    for (idx, raw) in contents.lines().enumerate() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let line = line.strip_prefix("export ").unwrap_or(line).trim_start();
        let Some((key, value)) = line.split_once('=') else {
            debug!(line = idx + 1, "skipping env line without `=`");
            continue;
        };

        let key = key.trim();
        if key.is_empty() {
            debug!(line = idx + 1, "skipping env line with empty key");
            continue;
        }

        vars.push((key.to_string(), unquote(value.trim()).to_string()));
    }

    vars
}

fn unquote(value: &str) -> &str {
    let bytes = value.as_bytes();
    if bytes.len() >= 2 {
        let (first, last) = (bytes[0], bytes[bytes.len() - 1]);
        if first == last && (first == b'"' || first == b'\'') {
            return &value[1..value.len() - 1];
        }
    }
    value
}
