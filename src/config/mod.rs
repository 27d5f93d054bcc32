// src/config/mod.rs

//! Configuration: CLI-derived run settings and the sourced env file.

pub mod env_file;
pub mod settings;

pub use env_file::EnvFile;
pub use settings::{REBUILD_MODE, Settings};
