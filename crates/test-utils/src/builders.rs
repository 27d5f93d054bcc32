#![allow(dead_code)]

use std::path::PathBuf;
use std::time::Duration;

use launchwatch::config::Settings;

/// Builder for `Settings` to simplify test setup: tiny intervals, paths
/// inside a temp workdir, no rebuild.
pub struct SettingsBuilder {
    settings: Settings,
}

impl SettingsBuilder {
    pub fn new(workdir: impl Into<PathBuf>) -> Self {
        let workdir = workdir.into();
        Self {
            settings: Settings {
                env_file: workdir.join("oci.env"),
                worker_command: "true".to_string(),
                force_rebuild: false,
                startup_timeout: Duration::from_millis(500),
                poll_interval: Duration::from_millis(20),
                monitor_interval: Duration::from_millis(20),
                workdir,
            },
        }
    }

    pub fn worker(mut self, cmd: &str) -> Self {
        self.settings.worker_command = cmd.to_string();
        self
    }

    pub fn env_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.settings.env_file = path.into();
        self
    }

    pub fn force_rebuild(mut self, val: bool) -> Self {
        self.settings.force_rebuild = val;
        self
    }

    pub fn startup_timeout(mut self, timeout: Duration) -> Self {
        self.settings.startup_timeout = timeout;
        self
    }

    pub fn poll_interval(mut self, interval: Duration) -> Self {
        self.settings.poll_interval = interval;
        self
    }

    pub fn monitor_interval(mut self, interval: Duration) -> Self {
        self.settings.monitor_interval = interval;
        self
    }

    pub fn build(self) -> Settings {
        self.settings
    }
}
