//! Layered configuration shared by the client library and plugin binaries.
//!
//! Values resolve through `ortho_config`: built-in defaults, then a TOML
//! file named by `--config-path`, then `STORMGR_*` environment variables,
//! then command-line flags. The socket root is the only piece of
//! configuration the locator needs; plugin binaries additionally read the
//! log settings.

mod defaults;

use std::time::Duration;

use camino::{Utf8Path, Utf8PathBuf};
use ortho_config::OrthoConfig;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

pub use defaults::{
    DEFAULT_LOG_FILTER, DEFAULT_TIMEOUT_MS, DEFAULT_UDS_PATH, default_log_filter_string,
    default_log_format, default_uds_path,
};

/// Log output styles understood by the plugin binaries.
#[derive(
    Debug, Clone, Copy, Default, Deserialize, Serialize, PartialEq, Eq, EnumString, Display,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum LogFormat {
    /// One JSON object per event.
    #[default]
    Json,
    /// Human-readable single line output.
    Compact,
}

/// Resolved configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize, OrthoConfig)]
#[ortho_config(prefix = "STORMGR")]
pub struct Config {
    /// Directory holding one listening socket per plugin.
    #[ortho_config(default = default_uds_path())]
    uds_path: Utf8PathBuf,
    /// `tracing` filter directive applied by plugin binaries.
    #[ortho_config(default = default_log_filter_string())]
    log_filter: String,
    /// Log output style applied by plugin binaries.
    #[ortho_config(default = default_log_format())]
    log_format: LogFormat,
    /// Bound on registration and individual requests, in milliseconds.
    #[ortho_config(default = DEFAULT_TIMEOUT_MS)]
    timeout_ms: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            uds_path: default_uds_path(),
            log_filter: default_log_filter_string(),
            log_format: default_log_format(),
            timeout_ms: DEFAULT_TIMEOUT_MS,
        }
    }
}

impl Config {
    /// Returns a copy rooted at a different socket directory.
    #[must_use]
    pub fn with_uds_path(mut self, uds_path: impl Into<Utf8PathBuf>) -> Self {
        self.uds_path = uds_path.into();
        self
    }

    /// Directory holding one listening socket per plugin.
    #[must_use]
    pub fn uds_path(&self) -> &Utf8Path {
        &self.uds_path
    }

    /// Socket path a plugin serving `scheme` listens on.
    #[must_use]
    pub fn plugin_socket(&self, scheme: &str) -> Utf8PathBuf {
        self.uds_path.join(scheme)
    }

    /// `tracing` filter directive.
    #[must_use]
    pub fn log_filter(&self) -> &str {
        &self.log_filter
    }

    /// Log output style.
    #[must_use]
    pub const fn log_format(&self) -> LogFormat {
        self.log_format
    }

    /// Request bound as a [`Duration`].
    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(u64::from(self.timeout_ms))
    }

    /// Request bound in milliseconds, as sent during registration.
    #[must_use]
    pub const fn timeout_ms(&self) -> u32 {
        self.timeout_ms
    }
}

#[cfg(test)]
mod tests;
