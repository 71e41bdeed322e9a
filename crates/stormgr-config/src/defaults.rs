use camino::Utf8PathBuf;

use crate::LogFormat;

/// Directory holding one listening socket per plugin.
pub const DEFAULT_UDS_PATH: &str = "/var/run/stormgr/ipc";

/// Default log filter expression used by the plugin binaries.
pub const DEFAULT_LOG_FILTER: &str = "info";

/// Default bound, in milliseconds, on registration and individual requests.
pub const DEFAULT_TIMEOUT_MS: u32 = 30_000;

/// Default socket root.
#[must_use]
pub fn default_uds_path() -> Utf8PathBuf {
    Utf8PathBuf::from(DEFAULT_UDS_PATH)
}

/// Owned log filter value used where allocation is required (e.g. serde).
#[must_use]
pub fn default_log_filter_string() -> String {
    DEFAULT_LOG_FILTER.to_owned()
}

/// Default logging format for the plugin binaries.
#[must_use]
pub const fn default_log_format() -> LogFormat {
    LogFormat::Json
}
