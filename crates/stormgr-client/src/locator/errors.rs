//! Error types for plugin discovery.

use std::io;

use stormgr_types::{ErrorCode, StorageError};
use thiserror::Error;

/// Errors surfaced while resolving a plugin socket.
#[derive(Debug, Error)]
pub enum LocatorError {
    /// No plugin answers anywhere under the socket root.
    #[error("no plugin daemon is running under {root}")]
    DaemonNotRunning {
        /// Socket root that was searched.
        root: String,
    },
    /// Plugins are running, but none serves the requested scheme.
    #[error("plugin {plugin:?} is not installed; expected a socket at {path}")]
    PluginNotExist {
        /// Scheme taken from the URI.
        plugin: String,
        /// Socket path that was expected.
        path: String,
    },
    /// A directory under the socket root could not be read.
    #[error("failed to read socket directory {path}: {source}")]
    Scan {
        /// Directory being listed.
        path: String,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },
}

impl From<LocatorError> for StorageError {
    fn from(error: LocatorError) -> Self {
        let code = match &error {
            LocatorError::DaemonNotRunning { .. } => ErrorCode::DaemonNotRunning,
            LocatorError::PluginNotExist { .. } => ErrorCode::PluginNotExist,
            LocatorError::Scan { source, .. }
                if source.kind() == io::ErrorKind::PermissionDenied =>
            {
                ErrorCode::PermissionDenied
            }
            LocatorError::Scan { .. } => ErrorCode::TransportError,
        };
        Self::new(code, error.to_string())
    }
}
