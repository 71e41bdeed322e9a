//! Error types for the plugin socket server.

use std::io;

use stormgr_types::{ErrorCode, StorageError};
use thiserror::Error;

/// Errors surfaced while binding or running a plugin socket.
#[derive(Debug, Error)]
pub enum ListenerError {
    /// The socket directory could not be created.
    #[error("failed to create socket directory {path}: {source}")]
    CreateDir {
        /// Directory that was being created.
        path: String,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },
    /// Binding the listening socket failed.
    #[error("failed to bind plugin socket at {path}: {source}")]
    Bind {
        /// Socket path.
        path: String,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },
    /// Another live process already serves the socket.
    #[error("plugin socket {path} is already in use")]
    InUse {
        /// Socket path.
        path: String,
    },
    /// Something other than a socket occupies the path.
    #[error("plugin socket path {path} is not a socket")]
    NotSocket {
        /// Offending path.
        path: String,
    },
    /// The existing path could not be inspected.
    #[error("failed to read metadata for plugin socket {path}: {source}")]
    Metadata {
        /// Socket path.
        path: String,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },
    /// Probing an existing socket failed for a reason other than it being
    /// stale.
    #[error("failed to probe existing plugin socket {path}: {source}")]
    Probe {
        /// Socket path.
        path: String,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },
    /// A stale socket could not be removed.
    #[error("failed to remove stale plugin socket {path}: {source}")]
    Cleanup {
        /// Socket path.
        path: String,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },
    /// The listener could not be switched to non-blocking mode.
    #[error("failed to enable non-blocking accept: {source}")]
    NonBlocking {
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },
    /// The accept thread could not be spawned.
    #[error("failed to spawn the accept thread: {source}")]
    Spawn {
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },
    /// The accept thread panicked.
    #[error("accept thread panicked")]
    ThreadPanic,
}

impl From<ListenerError> for StorageError {
    fn from(error: ListenerError) -> Self {
        Self::new(ErrorCode::PluginIpcFail, error.to_string())
    }
}
