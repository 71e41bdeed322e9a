//! Numbered error taxonomy carried across every public API and the wire.
//!
//! The numeric codes are stable: plugins report them in error responses and
//! clients map them back into [`ErrorCode`]. Numbers unknown to this build
//! collapse into [`ErrorCode::PluginBug`] while the original number is kept
//! in the message so nothing is silently lost.

use strum::{Display, FromRepr};
use thiserror::Error;

/// Stable numeric error codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, FromRepr)]
#[strum(serialize_all = "snake_case")]
#[repr(i32)]
pub enum ErrorCode {
    /// Defect in the client library itself.
    LibBug = 1,
    /// Defect in a plugin, including malformed or mistyped replies.
    PluginBug = 2,
    /// A job was started where a direct result was expected.
    JobStarted = 7,
    /// Registration or a request exceeded its time bound.
    Timeout = 11,
    /// No plugin sockets are live under the socket root.
    DaemonNotRunning = 12,
    /// The caller lacks the privileges the plugin requires.
    PermissionDenied = 13,
    /// An entity with the requested name already exists.
    NameConflict = 50,
    /// The initiator already belongs to another access group.
    ExistsInitiator = 52,
    /// An argument was malformed or semantically invalid.
    InvalidArgument = 101,
    /// The requested change was already in effect.
    NoStateChange = 125,
    /// The plugin ran out of memory.
    NoMemory = 152,
    /// The plugin does not implement the operation.
    NoSupport = 153,
    /// The volume is masked to an access group.
    IsMasked = 160,
    /// No access group matches the identifier.
    NotFoundAccessGroup = 200,
    /// No file system matches the identifier.
    NotFoundFs = 201,
    /// No job matches the identifier.
    NotFoundJob = 202,
    /// No pool matches the identifier.
    NotFoundPool = 203,
    /// No file-system snapshot matches the identifier.
    NotFoundFsSnapshot = 204,
    /// No volume matches the identifier.
    NotFoundVolume = 205,
    /// No NFS export matches the identifier.
    NotFoundNfsExport = 206,
    /// No system matches the identifier.
    NotFoundSystem = 208,
    /// No disk matches the identifier.
    NotFoundDisk = 209,
    /// The plugin rejected the supplied credentials.
    PluginAuthFailed = 300,
    /// The plugin failed to talk to its managed array.
    PluginIpcFail = 301,
    /// No plugin socket exists for the requested scheme.
    PluginNotExist = 311,
    /// The pool lacks the free space the request needs.
    NotEnoughSpace = 350,
    /// Socket refusal, broken pipe, unexpected end of stream.
    TransportError = 400,
    /// Malformed frame header or undecodable frame body.
    ProtocolError = 401,
    /// The last initiator of an access group cannot be removed.
    LastInitInAccessGroup = 502,
    /// The search key is not supported for the listed entity.
    UnsupportedSearchKey = 510,
}

impl ErrorCode {
    /// Returns the wire number for this code.
    #[must_use]
    pub const fn number(self) -> i32 {
        self as i32
    }
}

/// Error crossing every public API of the workspace.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message} ({code})")]
pub struct StorageError {
    code: ErrorCode,
    message: String,
}

impl StorageError {
    /// Builds an error from a code and a human-readable message.
    #[must_use]
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    /// Maps a raw wire error into a typed error.
    ///
    /// Numbers without a matching [`ErrorCode`] become
    /// [`ErrorCode::PluginBug`] with the number prefixed to the message.
    #[must_use]
    pub fn from_wire(number: i64, message: &str) -> Self {
        let known = i32::try_from(number).ok().and_then(ErrorCode::from_repr);
        match known {
            Some(code) => Self::new(code, message),
            None => Self::new(
                ErrorCode::PluginBug,
                format!("unknown error code {number}: {message}"),
            ),
        }
    }

    /// Returns the error code.
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        self.code
    }

    /// Returns the human-readable message.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Shorthand for [`ErrorCode::NoSupport`].
    #[must_use]
    pub fn no_support(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::NoSupport, message)
    }

    /// Shorthand for [`ErrorCode::InvalidArgument`].
    #[must_use]
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidArgument, message)
    }

    /// Shorthand for [`ErrorCode::PluginBug`].
    #[must_use]
    pub fn plugin_bug(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::PluginBug, message)
    }

    /// Shorthand for [`ErrorCode::TransportError`].
    #[must_use]
    pub fn transport(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::TransportError, message)
    }

    /// Shorthand for [`ErrorCode::ProtocolError`].
    #[must_use]
    pub fn protocol(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::ProtocolError, message)
    }
}

/// Raised when an integer does not name a variant of an exclusive
/// enumeration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown {kind} value {value}")]
pub struct UnknownValue {
    /// Human-readable name of the enumeration.
    pub kind: &'static str,
    /// Offending number.
    pub value: i64,
}
