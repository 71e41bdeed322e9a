//! Errors raised while driving the controller tool.

use std::io;
use std::path::PathBuf;
use std::sync::Arc;

use stormgr_types::{ErrorCode, StorageError};
use thiserror::Error;

/// Failure while running or interpreting the controller CLI.
#[derive(Debug, Clone, Error)]
pub enum SmartArrayError {
    /// The tool printed the same key twice under one parent.
    #[error("duplicate key {key:?} at output line {line}")]
    DuplicateKey {
        /// Repeated key.
        key: String,
        /// One-based line number within the filtered output.
        line: usize,
    },
    /// A line is indented to a depth no open block uses.
    #[error("unexpected indentation at output line {line}: {text:?}")]
    Indentation {
        /// One-based line number within the filtered output.
        line: usize,
        /// Offending line.
        text: String,
    },
    /// A field the translation depends on is absent.
    #[error("expected key {key:?} missing from {context}")]
    MissingKey {
        /// Missing key.
        key: String,
        /// Block that should have carried it.
        context: String,
    },
    /// A size field is not of the form `<number> <unit>B`.
    #[error("unexpected size {value:?}")]
    BadSize {
        /// Raw field value.
        value: String,
    },
    /// A numeric field did not parse.
    #[error("field {key:?} is not a number: {value:?}")]
    BadNumber {
        /// Field name.
        key: String,
        /// Raw field value.
        value: String,
    },
    /// The plugin was started without root privileges.
    #[error("the smartarray plugin requires root privileges")]
    NotRoot,
    /// None of the candidate tool paths exists.
    #[error("controller tool not found; tried {}", candidates.join(", "))]
    ToolNotInstalled {
        /// Paths probed, in order.
        candidates: Vec<String>,
    },
    /// The configured tool path does not exist or is not executable.
    #[error("controller tool {} does not exist or is not executable", path.display())]
    ToolMissing {
        /// Configured path.
        path: PathBuf,
    },
    /// Spawning the tool failed for another reason.
    #[error("failed to run {}: {source}", path.display())]
    Spawn {
        /// Tool path.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: Arc<io::Error>,
    },
    /// The tool exited unsuccessfully.
    #[error("controller tool failed ({status}): {message}")]
    ToolFailed {
        /// Exit status description.
        status: String,
        /// Captured stdout, or stderr when stdout is empty.
        message: String,
    },
    /// The tool reports no controller in the host.
    #[error("no SmartArray controller detected")]
    NoControllers,
    /// A volume's correlation token is not `slot:array:drive`.
    #[error("volume plugin data {value:?} is not a slot:array:drive triple")]
    InvalidPluginData {
        /// Raw token, if any.
        value: Option<String>,
    },
    /// The requested logical drive is not in the controller's topology.
    #[error("logical drive {drive} of array {array} not found in slot {slot}")]
    LogicalDriveNotFound {
        /// Controller slot.
        slot: String,
        /// Array letter.
        array: String,
        /// Logical drive number.
        drive: String,
    },
    /// A block device attribute exists but could not be read or parsed.
    #[error("failed to read {}: {message}", path.display())]
    Sysfs {
        /// Attribute file.
        path: PathBuf,
        /// What went wrong.
        message: String,
    },
    /// A logical drive lists no data disks.
    #[error("logical drive {drive} of array {array} has no data drives")]
    NoDataDrives {
        /// Array letter.
        array: String,
        /// Logical drive number.
        drive: String,
    },
}

impl SmartArrayError {
    pub(crate) fn missing(key: &str, context: &str) -> Self {
        Self::MissingKey {
            key: key.to_owned(),
            context: context.to_owned(),
        }
    }

    fn code(&self) -> ErrorCode {
        match self {
            Self::NoControllers => ErrorCode::NotFoundSystem,
            Self::LogicalDriveNotFound { .. } => ErrorCode::NotFoundVolume,
            Self::NotRoot
            | Self::ToolNotInstalled { .. }
            | Self::ToolMissing { .. }
            | Self::InvalidPluginData { .. } => ErrorCode::InvalidArgument,
            Self::DuplicateKey { .. }
            | Self::Indentation { .. }
            | Self::MissingKey { .. }
            | Self::BadSize { .. }
            | Self::BadNumber { .. }
            | Self::Spawn { .. }
            | Self::ToolFailed { .. }
            | Self::Sysfs { .. }
            | Self::NoDataDrives { .. } => ErrorCode::PluginBug,
        }
    }
}

impl From<SmartArrayError> for StorageError {
    fn from(error: SmartArrayError) -> Self {
        Self::new(error.code(), error.to_string())
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case::no_controllers(SmartArrayError::NoControllers, ErrorCode::NotFoundSystem)]
    #[case::vanished_drive(
        SmartArrayError::LogicalDriveNotFound {
            slot: "0".to_owned(),
            array: "A".to_owned(),
            drive: "9".to_owned(),
        },
        ErrorCode::NotFoundVolume
    )]
    #[case::not_root(SmartArrayError::NotRoot, ErrorCode::InvalidArgument)]
    #[case::parse(
        SmartArrayError::DuplicateKey { key: "Slot".to_owned(), line: 3 },
        ErrorCode::PluginBug
    )]
    fn errors_map_onto_storage_codes(#[case] error: SmartArrayError, #[case] code: ErrorCode) {
        let message = error.to_string();
        let converted = StorageError::from(error);
        assert_eq!(converted.code(), code);
        assert_eq!(converted.message(), message);
    }
}
