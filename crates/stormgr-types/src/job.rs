//! Asynchronous job identifiers and states.

use std::fmt;

use serde::{Deserialize, Serialize};
use strum::FromRepr;

use crate::error::UnknownValue;

/// Opaque identifier of a plugin-side job.
///
/// Ids are scoped to the connection that started the job.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobId(String);

impl JobId {
    /// Wraps a plugin-issued identifier.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the identifier text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Lifecycle state of a job as reported by `job_status`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, FromRepr, Serialize, Deserialize)]
#[serde(into = "i32", try_from = "i32")]
#[repr(i32)]
pub enum JobStatus {
    /// Still running; `percent` reports progress.
    InProgress = 1,
    /// Finished; the result is available.
    Complete = 2,
    /// Failed.
    Error = 3,
}

impl From<JobStatus> for i32 {
    fn from(value: JobStatus) -> Self {
        value as Self
    }
}

impl TryFrom<i32> for JobStatus {
    type Error = UnknownValue;

    fn try_from(value: i32) -> Result<Self, UnknownValue> {
        Self::from_repr(value).ok_or(UnknownValue {
            kind: "job status",
            value: i64::from(value),
        })
    }
}
