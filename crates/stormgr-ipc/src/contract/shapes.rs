//! Composite result shapes.

use serde_json::Value;
use stormgr_types::{JobId, JobStatus, RaidInfo, RaidType, StorageError};

use super::{WireValue, mismatch};

/// Result of a mutating call: either a started job or the finished entity.
///
/// On the wire this is the pair `[job_id | null, entity | null]` with
/// exactly one side populated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobOr<T> {
    /// The plugin started a job; poll it with `job_status`.
    Job(JobId),
    /// The operation finished synchronously.
    Done(T),
}

impl<T> JobOr<T> {
    /// Returns the job id when a job was started.
    #[must_use]
    pub const fn job(&self) -> Option<&JobId> {
        match self {
            Self::Job(id) => Some(id),
            Self::Done(_) => None,
        }
    }

    /// Returns the finished value when no job was started.
    #[must_use]
    pub fn done(self) -> Option<T> {
        match self {
            Self::Job(_) => None,
            Self::Done(value) => Some(value),
        }
    }
}

impl<T: WireValue> WireValue for JobOr<T> {
    const SHAPE: &'static str = "job/result pair";

    fn to_wire(&self) -> Result<Value, StorageError> {
        let pair = match self {
            Self::Job(id) => [id.to_wire()?, Value::Null],
            Self::Done(value) => [Value::Null, value.to_wire()?],
        };
        Ok(Value::Array(pair.into()))
    }

    fn from_wire(value: Value) -> Result<Self, StorageError> {
        let [job, result] = pair(value, Self::SHAPE)?;
        match (job, result) {
            (Value::String(id), Value::Null) => Ok(Self::Job(JobId::new(id))),
            (Value::Null, Value::Null) => Err(StorageError::plugin_bug(
                "reply carries neither a job id nor a result",
            )),
            (Value::Null, result) => T::from_wire(result).map(Self::Done),
            (Value::String(_), _) => Err(StorageError::plugin_bug(
                "reply carries both a job id and a result",
            )),
            (other, _) => Err(mismatch("job id", &other)),
        }
    }
}

fn pair(value: Value, shape: &str) -> Result<[Value; 2], StorageError> {
    match value {
        Value::Array(items) => <[Value; 2]>::try_from(items).map_err(|items| {
            StorageError::plugin_bug(format!(
                "expected {shape} of 2 elements in reply, found {}",
                items.len()
            ))
        }),
        other => Err(mismatch(shape, &other)),
    }
}

/// Plugin self-description returned by `plugin_info`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PluginDescription {
    /// Human-readable description.
    pub description: String,
    /// Plugin version.
    pub version: String,
}

impl WireValue for PluginDescription {
    const SHAPE: &'static str = "(description, version)";

    fn to_wire(&self) -> Result<Value, StorageError> {
        Ok(Value::Array(vec![
            Value::String(self.description.clone()),
            Value::String(self.version.clone()),
        ]))
    }

    fn from_wire(value: Value) -> Result<Self, StorageError> {
        let [description, version] = pair(value, Self::SHAPE)?;
        Ok(Self {
            description: String::from_wire(description)?,
            version: String::from_wire(version)?,
        })
    }
}

/// Reply to `job_status`.
///
/// `result` stays undecoded because its shape depends on the operation that
/// started the job; [`JobProgress::result_as`] decodes it.
#[derive(Debug, Clone, PartialEq)]
pub struct JobProgress {
    /// Lifecycle state.
    pub status: JobStatus,
    /// Progress from 0 to 100.
    pub percent: u8,
    /// Terminal result, `null` until the job completes.
    pub result: Value,
}

impl JobProgress {
    /// Decodes the terminal result with the originating operation's shape.
    ///
    /// Returns `None` while the job runs or after it failed. A completed
    /// job must carry a value of shape `T`; use `()` for jobs that produce
    /// nothing.
    ///
    /// # Errors
    ///
    /// Fails with a plugin-bug error when a completed job's result does not
    /// have shape `T`, including a missing result for an entity.
    pub fn result_as<T: WireValue>(&self) -> Result<Option<T>, StorageError> {
        match self.status {
            JobStatus::Complete => T::from_wire(self.result.clone()).map(Some),
            JobStatus::InProgress | JobStatus::Error => Ok(None),
        }
    }

    /// Consumes a completed job's progress and decodes its result.
    ///
    /// # Errors
    ///
    /// Plugin-bug error when the job has not completed or its result does
    /// not have shape `T`.
    pub fn into_result<T: WireValue>(self) -> Result<T, StorageError> {
        match self.status {
            JobStatus::Complete => T::from_wire(self.result),
            other => Err(StorageError::plugin_bug(format!(
                "job in state {other:?} has no result"
            ))),
        }
    }
}

impl WireValue for JobProgress {
    const SHAPE: &'static str = "(status, percent, result)";

    fn to_wire(&self) -> Result<Value, StorageError> {
        Ok(Value::Array(vec![
            Value::from(i32::from(self.status)),
            Value::from(self.percent),
            self.result.clone(),
        ]))
    }

    fn from_wire(value: Value) -> Result<Self, StorageError> {
        let items = match value {
            Value::Array(items) => items,
            other => return Err(mismatch(Self::SHAPE, &other)),
        };
        let Ok([status, percent, result]) = <[Value; 3]>::try_from(items) else {
            return Err(StorageError::plugin_bug(
                "job status reply must have 3 elements",
            ));
        };
        let status = status
            .as_i64()
            .and_then(|number| i32::try_from(number).ok())
            .and_then(|number| JobStatus::try_from(number).ok())
            .ok_or_else(|| mismatch("job status", &status))?;
        let percent = percent
            .as_u64()
            .and_then(|number| u8::try_from(number).ok())
            .filter(|number| *number <= 100)
            .ok_or_else(|| StorageError::plugin_bug(format!("invalid job percent {percent}")))?;
        if status != JobStatus::Complete && !result.is_null() {
            return Err(StorageError::plugin_bug(format!(
                "job in state {status:?} carries a result"
            )));
        }
        Ok(Self {
            status,
            percent,
            result,
        })
    }
}

impl WireValue for RaidInfo {
    const SHAPE: &'static str = "RAID info quintuple";

    fn to_wire(&self) -> Result<Value, StorageError> {
        Ok(Value::Array(vec![
            Value::from(i32::from(self.raid_type)),
            Value::from(self.strip_size),
            Value::from(self.disk_count),
            Value::from(self.min_io_size),
            Value::from(self.opt_io_size),
        ]))
    }

    fn from_wire(value: Value) -> Result<Self, StorageError> {
        let items = match value {
            Value::Array(items) => items,
            other => return Err(mismatch(Self::SHAPE, &other)),
        };
        let Ok([raid_type, strip, disks, min_io, opt_io]) = <[Value; 5]>::try_from(items) else {
            return Err(StorageError::plugin_bug(
                "volume_raid_info reply must have 5 elements",
            ));
        };
        let raid_type = raid_type
            .as_i64()
            .and_then(|number| i32::try_from(number).ok())
            .and_then(|number| RaidType::try_from(number).ok())
            .ok_or_else(|| mismatch("raid type", &raid_type))?;
        Ok(Self {
            raid_type,
            strip_size: unsigned(&strip)?,
            disk_count: unsigned(&disks)?,
            min_io_size: unsigned(&min_io)?,
            opt_io_size: unsigned(&opt_io)?,
        })
    }
}

fn unsigned(value: &Value) -> Result<u64, StorageError> {
    value
        .as_u64()
        .ok_or_else(|| mismatch("unsigned integer", value))
}
