//! Per-session tracking of long-running work.
//!
//! A job moves from in-progress, reporting a percentage on each poll, to
//! either complete with a result or failed with the original error. The
//! failure is handed to the client exactly once: the poll that first
//! observes it returns the error, later polls only report the terminal
//! status. Ids come from a monotonic counter and are never reused within a
//! registry, even after `free`.

use std::collections::BTreeMap;
use std::fmt;

use serde_json::Value;
use stormgr_ipc::JobProgress;
use stormgr_types::{ErrorCode, JobId, JobStatus, StorageError};
use tracing::debug;

const JOBS_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::jobs");

/// What a task reports when polled.
#[derive(Debug, Clone, PartialEq)]
pub enum JobPoll {
    /// Still running; percentage complete so far.
    Pending(u8),
    /// Finished with an encoded result or a failure.
    Finished(Result<Value, StorageError>),
}

/// Unit of work advanced by `job_status` polls.
pub trait JobTask: Send {
    /// Advances the work and reports where it stands.
    fn poll(&mut self) -> JobPoll;
}

/// Task that reports progress for a fixed number of polls, then yields a
/// precomputed outcome.
#[derive(Debug)]
pub struct StagedTask {
    steps: u32,
    taken: u32,
    outcome: Option<Result<Value, StorageError>>,
}

impl StagedTask {
    /// Builds a task that stays pending for `steps` polls.
    #[must_use]
    pub const fn new(steps: u32, outcome: Result<Value, StorageError>) -> Self {
        Self {
            steps,
            taken: 0,
            outcome: Some(outcome),
        }
    }
}

impl JobTask for StagedTask {
    fn poll(&mut self) -> JobPoll {
        if self.taken < self.steps {
            self.taken += 1;
            let percent = self
                .taken
                .saturating_mul(100)
                .checked_div(self.steps.saturating_add(1))
                .and_then(|percent| u8::try_from(percent).ok())
                .unwrap_or(0);
            return JobPoll::Pending(percent);
        }
        JobPoll::Finished(self.outcome.take().unwrap_or_else(|| {
            Err(StorageError::plugin_bug("job polled after it finished"))
        }))
    }
}

enum Entry {
    Running(Box<dyn JobTask>),
    Complete(Value),
    Failed,
}

/// Jobs started by one session.
#[derive(Default)]
pub struct JobRegistry {
    last_id: u64,
    jobs: BTreeMap<JobId, Entry>,
}

impl fmt::Debug for JobRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JobRegistry")
            .field("last_id", &self.last_id)
            .field("jobs", &self.jobs.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl JobRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a task and returns its id.
    pub fn submit(&mut self, task: impl JobTask + 'static) -> JobId {
        let id = self.allocate();
        debug!(target: JOBS_TARGET, job = %id, "job submitted");
        self.jobs.insert(id.clone(), Entry::Running(Box::new(task)));
        id
    }

    /// Registers a [`StagedTask`] and returns its id.
    pub fn submit_staged(&mut self, steps: u32, outcome: Result<Value, StorageError>) -> JobId {
        self.submit(StagedTask::new(steps, outcome))
    }

    /// Registers work that already finished; the first poll reports it
    /// complete.
    pub fn submit_complete(&mut self, result: Value) -> JobId {
        let id = self.allocate();
        debug!(target: JOBS_TARGET, job = %id, "job completed on submission");
        self.jobs.insert(id.clone(), Entry::Complete(result));
        id
    }

    /// Polls a job.
    ///
    /// # Errors
    ///
    /// `NotFoundJob` for unknown or freed ids; the job's own failure the
    /// first time it is observed.
    pub fn status(&mut self, id: &JobId) -> Result<JobProgress, StorageError> {
        let entry = self.jobs.get_mut(id).ok_or_else(|| not_found(id))?;
        match entry {
            Entry::Running(task) => match task.poll() {
                JobPoll::Pending(percent) => Ok(JobProgress {
                    status: JobStatus::InProgress,
                    percent: percent.min(99),
                    result: Value::Null,
                }),
                JobPoll::Finished(Ok(result)) => {
                    debug!(target: JOBS_TARGET, job = %id, "job complete");
                    *entry = Entry::Complete(result.clone());
                    Ok(complete(result))
                }
                JobPoll::Finished(Err(failure)) => {
                    debug!(target: JOBS_TARGET, job = %id, code = %failure.code(), "job failed");
                    *entry = Entry::Failed;
                    Err(failure)
                }
            },
            Entry::Complete(result) => Ok(complete(result.clone())),
            Entry::Failed => Ok(JobProgress {
                status: JobStatus::Error,
                percent: 100,
                result: Value::Null,
            }),
        }
    }

    /// Releases a job id. The id is never handed out again.
    ///
    /// # Errors
    ///
    /// `NotFoundJob` for unknown or already freed ids.
    pub fn free(&mut self, id: &JobId) -> Result<(), StorageError> {
        if self.jobs.remove(id).is_none() {
            return Err(not_found(id));
        }
        debug!(target: JOBS_TARGET, job = %id, "job freed");
        Ok(())
    }

    /// Number of jobs not yet freed.
    #[must_use]
    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    /// Reports whether every job has been freed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }

    fn allocate(&mut self) -> JobId {
        self.last_id = self.last_id.saturating_add(1);
        JobId::new(format!("JOB_{:08}", self.last_id))
    }
}

fn complete(result: Value) -> JobProgress {
    JobProgress {
        status: JobStatus::Complete,
        percent: 100,
        result,
    }
}

fn not_found(id: &JobId) -> StorageError {
    StorageError::new(ErrorCode::NotFoundJob, format!("job {id} not found"))
}
