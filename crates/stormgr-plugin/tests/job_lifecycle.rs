//! Behavioural tests for the job registry.

use std::cell::RefCell;

use rstest::fixture;
use rstest_bdd_macros::{given, scenario, then, when};
use serde_json::json;
use stormgr_ipc::JobProgress;
use stormgr_plugin::JobRegistry;
use stormgr_types::{ErrorCode, JobId, JobStatus, StorageError};

#[derive(Default)]
struct Jobs {
    registry: RefCell<JobRegistry>,
    job: RefCell<Option<JobId>>,
    last: RefCell<Option<Result<JobProgress, StorageError>>>,
}

impl Jobs {
    fn job(&self) -> JobId {
        match self.job.borrow().as_ref() {
            Some(id) => id.clone(),
            None => panic!("no job was submitted"),
        }
    }

    fn last(&self) -> Result<JobProgress, StorageError> {
        match self.last.borrow().as_ref() {
            Some(outcome) => outcome.clone(),
            None => panic!("the job was never polled"),
        }
    }
}

#[fixture]
fn jobs() -> Jobs {
    Jobs::default()
}

#[given("a job that needs {steps} polls to finish")]
fn given_staged_job(jobs: &Jobs, steps: u32) {
    let id = jobs
        .registry
        .borrow_mut()
        .submit_staged(steps, Ok(json!({"class": "Volume", "id": "vol-1"})));
    *jobs.job.borrow_mut() = Some(id);
}

#[given("a job that fails with \"{message}\"")]
fn given_failing_job(jobs: &Jobs, message: String) {
    let failure = StorageError::new(ErrorCode::NotEnoughSpace, message);
    let id = jobs.registry.borrow_mut().submit_staged(0, Err(failure));
    *jobs.job.borrow_mut() = Some(id);
}

#[when("the job is polled {count} times")]
fn when_polled(jobs: &Jobs, count: usize) {
    let id = jobs.job();
    for _ in 0..count {
        let outcome = jobs.registry.borrow_mut().status(&id);
        *jobs.last.borrow_mut() = Some(outcome);
    }
}

#[when("the job is freed")]
fn when_freed(jobs: &Jobs) {
    let id = jobs.job();
    if let Err(error) = jobs.registry.borrow_mut().free(&id) {
        panic!("free failed: {error}");
    }
}

#[then("the job is in progress at {percent} percent")]
fn then_in_progress(jobs: &Jobs, percent: u8) {
    let progress = jobs.last().unwrap_or_else(|error| panic!("poll failed: {error}"));
    assert_eq!(progress.status, JobStatus::InProgress);
    assert_eq!(progress.percent, percent);
}

#[then("the job is complete")]
fn then_complete(jobs: &Jobs) {
    let progress = jobs.last().unwrap_or_else(|error| panic!("poll failed: {error}"));
    assert_eq!(progress.status, JobStatus::Complete);
    assert_eq!(progress.percent, 100);
    assert_eq!(progress.result["id"], "vol-1");
}

#[then("the job is in the error state")]
fn then_error_state(jobs: &Jobs) {
    let progress = jobs.last().unwrap_or_else(|error| panic!("poll failed: {error}"));
    assert_eq!(progress.status, JobStatus::Error);
}

#[then("the poll failed with \"{text}\"")]
fn then_poll_failed(jobs: &Jobs, text: String) {
    match jobs.last() {
        Ok(progress) => panic!("expected a failure, got {progress:?}"),
        Err(error) => assert!(error.message().contains(&text), "got: {error}"),
    }
}

#[scenario(
    path = "tests/features/job_lifecycle.feature",
    name = "A staged job reports progress and then completes"
)]
fn staged_job_completes(#[from(jobs)] jobs: Jobs) {
    let _ = jobs;
}

#[scenario(
    path = "tests/features/job_lifecycle.feature",
    name = "A failing job reports its error exactly once"
)]
fn failing_job_reports_once(#[from(jobs)] jobs: Jobs) {
    let _ = jobs;
}

#[scenario(
    path = "tests/features/job_lifecycle.feature",
    name = "A freed job is no longer known"
)]
fn freed_job_is_unknown(#[from(jobs)] jobs: Jobs) {
    let _ = jobs;
}
