//! Behavioural tests for plugin discovery and job-driven sessions.

use std::cell::RefCell;
use std::time::Duration;

use rstest::fixture;
use rstest_bdd_macros::{given, scenario, then, when};
use stormgr_client::{Client, ErrorCode, JobId, JobOr, JobStatus, Locator, StorageError};
use stormgr_plugin::{PluginServer, ServerHandle};
use stormgr_plugin_sim::{SCHEME, SharedArray, SimPlugin};
use stormgr_types::{Provisioning, Volume};
use tempfile::TempDir;

const GIB: u64 = 1 << 30;

#[derive(Default)]
struct Session {
    root: RefCell<Option<TempDir>>,
    server: RefCell<Option<ServerHandle>>,
    client: RefCell<Option<Client>>,
    failure: RefCell<Option<StorageError>>,
    request: RefCell<Option<JobOr<Volume>>>,
    job: RefCell<Option<JobId>>,
    status: RefCell<Option<JobStatus>>,
}

impl Session {
    fn locator(&self) -> Locator {
        match self.root.borrow().as_ref() {
            Some(root) => Locator::new(root.path()),
            None => panic!("no socket root prepared"),
        }
    }

    fn with_client<T>(&self, action: impl FnOnce(&mut Client) -> T) -> T {
        match self.client.borrow_mut().as_mut() {
            Some(client) => action(client),
            None => panic!("no client connected: {:?}", self.failure.borrow()),
        }
    }

    fn job(&self) -> JobId {
        match self.job.borrow().as_ref() {
            Some(job) => job.clone(),
            None => panic!("no job recorded"),
        }
    }
}

#[fixture]
fn session() -> Session {
    Session::default()
}

#[given("a running simulated array")]
fn given_running_array(session: &Session) {
    let root = tempfile::tempdir().expect("temp dir");
    let shared = SharedArray::default();
    let server = PluginServer::bind(root.path().join(SCHEME))
        .expect("bind")
        .start(move || SimPlugin::with_array(shared.clone()))
        .expect("start");
    *session.server.borrow_mut() = Some(server);
    *session.root.borrow_mut() = Some(root);
}

#[given("an empty socket root")]
fn given_empty_root(session: &Session) {
    *session.root.borrow_mut() = Some(tempfile::tempdir().expect("temp dir"));
}

#[when("a client connects to \"{uri}\"")]
fn when_connecting(session: &Session, uri: String) {
    match Client::connect(&session.locator(), &uri, None, 5_000) {
        Ok(client) => *session.client.borrow_mut() = Some(client),
        Err(error) => *session.failure.borrow_mut() = Some(error),
    }
}

#[when("a {size} GiB volume named \"{name}\" is requested")]
fn when_volume_requested(session: &Session, size: u64, name: String) {
    let outcome = session.with_client(|client| {
        let pool = client
            .pools(Some("id"), Some("POOL_0001"))
            .expect("pools")
            .into_iter()
            .next()
            .expect("seeded pool");
        client
            .volume_create(&pool, &name, size * GIB, Provisioning::Default)
            .expect("volume_create")
    });
    *session.request.borrow_mut() = Some(outcome);
}

#[then("the request returns a job")]
fn then_job_returned(session: &Session) {
    let job = match session.request.borrow().as_ref() {
        Some(JobOr::Job(job)) => job.clone(),
        other => panic!("expected a job, got {other:?}"),
    };
    *session.job.borrow_mut() = Some(job);
}

#[when("the job is polled {count} time")]
fn when_polled(session: &Session, count: u32) {
    let job = session.job();
    for _ in 0..count {
        let (status, _, _) = session
            .with_client(|client| client.job_status_volume(&job))
            .expect("job status");
        *session.status.borrow_mut() = Some(status);
    }
}

#[then("the job is in progress")]
fn then_in_progress(session: &Session) {
    assert_eq!(*session.status.borrow(), Some(JobStatus::InProgress));
}

#[when("the job is waited for")]
fn when_waited(session: &Session) {
    let job = session.job();
    let volume = session
        .with_client(|client| client.wait_for_job::<Volume>(&job, Duration::from_millis(5)))
        .expect("job finished");
    assert!(!volume.id.is_empty(), "job carries the created volume");
}

#[then("the volume \"{name}\" is listed")]
fn then_listed(session: &Session, name: String) {
    let volumes = session
        .with_client(|client| client.volumes(None, None))
        .expect("volumes");
    assert!(
        volumes.iter().any(|volume| volume.name == name),
        "got {volumes:?}"
    );
}

#[then("the job is no longer known")]
fn then_job_unknown(session: &Session) {
    let job = session.job();
    let error = session
        .with_client(|client| client.job_status(&job))
        .expect_err("job was freed");
    assert_eq!(error.code(), ErrorCode::NotFoundJob);
}

#[then("connecting fails with {code}")]
fn then_connect_fails(session: &Session, code: String) {
    match session.failure.borrow().as_ref() {
        Some(error) => assert_eq!(error.code().to_string(), code, "got: {error}"),
        None => panic!("connection unexpectedly succeeded"),
    }
}

#[scenario(
    path = "tests/features/plugin_sessions.feature",
    name = "A volume created through a job is listed once the job completes"
)]
fn job_driven_volume_creation(#[from(session)] session: Session) {
    let _ = session;
}

#[scenario(
    path = "tests/features/plugin_sessions.feature",
    name = "A scheme nobody serves is reported as a missing plugin"
)]
fn missing_plugin_is_reported(#[from(session)] session: Session) {
    let _ = session;
}

#[scenario(
    path = "tests/features/plugin_sessions.feature",
    name = "An empty socket root is reported as a stopped daemon"
)]
fn stopped_daemon_is_reported(#[from(session)] session: Session) {
    let _ = session;
}
