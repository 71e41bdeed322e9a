//! Unit tests for request routing and the session loop.

use std::io::Write as _;
use std::os::unix::net::UnixStream;
use std::thread;

use rstest::{fixture, rstest};
use serde_json::json;
use stormgr_ipc::{JobProgress, WireValue};
use stormgr_types::{ErrorCode, JobStatus as Lifecycle, System};

use super::*;
use crate::test_support::ProbePlugin;

#[fixture]
fn session() -> Session<ProbePlugin> {
    Session::new(ProbePlugin::default())
}

fn arguments(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        other => panic!("arguments must be an object, got {other}"),
    }
}

#[rstest]
fn routes_to_the_plugin_method(mut session: Session<ProbePlugin>) {
    let result = session
        .dispatch("systems", Map::new())
        .expect("systems succeeds");
    let systems = Vec::<System>::from_wire(result).expect("system list");
    assert_eq!(systems.len(), 1);
    assert_eq!(session.plugin().calls, 1);
}

#[rstest]
fn register_receives_typed_arguments(mut session: Session<ProbePlugin>) {
    let args = arguments(json!({"uri": "probe://host/?x=1", "password": null, "timeout": 500}));
    let result = session
        .dispatch("plugin_register", args)
        .expect("register succeeds");
    assert_eq!(result, Value::Null);
    assert_eq!(
        session.plugin().registered_uri.as_deref(),
        Some("probe://host/?x=1")
    );
}

#[rstest]
#[case::unknown_method("volume_teleport")]
#[case::default_body("fs")]
#[case::default_body_mutation("volume_enable")]
fn unsupported_calls_fail_with_no_support(
    mut session: Session<ProbePlugin>,
    #[case] method: &str,
) {
    let args = if method == "volume_enable" {
        arguments(json!({"volume": {
            "class": "Volume", "id": "v", "name": "v", "vpd83": "", "block_size": 512,
            "num_of_blocks": 1, "admin_state": 1, "system_id": "s", "pool_id": "p",
            "plugin_data": null
        }}))
    } else {
        Map::new()
    };
    let error = session.dispatch(method, args).expect_err("unsupported");
    assert_eq!(error.code(), ErrorCode::NoSupport);
}

#[rstest]
fn undecodable_arguments_are_invalid(mut session: Session<ProbePlugin>) {
    let error = session
        .dispatch("job_status", arguments(json!({"job_id": 17})))
        .expect_err("numeric job id");
    assert_eq!(error.code(), ErrorCode::InvalidArgument);
}

#[rstest]
fn plugin_failures_pass_through(mut session: Session<ProbePlugin>) {
    let error = session
        .dispatch("job_status", arguments(json!({"job_id": "missing"})))
        .expect_err("unknown job");
    assert_eq!(error.code(), ErrorCode::NotFoundJob);
}

#[rstest]
fn panics_become_plugin_bugs_and_the_session_survives(mut session: Session<ProbePlugin>) {
    let error = session
        .dispatch("pools", Map::new())
        .expect_err("panicking plugin");
    assert_eq!(error.code(), ErrorCode::PluginBug);
    assert!(
        error.message().contains("vendor tool exploded"),
        "got: {}",
        error.message()
    );
    assert!(session.dispatch("systems", Map::new()).is_ok());
}

fn request(method: &str, id: u64, args: Value) -> Value {
    json!({"method": method, "arguments": args, "id": id})
}

#[test]
fn serve_answers_until_unregister() {
    let (client, server) = UnixStream::pair().expect("socket pair");
    let worker = thread::spawn(move || Session::new(ProbePlugin::default()).serve(server));

    let mut framed = Framed::new(client);
    framed
        .send(&request("systems", 1, json!({})))
        .expect("send systems");
    let reply = Response::from_value(framed.recv().expect("systems reply")).expect("envelope");
    assert_eq!(reply.id, 1);
    assert!(reply.outcome.is_ok());

    framed
        .send(&request("job_status", 2, json!({"job_id": "done"})))
        .expect("send job_status");
    let reply = Response::from_value(framed.recv().expect("status reply")).expect("envelope");
    let progress = JobProgress::from_wire(reply.outcome.expect("status ok")).expect("progress");
    assert_eq!(progress.status, Lifecycle::Complete);

    framed
        .send(&request("plugin_unregister", 3, json!({})))
        .expect("send unregister");
    let reply = Response::from_value(framed.recv().expect("unregister reply")).expect("envelope");
    assert_eq!(reply.outcome, Ok(Value::Null));

    worker
        .join()
        .expect("session thread")
        .expect("session ends cleanly");
    assert!(matches!(framed.recv(), Err(FrameError::Closed)));
}

#[test]
fn serve_ends_quietly_when_the_client_hangs_up() {
    let (client, server) = UnixStream::pair().expect("socket pair");
    let worker = thread::spawn(move || Session::new(ProbePlugin::default()).serve(server));
    drop(client);
    worker
        .join()
        .expect("session thread")
        .expect("hang-up is not an error");
}

#[test]
fn serve_rejects_malformed_frames_with_a_protocol_fault() {
    let (mut client, server) = UnixStream::pair().expect("socket pair");
    let worker = thread::spawn(move || Session::new(ProbePlugin::default()).serve(server));

    client.write_all(b"not-a-len!{}").expect("write garbage");
    let mut framed = Framed::new(client);
    let reply = Response::from_value(framed.recv().expect("fault reply")).expect("envelope");
    assert_eq!(reply.id, UNKNOWN_REQUEST_ID);
    let fault = reply.outcome.expect_err("protocol fault");
    assert_eq!(fault.code, i64::from(ErrorCode::ProtocolError.number()));

    let ended = worker.join().expect("session thread");
    assert!(matches!(ended, Err(FrameError::InvalidHeader { .. })));
}
