//! Tests for the plugin process lifecycle.

use std::path::PathBuf;
use std::sync::Mutex;

use rstest::{fixture, rstest};
use serde_json::Map;
use stormgr_ipc::{CONNECT_TIMEOUT, PluginDescription, Transport, WireValue};
use tempfile::TempDir;

use super::*;
use crate::test_support::ProbePlugin;

struct FixedLoader(Config);

impl ConfigLoader for FixedLoader {
    fn load(&self) -> Result<Config, Arc<OrthoError>> {
        Ok(self.0.clone())
    }
}

struct RejectingLoader;

impl ConfigLoader for RejectingLoader {
    fn load(&self) -> Result<Config, Arc<OrthoError>> {
        Config::load_from_iter(["stormgr-plugin", "--no-such-flag"])
    }
}

/// Calls the plugin once, then lets shutdown proceed.
struct ProbeThenStop {
    socket: PathBuf,
    seen: Mutex<Option<PluginDescription>>,
}

impl ShutdownSignal for ProbeThenStop {
    fn wait(&self) -> Result<(), ShutdownError> {
        let mut transport = Transport::connect(&self.socket, CONNECT_TIMEOUT).expect("connect");
        let reply = transport
            .send_request("plugin_info", Map::new())
            .expect("plugin_info");
        let info = PluginDescription::from_wire(reply).expect("description");
        *self.seen.lock().expect("lock") = Some(info);
        Ok(())
    }
}

struct NeverCalled;

impl ShutdownSignal for NeverCalled {
    fn wait(&self) -> Result<(), ShutdownError> {
        panic!("shutdown must not be awaited when startup fails");
    }
}

#[fixture]
fn root() -> TempDir {
    tempfile::tempdir().expect("temp dir")
}

fn config_for(root: &TempDir) -> Config {
    let path = root.path().to_str().expect("utf8 temp path");
    Config::default().with_uds_path(path)
}

#[rstest]
fn serves_under_the_configured_root_until_signalled(root: TempDir) {
    let config = config_for(&root);
    let signal = ProbeThenStop {
        socket: config.plugin_socket("probe").into_std_path_buf(),
        seen: Mutex::new(None),
    };

    run_with("probe", ProbePlugin::default, &FixedLoader(config), &signal).expect("run");

    let seen = signal.seen.lock().expect("lock").take().expect("probe ran");
    assert_eq!(seen.version, "1.0");
    assert!(!signal.socket.exists(), "socket removed after shutdown");
}

#[test]
fn configuration_failures_stop_startup() {
    let error = run_with("probe", ProbePlugin::default, &RejectingLoader, &NeverCalled)
        .expect_err("bad flag");
    assert!(matches!(error, RunError::Configuration { .. }));
}

#[rstest]
fn occupied_sockets_stop_startup(root: TempDir) {
    let config = config_for(&root);
    let socket = config.plugin_socket("probe");
    let _live = std::os::unix::net::UnixListener::bind(socket.as_std_path()).expect("occupy");

    let error = run_with("probe", ProbePlugin::default, &FixedLoader(config), &NeverCalled)
        .expect_err("socket in use");
    assert!(matches!(
        error,
        RunError::Listener {
            source: ListenerError::InUse { .. }
        }
    ));
}
