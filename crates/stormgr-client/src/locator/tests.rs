//! Tests for plugin discovery.

use rstest::{fixture, rstest};
use stormgr_plugin::{PluginServer, ServerHandle};
use stormgr_plugin_sim::{SharedArray, SimPlugin};
use stormgr_types::ErrorCode;
use tempfile::TempDir;

use super::*;

#[fixture]
fn socket_root() -> TempDir {
    tempfile::tempdir().expect("temp dir")
}

fn serve(path: &Path) -> ServerHandle {
    PluginServer::bind(path)
        .expect("bind")
        .start(|| SimPlugin::with_array(SharedArray::default()))
        .expect("start")
}

fn uri(raw: &str) -> StorageUri {
    StorageUri::parse(raw).expect("valid URI")
}

#[rstest]
fn missing_root_means_no_daemon(socket_root: TempDir) {
    let locator = Locator::new(socket_root.path().join("absent"));
    assert!(locator.plugins().expect("scan").is_empty());
    assert!(matches!(
        locator.resolve(&uri("sim://localhost/")),
        Err(LocatorError::DaemonNotRunning { .. })
    ));
}

#[rstest]
fn stale_files_do_not_count_as_running(socket_root: TempDir) {
    fs::write(socket_root.path().join("leftover"), b"").expect("write");
    let locator = Locator::new(socket_root.path());
    assert!(!locator.is_daemon_running().expect("liveness check"));
    assert!(matches!(
        locator.resolve(&uri("sim://localhost/")),
        Err(LocatorError::DaemonNotRunning { .. })
    ));
}

#[rstest]
fn running_plugins_resolve_by_scheme(socket_root: TempDir) {
    let path = socket_root.path().join("sim");
    let handle = serve(&path);
    let locator = Locator::new(socket_root.path());

    assert_eq!(
        locator.resolve(&uri("sim://localhost/?job_steps=0")).expect("resolve"),
        path
    );
    let missing = locator
        .resolve(&uri("smartarray://"))
        .expect_err("not installed");
    assert!(
        matches!(&missing, LocatorError::PluginNotExist { plugin, .. } if plugin == "smartarray"),
        "got {missing:?}"
    );

    handle.shutdown();
    handle.join().expect("join");
}

#[rstest]
fn sockets_are_listed_recursively_in_path_order(socket_root: TempDir) {
    let nested = socket_root.path().join("a");
    fs::create_dir(&nested).expect("mkdir");
    fs::write(socket_root.path().join("b"), b"").expect("write");
    fs::write(nested.join("c"), b"").expect("write");

    let locator = Locator::new(socket_root.path());
    assert_eq!(
        locator.plugins().expect("scan"),
        vec![nested.join("c"), socket_root.path().join("b")]
    );
}

#[rstest]
fn available_plugins_describe_live_sockets_only(socket_root: TempDir) {
    fs::write(socket_root.path().join("dead"), b"").expect("write");
    let handle = serve(&socket_root.path().join("sim"));
    let locator = Locator::new(socket_root.path());

    assert_eq!(
        locator.available_plugins(":").expect("describe"),
        vec![format!(
            "Simulated storage array:{}",
            env!("CARGO_PKG_VERSION")
        )]
    );

    handle.shutdown();
    handle.join().expect("join");
}

// Longer than the Unix socket address limit, so it can never be connected to.
fn unreachable_socket(root: &Path) -> PathBuf {
    let path = root.join("x".repeat(120));
    fs::write(&path, b"").expect("write");
    path
}

#[rstest]
fn unreachable_sockets_are_skipped(socket_root: TempDir) {
    unreachable_socket(socket_root.path());
    let locator = Locator::new(socket_root.path());
    assert!(!locator.is_daemon_running().expect("scan"));
    assert!(matches!(
        locator.resolve(&uri("sim://localhost/")),
        Err(LocatorError::DaemonNotRunning { .. })
    ));

    let handle = serve(&socket_root.path().join("sim"));
    assert!(locator.is_daemon_running().expect("scan"));
    assert!(matches!(
        locator.resolve(&uri("smartarray://")),
        Err(LocatorError::PluginNotExist { .. })
    ));
    assert_eq!(
        locator.available_plugins(":").expect("describe"),
        vec![format!(
            "Simulated storage array:{}",
            env!("CARGO_PKG_VERSION")
        )]
    );

    handle.shutdown();
    handle.join().expect("join");
}

#[rstest]
fn available_plugins_without_daemons_fails(socket_root: TempDir) {
    let error = Locator::new(socket_root.path())
        .available_plugins(":")
        .expect_err("nothing running");
    assert_eq!(error.code(), ErrorCode::DaemonNotRunning);
}

#[rstest]
fn locator_is_built_from_configuration() {
    let config = Config::default().with_uds_path("/run/custom");
    let locator = Locator::from_config(&config);
    assert_eq!(locator.root(), Path::new("/run/custom"));
    assert_eq!(locator.socket_path("sim"), Path::new("/run/custom/sim"));
}

#[rstest]
#[case::daemon(
    LocatorError::DaemonNotRunning { root: "/r".to_owned() },
    ErrorCode::DaemonNotRunning
)]
#[case::plugin(
    LocatorError::PluginNotExist { plugin: "x".to_owned(), path: "/r/x".to_owned() },
    ErrorCode::PluginNotExist
)]
#[case::denied(
    LocatorError::Scan {
        path: "/r".to_owned(),
        source: io::Error::from(io::ErrorKind::PermissionDenied),
    },
    ErrorCode::PermissionDenied
)]
#[case::scan(
    LocatorError::Scan {
        path: "/r".to_owned(),
        source: io::Error::from(io::ErrorKind::InvalidData),
    },
    ErrorCode::TransportError
)]
fn locator_errors_map_to_codes(#[case] error: LocatorError, #[case] expected: ErrorCode) {
    assert_eq!(StorageError::from(error).code(), expected);
}
