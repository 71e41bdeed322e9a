//! Behavioural tests for controller health reporting.

use std::cell::RefCell;
use std::path::Path;

use enumflags2::BitFlags;
use mockall::mock;
use rstest::fixture;
use rstest_bdd_macros::{given, scenario, then, when};
use stormgr_ipc::ops;
use stormgr_plugin::Plugin;
use stormgr_plugin_smartarray::{CommandRunner, SmartArrayError, SmartArrayPlugin};
use stormgr_types::{StorageError, System, SystemStatus};

const DETAIL: &str = include_str!("data/ctrl_all_show_detail.txt");
const STATUS: &str = include_str!("data/ctrl_all_show_status.txt");

mock! {
    Runner {}
    impl CommandRunner for Runner {
        fn run(&self, program: &Path, args: &[String]) -> Result<String, SmartArrayError>;
    }
}

#[derive(Default)]
struct Host {
    plugin: RefCell<Option<SmartArrayPlugin<MockRunner>>>,
    listing: RefCell<Option<Result<Vec<System>, StorageError>>>,
}

impl Host {
    fn install(&self, controllers: bool) {
        let mut runner = MockRunner::new();
        runner.expect_run().returning(move |_, args| {
            match (controllers, args.join(" ").as_str()) {
                (_, "version") => Ok(String::new()),
                (true, "ctrl all show detail") => Ok(DETAIL.to_owned()),
                (true, "ctrl all show status") => Ok(STATUS.to_owned()),
                _ => Err(SmartArrayError::NoControllers),
            }
        });
        let mut plugin = SmartArrayPlugin::with_runner(runner)
            .with_privilege_check(|| true)
            .with_sysfs_root(concat!(env!("CARGO_MANIFEST_DIR"), "/tests/data/sysfs"));
        let registered = plugin.plugin_register(ops::PluginRegister {
            uri: "smartarray://?hpssacli=/usr/sbin/hpssacli".to_owned(),
            password: None,
            timeout: 30_000,
            flags: 0,
        });
        if let Err(error) = registered {
            panic!("registration failed: {error}");
        }
        *self.plugin.borrow_mut() = Some(plugin);
    }

    fn systems(&self) -> Vec<System> {
        match self.listing.borrow().as_ref() {
            Some(Ok(systems)) => systems.clone(),
            Some(Err(error)) => panic!("listing failed: {error}"),
            None => panic!("systems were never listed"),
        }
    }

    fn system(&self, id: &str) -> System {
        match self.systems().into_iter().find(|system| system.id == id) {
            Some(system) => system,
            None => panic!("system {id} not reported"),
        }
    }
}

#[fixture]
fn host() -> Host {
    Host::default()
}

#[given("a host with a healthy controller and one with a failed battery")]
fn given_two_controllers(host: &Host) {
    host.install(true);
}

#[given("a host without controllers")]
fn given_no_controllers(host: &Host) {
    host.install(false);
}

#[when("the systems are listed")]
fn when_listed(host: &Host) {
    let outcome = match host.plugin.borrow_mut().as_mut() {
        Some(plugin) => plugin.systems(ops::Systems::default()),
        None => panic!("no plugin installed"),
    };
    *host.listing.borrow_mut() = Some(outcome);
}

#[then("{count} systems are reported")]
fn then_count(host: &Host, count: usize) {
    assert_eq!(host.systems().len(), count);
}

#[then("system \"{id}\" is OK")]
fn then_ok(host: &Host, id: String) {
    let system = host.system(&id);
    assert_eq!(system.status, BitFlags::from(SystemStatus::Ok));
    assert!(system.status_info.is_empty());
}

#[then("system \"{id}\" reports \"{text}\"")]
fn then_reports(host: &Host, id: String, text: String) {
    let system = host.system(&id);
    assert_eq!(system.status, BitFlags::from(SystemStatus::Other));
    assert!(system.status_info.contains(&text), "got {}", system.status_info);
}

#[then("the listing fails with \"{text}\"")]
fn then_fails(host: &Host, text: String) {
    match host.listing.borrow().as_ref() {
        Some(Err(error)) => assert!(error.message().contains(&text), "got: {error}"),
        Some(Ok(systems)) => panic!("expected a failure, got {systems:?}"),
        None => panic!("systems were never listed"),
    }
}

#[scenario(
    path = "tests/features/controller_health.feature",
    name = "A failed cache battery degrades its controller"
)]
fn failed_battery_degrades_controller(#[from(host)] host: Host) {
    let _ = host;
}

#[scenario(
    path = "tests/features/controller_health.feature",
    name = "A host without controllers reports no system"
)]
fn no_controllers_reports_no_system(#[from(host)] host: Host) {
    let _ = host;
}
