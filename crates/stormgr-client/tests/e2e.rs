//! End-to-end tests driving the simulator plugin over a real socket.

use std::time::Duration;

use rstest::{fixture, rstest};
use stormgr_client::{Capability, Client, ErrorCode, JobOr, JobStatus, Locator, ops};
use stormgr_plugin::{PluginServer, ServerHandle};
use stormgr_plugin_sim::{EXPORT_AUTH, SCHEME, SharedArray, SimPlugin};
use stormgr_types::{
    ANON_ID_UNSET, AccessGroup, FileSystem, InitiatorType, Pool, Provisioning, RaidType,
    ReplicationType, System, Volume,
};
use tempfile::TempDir;

const POLL: Duration = Duration::from_millis(5);
const GIB: u64 = 1 << 30;
const INLINE: &str = "sim://localhost/?job_steps=0";
const STAGED: &str = "sim://localhost/?job_steps=2";

struct Array {
    _server: ServerHandle,
    locator: Locator,
    _root: TempDir,
}

impl Array {
    fn connect(&self, uri: &str) -> Client {
        Client::connect(&self.locator, uri, None, 5_000).expect("connect")
    }
}

#[fixture]
fn array() -> Array {
    let root = tempfile::tempdir().expect("temp dir");
    let shared = SharedArray::default();
    let server = PluginServer::bind(root.path().join(SCHEME))
        .expect("bind")
        .start(move || SimPlugin::with_array(shared.clone()))
        .expect("start");
    Array {
        _server: server,
        locator: Locator::new(root.path()),
        _root: root,
    }
}

fn pool(client: &mut Client, id: &str) -> Pool {
    client
        .pools(Some("id"), Some(id))
        .expect("pools")
        .into_iter()
        .next()
        .expect("pool exists")
}

fn system(client: &mut Client) -> System {
    client
        .systems()
        .expect("systems")
        .into_iter()
        .next()
        .expect("one system")
}

fn create_volume(client: &mut Client, name: &str) -> Volume {
    let pool = pool(client, "POOL_0001");
    match client
        .volume_create(&pool, name, GIB, Provisioning::Default)
        .expect("volume_create")
    {
        JobOr::Done(volume) => volume,
        JobOr::Job(job) => panic!("expected an inline result, got job {job}"),
    }
}

fn create_fs(client: &mut Client, name: &str) -> FileSystem {
    let pool = pool(client, "POOL_0001");
    client
        .fs_create(&pool, name, GIB)
        .expect("fs_create")
        .done()
        .expect("inline result")
}

#[rstest]
fn volumes_are_created_and_deleted_through_jobs(array: Array) {
    let mut client = array.connect(STAGED);
    let pool = pool(&mut client, "POOL_0001");

    let job = match client
        .volume_create(&pool, "data", 10 * GIB, Provisioning::Default)
        .expect("volume_create")
    {
        JobOr::Job(job) => job,
        JobOr::Done(volume) => panic!("expected a job, got {volume:?}"),
    };
    let (status, percent, result) = client.job_status_volume(&job).expect("first poll");
    assert_eq!((status, result), (JobStatus::InProgress, None));
    assert!(percent < 100);

    let volume = client
        .wait_for_job::<Volume>(&job, POLL)
        .expect("job finished");
    assert_eq!(volume.name, "data");
    assert_eq!(volume.size_bytes(), 10 * GIB);
    assert_eq!(volume.pool_id, pool.id);
    assert_eq!(
        client.volumes(Some("id"), Some(&volume.id)).expect("volumes"),
        vec![volume.clone()]
    );
    let freed = client.job_status(&job).expect_err("job was freed");
    assert_eq!(freed.code(), ErrorCode::NotFoundJob);

    let delete = client
        .volume_delete(&volume)
        .expect("volume_delete")
        .expect("deletion runs as a job");
    client.wait_for_job::<()>(&delete, POLL).expect("deleted");
    assert!(
        client
            .volumes(Some("id"), Some(&volume.id))
            .expect("volumes")
            .is_empty()
    );
    client.close().expect("close");
}

#[rstest]
fn synchronous_sessions_return_results_inline(array: Array) {
    let mut client = array.connect(INLINE);
    let volume = create_volume(&mut client, "inline");
    assert_eq!(client.volume_delete(&volume).expect("delete"), None);
}

#[rstest]
fn sessions_share_one_array(array: Array) {
    let mut writer = array.connect(INLINE);
    let mut reader = array.connect(STAGED);
    let volume = create_volume(&mut writer, "shared");
    assert_eq!(
        reader.volumes(Some("id"), Some(&volume.id)).expect("volumes"),
        vec![volume]
    );
}

#[rstest]
fn masking_controls_access_and_blocks_deletion(array: Array) {
    let mut client = array.connect(INLINE);
    let system = system(&mut client);
    let volume = create_volume(&mut client, "masked");
    let group: AccessGroup = client
        .access_group_create(
            "hosts",
            "iqn.1994-05.com.example:host1",
            InitiatorType::IscsiIqn,
            &system,
        )
        .expect("access_group_create");

    client.volume_mask(&group, &volume).expect("mask");
    assert_eq!(
        client
            .volumes_accessible_by_access_group(&group)
            .expect("accessible"),
        vec![volume.clone()]
    );
    assert_eq!(
        client
            .access_groups_granted_to_volume(&volume)
            .expect("granted"),
        vec![group.clone()]
    );
    let refused = client.volume_delete(&volume).expect_err("still masked");
    assert_eq!(refused.code(), ErrorCode::IsMasked);

    client.volume_unmask(&group, &volume).expect("unmask");
    assert_eq!(client.volume_delete(&volume).expect("delete"), None);
    client.access_group_delete(&group).expect("group delete");
}

#[rstest]
fn clones_depend_on_their_source_until_detached(array: Array) {
    let mut client = array.connect(INLINE);
    let source = create_volume(&mut client, "source");
    let clone = client
        .volume_replicate(None, ReplicationType::PointInTimeClone, &source, "clone")
        .expect("replicate")
        .done()
        .expect("inline clone");
    assert_eq!(clone.pool_id, source.pool_id);
    assert!(client.volume_child_dependency(&source).expect("dependency"));
    assert_eq!(
        client
            .volume_child_dependency_rm(&source)
            .expect("detach"),
        None
    );
    assert!(!client.volume_child_dependency(&source).expect("dependency"));
}

#[rstest]
fn raid_info_reflects_the_backing_pool(array: Array) {
    let mut client = array.connect(INLINE);
    let volume = create_volume(&mut client, "raid");
    let info = client.volume_raid_info(&volume).expect("raid info");
    assert_eq!(info.raid_type, RaidType::Raid6);
    assert_eq!(info.disk_count, 8);
}

#[rstest]
fn file_systems_snapshot_and_export(array: Array) {
    let mut client = array.connect(INLINE);
    let fs = create_fs(&mut client, "home");
    let snapshot = client
        .fs_snapshot_create(&fs, "nightly")
        .expect("snapshot")
        .done()
        .expect("inline snapshot");
    assert_eq!(client.fs_snapshots(&fs).expect("snapshots"), vec![snapshot]);

    let export = client
        .export_fs(&ops::ExportFs {
            fs_id: fs.id.clone(),
            export_path: None,
            root_list: Vec::new(),
            rw_list: vec!["host1".to_owned()],
            ro_list: Vec::new(),
            anon_uid: ANON_ID_UNSET,
            anon_gid: ANON_ID_UNSET,
            auth_type: None,
            options: None,
            flags: 0,
        })
        .expect("export");
    assert_eq!(export.export_path, "/nfs/home");
    assert_eq!(
        client.exports(Some("fs_id"), Some(&fs.id)).expect("exports"),
        vec![export.clone()]
    );
    client.export_remove(&export).expect("unexport");
    assert_eq!(
        client.export_auth().expect("auth"),
        EXPORT_AUTH.iter().map(|auth| (*auth).to_owned()).collect::<Vec<_>>()
    );
}

#[rstest]
fn capabilities_are_checked_per_system(array: Array) {
    let mut client = array.connect(INLINE);
    let mut system = system(&mut client);
    client
        .require(&system, Capability::VolumeCreate)
        .expect("simulator supports everything");

    system.id = "elsewhere".to_owned();
    let error = client.capabilities(&system).expect_err("unknown system");
    assert_eq!(error.code(), ErrorCode::NotFoundSystem);
}

#[rstest]
fn timeouts_round_trip_through_the_plugin(array: Array) {
    let mut client = array.connect(INLINE);
    assert_eq!(client.time_out_get().expect("get"), 5_000);
    client.time_out_set(8_000).expect("set");
    assert_eq!(client.time_out_get().expect("get"), 8_000);
    assert_eq!(client.timeout(), Duration::from_secs(8));
}

#[rstest]
fn missing_plugins_are_told_apart_from_missing_daemons(array: Array) {
    let error = Client::connect(&array.locator, "smartarray://", None, 5_000)
        .expect_err("not installed");
    assert_eq!(error.code(), ErrorCode::PluginNotExist);

    let empty = tempfile::tempdir().expect("temp dir");
    let error = Client::connect(&Locator::new(empty.path()), "sim://", None, 5_000)
        .expect_err("nothing running");
    assert_eq!(error.code(), ErrorCode::DaemonNotRunning);
}

#[rstest]
fn running_plugins_are_described(array: Array) {
    let descriptions = array.locator.available_plugins(" ").expect("describe");
    assert_eq!(
        descriptions,
        vec![format!("Simulated storage array {}", env!("CARGO_PKG_VERSION"))]
    );
}
