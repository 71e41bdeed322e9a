//! Tests for the simulator's plugin surface.

use rstest::{fixture, rstest};
use stormgr_types::{ErrorCode, JobStatus, Provisioning, SearchKey};

use super::*;
use crate::array::{SYSTEM_ID, SimArray};

fn register(plugin: &mut SimPlugin, uri: &str) -> PluginResult<()> {
    plugin.plugin_register(ops::PluginRegister {
        uri: uri.to_owned(),
        password: None,
        timeout: 5_000,
        flags: 0,
    })
}

#[fixture]
fn inline() -> SimPlugin {
    let mut plugin = SimPlugin::with_array(SharedArray::new(SimArray::new()));
    register(&mut plugin, "sim://?job_steps=0").expect("register");
    plugin
}

#[fixture]
fn staged() -> SimPlugin {
    let mut plugin = SimPlugin::with_array(SharedArray::new(SimArray::new()));
    register(&mut plugin, "sim://").expect("register");
    plugin
}

fn first_pool(plugin: &mut SimPlugin) -> Pool {
    plugin
        .pools(ops::Pools::all())
        .expect("pools")
        .into_iter()
        .next()
        .expect("seeded pool")
}

fn create_volume(plugin: &mut SimPlugin, name: &str) -> PluginResult<JobOr<Volume>> {
    let pool = first_pool(plugin);
    plugin.volume_create(ops::VolumeCreate {
        pool,
        volume_name: name.to_owned(),
        size_bytes: 1 << 30,
        provisioning: Provisioning::Default,
        flags: 0,
    })
}

#[rstest]
#[case::default("sim://", DEFAULT_JOB_STEPS)]
#[case::inline("sim://?job_steps=0", 0)]
#[case::slow("sim://?job_steps=4", 4)]
fn registration_reads_job_steps(#[case] uri: &str, #[case] expected: u32) {
    let mut plugin = SimPlugin::with_array(SharedArray::default());
    register(&mut plugin, uri).expect("register");
    assert_eq!(plugin.job_steps(), expected);
}

#[rstest]
#[case::not_a_number("sim://?job_steps=soon")]
#[case::negative("sim://?job_steps=-1")]
#[case::not_a_uri("no scheme here")]
fn bad_registrations_are_invalid(#[case] uri: &str) {
    let mut plugin = SimPlugin::with_array(SharedArray::default());
    let error = register(&mut plugin, uri).expect_err("rejected");
    assert_eq!(error.code(), ErrorCode::InvalidArgument);
}

#[rstest]
fn timeout_round_trips(mut inline: SimPlugin) {
    assert_eq!(inline.time_out_get(ops::TimeOutGet::default()), Ok(5_000));
    inline
        .time_out_set(ops::TimeOutSet { ms: 750, flags: 0 })
        .expect("set");
    assert_eq!(inline.time_out_get(ops::TimeOutGet::default()), Ok(750));
}

#[rstest]
fn describes_itself(mut inline: SimPlugin) {
    let info = inline
        .plugin_info(ops::PluginInfo::default())
        .expect("info");
    assert_eq!(info.description, "Simulated storage array");
    assert!(!info.version.is_empty());
}

#[rstest]
fn capabilities_are_checked_against_the_system(mut inline: SimPlugin) {
    let system = inline
        .systems(ops::Systems::default())
        .expect("systems")
        .remove(0);
    assert_eq!(system.id, SYSTEM_ID);
    let capabilities = inline
        .capabilities(ops::Capabilities {
            system: system.clone(),
            flags: 0,
        })
        .expect("capabilities");
    assert_eq!(capabilities, Capabilities::all());

    let stranger = System {
        id: "elsewhere".to_owned(),
        ..system
    };
    let error = inline
        .capabilities(ops::Capabilities {
            system: stranger,
            flags: 0,
        })
        .expect_err("unknown system");
    assert_eq!(error.code(), ErrorCode::NotFoundSystem);
}

#[rstest]
fn listings_apply_search_keys(mut inline: SimPlugin) {
    let all = inline.pools(ops::Pools::all()).expect("all pools");
    assert_eq!(all.len(), 2);
    let one = inline
        .pools(ops::Pools::matching("id", "POOL_0002"))
        .expect("filtered");
    assert_eq!(one.len(), 1);
    assert_eq!(one.first().map(|pool| pool.id.as_str()), Some("POOL_0002"));

    let error = inline
        .disks(ops::Disks::matching(
            <&str>::from(SearchKey::PoolId),
            "POOL_0001",
        ))
        .expect_err("disks have no pool key");
    assert_eq!(error.code(), ErrorCode::UnsupportedSearchKey);
}

#[rstest]
fn inline_mutations_return_the_entity(mut inline: SimPlugin) {
    let volume = create_volume(&mut inline, "data")
        .expect("create")
        .done()
        .expect("inline result");
    assert_eq!(volume.name, "data");
    let listed = inline
        .volumes(ops::Volumes::matching("id", volume.id.clone()))
        .expect("listed");
    assert_eq!(listed, vec![volume.clone()]);

    let deleted = inline
        .volume_delete(ops::VolumeDelete { volume, flags: 0 })
        .expect("delete");
    assert_eq!(deleted, None);
}

#[rstest]
fn staged_mutations_complete_through_jobs(mut staged: SimPlugin) {
    let job = match create_volume(&mut staged, "data").expect("create") {
        JobOr::Job(id) => id,
        JobOr::Done(volume) => panic!("expected a job, got {volume:?}"),
    };
    let pending = staged
        .job_status(ops::JobStatus {
            job_id: job.clone(),
            flags: 0,
        })
        .expect("first poll");
    assert_eq!(pending.status, JobStatus::InProgress);

    let done = staged
        .job_status(ops::JobStatus {
            job_id: job.clone(),
            flags: 0,
        })
        .expect("second poll");
    assert_eq!(done.status, JobStatus::Complete);
    let volume = done
        .result_as::<Volume>()
        .expect("volume shape")
        .expect("volume result");
    assert_eq!(volume.name, "data");

    staged
        .job_free(ops::JobFree {
            job_id: job.clone(),
            flags: 0,
        })
        .expect("free");
    let error = staged
        .job_status(ops::JobStatus { job_id: job, flags: 0 })
        .expect_err("freed");
    assert_eq!(error.code(), ErrorCode::NotFoundJob);
}

#[rstest]
fn validation_failures_are_immediate(mut staged: SimPlugin) {
    create_volume(&mut staged, "data").expect("first");
    let error = create_volume(&mut staged, "data").expect_err("duplicate");
    assert_eq!(error.code(), ErrorCode::NameConflict);
}

#[rstest]
fn sessions_share_one_array() {
    let array = SharedArray::new(SimArray::new());
    let mut first = SimPlugin::with_array(array.clone());
    let mut second = SimPlugin::with_array(array);
    register(&mut first, "sim://?job_steps=0").expect("register first");
    register(&mut second, "sim://?job_steps=0").expect("register second");

    create_volume(&mut first, "shared").expect("create");
    let seen = second.volumes(ops::Volumes::all()).expect("volumes");
    assert_eq!(seen.len(), 1);
}

#[rstest]
fn jobs_are_private_to_a_session() {
    let array = SharedArray::new(SimArray::new());
    let mut first = SimPlugin::with_array(array.clone());
    let mut second = SimPlugin::with_array(array);
    register(&mut first, "sim://").expect("register first");
    register(&mut second, "sim://").expect("register second");

    let job = create_volume(&mut first, "data")
        .expect("create")
        .job()
        .cloned()
        .expect("job id");
    let error = second
        .job_status(ops::JobStatus { job_id: job, flags: 0 })
        .expect_err("other session's job");
    assert_eq!(error.code(), ErrorCode::NotFoundJob);
}

#[rstest]
fn exports_use_the_advertised_auth_flavours(mut inline: SimPlugin) {
    let flavours = inline
        .export_auth(ops::ExportAuth::default())
        .expect("auth list");
    assert_eq!(flavours, vec!["standard", "sys", "krb5"]);

    let pool = first_pool(&mut inline);
    let fs = inline
        .fs_create(ops::FsCreate {
            pool,
            name: "home".to_owned(),
            size_bytes: 1 << 30,
            flags: 0,
        })
        .expect("create")
        .done()
        .expect("inline fs");
    let export = inline
        .export_fs(ops::ExportFs {
            fs_id: fs.id.clone(),
            export_path: None,
            root_list: Vec::new(),
            rw_list: vec!["192.0.2.10".to_owned()],
            ro_list: Vec::new(),
            anon_uid: stormgr_types::ANON_ID_UNSET,
            anon_gid: stormgr_types::ANON_ID_UNSET,
            auth_type: Some("krb5".to_owned()),
            options: None,
            flags: 0,
        })
        .expect("export");
    assert_eq!(export.fs_id, fs.id);
    assert_eq!(export.auth, "krb5");
    let listed = inline
        .exports(ops::Exports::matching("fs_id", fs.id))
        .expect("exports");
    assert_eq!(listed, vec![export]);
}
