//! Unit tests for result shapes and argument contracts.

use enumflags2::BitFlags;
use rstest::{fixture, rstest};
use serde_json::json;
use stormgr_types::{AdminState, ErrorCode, JobStatus, RaidInfo, RaidType, SystemStatus};

use super::ops;
use super::*;

#[fixture]
fn volume() -> Volume {
    Volume {
        id: "vol-1".into(),
        name: "data".into(),
        vpd83: "600508b1001c5e".into(),
        block_size: 512,
        num_of_blocks: 4096,
        admin_state: AdminState::Enabled,
        system_id: "sys-1".into(),
        pool_id: "pool-1".into(),
        plugin_data: Some("0:A:1".into()),
    }
}

fn system() -> System {
    System {
        id: "sys-1".into(),
        name: "Array".into(),
        status: BitFlags::from(SystemStatus::Ok),
        status_info: String::new(),
        plugin_data: None,
    }
}

#[rstest]
fn records_decode_when_class_matches(volume: Volume) {
    let wire = volume.to_wire().expect("encode");
    assert_eq!(Volume::from_wire(wire).expect("decode"), volume);
}

#[test]
fn records_with_the_wrong_class_are_plugin_bugs() {
    let wire = system().to_wire().expect("encode");
    let error = Volume::from_wire(wire).expect_err("system is not a volume");
    assert_eq!(error.code(), ErrorCode::PluginBug);
    assert!(error.message().contains("System"), "got: {}", error.message());
}

#[rstest]
fn sequence_with_a_foreign_element_is_rejected(volume: Volume) {
    let wire = json!([volume.to_wire().expect("encode"), system().to_wire().expect("encode")]);
    let error = Vec::<Volume>::from_wire(wire).expect_err("mixed sequence");
    assert_eq!(error.code(), ErrorCode::PluginBug);
}

#[rstest]
#[case::number(json!(5))]
#[case::object(json!({"class": "Volume"}))]
#[case::null(Value::Null)]
fn non_sequences_are_rejected_for_listings(#[case] wire: Value) {
    let error = Vec::<Volume>::from_wire(wire).expect_err("not a sequence");
    assert_eq!(error.code(), ErrorCode::PluginBug);
}

#[rstest]
fn job_or_accepts_exactly_one_side(volume: Volume) {
    let started = JobOr::<Volume>::from_wire(json!(["JOB_1", null])).expect("job side");
    assert_eq!(started.job().map(JobId::as_str), Some("JOB_1"));

    let wire = json!([null, volume.to_wire().expect("encode")]);
    let done = JobOr::<Volume>::from_wire(wire).expect("result side");
    assert_eq!(done.done(), Some(volume));
}

#[rstest]
#[case::both(json!(["JOB_1", {"class": "Volume"}]))]
#[case::neither(json!([null, null]))]
#[case::short(json!(["JOB_1"]))]
#[case::not_a_pair(json!("JOB_1"))]
fn job_or_rejects_malformed_pairs(#[case] wire: Value) {
    let error = JobOr::<Volume>::from_wire(wire).expect_err("malformed pair");
    assert_eq!(error.code(), ErrorCode::PluginBug);
}

#[test]
fn job_or_none_accepts_both_forms() {
    assert_eq!(Option::<JobId>::from_wire(Value::Null).expect("none"), None);
    assert_eq!(
        Option::<JobId>::from_wire(json!("JOB_7")).expect("job"),
        Some(JobId::new("JOB_7"))
    );
}

#[test]
fn plugin_description_is_a_string_pair() {
    let info = PluginDescription::from_wire(json!(["Simulated array", "0.1.0"])).expect("pair");
    assert_eq!(info.description, "Simulated array");
    assert_eq!(info.version, "0.1.0");
    let error = PluginDescription::from_wire(json!(["only one"])).expect_err("short");
    assert_eq!(error.code(), ErrorCode::PluginBug);
}

#[test]
fn raid_info_is_five_integers() {
    let info = RaidInfo::from_wire(json!([10, 262_144, 4, 262_144, 524_288])).expect("decode");
    assert_eq!(info.raid_type, RaidType::Raid10);
    assert_eq!(info.disk_count, 4);
    assert_eq!(info.opt_io_size, 524_288);
    assert_eq!(info.to_wire().expect("encode"), json!([10, 262_144, 4, 262_144, 524_288]));

    let error = RaidInfo::from_wire(json!([10, 1, 2, 3])).expect_err("four values");
    assert_eq!(error.code(), ErrorCode::PluginBug);
}

#[rstest]
fn job_progress_exposes_typed_result(volume: Volume) {
    let wire = json!([2, 100, volume.to_wire().expect("encode")]);
    let progress = JobProgress::from_wire(wire).expect("decode");
    assert_eq!(progress.status, JobStatus::Complete);
    assert_eq!(progress.result_as::<Volume>().expect("volume"), Some(volume));
}

#[test]
fn completed_jobs_must_carry_the_declared_result() {
    let progress = JobProgress::from_wire(json!([2, 100, null])).expect("decode");
    let error = progress.result_as::<Volume>().expect_err("missing volume");
    assert_eq!(error.code(), ErrorCode::PluginBug);
    let error = progress
        .clone()
        .into_result::<Volume>()
        .expect_err("missing volume");
    assert_eq!(error.code(), ErrorCode::PluginBug);

    assert_eq!(progress.result_as::<()>().expect("no result"), Some(()));
    progress.into_result::<()>().expect("no result");
}

#[rstest]
#[case::in_progress(1)]
#[case::failed(3)]
fn unfinished_jobs_carry_no_result(volume: Volume, #[case] status: i32) {
    let wire = json!([status, 40, volume.to_wire().expect("encode")]);
    let error = JobProgress::from_wire(wire).expect_err("premature result");
    assert_eq!(error.code(), ErrorCode::PluginBug);

    let progress = JobProgress::from_wire(json!([status, 40, null])).expect("decode");
    assert_eq!(progress.result_as::<Volume>().expect("no result yet"), None);
    let error = progress.into_result::<Volume>().expect_err("not complete");
    assert_eq!(error.code(), ErrorCode::PluginBug);
}

#[test]
fn job_progress_rejects_out_of_range_percent() {
    let error = JobProgress::from_wire(json!([1, 101, null])).expect_err("percent");
    assert_eq!(error.code(), ErrorCode::PluginBug);
}

#[test]
fn listing_validation_rejects_unsupported_keys() {
    let error = ops::Disks::matching("pool_id", "p1")
        .validate()
        .expect_err("disks have no pool");
    assert_eq!(error.code(), ErrorCode::UnsupportedSearchKey);
    assert!(ops::Volumes::matching("pool_id", "p1").validate().is_ok());
}

#[test]
fn arguments_encode_with_wire_names() {
    let operation = ops::TimeOutSet { ms: 500, flags: 0 };
    let arguments = encode_arguments(&operation).expect("encode");
    assert_eq!(Value::Object(arguments), json!({"ms": 500, "flags": 0}));
}

#[test]
fn missing_flags_default_to_zero() {
    let mut arguments = Map::new();
    arguments.insert("ms".into(), json!(250));
    let decoded: ops::TimeOutSet = decode_arguments(arguments).expect("decode");
    assert_eq!(decoded, ops::TimeOutSet { ms: 250, flags: 0 });
}

#[test]
fn undecodable_arguments_are_invalid_argument() {
    let mut arguments = Map::new();
    arguments.insert("ms".into(), json!("soon"));
    let error = decode_arguments::<ops::TimeOutSet>(arguments).expect_err("bad type");
    assert_eq!(error.code(), ErrorCode::InvalidArgument);
    assert!(error.message().contains("time_out_set"));
}

#[test]
fn every_method_name_is_unique() {
    let mut names: Vec<&str> = ops::METHODS.to_vec();
    names.sort_unstable();
    names.dedup();
    assert_eq!(names.len(), ops::METHODS.len());
    assert_eq!(names.len(), 44);
}
