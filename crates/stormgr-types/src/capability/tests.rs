//! Unit tests for capability sets.

use rstest::rstest;
use serde_json::json;

use super::*;

#[test]
fn serializes_as_sorted_numbers_under_class_tag() {
    let caps: Capabilities = [
        Capability::VolumeRaidInfo,
        Capability::Volumes,
        Capability::Disks,
    ]
    .into_iter()
    .collect();
    let value = serde_json::to_value(&caps).expect("serialize");
    assert_eq!(
        value,
        json!({"class": "Capabilities", "supported": [20, 54, 220]})
    );
}

#[test]
fn decoding_skips_unknown_numbers() {
    let value = json!({"class": "Capabilities", "supported": [20, 9999, 121]});
    let caps: Capabilities = serde_json::from_value(value).expect("deserialize");
    assert!(caps.supports(Capability::Volumes));
    assert!(caps.supports(Capability::Exports));
    assert_eq!(caps.iter().count(), 2);
}

#[rstest]
#[case::volumes(Capability::Volumes, 20)]
#[case::chap(Capability::VolumeIscsiChapAuthentication, 53)]
#[case::snapshot_delete(Capability::FsSnapshotDelete, 109)]
#[case::target_ports(Capability::TargetPorts, 216)]
fn capabilities_keep_wire_numbers(#[case] capability: Capability, #[case] number: u32) {
    assert_eq!(u32::from(capability), number);
    assert_eq!(Capability::try_from(number), Ok(capability));
}

#[test]
fn set_and_unset_toggle_support() {
    let mut caps = Capabilities::new();
    caps.set(Capability::VolumeCreate);
    assert!(caps.supports(Capability::VolumeCreate));
    caps.unset(Capability::VolumeCreate);
    assert!(!caps.supports(Capability::VolumeCreate));
}

#[test]
fn all_contains_every_variant() {
    let caps = Capabilities::all();
    assert_eq!(caps.iter().count(), Capability::iter().count());
}
