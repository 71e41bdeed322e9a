//! Unit tests for URI parsing.

use rstest::rstest;

use super::*;
use crate::ErrorCode;

#[rstest]
#[case::bare("sim://", "sim", None)]
#[case::transport("ontap+ssl://admin@filer.example:443/", "ontap", Some("ssl"))]
#[case::query("smartarray://localhost/?ssacli=/opt/ssacli", "smartarray", None)]
fn plugin_name_stops_at_the_transport(
    #[case] raw: &str,
    #[case] plugin: &str,
    #[case] transport: Option<&str>,
) {
    let uri = StorageUri::parse(raw).expect("valid URI");
    assert_eq!(uri.plugin(), plugin);
    assert_eq!(uri.transport(), transport);
    assert_eq!(uri.as_str(), raw);
}

#[test]
fn authority_parts_are_exposed() {
    let uri = StorageUri::parse("ontap+ssl://admin@filer.example:8443/").expect("valid URI");
    assert_eq!(uri.user(), Some("admin"));
    assert_eq!(uri.host(), Some("filer.example"));
    assert_eq!(uri.port(), Some(8443));
}

#[test]
fn query_values_are_decoded() {
    let uri = StorageUri::parse("sim://localhost/?job_steps=3&path=%2Fopt%2Ftool").expect("valid");
    assert_eq!(uri.query("job_steps").as_deref(), Some("3"));
    assert_eq!(uri.query("path").as_deref(), Some("/opt/tool"));
    assert_eq!(uri.query("missing"), None);
}

#[rstest]
#[case::no_scheme("localhost/array")]
#[case::empty("")]
#[case::empty_plugin("+ssl://host/")]
fn malformed_uris_are_invalid_arguments(#[case] raw: &str) {
    let error = StorageUri::parse(raw).expect_err("malformed");
    assert_eq!(error.code(), ErrorCode::InvalidArgument);
}
