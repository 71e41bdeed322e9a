//! Unit tests for configuration accessors.

use std::str::FromStr;

use rstest::rstest;

use super::*;

#[test]
fn defaults_point_at_the_system_socket_root() {
    let config = Config::default();
    assert_eq!(config.uds_path(), Utf8Path::new(DEFAULT_UDS_PATH));
    assert_eq!(config.log_filter(), DEFAULT_LOG_FILTER);
    assert_eq!(config.log_format(), LogFormat::Json);
    assert_eq!(config.timeout(), Duration::from_secs(30));
}

#[test]
fn plugin_socket_joins_scheme_onto_root() {
    let config = Config::default().with_uds_path("/tmp/stormgr-test");
    assert_eq!(
        config.plugin_socket("sim"),
        Utf8PathBuf::from("/tmp/stormgr-test/sim")
    );
}

#[rstest]
#[case::json("json", LogFormat::Json)]
#[case::compact("compact", LogFormat::Compact)]
#[case::mixed_case("Compact", LogFormat::Compact)]
fn log_format_parses_case_insensitively(#[case] text: &str, #[case] expected: LogFormat) {
    assert_eq!(LogFormat::from_str(text), Ok(expected));
}

#[test]
fn log_format_rejects_unknown_styles() {
    assert!(LogFormat::from_str("xml").is_err());
}
