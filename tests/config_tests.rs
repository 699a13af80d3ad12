use std::time::Duration;

use bellbridge::error::ConfigError;
use bellbridge::BridgeConfig;

#[test]
fn test_defaults() {
    let config = BridgeConfig::default();
    assert_eq!(config.query_poll_ms, 10);
    assert_eq!(config.query_timeout_ms, 500);
    assert_eq!(config.gyro_timeout_ms, 3000);
    assert_eq!(config.joint_poll_ms, 20);
    assert_eq!(config.joint_tolerance_deg, 3.0);
    assert_eq!(config.joint_deadline_ms, 2000);
    assert!(config.validate().is_ok());
}

#[test]
fn test_partial_json_keeps_defaults() {
    let config = BridgeConfig::from_json_str(r#"{"query_timeout_ms": 800, "joint_tolerance_deg": 1.5}"#)
        .expect("valid config");
    assert_eq!(config.query_timeout_ms, 800);
    assert_eq!(config.joint_tolerance_deg, 1.5);
    assert_eq!(config.query_poll_ms, 10);
    assert_eq!(config.snapshot_timeout_ms, 200);
}

#[test]
fn test_windows_follow_config() {
    let config = BridgeConfig::from_json_str(r#"{"query_poll_ms": 5, "reading_timeout_ms": 750}"#).expect("valid config");

    let compare = config.compare_window();
    assert_eq!(compare.interval, Duration::from_millis(5));
    assert_eq!(compare.limit, Duration::from_millis(500));

    assert_eq!(config.reading_window().limit, Duration::from_millis(750));
    assert_eq!(config.gyro_window().limit, Duration::from_millis(3000));
    assert_eq!(config.joint_window().interval, Duration::from_millis(20));
    assert_eq!(config.snapshot_timeout(), Duration::from_millis(200));
}

#[test]
fn test_zero_poll_interval_rejected() {
    let result = BridgeConfig::from_json_str(r#"{"query_poll_ms": 0}"#);
    assert!(matches!(result, Err(ConfigError::Invalid { field: "query_poll_ms", .. })));
}

#[test]
fn test_negative_tolerance_rejected() {
    let result = BridgeConfig::from_json_str(r#"{"joint_tolerance_deg": -1.0}"#);
    assert!(matches!(result, Err(ConfigError::Invalid { field: "joint_tolerance_deg", .. })));
}

#[test]
fn test_malformed_json_rejected() {
    let result = BridgeConfig::from_json_str(r#"{"query_poll_ms": "fast"}"#);
    assert!(matches!(result, Err(ConfigError::Parse(_))));
}

#[test]
fn test_missing_file_reports_path() {
    let result = BridgeConfig::load("/nonexistent/bellbridge.json");
    match result {
        Err(ConfigError::Io { path, .. }) => assert!(path.ends_with("bellbridge.json")),
        other => panic!("expected Io error, got {:?}", other),
    }
}

#[test]
fn test_load_from_file() {
    let path = std::env::temp_dir().join(format!("bellbridge-config-{}.json", std::process::id()));
    std::fs::write(&path, r#"{"command_queue_depth": 8}"#).expect("write temp config");

    let config = BridgeConfig::load(&path).expect("load config");
    assert_eq!(config.command_queue_depth, 8);

    let _ = std::fs::remove_file(&path);
}

#[test]
fn test_oversized_timeout_rejected() {
    let result = BridgeConfig::from_json_str(r#"{"query_timeout_ms": 18446744073709551615}"#);
    assert!(matches!(result, Err(ConfigError::Invalid { field: "query_timeout_ms", .. })));

    let day_ms = 24 * 60 * 60 * 1000;
    let at_ceiling = format!(r#"{{"joint_deadline_ms": {}}}"#, day_ms);
    assert!(BridgeConfig::from_json_str(&at_ceiling).is_ok());
    let past_ceiling = format!(r#"{{"joint_deadline_ms": {}}}"#, day_ms + 1);
    assert!(BridgeConfig::from_json_str(&past_ceiling).is_err());
}
