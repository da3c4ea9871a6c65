//! Configuration loading and validation tests.
//!
//! Tests TOML parsing, partial configs with defaults, and validation.

use gridbait_core::config::GridbaitConfig;

#[test]
fn test_parse_full_config() {
    // Given: A complete TOML config
    let toml_str = r#"
[general]
log_level = "debug"
log_format = "json"
data_dir = "/var/lib/gridbait"
pid_file = "/var/run/gridbait.pid"
device_id = "substation-7"

[relay]
enabled = true
event_log_path = "/var/lib/gridbait/events.log"
offset_path = "/var/lib/gridbait/relay.offset"
blocklist_path = "/var/lib/gridbait/blocked_ips.txt"
sink_url = "https://monitor.example.com"
poll_interval_secs = 5
error_backoff_secs = 10
request_timeout_secs = 10

[decoy]
enabled = true
event_log_path = "/var/lib/gridbait/events.log"

[[decoy.listeners]]
name = "smart-meter"
protocol = "modbus"
bind = "0.0.0.0:1502"

[[decoy.listeners]]
name = "ev-charger"
protocol = "ocpp"
bind = "0.0.0.0:8080"
canned_response = '{"status":"Accepted"}'

[metrics]
enabled = false
"#;

    // When: Parsing config
    let result = GridbaitConfig::parse(toml_str);

    // Then: Should succeed
    assert!(result.is_ok(), "full config should parse successfully");
    let config = result.expect("config should parse");

    assert_eq!(config.general.log_level, "debug");
    assert_eq!(config.general.device_id, "substation-7");

    assert!(config.relay.enabled);
    assert_eq!(config.relay.sink_url, "https://monitor.example.com");
    assert_eq!(config.relay.poll_interval_secs, 5);

    assert!(config.decoy.enabled);
    assert_eq!(config.decoy.listeners.len(), 2);
    assert_eq!(config.decoy.listeners[0].name, "smart-meter");
    assert_eq!(
        config.decoy.listeners[1].canned_response.as_deref(),
        Some(r#"{"status":"Accepted"}"#)
    );

    assert!(!config.metrics.enabled);
}

#[test]
fn test_parse_partial_config_with_defaults() {
    // Given: A partial config (only general section)
    let toml_str = r#"
[general]
log_level = "warn"
"#;

    // When: Parsing config
    let config = GridbaitConfig::parse(toml_str).expect("partial config should parse");

    // Then: Missing sections fall back to defaults
    assert_eq!(config.general.log_level, "warn");
    assert_eq!(config.general.log_format, "json");
    assert!(config.relay.enabled);
    assert_eq!(config.relay.poll_interval_secs, 5);
    assert!(config.decoy.enabled);
    assert_eq!(config.decoy.listeners.len(), 3);
}

#[test]
fn test_parse_invalid_toml_fails() {
    let result = GridbaitConfig::parse("this is not [valid toml");
    assert!(result.is_err(), "invalid TOML should fail to parse");
}

#[test]
fn test_default_config_validates() {
    let config = GridbaitConfig::default();
    assert!(config.validate().is_ok(), "default config should validate");
}

#[test]
fn test_validation_rejects_bad_log_format() {
    let mut config = GridbaitConfig::default();
    config.general.log_format = "xml".to_owned();
    assert!(config.validate().is_err());
}

#[test]
fn test_validation_rejects_empty_sink_url() {
    let mut config = GridbaitConfig::default();
    config.relay.sink_url = String::new();
    assert!(config.validate().is_err());
}

#[tokio::test]
async fn test_load_from_file() {
    // Given: A config file on disk
    let dir = tempfile::tempdir().expect("should create temp dir");
    let path = dir.path().join("gridbait.toml");
    tokio::fs::write(
        &path,
        r#"
[general]
device_id = "file-node"
"#,
    )
    .await
    .expect("should write config file");

    // When: Loading it
    let config = GridbaitConfig::load(&path).await.expect("should load");

    // Then: File values override defaults
    assert_eq!(config.general.device_id, "file-node");
}

#[tokio::test]
async fn test_load_missing_file_fails() {
    let result = GridbaitConfig::load("/nonexistent/gridbait.toml").await;
    assert!(result.is_err(), "missing config file should fail to load");
}
