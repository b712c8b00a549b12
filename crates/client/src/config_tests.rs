// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

#![allow(clippy::panic)]
#![allow(clippy::unwrap_used)]

use super::*;
use tempfile::tempdir;
use yare::parameterized;

#[test]
fn defaults() {
    let config = ClientConfig::default();
    assert_eq!(config.url, None);
    assert_eq!(config.path, "/ws");
    assert_eq!(config.token_param, "token");
    assert_eq!(config.backoff().unwrap(), BackoffPolicy::default());
    assert_eq!(config.connect_timeout(), Duration::from_secs(10));
    assert_eq!(
        config.heartbeat(),
        Some(Heartbeat {
            interval: Duration::from_secs(30),
            timeout: Duration::from_secs(10),
        })
    );
    config.validate().unwrap();
}

#[test]
fn empty_file_yields_defaults() {
    let config = ClientConfig::from_toml_str("").unwrap();
    assert_eq!(config, ClientConfig::default());
}

#[test]
fn partial_file_keeps_other_defaults() {
    let config = ClientConfig::from_toml_str(
        r#"
        url = "wss://sync.example.com/live"
        backoff_cap_ms = 5000
        heartbeat_interval_ms = 0
        "#,
    )
    .unwrap();
    assert_eq!(config.url.as_deref(), Some("wss://sync.example.com/live"));
    assert_eq!(config.backoff().unwrap().cap(), Duration::from_secs(5));
    assert_eq!(config.backoff().unwrap().base(), Duration::from_secs(1));
    assert_eq!(config.heartbeat(), None);
    assert_eq!(config.path, "/ws");
}

#[test]
fn load_missing_file_is_default() {
    let dir = tempdir().unwrap();
    let config = ClientConfig::load(&dir.path().join("absent.toml")).unwrap();
    assert_eq!(config, ClientConfig::default());
}

#[test]
fn load_reads_file() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(&path, "path = \"/realtime\"\ntoken_param = \"access_token\"\n").unwrap();

    let config = ClientConfig::load(&path).unwrap();
    assert_eq!(config.path, "/realtime");
    assert_eq!(config.token_param, "access_token");
}

#[test]
fn read_defers_validation() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(&path, "url = \"http://sync.example.com\"\n").unwrap();

    let config = ClientConfig::read(&path).unwrap();
    assert_eq!(config.url.as_deref(), Some("http://sync.example.com"));
    assert!(config.validate().is_err());
    assert!(ClientConfig::load(&path).is_err());
}

#[test]
fn unknown_key_is_rejected() {
    let result = ClientConfig::from_toml_str("max_retries = 3");
    assert!(matches!(result, Err(ConfigError::Parse(_))));
}

#[parameterized(
    http_url = { "url = \"http://example.com/ws\"", "url" },
    garbage_url = { "url = \"not a url\"", "url" },
    relative_path = { "path = \"ws\"", "path" },
    empty_token_param = { "token_param = \"\"", "token_param" },
    zero_connect_timeout = { "connect_timeout_secs = 0", "connect_timeout_secs" },
    zero_heartbeat_timeout = { "heartbeat_timeout_ms = 0", "heartbeat_timeout_ms" },
)]
fn invalid_values_are_rejected(toml: &str, field_name: &str) {
    match ClientConfig::from_toml_str(toml) {
        Err(ConfigError::Invalid { field, .. }) => assert_eq!(field, field_name),
        other => panic!("expected invalid {field_name}, got {other:?}"),
    }
}

#[test]
fn zero_backoff_base_is_rejected() {
    let result = ClientConfig::from_toml_str("backoff_base_ms = 0");
    assert!(matches!(result, Err(ConfigError::Core(_))));
}

#[test]
fn cap_below_base_is_rejected() {
    let result = ClientConfig::from_toml_str("backoff_base_ms = 5000\nbackoff_cap_ms = 1000");
    assert!(matches!(result, Err(ConfigError::Core(_))));
}

#[test]
fn zero_heartbeat_timeout_allowed_when_disabled() {
    let config =
        ClientConfig::from_toml_str("heartbeat_interval_ms = 0\nheartbeat_timeout_ms = 0").unwrap();
    assert_eq!(config.heartbeat(), None);
}

#[test]
fn renders_back_to_toml() {
    let config = ClientConfig {
        url: Some("ws://localhost:9000/ws".to_string()),
        ..ClientConfig::default()
    };
    let rendered = config.to_toml_string().unwrap();
    assert!(rendered.contains("url = \"ws://localhost:9000/ws\""));
    assert_eq!(ClientConfig::from_toml_str(&rendered).unwrap(), config);
}
