//! EventgateConfig 파일 로딩 통합 테스트
//!
//! 실제 TOML 파일을 만들어 load / from_file 경로와
//! 환경변수 오버라이드의 상호작용을 검증합니다.

use std::io::Write;

use serial_test::serial;
use tempfile::NamedTempFile;

use eventgate_core::config::EventgateConfig;
use eventgate_core::error::{ConfigError, EventgateError};

fn write_config(content: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().expect("create temp config");
    file.write_all(content.as_bytes()).expect("write config");
    file.flush().expect("flush config");
    file
}

#[tokio::test]
async fn load_full_config_file() {
    let file = write_config(
        r#"
[general]
log_level = "debug"
log_format = "pretty"
pid_file = "/tmp/eventgate.pid"

[server]
event_socket = "/tmp/eg-it-queue"
api_socket = "/tmp/eg-it-api"
api_timeout_ms = 2500
api_queue_tasks = 10
consumer_threads = 2

[queue]
capacity = 4096
flood_file = "/tmp/eg-it-flood.log"
flood_attempts = 5
flood_sleep_ms = 50
"#,
    );

    let config = EventgateConfig::from_file(file.path()).await.unwrap();
    assert_eq!(config.general.log_level, "debug");
    assert_eq!(config.server.event_socket, "/tmp/eg-it-queue");
    assert_eq!(config.server.api_timeout_ms, 2500);
    assert_eq!(config.queue.capacity, 4096);
    assert_eq!(config.queue.flood_attempts, 5);
}

#[tokio::test]
async fn load_minimal_config_applies_defaults() {
    let file = write_config("[general]\nlog_level = \"warn\"\n");

    let config = EventgateConfig::from_file(file.path()).await.unwrap();
    assert_eq!(config.general.log_level, "warn");
    assert_eq!(config.general.log_format, "json");
    assert_eq!(config.queue.capacity, 10_000);
    assert_eq!(config.server.consumer_threads, 4);
}

#[tokio::test]
async fn from_file_rejects_invalid_values() {
    let file = write_config("[queue]\ncapacity = 0\n");

    let result = EventgateConfig::from_file(file.path()).await;
    assert!(matches!(
        result,
        Err(EventgateError::Config(ConfigError::InvalidValue { .. }))
    ));
}

#[tokio::test]
async fn from_file_rejects_malformed_toml() {
    let file = write_config("[queue\ncapacity = ???");

    let result = EventgateConfig::from_file(file.path()).await;
    assert!(matches!(
        result,
        Err(EventgateError::Config(ConfigError::ParseFailed { .. }))
    ));
}

#[tokio::test]
async fn missing_file_is_file_not_found() {
    let result = EventgateConfig::from_file("/definitely/not/here.toml").await;
    match result {
        Err(EventgateError::Config(ConfigError::FileNotFound { path })) => {
            assert!(path.contains("here.toml"));
        }
        other => panic!("expected FileNotFound, got {other:?}"),
    }
}

#[tokio::test]
#[serial]
async fn load_applies_env_overrides_over_file() {
    let file = write_config("[queue]\ncapacity = 111\n");

    unsafe {
        std::env::set_var("EVENTGATE_QUEUE_CAPACITY", "222");
    }
    let config = EventgateConfig::load(file.path()).await.unwrap();
    unsafe {
        std::env::remove_var("EVENTGATE_QUEUE_CAPACITY");
    }

    assert_eq!(config.queue.capacity, 222);
}

#[tokio::test]
#[serial]
async fn load_rejects_invalid_env_override_result() {
    // 파일은 유효하지만 환경변수 오버라이드 결과가 유효하지 않은 경우
    let file = write_config("[server]\nevent_socket = \"/tmp/eg-env-queue\"\n");

    unsafe {
        std::env::set_var("EVENTGATE_SERVER_API_SOCKET", "/tmp/eg-env-queue");
    }
    let result = EventgateConfig::load(file.path()).await;
    unsafe {
        std::env::remove_var("EVENTGATE_SERVER_API_SOCKET");
    }

    assert!(result.is_err());
}
