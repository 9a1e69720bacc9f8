//! Daemon assembly and startup failure tests.
//!
//! The happy-path run loop blocks on OS signals, so these tests focus
//! on build-time wiring and fail-fast startup behavior.

use tempfile::TempDir;

use eventgate_core::config::EventgateConfig;
use eventgate_daemon::bootstrap::Daemon;

fn test_config(dir: &TempDir) -> EventgateConfig {
    let mut config = EventgateConfig::default();
    config.server.event_socket = dir.path().join("event.sock").display().to_string();
    config.server.api_socket = dir.path().join("api.sock").display().to_string();
    config
}

#[test]
fn build_with_valid_config_succeeds() {
    let dir = TempDir::new().unwrap();
    let config = test_config(&dir);
    assert!(Daemon::build(config).is_ok());
}

#[test]
fn build_with_flood_file_succeeds() {
    let dir = TempDir::new().unwrap();
    let mut config = test_config(&dir);
    config.queue.flood_file = dir.path().join("flood.log").display().to_string();
    assert!(Daemon::build(config).is_ok());
    assert!(dir.path().join("flood.log").exists());
}

#[tokio::test]
async fn run_fails_fast_on_unbindable_socket() {
    let dir = TempDir::new().unwrap();
    let mut config = test_config(&dir);
    config.server.event_socket = "/nonexistent-dir/event.sock".to_owned();
    config.general.pid_file = dir.path().join("eventgate.pid").display().to_string();

    let daemon = Daemon::build(config).unwrap();
    let result = daemon.run().await;

    assert!(result.is_err(), "run should fail on bind error");
    assert!(
        !dir.path().join("eventgate.pid").exists(),
        "PID file must be cleaned up on startup failure"
    );
}

#[tokio::test]
async fn run_refuses_duplicate_pid_file() {
    let dir = TempDir::new().unwrap();
    let pid_path = dir.path().join("eventgate.pid");
    std::fs::write(&pid_path, "99999").unwrap();

    let mut config = test_config(&dir);
    config.general.pid_file = pid_path.display().to_string();

    let daemon = Daemon::build(config).unwrap();
    let err = daemon.run().await.unwrap_err();
    assert!(err.to_string().contains("already exists"));
    // The stale file belongs to the other instance, do not delete it.
    assert!(pid_path.exists());
}
