//! Installs the global subscriber once, so this file holds a single test.

use clientmgr_bootstrap::{LogFormat, LogOutput, LoggingConfig, init_logging};

#[test]
fn file_output_receives_json_events() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("logs").join("clientmgr.log");

    let config = LoggingConfig {
        level: "info".to_owned(),
        format: LogFormat::Json,
        output: LogOutput::File,
        path: Some(path.clone()),
    };

    let guard = init_logging(&config).unwrap();
    tracing::info!(client = "status", "client registered");
    tracing::debug!("filtered out");
    drop(guard);

    let contents = std::fs::read_to_string(&path).unwrap();
    assert!(contents.contains("client registered"));
    assert!(contents.contains("\"client\":\"status\""));
    assert!(!contents.contains("filtered out"));

    // A second install fails instead of silently replacing the first.
    assert!(init_logging(&config).is_err());
}
