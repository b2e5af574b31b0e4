//! Layer precedence across file and environment.

use conduit_config::{ConfigLoader, LogFormat};
use std::io::Write;

#[test]
fn environment_beats_file_beats_defaults() {
    let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
    writeln!(
        file,
        "[server]\nhttp_addr = \"127.0.0.1:7000\"\nshutdown_timeout_secs = 5\n\n[telemetry.logging]\nformat = \"pretty\""
    )
    .unwrap();

    std::env::set_var("CONDUITLAYER__SERVER__HTTP_ADDR", "127.0.0.1:7001");

    let config = ConfigLoader::new()
        .with_defaults()
        .with_file(file.path())
        .unwrap()
        .with_env_prefix("CONDUITLAYER")
        .load()
        .unwrap();

    assert_eq!(config.server.http_addr, "127.0.0.1:7001");
    assert_eq!(config.server.shutdown_timeout_secs, 5);
    assert_eq!(config.telemetry.logging.format, LogFormat::Pretty);
    assert_eq!(config.telemetry.logging.level, "info");
    assert!(!config.telemetry.metrics.enabled);
}

#[test]
fn sections_feed_telemetry() {
    let config = ConfigLoader::new()
        .with_string(r#"{"telemetry":{"metrics":{"enabled":true,"addr":"127.0.0.1:9464"}}}"#, "json")
        .unwrap()
        .load()
        .unwrap();
    let telemetry = config.telemetry.to_telemetry_config();
    assert!(telemetry.metrics.enabled);
    assert_eq!(telemetry.metrics.addr, "127.0.0.1:9464");
    assert_eq!(telemetry.logging.format, conduit_telemetry::LogFormat::Json);
}
