//! Tests for bootstrap config resolution
//!
//! Note: Uses serial_test crate to prevent ENV variable race conditions.
//! Tests that manipulate CANVASS_CONFIG are marked with #[serial].

use canvass_common::config::{ConfigResolver, ConfigSource, CONFIG_ENV_VAR};
use canvass_common::Error;
use serial_test::serial;
use std::env;
use std::io::Write;
use std::path::PathBuf;

fn write_config(contents: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().expect("create temp config");
    file.write_all(contents.as_bytes()).expect("write temp config");
    file
}

#[test]
#[serial]
fn test_cli_path_wins_over_env() {
    env::set_var(CONFIG_ENV_VAR, "/tmp/canvass-env-config.toml");

    let resolver = ConfigResolver::new(Some(PathBuf::from("/tmp/canvass-cli.toml")));
    assert_eq!(
        resolver.resolve(),
        ConfigSource::CommandLine(PathBuf::from("/tmp/canvass-cli.toml"))
    );

    env::remove_var(CONFIG_ENV_VAR);
}

#[test]
#[serial]
fn test_env_var_used_without_cli() {
    env::set_var(CONFIG_ENV_VAR, "/tmp/canvass-env-config.toml");

    let resolver = ConfigResolver::new(None);
    assert_eq!(
        resolver.resolve(),
        ConfigSource::Environment(PathBuf::from("/tmp/canvass-env-config.toml"))
    );

    env::remove_var(CONFIG_ENV_VAR);
}

#[test]
#[serial]
fn test_load_reads_sections() {
    env::remove_var(CONFIG_ENV_VAR);
    let file = write_config(
        r#"
[server]
port = 6100

[data]
local_paths = ["/srv/canvass/addresses.json"]
remote_filenames = ["backup.json"]
fetch_timeout_secs = 3
offline = true

[logging]
level = "debug"
"#,
    );

    let config = ConfigResolver::new(Some(file.path().to_path_buf()))
        .load()
        .expect("config should load");

    assert_eq!(config.server.port, 6100);
    assert_eq!(config.server.bind, "127.0.0.1");
    assert_eq!(
        config.data.local_paths,
        vec![PathBuf::from("/srv/canvass/addresses.json")]
    );
    assert_eq!(config.data.remote_filenames, vec!["backup.json".to_string()]);
    assert_eq!(config.data.fetch_timeout_secs, 3);
    assert!(config.data.offline);
    assert!(config.data.remote_urls().is_empty());
    assert_eq!(config.data.sample_per_precinct, 24);
    assert_eq!(config.logging.level, "debug");
}

#[test]
#[serial]
fn test_missing_explicit_file_is_an_error() {
    env::remove_var(CONFIG_ENV_VAR);

    let result = ConfigResolver::new(Some(PathBuf::from("/nonexistent/canvass.toml"))).load();
    assert!(matches!(result, Err(Error::Config(_))));
}

#[test]
#[serial]
fn test_invalid_toml_is_an_error() {
    env::remove_var(CONFIG_ENV_VAR);
    let file = write_config("[server\nport = ");

    let result = ConfigResolver::new(Some(file.path().to_path_buf())).load();
    match result {
        Err(Error::Config(msg)) => assert!(msg.contains("Parse")),
        other => panic!("expected parse error, got {:?}", other.map(|_| ())),
    }
}

#[test]
#[serial]
fn test_invalid_values_rejected() {
    env::remove_var(CONFIG_ENV_VAR);
    let file = write_config("[data]\nsample_per_precinct = 0\n");

    let result = ConfigResolver::new(Some(file.path().to_path_buf())).load();
    assert!(matches!(result, Err(Error::Config(_))));
}

#[test]
#[serial]
fn test_upload_limit_configurable() {
    env::remove_var(CONFIG_ENV_VAR);
    let file = write_config("[data]\nmax_upload_bytes = 1048576\n");
    let config = ConfigResolver::new(Some(file.path().to_path_buf()))
        .load()
        .expect("config should load");
    assert_eq!(config.data.max_upload_bytes, 1_048_576);

    let zero = write_config("[data]\nmax_upload_bytes = 0\n");
    let result = ConfigResolver::new(Some(zero.path().to_path_buf())).load();
    assert!(matches!(result, Err(Error::Config(_))));
}
