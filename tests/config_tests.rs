use std::io::Write;
use std::path::PathBuf;
use tempfile::NamedTempFile;

use swarmfetch::config::{CliArgs, Config, MAX_CHUNK_SIZE};
use swarmfetch::SwarmError;

fn toml_file(content: &str) -> NamedTempFile {
    let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file
}

// Only test in this binary that touches the process environment.
#[test]
fn test_layering_file_env_cli() {
    let file = toml_file(
        r#"
[tracker]
host = "tracker.lan"
port = 9000

[client]
chunk_size = 2048
timeout_secs = 30
"#,
    );

    std::env::set_var("SWARMFETCH_TRACKER_PORT", "9001");
    std::env::set_var("SWARMFETCH_CHUNK_SIZE", "4096");
    let cli = CliArgs {
        config_file: Some(file.path().to_path_buf()),
        chunk_size: Some(8192),
        ..Default::default()
    };
    let loaded = Config::load_with_cli(&cli);

    std::env::set_var("SWARMFETCH_TIMEOUT", "soon");
    let bad_env = Config::default().merge_from_env();

    std::env::remove_var("SWARMFETCH_TRACKER_PORT");
    std::env::remove_var("SWARMFETCH_CHUNK_SIZE");
    std::env::remove_var("SWARMFETCH_TIMEOUT");

    let config = loaded.unwrap();
    // file
    assert_eq!(config.tracker.host, "tracker.lan");
    assert_eq!(config.client.timeout_secs, 30);
    // env over file
    assert_eq!(config.tracker.port, 9001);
    // cli over env
    assert_eq!(config.client.chunk_size, 8192);
    // defaults elsewhere
    assert_eq!(config.tracker.web_port, 7071);
    assert_eq!(config.seeder.input_dir, PathBuf::from("./shared"));

    assert!(matches!(bad_env, Err(SwarmError::InvalidArgument(msg)) if msg.contains("SWARMFETCH_TIMEOUT")));
}

#[test]
fn test_missing_explicit_config_file_is_error() {
    let cli = CliArgs {
        config_file: Some(PathBuf::from("/nonexistent/swarmfetch.toml")),
        ..Default::default()
    };
    assert!(matches!(
        Config::from_file(cli.config_file.as_ref().unwrap()),
        Err(SwarmError::IoError(_))
    ));
}

#[test]
fn test_timeout_bounds() {
    for (secs, ok) in [(0, false), (1, true), (3600, true), (3601, false), (u64::MAX, false)] {
        let mut config = Config::default();
        config.client.timeout_secs = secs;
        assert_eq!(config.validate().is_ok(), ok, "timeout {}", secs);
    }
}

#[test]
fn test_validation_error_lists_fields() {
    let mut config = Config::default();
    config.client.chunk_size = MAX_CHUNK_SIZE * 2;
    config.logging.level = "chatty".to_string();

    let message = config.validate().unwrap_err().to_string();
    assert!(message.contains("client.chunk_size"), "{}", message);
    assert!(message.contains("logging.level"), "{}", message);
}

#[test]
fn test_unknown_keys_are_ignored_and_sections_default() {
    let file = toml_file(
        r#"
[seeder]
input_dir = "/srv/share"
colour = "blue"
"#,
    );
    let config = Config::from_file(file.path()).unwrap();
    assert_eq!(config.seeder.input_dir, PathBuf::from("/srv/share"));
    assert_eq!(config.seeder.port, 7080);
    assert_eq!(config.client.chunk_size, 1024 * 1024);
}
