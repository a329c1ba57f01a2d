//! Configuration loading tests
//!
//! Partial files, both formats and validation failures.

use engine_console::config::loader::{load_config_file, validate_config, ConfigLoader};
use engine_console::{init_with_config, Config, Error};
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

fn write(dir: &TempDir, name: &str, content: &str) -> PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, content).unwrap();
    path
}

#[test]
fn test_partial_toml_keeps_defaults() {
    let dir = TempDir::new().unwrap();
    let path = write(
        &dir,
        "config.toml",
        r#"
[console]
auto_start = true
"#,
    );

    let config = ConfigLoader::load_from_path(&path).unwrap();
    assert!(config.console.auto_start);
    assert!(config.console.echo_commands);
    assert_eq!(config.locator, Config::default().locator);
    assert_eq!(config.logging.level, "info");
}

#[test]
fn test_locator_section() {
    let dir = TempDir::new().unwrap();
    let path = write(
        &dir,
        "config.toml",
        r#"
[locator]
file_names = ["dbd", "dbd-debug"]
sub_dirs = ["out/bin"]
max_parent_levels = 2
base_dir = "/opt/db"

[logging]
level = "debug"
"#,
    );

    let config = load_config_file(&path).unwrap();
    assert_eq!(config.locator.file_names, vec!["dbd", "dbd-debug"]);
    assert_eq!(config.locator.sub_dirs, vec![PathBuf::from("out/bin")]);
    assert_eq!(config.locator.max_parent_levels, 2);
    assert_eq!(config.locator.base_dir, Some(PathBuf::from("/opt/db")));
    assert_eq!(config.locator.primary_name(), Some("dbd"));
    assert_eq!(config.logging.level, "debug");
}

#[test]
fn test_json_config() {
    let dir = TempDir::new().unwrap();
    let path = write(
        &dir,
        "config.json",
        r#"{ "console": { "echo_commands": false }, "locator": { "max_parent_levels": 3 } }"#,
    );

    let config = init_with_config(&path).unwrap();
    assert!(!config.console.echo_commands);
    assert_eq!(config.locator.max_parent_levels, 3);
}

#[test]
fn test_invalid_values_are_rejected() {
    let dir = TempDir::new().unwrap();
    let path = write(
        &dir,
        "config.toml",
        r#"
[locator]
max_parent_levels = 0
"#,
    );

    match ConfigLoader::load_from_path(&path) {
        Err(Error::ConfigValidationFailed { field, .. }) => {
            assert_eq!(field, "locator.max_parent_levels");
        }
        other => panic!("expected validation failure, got {other:?}"),
    }
}

#[test]
fn test_wrong_types_fail_to_parse() {
    let dir = TempDir::new().unwrap();
    let path = write(&dir, "config.toml", "[console]\nauto_start = \"yes\"\n");
    assert!(matches!(
        load_config_file(&path),
        Err(Error::ConfigParseFailed { .. })
    ));
}

#[test]
fn test_saved_default_config_loads_back() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("engine-console").join("config.toml");

    let loader = ConfigLoader::with_path(&path);
    loader.save_to_path(&Config::default(), &path).unwrap();

    let loaded = ConfigLoader::load_from_path(&path).unwrap();
    assert_eq!(loaded, Config::default());
    assert!(validate_config(&loaded).is_ok());
}
