//! Integration tests for config loading and rule compilation
//!
//! These tests verify the full lifecycle through TOML files on disk, rather
//! than constructing Config structs directly.

use std::fs;
use tempfile::TempDir;

use kbctx::config::Config;
use kbctx::context::WindowContext;

/// Helper to create a temporary config directory
fn setup_temp_config() -> (TempDir, std::path::PathBuf) {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let config_dir = temp_dir.path().join("kbctx");
    fs::create_dir_all(&config_dir).expect("Failed to create config dir");
    let config_path = config_dir.join("config.toml");
    (temp_dir, config_path)
}

fn ctx(class: Option<&str>, title: Option<&str>, device: &str) -> WindowContext {
    WindowContext {
        wm_class: class.map(str::to_string),
        wm_name: title.map(str::to_string),
        device_name: device.to_string(),
        numlock_on: false,
        capslock_on: false,
    }
}

#[test]
fn test_config_write_and_load_toml() {
    let (_temp, config_path) = setup_temp_config();

    let toml_content = r#"
[settings]
log_level = "debug"

[[rules]]
dbg = "browsers"
lst = [
    { clas = "^firefox$" },
    { clas = "^chromium(-browser)?$" },
]

[[rules]]
dbg = "external terminal"
clas = "^kitty$"
not_devn = "AT Translated"

[[rules]]
name = "Spreadsheet"
numlk = true
"#;

    fs::write(&config_path, toml_content).expect("Failed to write TOML");

    let loaded = Config::load_from_path(&config_path).expect("Failed to load config");

    assert_eq!(loaded.settings.log_level, "debug");
    assert_eq!(loaded.rules.len(), 3);
    assert_eq!(loaded.rules[0].label.as_deref(), Some("browsers"));
    assert_eq!(loaded.rules[1].label.as_deref(), Some("external terminal"));
    assert_eq!(loaded.rules[2].label, None);

    // Compiled rules evaluate against real contexts
    assert!(loaded.rules[0].matches(&ctx(Some("Firefox"), None, "kbd")));
    assert!(loaded.rules[1].matches(&ctx(Some("kitty"), None, "USB Keyboard")));
    assert!(!loaded.rules[1].matches(&ctx(Some("kitty"), None, "AT Translated Set 2 keyboard")));
}

#[test]
fn test_missing_config_file_errors() {
    let (_temp, config_path) = setup_temp_config();
    let err = Config::load_from_path(&config_path).unwrap_err();
    assert!(format!("{err:#}").contains("Failed to read config"), "{err:#}");
}

#[test]
fn test_settings_are_optional() {
    let (_temp, config_path) = setup_temp_config();
    fs::write(&config_path, "[[rules]]\nclas = \"firefox\"").unwrap();

    let loaded = Config::load_from_path(&config_path).expect("Failed to load config");
    assert_eq!(loaded.settings.log_level, "info");
    assert_eq!(loaded.rules.len(), 1);
}

#[test]
fn test_invalid_regex_fails_at_load_not_evaluation() {
    let (_temp, config_path) = setup_temp_config();
    fs::write(&config_path, "[[rules]]\nclas = \"fire[fox\"").unwrap();

    let err = Config::load_from_path(&config_path).unwrap_err();
    assert!(format!("{err:#}").contains("Invalid rule 1"), "{err:#}");
}

#[test]
fn test_unknown_field_in_nested_list_is_fatal() {
    let (_temp, config_path) = setup_temp_config();
    let toml_content = r#"
[[rules]]
lst = [
    { clas = "^firefox$" },
    { klass = "typo" },
]
"#;
    fs::write(&config_path, toml_content).unwrap();

    let err = Config::load_from_path(&config_path).unwrap_err();
    assert!(format!("{err:#}").contains("klass"), "{err:#}");
}

#[test]
fn test_rule_with_only_modifier_fields_is_rejected() {
    let (_temp, config_path) = setup_temp_config();
    fs::write(&config_path, "[[rules]]\ncse = true\ndbg = \"empty\"").unwrap();

    let err = Config::load_from_path(&config_path).unwrap_err();
    assert!(format!("{err:#}").contains("Invalid rule 1"), "{err:#}");
}
