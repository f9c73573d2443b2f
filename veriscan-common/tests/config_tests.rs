//! Configuration resolution tests
//!
//! Note: Uses serial_test to prevent ENV variable race conditions between
//! tests that manipulate VERISCAN_* variables.

use serial_test::serial;
use std::env;
use std::path::PathBuf;
use veriscan_common::config::{Config, DeploymentMode, Overrides, TomlConfig};

fn clear_env() {
    env::remove_var("VERISCAN_BIND");
    env::remove_var("VERISCAN_DB");
    env::remove_var("VERISCAN_UPLOADS");
    env::remove_var("VERISCAN_WORKFLOW_URL");
    env::remove_var("VERISCAN_MODE");
    env::remove_var("VERISCAN_TOKEN_TTL_DAYS");
}

#[test]
fn test_defaults_when_nothing_is_set() {
    let config = Config::from_overrides(Overrides::default());

    assert_eq!(config.bind_addr, "127.0.0.1:5800");
    assert_eq!(config.workflow_base_url, "http://localhost:5678/webhook");
    assert_eq!(config.mode, DeploymentMode::Development);
    assert_eq!(config.token_ttl_days, 7);
    assert!(config
        .database_path
        .to_string_lossy()
        .ends_with("veriscan.db"));
}

#[test]
fn test_cli_overrides_win_over_lower_tiers() {
    let cli = Overrides {
        workflow_base_url: Some("http://cli:1234/hooks".to_string()),
        ..Default::default()
    };
    let lower = Overrides {
        workflow_base_url: Some("http://file:5678/hooks".to_string()),
        bind_addr: Some("0.0.0.0:9000".to_string()),
        ..Default::default()
    };

    let config = Config::from_overrides(cli.or(lower));
    assert_eq!(config.workflow_base_url, "http://cli:1234/hooks");
    assert_eq!(config.bind_addr, "0.0.0.0:9000");
}

#[test]
#[serial]
fn test_env_overrides_are_collected() {
    clear_env();
    env::set_var("VERISCAN_MODE", "production");
    env::set_var("VERISCAN_DB", "/tmp/veriscan-test.db");
    env::set_var("VERISCAN_TOKEN_TTL_DAYS", "30");

    let overrides = Overrides::from_env().expect("env overrides should parse");
    assert_eq!(overrides.mode, Some(DeploymentMode::Production));
    assert_eq!(
        overrides.database_path,
        Some(PathBuf::from("/tmp/veriscan-test.db"))
    );
    assert_eq!(overrides.token_ttl_days, Some(30));

    clear_env();
}

#[test]
#[serial]
fn test_invalid_mode_is_a_config_error() {
    clear_env();
    env::set_var("VERISCAN_MODE", "staging");

    let result = Overrides::from_env();
    assert!(result.is_err());

    clear_env();
}

#[test]
#[serial]
fn test_invalid_ttl_is_a_config_error() {
    clear_env();
    env::set_var("VERISCAN_TOKEN_TTL_DAYS", "soon");

    let result = Overrides::from_env();
    assert!(result.is_err());

    clear_env();
}

#[test]
fn test_toml_schema_accepts_partial_files() {
    let parsed: TomlConfig = toml::from_str(
        r#"
        workflow_base_url = "http://engine.internal/webhook"
        mode = "production"
        "#,
    )
    .expect("partial TOML should parse");

    assert_eq!(
        parsed.workflow_base_url.as_deref(),
        Some("http://engine.internal/webhook")
    );
    assert_eq!(parsed.mode.as_deref(), Some("production"));
    assert!(parsed.bind_addr.is_none());
}

#[test]
#[serial]
fn test_missing_config_file_falls_through_to_defaults() {
    clear_env();
    let missing = PathBuf::from("/nonexistent/veriscan.toml");
    let config = Config::resolve(Overrides::default(), Some(&missing))
        .expect("missing config file should not be fatal");
    assert_eq!(config.bind_addr, "127.0.0.1:5800");
}

#[test]
#[serial]
fn test_config_file_values_are_applied() {
    clear_env();
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("veriscan.toml");
    std::fs::write(
        &path,
        r#"
        bind_addr = "127.0.0.1:7000"
        workflow_base_url = "http://engine.internal/webhook"
        mode = "production"
        "#,
    )
    .expect("write config");

    let config = Config::resolve(Overrides::default(), Some(&path)).expect("resolve");
    assert_eq!(config.bind_addr, "127.0.0.1:7000");
    assert_eq!(config.workflow_base_url, "http://engine.internal/webhook");
    assert_eq!(config.mode, DeploymentMode::Production);
    // Unset values still default
    assert_eq!(config.token_ttl_days, 7);
}

#[test]
fn test_mode_parsing_accepts_short_forms() {
    assert_eq!(
        "prod".parse::<DeploymentMode>().unwrap(),
        DeploymentMode::Production
    );
    assert_eq!(
        "dev".parse::<DeploymentMode>().unwrap(),
        DeploymentMode::Development
    );
    assert!("qa".parse::<DeploymentMode>().is_err());
}
