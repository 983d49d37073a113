//! Layered settings loading

use std::fs;

use tempfile::TempDir;

use rulesdesk::config::{local_config_path, Settings, DEFAULT_API_URL};

// Env overrides are process-wide; these tests only touch files.

#[test]
fn given_no_local_file_when_loading_then_defaults_apply() {
    let temp = TempDir::new().unwrap();

    let settings = Settings::load(Some(temp.path())).unwrap();

    if std::env::var("RULESDESK_API_URL").is_err() {
        assert_eq!(settings.api_url, DEFAULT_API_URL);
    }
}

#[test]
fn given_local_file_when_loading_then_values_override_defaults() {
    let temp = TempDir::new().unwrap();
    fs::write(
        local_config_path(temp.path()),
        "api_url = \"http://rules.internal:9000/\"\nengine = \"main\"\npretty = false\n",
    )
    .unwrap();

    let settings = Settings::load(Some(temp.path())).unwrap();

    if std::env::var("RULESDESK_API_URL").is_err() {
        assert_eq!(settings.api_url, "http://rules.internal:9000");
    }
    if std::env::var("RULESDESK_ENGINE").is_err() {
        assert_eq!(settings.engine.as_deref(), Some("main"));
    }
    assert!(!settings.pretty || std::env::var("RULESDESK_PRETTY").is_ok());
}

#[test]
fn given_malformed_local_file_when_loading_then_config_error() {
    let temp = TempDir::new().unwrap();
    fs::write(local_config_path(temp.path()), "api_url = [").unwrap();

    let result = Settings::load(Some(temp.path()));

    assert!(result.is_err());
    assert!(result.unwrap_err().to_string().contains("config error"));
}

#[test]
fn given_settings_when_rendering_toml_then_reloadable() {
    let temp = TempDir::new().unwrap();
    let settings = Settings {
        api_url: "http://localhost:1".into(),
        engine: Some("main".into()),
        pretty: true,
    };
    fs::write(local_config_path(temp.path()), settings.to_toml().unwrap()).unwrap();

    let loaded = Settings::load(Some(temp.path())).unwrap();

    if std::env::var("RULESDESK_API_URL").is_err() && std::env::var("RULESDESK_ENGINE").is_err()
    {
        assert_eq!(loaded.api_url, settings.api_url);
        assert_eq!(loaded.engine, settings.engine);
    }
}
