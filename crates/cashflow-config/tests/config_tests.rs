use std::fs;

use cashflow_config::{Config, ConfigError, ConfigManager, RecurrenceSettings};
use tempfile::tempdir;

#[test]
fn default_config_uses_standard_horizon() {
    let cfg = Config::default();

    assert_eq!(cfg.recurrence.initial_months, 12);
    assert_eq!(cfg.recurrence.threshold_months, 6);
    assert_eq!(cfg.recurrence.extension_months, 12);
    assert!(cfg.resolve_data_root().ends_with("CashFlow"));
}

#[test]
fn missing_file_loads_defaults() {
    let dir = tempdir().expect("tempdir");
    let manager = ConfigManager::new(dir.path().join("config.json"));

    assert_eq!(manager.load().expect("load config"), Config::default());
}

#[test]
fn config_manager_persists_and_loads_config() {
    let dir = tempdir().expect("tempdir");
    let manager = ConfigManager::with_base_dir(dir.path().to_path_buf()).expect("manager");

    let cfg = Config {
        data_root: Some(dir.path().join("data")),
        default_owner: Some("studio".into()),
        recurrence: RecurrenceSettings {
            initial_months: 24,
            threshold_months: 3,
            extension_months: 6,
        },
    };

    manager.save(&cfg).expect("save config");
    let loaded = manager.load().expect("load config");

    assert_eq!(loaded, cfg);
    assert!(!manager.config_path().with_extension("json.tmp").exists());
}

#[test]
fn partial_documents_fill_in_defaults() {
    let dir = tempdir().expect("tempdir");
    let path = dir.path().join("config.json");
    fs::write(&path, r#"{"recurrence": {"threshold_months": 2}}"#).expect("write");

    let loaded = ConfigManager::new(path).load().expect("load config");
    assert_eq!(loaded.recurrence.threshold_months, 2);
    assert_eq!(loaded.recurrence.extension_months, 12);
    assert_eq!(loaded.default_owner, None);
}

#[test]
fn invalid_horizon_is_rejected() {
    let dir = tempdir().expect("tempdir");
    let manager = ConfigManager::new(dir.path().join("config.json"));
    let mut cfg = Config::default();
    cfg.recurrence.threshold_months = 18;

    assert!(matches!(manager.save(&cfg), Err(ConfigError::Invalid(_))));
}
