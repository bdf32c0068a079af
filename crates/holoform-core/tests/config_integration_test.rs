use holoform_core::{ConfigError, ConfigManager};
use std::fs;
use tempfile::TempDir;

#[test]
fn test_load_config_from_file() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("holoform.toml");
    fs::write(
        &path,
        r#"
[project]
cache_file = "cache/hashes.json"
exclude_patterns = ["**/generated/**"]

[logging]
format = "compact"
"#,
    )
    .unwrap();

    let manager = ConfigManager::from_file(&path).unwrap();
    let config = manager.config();
    assert_eq!(config.project.cache_file, "cache/hashes.json");
    assert_eq!(config.project.exclude_patterns, vec!["**/generated/**"]);
    assert_eq!(config.logging.format, "compact");
    assert_eq!(manager.config_path(), Some(path.as_path()));
}

#[test]
fn test_missing_config_file_is_reported() {
    let tmp = TempDir::new().unwrap();
    let result = ConfigManager::from_file(&tmp.path().join("absent.toml"));
    assert!(matches!(result, Err(ConfigError::NotFound(_))));
}

#[test]
fn test_malformed_config_is_a_parse_error() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("holoform.toml");
    fs::write(&path, "[project\ncache_file = 1").unwrap();

    let result = ConfigManager::from_file(&path);
    assert!(matches!(result, Err(ConfigError::ParseError(_))));
}
