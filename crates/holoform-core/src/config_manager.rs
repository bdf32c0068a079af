use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info, warn};

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Config file not found: {0}")]
    NotFound(String),

    #[error("Failed to read config: {0}")]
    ReadError(String),

    #[error("Failed to parse config: {0}")]
    ParseError(String),

    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

/// Main configuration for the Holoform tools
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct HoloformConfig {
    /// Project pass settings (cache location, file selection)
    #[serde(default)]
    pub project: ProjectSettings,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Settings for a project-level pass
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProjectSettings {
    /// Content-hash cache file, relative to the project root
    #[serde(default = "default_cache_file")]
    pub cache_file: String,

    /// Per-file Holoform store, relative to the project root
    #[serde(default = "default_records_file")]
    pub records_file: String,

    /// Source file extensions to parse (without the dot)
    #[serde(default = "default_extensions")]
    pub extensions: Vec<String>,

    /// Exclude patterns (gitignore format)
    #[serde(default = "default_exclude_patterns")]
    pub exclude_patterns: Vec<String>,
}

impl Default for ProjectSettings {
    fn default() -> Self {
        Self {
            cache_file: default_cache_file(),
            records_file: default_records_file(),
            extensions: default_extensions(),
            exclude_patterns: default_exclude_patterns(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LoggingConfig {
    /// Log level: "trace", "debug", "info", "warn", "error"
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log format: "pretty", "json", "compact"
    #[serde(default = "default_log_format")]
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

fn default_cache_file() -> String {
    ".holoform_cache.json".to_string()
}
fn default_records_file() -> String {
    ".holoform_records.json".to_string()
}
fn default_extensions() -> Vec<String> {
    vec!["py".to_string()]
}
fn default_exclude_patterns() -> Vec<String> {
    vec![
        "**/.git/**".to_string(),
        "**/__pycache__/**".to_string(),
        "**/.venv/**".to_string(),
        "**/venv/**".to_string(),
        "**/build/**".to_string(),
        "**/dist/**".to_string(),
        "**/node_modules/**".to_string(),
    ]
}
fn default_log_level() -> String {
    "warn".to_string()
}
fn default_log_format() -> String {
    "pretty".to_string()
}

/// Configuration manager with smart defaults
pub struct ConfigManager {
    config: HoloformConfig,
    config_path: Option<PathBuf>,
}

impl ConfigManager {
    /// Load configuration with the following precedence:
    /// 1. Environment variables (.env file)
    /// 2. Config file (.holoform.toml)
    /// 3. Sensible defaults
    pub fn load() -> Result<Self, ConfigError> {
        debug!("Loading Holoform configuration");

        Self::load_dotenv();

        let (config, config_path) = Self::load_config_file()?;
        let config = Self::apply_env_overrides(config);
        Self::validate_config(&config)?;

        match config_path {
            Some(ref path) => info!("Config file: {}", path.display()),
            None => debug!("No config file found, using defaults"),
        }

        Ok(Self {
            config,
            config_path,
        })
    }

    /// Load a specific config file, still honouring environment overrides.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::NotFound(path.display().to_string()));
        }
        let config = Self::apply_env_overrides(Self::read_toml_file(path)?);
        Self::validate_config(&config)?;
        Ok(Self {
            config,
            config_path: Some(path.to_path_buf()),
        })
    }

    fn load_dotenv() {
        if Path::new(".env").exists() {
            if let Err(e) = dotenv::from_filename(".env") {
                warn!("Failed to load .env file: {}", e);
            }
        }
    }

    /// Search order:
    /// 1. ./.holoform.toml
    /// 2. ~/.holoform/config.toml
    fn load_config_file() -> Result<(HoloformConfig, Option<PathBuf>), ConfigError> {
        let local_config = Path::new(".holoform.toml");
        if local_config.exists() {
            let config = Self::read_toml_file(local_config)?;
            return Ok((config, Some(local_config.to_path_buf())));
        }

        if let Some(home) = dirs::home_dir() {
            let user_config = home.join(".holoform").join("config.toml");
            if user_config.exists() {
                let config = Self::read_toml_file(&user_config)?;
                return Ok((config, Some(user_config)));
            }
        }

        Ok((HoloformConfig::default(), None))
    }

    fn read_toml_file(path: &Path) -> Result<HoloformConfig, ConfigError> {
        let content =
            std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError(e.to_string()))?;

        toml::from_str(&content).map_err(|e| ConfigError::ParseError(e.to_string()))
    }

    fn apply_env_overrides(mut config: HoloformConfig) -> HoloformConfig {
        if let Ok(file) = std::env::var("HOLOFORM_CACHE_FILE") {
            config.project.cache_file = file;
        }
        if let Ok(file) = std::env::var("HOLOFORM_RECORDS_FILE") {
            config.project.records_file = file;
        }
        if let Ok(extensions) = std::env::var("HOLOFORM_EXTENSIONS") {
            config.project.extensions = extensions
                .split(',')
                .map(|e| e.trim().trim_start_matches('.').to_string())
                .filter(|e| !e.is_empty())
                .collect();
        }

        // RUST_LOG wins over the tool-specific variable
        if let Ok(level) = std::env::var("HOLOFORM_LOG_LEVEL") {
            config.logging.level = level;
        }
        if let Ok(level) = std::env::var("RUST_LOG") {
            config.logging.level = level;
        }
        if let Ok(format) = std::env::var("HOLOFORM_LOG_FORMAT") {
            config.logging.format = format;
        }

        config
    }

    /// Validate configuration
    pub fn validate_config(config: &HoloformConfig) -> Result<(), ConfigError> {
        match config.logging.level.as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => {}
            // Full filter directives such as "holoform_graph=debug" are passed through
            other if other.contains('=') => {}
            other => {
                return Err(ConfigError::ValidationError(format!(
                    "Invalid log level: {}. Must be one of: trace, debug, info, warn, error",
                    other
                )))
            }
        }

        match config.logging.format.as_str() {
            "pretty" | "json" | "compact" => {}
            other => {
                return Err(ConfigError::ValidationError(format!(
                    "Invalid log format: {}. Must be one of: pretty, json, compact",
                    other
                )))
            }
        }

        if config.project.extensions.is_empty() {
            return Err(ConfigError::ValidationError(
                "At least one source file extension is required".to_string(),
            ));
        }

        Ok(())
    }

    /// Get the loaded configuration
    pub fn config(&self) -> &HoloformConfig {
        &self.config
    }

    /// Get the path to the config file that was loaded, if any
    pub fn config_path(&self) -> Option<&Path> {
        self.config_path.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = HoloformConfig::default();
        assert!(ConfigManager::validate_config(&config).is_ok());
        assert_eq!(config.project.cache_file, ".holoform_cache.json");
        assert_eq!(config.project.extensions, vec!["py".to_string()]);
    }

    #[test]
    fn partial_toml_falls_back_to_defaults() {
        let config: HoloformConfig = toml::from_str(
            r#"
[project]
extensions = ["py", "pyi"]
"#,
        )
        .unwrap();
        assert_eq!(config.project.extensions.len(), 2);
        assert_eq!(config.project.records_file, ".holoform_records.json");
        assert_eq!(config.logging.level, "warn");
    }

    #[test]
    fn rejects_unknown_log_format() {
        let mut config = HoloformConfig::default();
        config.logging.format = "xml".to_string();
        assert!(matches!(
            ConfigManager::validate_config(&config),
            Err(ConfigError::ValidationError(_))
        ));
    }

    #[test]
    fn rejects_empty_extension_list() {
        let mut config = HoloformConfig::default();
        config.project.extensions.clear();
        assert!(ConfigManager::validate_config(&config).is_err());
    }
}
