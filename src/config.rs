use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::{NameRules, DEFAULT_NAME_MAX_LEN, DEFAULT_NAME_MIN_LEN};

pub const CONFIG_FILE: &str = "categories.toml";

/// Default config template with rich comments
pub const DEFAULT_CONFIG_TEMPLATE: &str = r#"# Category service configuration

[validation]
# How store ids are checked before they are associated with a category
# "strict"  - every id must exist in the store directory
# "lenient" - ids are accepted without a directory lookup
store_validation = "strict"

# Category name length bounds, in characters
name_min_len = 2
name_max_len = 50

[logging]
# Filter directive, e.g. "info" or "shelf_categories=debug"
level = "info"
app_name = "shelf-categories"
# Directory for the rolling log file; omit to log to stderr only
# log_dir = "/var/log/shelf"
"#;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse config {path}: {message}")]
    Parse { path: PathBuf, message: String },

    #[error("Failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("Invalid config: {0}")]
    Invalid(String),
}

/// Top-level configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub validation: ValidationConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreValidation {
    /// Unknown store ids fail with `InvalidReference`
    #[default]
    Strict,
    /// Store ids are not checked against the directory
    Lenient,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationConfig {
    #[serde(default)]
    pub store_validation: StoreValidation,
    #[serde(default = "default_name_min_len")]
    pub name_min_len: usize,
    #[serde(default = "default_name_max_len")]
    pub name_max_len: usize,
}

fn default_name_min_len() -> usize {
    DEFAULT_NAME_MIN_LEN
}

fn default_name_max_len() -> usize {
    DEFAULT_NAME_MAX_LEN
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            store_validation: StoreValidation::default(),
            name_min_len: DEFAULT_NAME_MIN_LEN,
            name_max_len: DEFAULT_NAME_MAX_LEN,
        }
    }
}

impl ValidationConfig {
    pub fn lenient() -> Self {
        Self {
            store_validation: StoreValidation::Lenient,
            ..Self::default()
        }
    }

    pub fn name_rules(&self) -> NameRules {
        NameRules {
            min_len: self.name_min_len,
            max_len: self.name_max_len,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_level")]
    pub level: String,
    #[serde(default = "default_app_name")]
    pub app_name: String,
    #[serde(default)]
    pub log_dir: Option<PathBuf>,
}

fn default_level() -> String {
    "info".to_string()
}

fn default_app_name() -> String {
    "shelf-categories".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_level(),
            app_name: default_app_name(),
            log_dir: None,
        }
    }
}

impl Config {
    /// Load config from a file; a missing file yields the defaults
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Save config to a file
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, toml::to_string_pretty(self)?)?;
        Ok(())
    }

    /// Write the commented template unless a config already exists
    pub fn init(base_dir: &Path) -> Result<PathBuf, ConfigError> {
        let path = base_dir.join(CONFIG_FILE);
        fs::create_dir_all(base_dir)?;

        if !path.exists() {
            fs::write(&path, DEFAULT_CONFIG_TEMPLATE)?;
        }

        Ok(path)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let v = &self.validation;
        if v.name_min_len == 0 {
            return Err(ConfigError::Invalid("name_min_len must be at least 1".to_string()));
        }
        if v.name_min_len > v.name_max_len {
            return Err(ConfigError::Invalid(format!(
                "name_min_len ({}) exceeds name_max_len ({})",
                v.name_min_len, v.name_max_len
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load(&dir.path().join(CONFIG_FILE)).unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.validation.store_validation, StoreValidation::Strict);
        assert_eq!(config.validation.name_rules(), NameRules::default());
    }

    #[test]
    fn test_template_parses_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = Config::init(dir.path()).unwrap();
        assert_eq!(Config::load(&path).unwrap(), Config::default());
    }

    #[test]
    fn test_partial_config() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE);
        fs::write(&path, "[validation]\nstore_validation = \"lenient\"\n").unwrap();

        let config = Config::load(&path).unwrap();
        assert_eq!(config.validation.store_validation, StoreValidation::Lenient);
        assert_eq!(config.validation.name_max_len, DEFAULT_NAME_MAX_LEN);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_save_and_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join(CONFIG_FILE);
        let mut config = Config::default();
        config.validation.name_max_len = 80;
        config.logging.log_dir = Some(dir.path().join("logs"));
        config.save(&path).unwrap();

        assert_eq!(Config::load(&path).unwrap(), config);
    }

    #[test]
    fn test_invalid_bounds_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE);
        fs::write(&path, "[validation]\nname_min_len = 10\nname_max_len = 5\n").unwrap();
        assert!(matches!(Config::load(&path), Err(ConfigError::Invalid(_))));

        fs::write(&path, "[validation\n").unwrap();
        assert!(matches!(Config::load(&path), Err(ConfigError::Parse { .. })));
    }
}
