//! Configuration file support.
//!
//! Configuration is loaded from `$XDG_CONFIG_HOME/gym/config.toml`. Every
//! field has a default, so a partial (or missing) file is fine.

use crate::feedback::FallbackMessages;
use crate::{Error, FilterDimension, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Application configuration
#[derive(Clone, Debug, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub api: ApiConfig,

    #[serde(default)]
    pub home: HomeConfig,

    #[serde(default)]
    pub messages: FallbackMessages,

    #[serde(default)]
    pub data: DataConfig,
}

/// Remote API configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ApiConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,

    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl ApiConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Home screen configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct HomeConfig {
    /// Muscle group selected before the user picks one
    #[serde(default = "default_group")]
    pub default_group: String,
}

impl Default for HomeConfig {
    fn default() -> Self {
        Self {
            default_group: default_group(),
        }
    }
}

impl HomeConfig {
    pub fn default_selection(&self) -> FilterDimension {
        FilterDimension::new(self.default_group.clone())
    }
}

/// Local data configuration (session records)
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DataConfig {
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
        }
    }
}

// Default value functions
fn default_base_url() -> String {
    "http://localhost:3333".into()
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_group() -> String {
    "costas".into()
}

fn default_data_dir() -> PathBuf {
    dirs::data_local_dir()
        .or_else(|| dirs::home_dir().map(|home| home.join(".local/share")))
        .unwrap_or_else(|| PathBuf::from("."))
        .join("gym")
}

impl Config {
    /// Load configuration from the standard config path
    pub fn load() -> Result<Self> {
        let config_path = Self::default_config_path();
        if config_path.exists() {
            Self::load_from(&config_path)
        } else {
            tracing::info!(
                "No config file found at {:?}, using defaults",
                config_path
            );
            Ok(Self::default())
        }
    }

    /// Load configuration from a specific path
    pub fn load_from(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;
        config.validate()?;
        tracing::info!("Loaded config from {:?}", path);
        Ok(config)
    }

    /// Get the default config file path
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .or_else(|| dirs::home_dir().map(|home| home.join(".config")))
            .unwrap_or_else(|| PathBuf::from("."))
            .join("gym")
            .join("config.toml")
    }

    /// Save the current configuration to a specific path
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let contents = toml::to_string_pretty(self)
            .map_err(|e| Error::Config(format!("Failed to serialize config: {}", e)))?;
        std::fs::write(path, contents)?;
        tracing::info!("Saved config to {:?}", path);
        Ok(())
    }

    /// Reject values the screens cannot work with
    pub fn validate(&self) -> Result<()> {
        let url = self.api.base_url.trim();
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(Error::Config(format!(
                "api.base_url must be an http(s) URL, got {:?}",
                self.api.base_url
            )));
        }
        if self.api.timeout_secs == 0 {
            return Err(Error::Config("api.timeout_secs must be positive".into()));
        }
        if self.home.default_group.trim().is_empty() {
            return Err(Error::Config("home.default_group must not be empty".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.api.base_url, "http://localhost:3333");
        assert_eq!(config.api.timeout(), Duration::from_secs(30));
        assert_eq!(config.home.default_selection(), FilterDimension::new("costas"));
        assert_eq!(config.messages.load_exercises, "could not load items");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_roundtrip() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("gym/config.toml");

        let mut config = Config::default();
        config.home.default_group = "ombro".into();
        config.save_to(&path).unwrap();

        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded.home.default_group, "ombro");
        assert_eq!(loaded.messages, config.messages);
    }

    #[test]
    fn test_partial_config() {
        let toml_str = r#"
[home]
default_group = "pernas"

[messages]
create_account = "Não foi possível criar conta."
"#;
        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(config.home.default_group, "pernas");
        assert_eq!(config.messages.create_account, "Não foi possível criar conta.");
        assert_eq!(config.messages.load_groups, "could not load filter dimensions"); // default
        assert_eq!(config.api.timeout_secs, 30); // default
    }

    #[test]
    fn test_invalid_values_rejected() {
        let mut config = Config::default();
        config.api.base_url = "localhost:3333".into();
        assert!(matches!(config.validate(), Err(Error::Config(_))));

        let mut config = Config::default();
        config.home.default_group = "  ".into();
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.api.timeout_secs = 0;
        assert!(config.validate().is_err());
    }
}
