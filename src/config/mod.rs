use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Application configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub api_key: Option<String>,
    pub default_voice: String,
    pub default_style: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            default_voice: "Kore".to_string(),
            default_style: "default".to_string(),
        }
    }
}

/// Configuration manager for loading and saving settings
pub struct ConfigManager {
    config: AppConfig,
    config_path: PathBuf,
}

impl ConfigManager {
    pub fn new() -> Result<Self, ConfigError> {
        let config_path = Self::get_config_path()?;
        let config = Self::load_config(&config_path).unwrap_or_default();

        Ok(Self {
            config,
            config_path,
        })
    }

    pub fn get_config(&self) -> &AppConfig {
        &self.config
    }

    /// Resolve the API key: config file first, then the environment
    pub fn api_key(&self) -> Option<String> {
        self.config
            .api_key
            .clone()
            .filter(|k| !k.trim().is_empty())
            .or_else(|| std::env::var("GEMINI_API_KEY").ok())
            .filter(|k| !k.trim().is_empty())
    }

    pub fn set_api_key(&mut self, key: String) -> Result<(), ConfigError> {
        self.config.api_key = Some(key);
        self.save_config()
    }

    pub fn set_default_voice(&mut self, voice_id: String) -> Result<(), ConfigError> {
        self.config.default_voice = voice_id;
        self.save_config()
    }

    pub fn set_default_style(&mut self, style_id: String) -> Result<(), ConfigError> {
        self.config.default_style = style_id;
        self.save_config()
    }

    pub fn reset_to_defaults(&mut self) -> Result<(), ConfigError> {
        self.config = AppConfig::default();
        self.save_config()
    }

    fn get_config_path() -> Result<PathBuf, ConfigError> {
        let config_dir = dirs::home_dir()
            .ok_or(ConfigError::ConfigDirNotFound)?
            .join(".config")
            .join("tvoice");

        std::fs::create_dir_all(&config_dir).map_err(ConfigError::IoError)?;

        Ok(config_dir.join("config.toml"))
    }

    fn load_config(path: &Path) -> Result<AppConfig, ConfigError> {
        if !path.exists() {
            return Ok(AppConfig::default());
        }

        let config_content = std::fs::read_to_string(path).map_err(ConfigError::IoError)?;

        let config: AppConfig =
            toml::from_str(&config_content).map_err(ConfigError::DeserializationError)?;

        Ok(config)
    }

    fn save_config(&self) -> Result<(), ConfigError> {
        // Ensure the parent directory exists
        if let Some(parent) = self.config_path.parent() {
            std::fs::create_dir_all(parent).map_err(ConfigError::IoError)?;
        }

        let config_content =
            toml::to_string_pretty(&self.config).map_err(ConfigError::SerializationError)?;

        std::fs::write(&self.config_path, config_content).map_err(ConfigError::IoError)?;

        Ok(())
    }
}
