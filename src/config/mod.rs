//! Configuration module for pictag
//!
//! Resolves where the storage tiers live on disk. The result is an
//! explicit [`StorePaths`] handle that gets passed into
//! [`crate::TagManager::open`]; the library holds no global settings
//! state, so tests can point a manager at throwaway directories.

use config::{Config, ConfigError, File, FileFormat};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Persisted application configuration
#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct PictagConfig {
    /// Override for the application data directory. When unset, the
    /// platform data directory is used.
    #[serde(default)]
    pub data_dir: Option<PathBuf>,
}

impl PictagConfig {
    /// Get the path to the config file
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the system config directory cannot be determined.
    pub fn config_path() -> Result<PathBuf, ConfigError> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| ConfigError::Message("Could not determine config directory".to_string()))?;

        Ok(config_dir.join("pictag").join("config.toml"))
    }

    /// Load configuration from file, creating default if it doesn't exist
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the config file cannot be read, parsed, or created.
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = Self::config_path()?;

        if !config_path.exists() {
            let default_config = Self::default();
            default_config.save()?;
            return Ok(default_config);
        }

        let settings = Config::builder()
            .add_source(File::from(config_path).format(FileFormat::Toml))
            .build()?;

        settings.try_deserialize()
    }

    /// Save configuration to file
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the config directory cannot be created, the configuration
    /// cannot be serialized to TOML, or the file cannot be written.
    pub fn save(&self) -> Result<(), ConfigError> {
        let config_path = Self::config_path()?;

        if let Some(parent) = config_path.parent() {
            fs::create_dir_all(parent)
                .map_err(|e| ConfigError::Message(format!("Failed to create config directory: {e}")))?;
        }

        let toml_string = toml::to_string_pretty(self)
            .map_err(|e| ConfigError::Message(format!("Failed to serialize config: {e}")))?;

        fs::write(&config_path, toml_string)
            .map_err(|e| ConfigError::Message(format!("Failed to write config file: {e}")))?;

        Ok(())
    }

    /// The effective application data directory
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if no override is set and the platform data
    /// directory cannot be determined.
    pub fn data_dir(&self) -> Result<PathBuf, ConfigError> {
        match &self.data_dir {
            Some(dir) => Ok(dir.clone()),
            None => dirs::data_dir()
                .map(|d| d.join("pictag"))
                .ok_or_else(|| ConfigError::Message("Could not determine data directory".to_string())),
        }
    }
}

/// Filesystem locations of the storage tiers
///
/// Constructed once by the embedding application (or a test) and handed
/// to [`crate::TagManager::open`]; lifecycle belongs to the constructor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorePaths {
    /// Directory holding the sled primary index
    pub index_dir: PathBuf,
    /// Backing file of the JSON backup store
    pub backup_file: PathBuf,
}

impl StorePaths {
    /// Standard layout inside an application data directory
    #[must_use]
    pub fn in_dir(data_dir: &Path) -> Self {
        Self {
            index_dir: data_dir.join("index"),
            backup_file: data_dir.join("backup.json"),
        }
    }

    /// Resolve store locations from the persisted configuration
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the configuration cannot be loaded or no
    /// data directory can be determined.
    pub fn resolve() -> Result<Self, ConfigError> {
        let config = PictagConfig::load()?;
        Ok(Self::in_dir(&config.data_dir()?))
    }
}
