//! Configuration module for tagfs
//!
//! Manages application configuration including database paths and the
//! virtual filesystem settings. Configuration is stored in the user's config
//! directory; a missing file means defaults and is never created implicitly.

pub mod error;

pub use error::ConfigError;

use crate::vfs::CacheConfig;
use config::{Config, File, FileFormat};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

/// Environment variable selecting the database
pub const DATABASE_ENV: &str = "TAGFS_DB";

/// Path display format
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum PathFormat {
    /// Display absolute paths
    #[default]
    Absolute,
    /// Display relative paths (relative to current directory)
    Relative,
}

/// Application configuration structure
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq, Eq)]
pub struct TagfsConfig {
    /// Map of database names to their filesystem paths
    #[serde(default)]
    pub databases: HashMap<String, PathBuf>,

    /// The default database to use when none is specified
    #[serde(default)]
    pub default_database: Option<String>,

    /// Disable implication expansion in mounted filesystems
    #[serde(default)]
    pub explicit: bool,

    /// Default format for displaying paths (absolute or relative)
    #[serde(default)]
    pub path_format: PathFormat,

    /// Directory listing cache of mounted filesystems
    #[serde(default)]
    pub cache: CacheConfig,
}

impl TagfsConfig {
    /// Get the path to the config file
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::MissingHome` if the system config directory cannot be determined.
    pub fn config_path() -> Result<PathBuf, ConfigError> {
        let config_dir = dirs::config_dir().ok_or(ConfigError::MissingHome)?;
        Ok(config_dir.join("tagfs").join("config.toml"))
    }

    /// Load configuration from the user's config file
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the config directory is unknown or the file cannot be parsed.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&Self::config_path()?)
    }

    /// Load configuration from `path`, defaults if the file does not exist
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Load` if the file cannot be read or parsed.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let settings = Config::builder()
            .add_source(File::from(path).format(FileFormat::Toml))
            .build()?;

        Ok(settings.try_deserialize()?)
    }

    /// Save configuration to the user's config file
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the configuration cannot be serialized or written.
    pub fn save(&self) -> Result<(), ConfigError> {
        self.save_to(&Self::config_path()?)
    }

    /// Save configuration to `path`, creating its directory
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the configuration cannot be serialized or written.
    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, toml::to_string_pretty(self)?)?;
        Ok(())
    }

    /// Get a database path by name
    #[must_use]
    pub fn get_database(&self, name: &str) -> Option<&PathBuf> {
        self.databases.get(name)
    }

    /// Register a named database
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::DatabaseExists` if the name is already taken.
    pub fn add_database(&mut self, name: String, path: PathBuf) -> Result<(), ConfigError> {
        if self.databases.contains_key(&name) {
            return Err(ConfigError::DatabaseExists(name));
        }
        self.databases.insert(name, path);
        Ok(())
    }

    /// Forget a named database, clearing the default if it pointed there
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::UnknownDatabase` if the name is not configured.
    pub fn remove_database(&mut self, name: &str) -> Result<PathBuf, ConfigError> {
        let path = self
            .databases
            .remove(name)
            .ok_or_else(|| ConfigError::UnknownDatabase(name.to_string()))?;
        if self.default_database.as_deref() == Some(name) {
            self.default_database = None;
        }
        Ok(path)
    }

    /// Set the default database
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::UnknownDatabase` if the name is not configured.
    pub fn set_default_database(&mut self, name: String) -> Result<(), ConfigError> {
        if !self.databases.contains_key(&name) {
            return Err(ConfigError::UnknownDatabase(name));
        }
        self.default_database = Some(name);
        Ok(())
    }

    /// Path of the configured default database, if any
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::UnknownDatabase` if the default names no configured database.
    pub fn default_database_path(&self) -> Result<Option<&PathBuf>, ConfigError> {
        self.default_database
            .as_deref()
            .map(|name| {
                self.get_database(name)
                    .ok_or_else(|| ConfigError::UnknownDatabase(name.to_string()))
            })
            .transpose()
    }
}

/// Select the database to operate on
///
/// In order of precedence: the `--db` flag (a configured database name or a
/// path), the `TAGFS_DB` environment value, the configured default database,
/// and finally `<home>/.tagfs/db`.
///
/// # Errors
///
/// Returns `ConfigError::UnknownDatabase` if the configured default is dangling,
/// or `ConfigError::MissingHome` if the fallback is needed and there is no home.
pub fn resolve_database_path(
    flag: Option<&str>,
    env_value: Option<&str>,
    config: &TagfsConfig,
    home: Option<&Path>,
) -> Result<PathBuf, ConfigError> {
    if let Some(flag) = flag {
        return Ok(config
            .get_database(flag)
            .cloned()
            .unwrap_or_else(|| PathBuf::from(flag)));
    }

    if let Some(value) = env_value.filter(|v| !v.is_empty()) {
        return Ok(PathBuf::from(value));
    }

    if let Some(path) = config.default_database_path()? {
        return Ok(path.clone());
    }

    home.map(|home| home.join(".tagfs").join("db"))
        .ok_or(ConfigError::MissingHome)
}
