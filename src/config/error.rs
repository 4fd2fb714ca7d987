//! Configuration errors

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    /// Neither a config directory nor a home directory could be determined
    #[error("Could not determine home directory")]
    MissingHome,

    #[error("Failed to load config: {0}")]
    Load(#[from] config::ConfigError),

    #[error("Config I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("Database '{0}' does not exist in configuration")]
    UnknownDatabase(String),

    #[error("Database '{0}' already exists")]
    DatabaseExists(String),
}

#[cfg(test)]
#[path = "error_tests.rs"]
mod error_tests;
