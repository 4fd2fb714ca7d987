//! tagfs - Tag files and browse tag queries as directories
//!
//! Files are tagged in a SQLite tag store independent of where they live.
//! Queries such as `photo and not draft` or `rating >= 4` select files, and
//! the virtual filesystem presents every query as a directory:
//! `/photo/and/not/draft` lists the matching files next to the tags and
//! operators that can narrow the query further.

use thiserror::Error;

pub mod cli;
pub mod commands;
pub mod config;
pub mod db;
pub mod mount;
pub mod output;
pub mod query;
pub mod vfs;

#[cfg(test)]
pub mod testing;

/// Error enum, contains all failure states of the program
#[derive(Debug, Error)]
pub enum TagfsError {
    /// Tag store error
    #[error("Database error: {0}")]
    Db(#[from] db::DbError),
    /// Query could not be parsed
    #[error("Invalid query: {0}")]
    Parse(#[from] query::ParseError),
    /// Query could not be evaluated
    #[error("{0}")]
    Eval(#[from] query::EvalError),
    /// Virtual filesystem error
    #[error("{0}")]
    Vfs(#[from] vfs::VfsError),
    /// Mount lifecycle error
    #[error("{0}")]
    Mount(#[from] mount::MountError),
    /// Represents a configuration error
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),
    /// Represents an I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// Invalid input error
    #[error("{0}")]
    InvalidInput(String),
}
