//! Database-specific error types
//!
//! This module defines all error types that can occur during tag store operations.
//!
//! # Error Types
//!
//! - **`Sqlite`**: Errors from the underlying SQLite connection
//! - **`NotFound`**: The database file does not exist (read-only open)
//! - **`FileNotFound`**: A file to be tagged does not exist on disk
//! - **`InvalidName`**: A tag or value name that cannot appear in the virtual tree
//! - **`UnknownTag`** / **`UnknownValue`**: Lookups by name that found nothing
//!
//! All errors implement `std::error::Error` via the `thiserror` crate.

use thiserror::Error;

/// Database-specific errors
#[derive(Debug, Error)]
pub enum DbError {
    /// Represents a SQLite error
    #[error("Database error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// I/O error while inspecting a file or creating the database directory
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Database file does not exist
    #[error("Database not found: {0}")]
    NotFound(String),

    /// File does not exist on the filesystem
    #[error("File not found: {0}")]
    FileNotFound(String),

    /// Tag or value name is not usable
    #[error("Invalid name '{0}': {1}")]
    InvalidName(String, &'static str),

    /// No tag with this name
    #[error("No such tag: {0}")]
    UnknownTag(String),

    /// No value with this name
    #[error("No such value: {0}")]
    UnknownValue(String),
}

#[cfg(test)]
#[path = "error_tests.rs"]
mod error_tests;
