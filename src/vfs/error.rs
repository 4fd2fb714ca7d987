//! Errors raised while serving the virtual tree
//!
//! Every variant maps to an errno through [`VfsError::errno`]; none of them
//! stops the serving process.

use crate::db::DbError;
use crate::query::EvalError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum VfsError {
    /// Path does not resolve to any node
    #[error("No such entry: {0}")]
    NotFound(String),

    /// Mutating operation on the read-only tree
    #[error("Operation not supported: {0}")]
    OperationNotSupported(&'static str),

    /// `readlink` on an entry that is not a symbolic link
    #[error("Not a symbolic link: {0}")]
    NotALink(String),

    #[error("Is a directory: {0}")]
    IsDirectory(String),

    #[error("Not a directory: {0}")]
    NotADirectory(String),

    #[error("Query evaluation failed: {0}")]
    Eval(#[from] EvalError),

    #[error("Tag store error: {0}")]
    Store(#[from] DbError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl VfsError {
    /// Error number reported to the kernel
    #[must_use]
    pub fn errno(&self) -> libc::c_int {
        match self {
            Self::NotFound(_) => libc::ENOENT,
            Self::OperationNotSupported(_) => libc::ENOTSUP,
            Self::NotALink(_) => libc::EINVAL,
            Self::IsDirectory(_) => libc::EISDIR,
            Self::NotADirectory(_) => libc::ENOTDIR,
            Self::Eval(_) | Self::Store(_) => libc::EIO,
            Self::Io(e) => e.raw_os_error().unwrap_or(libc::EIO),
        }
    }
}

#[cfg(test)]
#[path = "error_tests.rs"]
mod error_tests;
