//! Errors of the mount daemon lifecycle

use thiserror::Error;

#[derive(Debug, Error)]
pub enum MountError {
    #[error("mount point not found: {0}")]
    MountPointNotFound(String),

    #[error("mount point is not a directory: {0}")]
    MountPointNotDirectory(String),

    #[error("database not found: {0}")]
    DatabaseNotFound(String),

    #[error("failed to spawn VFS daemon: {0}")]
    SpawnFailed(String),

    /// The daemon exited non-zero during the grace interval; carries its stderr
    #[error("could not mount VFS: {0}")]
    MountFailed(String),

    #[error("could not probe VFS daemon: {0}")]
    Probe(#[source] std::io::Error),

    #[error("could not read mount table: {0}")]
    MountTable(#[source] std::io::Error),

    #[error("failed to unmount: {0}")]
    UnmountFailed(String),
}

#[cfg(test)]
#[path = "error_tests.rs"]
mod error_tests;
