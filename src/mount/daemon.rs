//! Spawning the VFS daemon as a background process

use std::env;
use std::io::{self, Read};
use std::os::unix::process::CommandExt;
use std::path::{Path, PathBuf};
use std::process::{Child, Command, ExitStatus, Stdio};
use tracing::debug;

/// A spawned daemon process, as far as the readiness probe cares
pub trait Daemon {
    fn id(&self) -> u32;

    /// Exit status if the process has already exited, without blocking
    ///
    /// # Errors
    ///
    /// Returns the OS error if the process state cannot be queried.
    fn try_wait(&mut self) -> io::Result<Option<ExitStatus>>;

    /// Everything the process wrote to its stderr
    ///
    /// Only called once the process has exited.
    ///
    /// # Errors
    ///
    /// Returns the OS error if the pipe cannot be read.
    fn stderr_output(&mut self) -> io::Result<String>;
}

/// Starts VFS daemons for (database, mountpoint) pairs
pub trait DaemonSpawner {
    type Daemon: Daemon;

    /// # Errors
    ///
    /// Returns the OS error if the process cannot be started.
    fn spawn(&self, database: &Path, mountpoint: &Path) -> io::Result<Self::Daemon>;
}

/// Spawns `<program> vfs <database> <mountpoint>` in its own process group
#[derive(Debug, Clone)]
pub struct ProcessSpawner {
    program: PathBuf,
}

impl ProcessSpawner {
    #[must_use]
    pub const fn new(program: PathBuf) -> Self {
        Self { program }
    }

    /// Spawner re-executing the running binary
    ///
    /// # Errors
    ///
    /// Returns the OS error if the current executable cannot be located.
    pub fn current() -> io::Result<Self> {
        Ok(Self::new(env::current_exe()?))
    }

    #[must_use]
    pub fn program(&self) -> &Path {
        &self.program
    }
}

impl DaemonSpawner for ProcessSpawner {
    type Daemon = Child;

    fn spawn(&self, database: &Path, mountpoint: &Path) -> io::Result<Child> {
        debug!(program = %self.program.display(), "spawning VFS daemon");
        Command::new(&self.program)
            .arg("vfs")
            .arg(database)
            .arg(mountpoint)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .process_group(0)
            .spawn()
    }
}

impl Daemon for Child {
    fn id(&self) -> u32 {
        Self::id(self)
    }

    fn try_wait(&mut self) -> io::Result<Option<ExitStatus>> {
        Self::try_wait(self)
    }

    fn stderr_output(&mut self) -> io::Result<String> {
        let mut output = String::new();
        if let Some(mut stderr) = self.stderr.take() {
            stderr.read_to_string(&mut output)?;
        }
        Ok(output)
    }
}
