//! Mount daemon lifecycle
//!
//! Every mounted database is served by its own background process, started as
//! `tagfs vfs <database> <mountpoint>`. Mounting validates the paths, spawns
//! the daemon and probes it once after a grace interval: a daemon that has
//! already exited non-zero by then failed to mount, and its stderr is
//! reported. Failures after the probe only show up as stale mount entries.
//!
//! Listing and unmounting go through the OS mount table, so they work for
//! mounts made by any process.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::thread;
use std::time::Duration;
use tracing::{debug, info, warn};

pub mod daemon;
pub mod error;
pub mod table;

pub use daemon::{Daemon, DaemonSpawner, ProcessSpawner};
pub use error::MountError;
pub use table::{MountTable, SystemMountTable, parse_mount_table};

/// Time a freshly spawned daemon gets to fail before it is considered mounted
pub const PROBE_GRACE_INTERVAL: Duration = Duration::from_millis(500);

/// Lifecycle of one mount request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MountState {
    Idle,
    Spawning,
    Probing,
    Mounted,
    Unmounting,
    Stopped,
    Failed,
}

impl fmt::Display for MountState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Idle => "idle",
            Self::Spawning => "spawning",
            Self::Probing => "probing",
            Self::Mounted => "mounted",
            Self::Unmounting => "unmounting",
            Self::Stopped => "stopped",
            Self::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// A mounted database as recorded in the OS mount table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MountEntry {
    pub database_path: PathBuf,
    pub mount_path: PathBuf,
}

impl fmt::Display for MountEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "'{}' at '{}'", self.database_path.display(), self.mount_path.display())
    }
}

/// Spawns, probes and tears down VFS daemons
pub struct MountController<S: DaemonSpawner, T: MountTable> {
    spawner: S,
    table: T,
    grace: Duration,
    state: MountState,
}

impl MountController<ProcessSpawner, SystemMountTable> {
    /// Controller re-executing the running binary against the system mount table
    ///
    /// # Errors
    ///
    /// Returns `MountError::SpawnFailed` if the current executable cannot be located.
    pub fn system() -> Result<Self, MountError> {
        let spawner = ProcessSpawner::current().map_err(|e| MountError::SpawnFailed(e.to_string()))?;
        Ok(Self::new(spawner, SystemMountTable))
    }
}

impl<S: DaemonSpawner, T: MountTable> MountController<S, T> {
    #[must_use]
    pub const fn new(spawner: S, table: T) -> Self {
        Self {
            spawner,
            table,
            grace: PROBE_GRACE_INTERVAL,
            state: MountState::Idle,
        }
    }

    #[must_use]
    pub const fn with_grace(mut self, grace: Duration) -> Self {
        self.grace = grace;
        self
    }

    #[must_use]
    pub const fn state(&self) -> MountState {
        self.state
    }

    #[must_use]
    pub const fn spawner(&self) -> &S {
        &self.spawner
    }

    fn transition(&mut self, state: MountState) {
        debug!(from = %self.state, to = %state, "mount state change");
        self.state = state;
    }

    /// Mount `database` at `mountpoint` through a background daemon
    ///
    /// Both paths are validated before anything is spawned.
    ///
    /// # Errors
    ///
    /// - `MountPointNotFound` / `MountPointNotDirectory` for a bad mountpoint
    /// - `DatabaseNotFound` if the database file does not exist
    /// - `SpawnFailed` if the daemon cannot be started
    /// - `MountFailed` with the daemon's stderr if it exits non-zero during the grace interval
    pub fn mount(&mut self, database: &Path, mountpoint: &Path) -> Result<MountEntry, MountError> {
        let mount_path = fs::canonicalize(mountpoint)
            .map_err(|_| MountError::MountPointNotFound(mountpoint.display().to_string()))?;
        if !mount_path.is_dir() {
            return Err(MountError::MountPointNotDirectory(mountpoint.display().to_string()));
        }
        let database_path = fs::canonicalize(database)
            .map_err(|_| MountError::DatabaseNotFound(database.display().to_string()))?;

        self.transition(MountState::Spawning);
        info!(
            database = %database_path.display(),
            mountpoint = %mount_path.display(),
            "spawning daemon to mount virtual filesystem"
        );
        let mut daemon = match self.spawner.spawn(&database_path, &mount_path) {
            Ok(daemon) => daemon,
            Err(e) => {
                self.transition(MountState::Failed);
                return Err(MountError::SpawnFailed(e.to_string()));
            }
        };

        self.transition(MountState::Probing);
        thread::sleep(self.grace);
        match self.probe(&mut daemon) {
            Ok(()) => {
                self.transition(MountState::Mounted);
                info!(pid = daemon.id(), "virtual filesystem mounted");
                Ok(MountEntry { database_path, mount_path })
            }
            Err(e) => {
                self.transition(MountState::Failed);
                Err(e)
            }
        }
    }

    fn probe(&self, daemon: &mut S::Daemon) -> Result<(), MountError> {
        match daemon.try_wait().map_err(MountError::Probe)? {
            None => Ok(()),
            Some(status) if status.success() => {
                warn!(pid = daemon.id(), "daemon exited cleanly during the grace interval");
                Ok(())
            }
            Some(status) => {
                debug!(%status, "daemon exited during the grace interval");
                let stderr = daemon.stderr_output().map_err(MountError::Probe)?;
                Err(MountError::MountFailed(stderr))
            }
        }
    }

    /// Mounted virtual filesystems
    ///
    /// # Errors
    ///
    /// Returns `MountError::MountTable` if the mount table cannot be read.
    pub fn list_mounts(&self) -> Result<Vec<MountEntry>, MountError> {
        self.table.entries()
    }

    /// Unmount the virtual filesystem at `mountpoint`
    ///
    /// The daemon exits by itself once its session ends.
    ///
    /// # Errors
    ///
    /// Returns `MountError::UnmountFailed` with the OS message.
    pub fn unmount(&mut self, mountpoint: &Path) -> Result<(), MountError> {
        self.transition(MountState::Unmounting);
        info!(mountpoint = %mountpoint.display(), "unmounting virtual filesystem");
        match self.table.unmount(mountpoint) {
            Ok(()) => {
                self.transition(MountState::Stopped);
                Ok(())
            }
            Err(e) => {
                self.transition(MountState::Failed);
                Err(e)
            }
        }
    }

    /// Unmount every listed virtual filesystem, returning the entries unmounted
    ///
    /// # Errors
    ///
    /// Stops at the first failure.
    pub fn unmount_all(&mut self) -> Result<Vec<MountEntry>, MountError> {
        let entries = self.list_mounts()?;
        for entry in &entries {
            self.unmount(&entry.mount_path)?;
        }
        Ok(entries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::TestFiles;
    use std::cell::{Cell, RefCell};
    use std::io;
    use std::os::unix::process::ExitStatusExt;
    use std::process::ExitStatus;
    use std::rc::Rc;

    type Mounts = Rc<RefCell<Vec<MountEntry>>>;

    struct FakeDaemon {
        exit: Option<ExitStatus>,
        stderr: String,
    }

    impl Daemon for FakeDaemon {
        fn id(&self) -> u32 {
            4242
        }

        fn try_wait(&mut self) -> io::Result<Option<ExitStatus>> {
            Ok(self.exit)
        }

        fn stderr_output(&mut self) -> io::Result<String> {
            Ok(std::mem::take(&mut self.stderr))
        }
    }

    /// Records spawns; a running daemon adds itself to the shared mount table
    struct FakeSpawner {
        spawned: Cell<usize>,
        exit_code: Option<i32>,
        stderr: &'static str,
        mounts: Mounts,
    }

    impl FakeSpawner {
        fn new(mounts: &Mounts) -> Self {
            Self {
                spawned: Cell::new(0),
                exit_code: None,
                stderr: "",
                mounts: Rc::clone(mounts),
            }
        }

        fn failing(mounts: &Mounts, code: i32, stderr: &'static str) -> Self {
            Self { exit_code: Some(code), stderr, ..Self::new(mounts) }
        }
    }

    impl DaemonSpawner for FakeSpawner {
        type Daemon = FakeDaemon;

        fn spawn(&self, database: &Path, mountpoint: &Path) -> io::Result<FakeDaemon> {
            self.spawned.set(self.spawned.get() + 1);
            if self.exit_code.is_none() {
                self.mounts.borrow_mut().push(MountEntry {
                    database_path: database.to_path_buf(),
                    mount_path: mountpoint.to_path_buf(),
                });
            }
            Ok(FakeDaemon {
                exit: self.exit_code.map(|code| ExitStatus::from_raw(code << 8)),
                stderr: self.stderr.to_string(),
            })
        }
    }

    struct FakeTable {
        mounts: Mounts,
    }

    impl MountTable for FakeTable {
        fn entries(&self) -> Result<Vec<MountEntry>, MountError> {
            Ok(self.mounts.borrow().clone())
        }

        fn unmount(&self, mountpoint: &Path) -> Result<(), MountError> {
            let mut mounts = self.mounts.borrow_mut();
            let before = mounts.len();
            mounts.retain(|m| m.mount_path != mountpoint);
            if mounts.len() == before {
                return Err(MountError::UnmountFailed(format!(
                    "fusermount: entry for {} not found in /etc/mtab",
                    mountpoint.display()
                )));
            }
            Ok(())
        }
    }

    fn controller(spawner: FakeSpawner, mounts: &Mounts) -> MountController<FakeSpawner, FakeTable> {
        MountController::new(spawner, FakeTable { mounts: Rc::clone(mounts) }).with_grace(Duration::ZERO)
    }

    struct Fixture {
        files: TestFiles,
        database: PathBuf,
        mountpoint: PathBuf,
    }

    fn fixture() -> Fixture {
        let files = TestFiles::new();
        let database = files.create("tags.db", b"");
        let mountpoint = files.path().join("mnt");
        fs::create_dir(&mountpoint).unwrap();
        Fixture { files, database, mountpoint }
    }

    #[test]
    fn test_mount_onto_regular_file_never_spawns() {
        let f = fixture();
        let mounts = Mounts::default();
        let mut controller = controller(FakeSpawner::new(&mounts), &mounts);
        let target = f.files.create("not-a-dir", b"x");

        let result = controller.mount(&f.database, &target);
        assert!(matches!(result, Err(MountError::MountPointNotDirectory(_))));
        assert_eq!(controller.spawner().spawned.get(), 0);
        assert_eq!(controller.state(), MountState::Idle);
    }

    #[test]
    fn test_missing_paths_never_spawn() {
        let f = fixture();
        let mounts = Mounts::default();
        let mut controller = controller(FakeSpawner::new(&mounts), &mounts);

        let result = controller.mount(&f.database, &f.files.path().join("missing"));
        assert!(matches!(result, Err(MountError::MountPointNotFound(_))));

        let result = controller.mount(&f.files.path().join("missing.db"), &f.mountpoint);
        assert!(matches!(result, Err(MountError::DatabaseNotFound(_))));

        assert_eq!(controller.spawner().spawned.get(), 0);
    }

    #[test]
    fn test_mount_list_unmount() {
        let f = fixture();
        let mounts = Mounts::default();
        let mut controller = controller(FakeSpawner::new(&mounts), &mounts);

        let entry = controller.mount(&f.database, &f.mountpoint).unwrap();
        assert_eq!(controller.state(), MountState::Mounted);
        assert_eq!(entry.mount_path, fs::canonicalize(&f.mountpoint).unwrap());

        let listed = controller.list_mounts().unwrap();
        assert_eq!(listed.iter().filter(|m| **m == entry).count(), 1);

        controller.unmount(&entry.mount_path).unwrap();
        assert_eq!(controller.state(), MountState::Stopped);
        assert!(!controller.list_mounts().unwrap().contains(&entry));
    }

    #[test]
    fn test_daemon_failure_reports_stderr_verbatim() {
        let f = fixture();
        let mounts = Mounts::default();
        let stderr = "fuse: bad mount point `/mnt': Transport endpoint is not connected\n";
        let mut controller = controller(FakeSpawner::failing(&mounts, 1, stderr), &mounts);

        match controller.mount(&f.database, &f.mountpoint) {
            Err(MountError::MountFailed(text)) => assert_eq!(text, stderr),
            other => panic!("expected MountFailed, got {other:?}"),
        }
        assert_eq!(controller.state(), MountState::Failed);
        assert_eq!(controller.spawner().spawned.get(), 1);
        assert!(controller.list_mounts().unwrap().is_empty());
    }

    #[test]
    fn test_clean_exit_during_grace_is_not_a_failure() {
        let f = fixture();
        let mounts = Mounts::default();
        let mut controller = controller(FakeSpawner::failing(&mounts, 0, ""), &mounts);
        assert!(controller.mount(&f.database, &f.mountpoint).is_ok());
    }

    #[test]
    fn test_unmount_failure_keeps_os_message() {
        let mounts = Mounts::default();
        let mut controller = controller(FakeSpawner::new(&mounts), &mounts);

        match controller.unmount(Path::new("/mnt/none")) {
            Err(MountError::UnmountFailed(text)) => assert!(text.contains("/mnt/none")),
            other => panic!("expected UnmountFailed, got {other:?}"),
        }
        assert_eq!(controller.state(), MountState::Failed);
    }

    #[test]
    fn test_unmount_all() {
        let f = fixture();
        let second = f.files.path().join("mnt2");
        fs::create_dir(&second).unwrap();
        let mounts = Mounts::default();
        let mut controller = controller(FakeSpawner::new(&mounts), &mounts);

        controller.mount(&f.database, &f.mountpoint).unwrap();
        controller.mount(&f.database, &second).unwrap();

        let unmounted = controller.unmount_all().unwrap();
        assert_eq!(unmounted.len(), 2);
        assert!(controller.list_mounts().unwrap().is_empty());
    }

    #[test]
    fn test_entry_display() {
        let entry = MountEntry {
            database_path: PathBuf::from("/home/user/.tagfs/db"),
            mount_path: PathBuf::from("/mnt/tags"),
        };
        assert_eq!(entry.to_string(), "'/home/user/.tagfs/db' at '/mnt/tags'");
    }
}
