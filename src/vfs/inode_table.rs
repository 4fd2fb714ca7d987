//! Kernel inode bookkeeping for the virtual tree
//!
//! The kernel addresses entries by inode while the virtual tree is resolved
//! by path. Each successful `lookup` takes a reference on the path's inode and
//! each `forget` drops the references the kernel reports. A path whose count
//! reaches zero is evicted, so the table only holds what the kernel still
//! remembers. Inode numbers are never reused within one mount.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Virtual path known to the kernel, with its outstanding lookup count
#[derive(Debug)]
struct Known {
    path: PathBuf,
    lookups: u64,
}

/// Reference-counted mapping between inodes and virtual paths
#[derive(Debug)]
pub struct InodeTable {
    known: HashMap<u64, Known>,
    by_path: HashMap<PathBuf, u64>,
    next_inode: u64,
}

impl InodeTable {
    pub const ROOT_INODE: u64 = 1;

    /// Reported for directory entries the kernel has not looked up yet
    pub const UNASSIGNED_INODE: u64 = u64::MAX;

    /// Create a table holding only the root directory, which is never evicted
    #[must_use]
    pub fn new() -> Self {
        let root = PathBuf::from("/");
        Self {
            known: HashMap::from([(Self::ROOT_INODE, Known { path: root.clone(), lookups: 0 })]),
            by_path: HashMap::from([(root, Self::ROOT_INODE)]),
            next_inode: Self::ROOT_INODE + 1,
        }
    }

    /// Take one kernel reference on `path`, assigning an inode on first sight
    pub fn lookup(&mut self, path: &Path) -> u64 {
        let ino = match self.by_path.get(path) {
            Some(&ino) => ino,
            None => {
                let ino = self.next_inode;
                self.next_inode += 1;
                self.by_path.insert(path.to_path_buf(), ino);
                self.known.insert(ino, Known { path: path.to_path_buf(), lookups: 0 });
                ino
            }
        };
        if let Some(known) = self.known.get_mut(&ino) {
            known.lookups += 1;
        }
        ino
    }

    /// Drop `count` kernel references on `ino`
    ///
    /// Returns true when the inode was evicted.
    pub fn forget(&mut self, ino: u64, count: u64) -> bool {
        if ino == Self::ROOT_INODE {
            return false;
        }
        let Some(known) = self.known.get_mut(&ino) else {
            return false;
        };
        known.lookups = known.lookups.saturating_sub(count);
        if known.lookups > 0 {
            return false;
        }
        if let Some(known) = self.known.remove(&ino) {
            self.by_path.remove(&known.path);
        }
        true
    }

    /// Inode already assigned to `path`, without taking a reference
    #[must_use]
    pub fn inode_of(&self, path: &Path) -> Option<u64> {
        self.by_path.get(path).copied()
    }

    #[must_use]
    pub fn get_path(&self, ino: u64) -> Option<&Path> {
        self.known.get(&ino).map(|known| known.path.as_path())
    }

    /// Parent of a virtual path, the root being its own parent
    #[must_use]
    pub fn parent_path(path: &Path) -> PathBuf {
        path.parent().map_or_else(|| PathBuf::from("/"), Path::to_path_buf)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.known.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.known.is_empty()
    }
}

impl Default for InodeTable {
    fn default() -> Self {
        Self::new()
    }
}
