//! FUSE binding of the virtual tree
//!
//! Implements `fuser::Filesystem` on top of [`VirtualTree`]. The kernel sees
//! a read-only tree: every mutating call is answered with `ENOTSUP`.

use super::inode_table::InodeTable;
use super::tree::{Attr, AttrKind, VirtualTree};
use super::VfsError;
use crate::db::TagStore;
use fuser::{
    FileAttr, FileType, Filesystem, MountOption, ReplyAttr, ReplyCreate, ReplyData, ReplyDirectory,
    ReplyEmpty, ReplyEntry, ReplyOpen, ReplyWrite, Request, TimeOrNow,
};
use std::collections::HashMap;
use std::ffi::OsStr;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};
use tracing::{debug, info, warn};

/// Filesystem type suffix, shown as `fuse.tagfs` in the mount table
pub const SUBTYPE: &str = "tagfs";

/// Options for mounting the tag store at `database`
#[must_use]
pub fn mount_options(database: &Path) -> Vec<MountOption> {
    vec![
        MountOption::FSName(database.display().to_string()),
        MountOption::Subtype(SUBTYPE.to_string()),
        MountOption::RO,
        MountOption::NoExec,
    ]
}

/// Mount `tree` at `mountpoint` and serve it until unmounted
///
/// # Errors
///
/// Returns the I/O error reported by the FUSE session.
pub fn serve<S: TagStore>(tree: VirtualTree<S>, database: &Path, mountpoint: &Path) -> io::Result<()> {
    info!(database = %database.display(), mountpoint = %mountpoint.display(), "serving virtual filesystem");
    fuser::mount2(TagFs::new(tree), mountpoint, &mount_options(database))
}

/// FUSE filesystem for one tag store
pub struct TagFs<S: TagStore> {
    tree: VirtualTree<S>,
    inodes: InodeTable,
    /// Open real files: file handle → file
    handles: HashMap<u64, fs::File>,
    next_fh: u64,
}

impl<S: TagStore> TagFs<S> {
    /// Default TTL for FUSE attributes
    const ATTR_TTL: Duration = Duration::from_secs(1);

    /// Block size for FUSE
    const BLOCK_SIZE: u32 = 512;

    #[must_use]
    pub fn new(tree: VirtualTree<S>) -> Self {
        Self {
            tree,
            inodes: InodeTable::new(),
            handles: HashMap::new(),
            next_fh: 1,
        }
    }

    fn next_handle(&mut self) -> u64 {
        let fh = self.next_fh;
        self.next_fh += 1;
        fh
    }

    fn path_of(&self, ino: u64) -> Result<PathBuf, libc::c_int> {
        self.inodes
            .get_path(ino)
            .map(Path::to_path_buf)
            .ok_or(libc::ENOENT)
    }

    fn make_attr(ino: u64, attr: &Attr) -> FileAttr {
        let (kind, nlink) = match attr.kind {
            AttrKind::Directory => (FileType::Directory, 2),
            AttrKind::File => (FileType::RegularFile, 1),
        };

        FileAttr {
            ino,
            size: attr.size,
            blocks: attr.size.div_ceil(u64::from(Self::BLOCK_SIZE)),
            atime: attr.mtime,
            mtime: attr.mtime,
            ctime: attr.mtime,
            crtime: attr.mtime,
            kind,
            perm: attr.perm,
            nlink,
            uid: unsafe { libc::getuid() },
            gid: unsafe { libc::getgid() },
            rdev: 0,
            blksize: Self::BLOCK_SIZE,
            flags: 0,
        }
    }

    /// Errno for a failed call, logging failures that are not plain misses
    fn fail(path: &Path, error: &VfsError) -> libc::c_int {
        match error {
            VfsError::Eval(_) | VfsError::Store(_) | VfsError::Io(_) => {
                warn!(path = %path.display(), %error, "virtual filesystem request failed");
            }
            _ => debug!(path = %path.display(), %error, "virtual filesystem request rejected"),
        }
        error.errno()
    }

    /// Entries of a directory as reported to readdir, `.` and `..` first
    ///
    /// Children the kernel has not looked up yet carry a placeholder inode;
    /// only `lookup` assigns real ones.
    fn directory_entries(&self, ino: u64, path: &Path) -> Result<Vec<(u64, FileType, String)>, libc::c_int> {
        let entries = self.tree.readdir(path).map_err(|e| Self::fail(path, &e))?;

        let parent_ino = self
            .inodes
            .inode_of(&InodeTable::parent_path(path))
            .unwrap_or(InodeTable::ROOT_INODE);
        let mut all_entries = Vec::with_capacity(entries.len() + 2);
        all_entries.push((ino, FileType::Directory, ".".to_string()));
        all_entries.push((parent_ino, FileType::Directory, "..".to_string()));

        for entry in entries {
            let entry_ino = self
                .inodes
                .inode_of(&path.join(&entry.name))
                .unwrap_or(InodeTable::UNASSIGNED_INODE);
            let kind = if entry.is_dir() { FileType::Directory } else { FileType::RegularFile };
            all_entries.push((entry_ino, kind, entry.name));
        }
        Ok(all_entries)
    }

    fn reject(&self, operation: &'static str) -> libc::c_int {
        self.tree
            .mutate(operation)
            .err()
            .map_or(libc::ENOTSUP, |e| Self::fail(Path::new("/"), &e))
    }
}

impl<S: TagStore> Filesystem for TagFs<S> {
    fn init(&mut self, _req: &Request<'_>, _config: &mut fuser::KernelConfig) -> Result<(), libc::c_int> {
        info!("virtual filesystem initialized");
        Ok(())
    }

    fn destroy(&mut self) {
        info!("virtual filesystem destroyed");
    }

    fn lookup(&mut self, _req: &Request<'_>, parent: u64, name: &OsStr, reply: ReplyEntry) {
        let Some(name) = name.to_str() else {
            reply.error(libc::ENOENT);
            return;
        };
        let parent_path = match self.path_of(parent) {
            Ok(p) => p,
            Err(errno) => {
                reply.error(errno);
                return;
            }
        };
        let path = parent_path.join(name);

        let attr = self
            .tree
            .lookup(&parent_path, name)
            .and_then(|node| self.tree.node_attr(&node));
        match attr {
            Ok(attr) => {
                let ino = self.inodes.lookup(&path);
                reply.entry(&Self::ATTR_TTL, &Self::make_attr(ino, &attr), 0);
            }
            Err(e) => reply.error(Self::fail(&path, &e)),
        }
    }

    fn getattr(&mut self, _req: &Request<'_>, ino: u64, _fh: Option<u64>, reply: ReplyAttr) {
        let path = match self.path_of(ino) {
            Ok(p) => p,
            Err(errno) => {
                reply.error(errno);
                return;
            }
        };

        match self.tree.getattr(&path) {
            Ok(attr) => reply.attr(&Self::ATTR_TTL, &Self::make_attr(ino, &attr)),
            Err(e) => reply.error(Self::fail(&path, &e)),
        }
    }

    fn forget(&mut self, _req: &Request<'_>, ino: u64, nlookup: u64) {
        if self.inodes.forget(ino, nlookup) {
            debug!(ino, "inode evicted");
        }
    }

    fn readdir(&mut self, _req: &Request<'_>, ino: u64, _fh: u64, offset: i64, mut reply: ReplyDirectory) {
        let path = match self.path_of(ino) {
            Ok(p) => p,
            Err(errno) => {
                reply.error(errno);
                return;
            }
        };

        let all_entries = match self.directory_entries(ino, &path) {
            Ok(entries) => entries,
            Err(errno) => {
                reply.error(errno);
                return;
            }
        };

        let skip = usize::try_from(offset).unwrap_or_default();
        for (i, (ino, kind, name)) in all_entries.into_iter().enumerate().skip(skip) {
            let next = i64::try_from(i + 1).unwrap_or(i64::MAX);
            if reply.add(ino, next, kind, &name) {
                break;
            }
        }

        reply.ok();
    }

    fn open(&mut self, _req: &Request<'_>, ino: u64, flags: i32, reply: ReplyOpen) {
        if flags & libc::O_ACCMODE != libc::O_RDONLY {
            reply.error(self.reject("write"));
            return;
        }

        let path = match self.path_of(ino) {
            Ok(p) => p,
            Err(errno) => {
                reply.error(errno);
                return;
            }
        };

        match self.tree.open(&path) {
            Ok(file) => {
                let fh = self.next_handle();
                self.handles.insert(fh, file);
                reply.opened(fh, 0);
            }
            Err(e) => reply.error(Self::fail(&path, &e)),
        }
    }

    fn read(
        &mut self,
        _req: &Request<'_>,
        ino: u64,
        fh: u64,
        offset: i64,
        size: u32,
        _flags: i32,
        _lock_owner: Option<u64>,
        reply: ReplyData,
    ) {
        let Some(file) = self.handles.get(&fh) else {
            reply.error(libc::EBADF);
            return;
        };
        let Ok(offset) = u64::try_from(offset) else {
            reply.error(libc::EINVAL);
            return;
        };

        match self.tree.read(file, offset, size as usize) {
            Ok(data) => reply.data(&data),
            Err(e) => {
                let path = self.path_of(ino).unwrap_or_default();
                reply.error(Self::fail(&path, &e));
            }
        }
    }

    fn release(
        &mut self,
        _req: &Request<'_>,
        _ino: u64,
        fh: u64,
        _flags: i32,
        _lock_owner: Option<u64>,
        _flush: bool,
        reply: ReplyEmpty,
    ) {
        self.handles.remove(&fh);
        reply.ok();
    }

    fn readlink(&mut self, _req: &Request<'_>, ino: u64, reply: ReplyData) {
        let path = match self.path_of(ino) {
            Ok(p) => p,
            Err(errno) => {
                reply.error(errno);
                return;
            }
        };

        match self.tree.readlink(&path) {
            Ok(target) => reply.data(target.as_os_str().as_encoded_bytes()),
            Err(e) => reply.error(Self::fail(&path, &e)),
        }
    }

    fn setattr(
        &mut self,
        _req: &Request<'_>,
        _ino: u64,
        _mode: Option<u32>,
        _uid: Option<u32>,
        _gid: Option<u32>,
        _size: Option<u64>,
        _atime: Option<TimeOrNow>,
        _mtime: Option<TimeOrNow>,
        _ctime: Option<SystemTime>,
        _fh: Option<u64>,
        _crtime: Option<SystemTime>,
        _chgtime: Option<SystemTime>,
        _bkuptime: Option<SystemTime>,
        _flags: Option<u32>,
        reply: ReplyAttr,
    ) {
        reply.error(self.reject("setattr"));
    }

    fn mkdir(&mut self, _req: &Request<'_>, _parent: u64, _name: &OsStr, _mode: u32, _umask: u32, reply: ReplyEntry) {
        reply.error(self.reject("mkdir"));
    }

    fn unlink(&mut self, _req: &Request<'_>, _parent: u64, _name: &OsStr, reply: ReplyEmpty) {
        reply.error(self.reject("unlink"));
    }

    fn rmdir(&mut self, _req: &Request<'_>, _parent: u64, _name: &OsStr, reply: ReplyEmpty) {
        reply.error(self.reject("rmdir"));
    }

    fn symlink(&mut self, _req: &Request<'_>, _parent: u64, _link_name: &OsStr, _target: &Path, reply: ReplyEntry) {
        reply.error(self.reject("symlink"));
    }

    fn rename(
        &mut self,
        _req: &Request<'_>,
        _parent: u64,
        _name: &OsStr,
        _newparent: u64,
        _newname: &OsStr,
        _flags: u32,
        reply: ReplyEmpty,
    ) {
        reply.error(self.reject("rename"));
    }

    fn write(
        &mut self,
        _req: &Request<'_>,
        _ino: u64,
        _fh: u64,
        _offset: i64,
        _data: &[u8],
        _write_flags: u32,
        _flags: i32,
        _lock_owner: Option<u64>,
        reply: ReplyWrite,
    ) {
        reply.error(self.reject("write"));
    }

    fn create(
        &mut self,
        _req: &Request<'_>,
        _parent: u64,
        _name: &OsStr,
        _mode: u32,
        _umask: u32,
        _flags: i32,
        reply: ReplyCreate,
    ) {
        reply.error(self.reject("create"));
    }
}
