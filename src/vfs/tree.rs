//! Read-only filesystem operations over virtual paths
//!
//! Synthesized directories (the root, query and value directories) have fixed
//! attributes. File leaves delegate everything to the real path: attributes
//! are read from disk on every call and content is read positionally from the
//! real file, never copied or cached.

use super::cache::{CacheConfig, DirectoryCache};
use super::resolver::{Node, Resolver};
use super::{DirEntry, VfsError};
use crate::db::TagStore;
use std::fs;
use std::os::unix::fs::{FileExt, PermissionsExt};
use std::path::Path;
use std::time::SystemTime;

/// Permission bits of synthesized directories
pub const DIRECTORY_MODE: u16 = 0o555;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttrKind {
    Directory,
    File,
}

/// Attributes reported for a virtual path
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Attr {
    pub kind: AttrKind,
    pub size: u64,
    pub mtime: SystemTime,
    pub perm: u16,
}

/// The virtual tree of one mounted tag store
pub struct VirtualTree<S: TagStore> {
    store: S,
    cache: DirectoryCache,
    explicit: bool,
    mounted_at: SystemTime,
}

impl<S: TagStore> VirtualTree<S> {
    #[must_use]
    pub fn new(store: S, cache: &CacheConfig, explicit: bool) -> Self {
        Self {
            store,
            cache: DirectoryCache::new(cache),
            explicit,
            mounted_at: SystemTime::now(),
        }
    }

    #[must_use]
    pub const fn store(&self) -> &S {
        &self.store
    }

    #[must_use]
    pub const fn cache(&self) -> &DirectoryCache {
        &self.cache
    }

    fn resolver(&self) -> Resolver<'_, S> {
        Resolver::new(&self.store, &self.cache, self.explicit)
    }

    /// Resolve a full virtual path
    ///
    /// # Errors
    ///
    /// Returns `VfsError::NotFound` for paths that do not resolve.
    pub fn resolve(&self, path: &Path) -> Result<Node, VfsError> {
        self.resolver().resolve_path(path)
    }

    /// Resolve `name` inside the directory at `parent`
    ///
    /// # Errors
    ///
    /// Returns `VfsError::NotFound` if either the parent or the name does not resolve.
    pub fn lookup(&self, parent: &Path, name: &str) -> Result<Node, VfsError> {
        let resolver = self.resolver();
        let parent = resolver.resolve_path(parent)?;
        resolver.lookup(&parent, name)
    }

    /// Entries of the directory at `path`
    ///
    /// # Errors
    ///
    /// Returns `VfsError::NotFound` if the path does not resolve, or
    /// `VfsError::NotADirectory` for leaves backed by regular files.
    pub fn readdir(&self, path: &Path) -> Result<Vec<DirEntry>, VfsError> {
        let resolver = self.resolver();
        let node = resolver.resolve_path(path)?;
        Ok(resolver.listing(&node)?.iter().cloned().collect())
    }

    /// Attributes of the node at `path`
    ///
    /// # Errors
    ///
    /// Returns `VfsError::NotFound` if the path does not resolve, or
    /// `VfsError::Io` if the real file cannot be inspected.
    pub fn getattr(&self, path: &Path) -> Result<Attr, VfsError> {
        let node = self.resolve(path)?;
        self.node_attr(&node)
    }

    /// Attributes of an already resolved node
    ///
    /// # Errors
    ///
    /// Returns `VfsError::Io` if the real file behind a leaf cannot be inspected.
    pub fn node_attr(&self, node: &Node) -> Result<Attr, VfsError> {
        match node {
            Node::File { path, .. } => real_attr(path),
            _ => Ok(Attr {
                kind: AttrKind::Directory,
                size: 0,
                mtime: self.mounted_at,
                perm: DIRECTORY_MODE,
            }),
        }
    }

    /// Open the real file behind a leaf for reading
    ///
    /// # Errors
    ///
    /// Returns `VfsError::IsDirectory` for directories, `VfsError::NotFound` if
    /// the path does not resolve, or `VfsError::Io` if the file cannot be opened.
    pub fn open(&self, path: &Path) -> Result<fs::File, VfsError> {
        match self.resolve(path)? {
            Node::File { path: real, .. } if !real.is_dir() => Ok(fs::File::open(real)?),
            _ => Err(VfsError::IsDirectory(path.display().to_string())),
        }
    }

    /// Read up to `len` bytes at `offset` from an opened file
    ///
    /// # Errors
    ///
    /// Returns `VfsError::Io` if the read fails.
    pub fn read(&self, file: &fs::File, offset: u64, len: usize) -> Result<Vec<u8>, VfsError> {
        let mut buf = vec![0; len];
        let mut filled = 0;
        while filled < len {
            let n = file.read_at(&mut buf[filled..], offset + filled as u64)?;
            if n == 0 {
                break;
            }
            filled += n;
        }
        buf.truncate(filled);
        Ok(buf)
    }

    /// File leaves are served by delegated open, so no entry is a link
    ///
    /// # Errors
    ///
    /// Always fails: `VfsError::NotALink` for existing entries, otherwise `VfsError::NotFound`.
    pub fn readlink(&self, path: &Path) -> Result<std::path::PathBuf, VfsError> {
        self.resolve(path)?;
        Err(VfsError::NotALink(path.display().to_string()))
    }

    /// Reject a mutating operation
    ///
    /// # Errors
    ///
    /// Always returns `VfsError::OperationNotSupported`.
    pub fn mutate(&self, operation: &'static str) -> Result<(), VfsError> {
        Err(VfsError::OperationNotSupported(operation))
    }
}

fn real_attr(path: &Path) -> Result<Attr, VfsError> {
    let metadata = fs::metadata(path)?;
    let kind = if metadata.is_dir() { AttrKind::Directory } else { AttrKind::File };

    #[allow(clippy::cast_possible_truncation)]
    let perm = (metadata.permissions().mode() & 0o7777) as u16;

    Ok(Attr {
        kind,
        size: metadata.len(),
        mtime: metadata.modified()?,
        perm,
    })
}
