//! Virtual filesystem projection of the tag store
//!
//! Directories are queries: `/photo/and/not/draft` lists the files tagged
//! `photo` but not `draft`, alongside the tags and operators that can refine
//! the query further. Files appear as leaves that delegate to the real path.
//!
//! - [`resolver`]: path segments to nodes, and node listings
//! - [`cache`]: listing cache keyed by canonical query
//! - [`tree`]: read-only filesystem operations
//! - [`fs`]: binding of the tree to FUSE

pub mod cache;
pub mod error;
pub mod fs;
pub mod inode_table;
pub mod listing;
pub mod resolver;
pub mod tree;

pub use cache::{CacheConfig, DirectoryCache, InvalidationScope, ListingKey};
pub use error::VfsError;
pub use fs::{SUBTYPE, TagFs, mount_options, serve};
pub use listing::{DirEntry, EntryKind, Listing};
pub use resolver::{Node, QueryState, Resolver, Step};
pub use tree::{Attr, AttrKind, VirtualTree};
