//! Command implementations
//!
//! Each command is a module with an execute function that takes parsed CLI args
//! and executes the operation against the database, the config file or the
//! mount table.

use crate::TagfsError;

pub mod db;
pub mod files;
pub mod imply;
pub mod mount;
pub mod tag;
pub mod tags;
pub mod values;
pub mod vfs;

// Re-export execute functions for convenience
pub use db::execute as db;
pub use files::execute as files;
pub use imply::execute as imply;
pub use mount::execute as mount;
pub use mount::unmount;
pub use tag::execute as tag;
pub use tag::untag;
pub use tags::execute as tags;
pub use values::execute as values;
pub use vfs::execute as vfs;

type Result<T> = std::result::Result<T, TagfsError>;
