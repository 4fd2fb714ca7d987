//! Hidden vfs command - the mount daemon itself

use super::Result;
use crate::config::TagfsConfig;
use crate::db::Database;
use crate::vfs::{self, VirtualTree};
use std::path::Path;

/// Serve `database` at `mountpoint` in the foreground until unmounted
///
/// # Errors
/// Returns an error if the database cannot be opened or the filesystem
/// cannot be mounted
pub fn execute(database: &Path, mountpoint: &Path, config: &TagfsConfig) -> Result<()> {
    let db = Database::open_read_only(database)?;
    let tree = VirtualTree::new(db, &config.cache, config.explicit);
    vfs::serve(tree, database, mountpoint)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::TagfsError;
    use crate::db::DbError;
    use crate::testing::TestFiles;

    #[test]
    fn test_missing_database_fails_before_mounting() {
        let files = TestFiles::new();
        let result = execute(&files.path().join("missing.db"), files.path(), &TagfsConfig::default());
        assert!(matches!(result, Err(TagfsError::Db(DbError::NotFound(_)))));
    }
}
