//! Testing utilities for tagfs
//!
//! Provides `TestStore`, an in-memory tag database paired with a temporary
//! directory of real files, and `TestFiles` for tests that only need files.
//!
//! Only available when compiled with `cfg(test)`.

use crate::db::{Database, FileIds, TagStore};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Temporary directory of real files, removed on drop
pub struct TestFiles {
    dir: TempDir,
}

impl TestFiles {
    /// # Panics
    /// Panics if the temporary directory cannot be created.
    #[must_use]
    pub fn new() -> Self {
        Self { dir: TempDir::new().expect("Failed to create temp dir") }
    }

    /// Create (or overwrite) a file relative to the temporary directory
    ///
    /// Intermediate directories are created as needed.
    ///
    /// # Panics
    /// Panics if the file cannot be written.
    pub fn create(&self, name: impl AsRef<Path>, content: &[u8]) -> PathBuf {
        let path = self.dir.path().join(name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("Failed to create parent dir");
        }
        fs::write(&path, content).expect("Failed to write test file");
        path
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        self.dir.path()
    }
}

impl Default for TestFiles {
    fn default() -> Self {
        Self::new()
    }
}

/// In-memory tag database with real backing files
///
/// # Examples
/// ```ignore
/// let store = TestStore::new();
/// store.tag("a.txt", &["photo", "rating=5"]);
/// assert_eq!(store.db().count().unwrap(), 1);
/// ```
pub struct TestStore {
    files: TestFiles,
    db: Database,
}

impl TestStore {
    /// # Panics
    /// Panics if the in-memory database cannot be created.
    #[must_use]
    pub fn new() -> Self {
        Self {
            files: TestFiles::new(),
            db: Database::in_memory().expect("Failed to open in-memory database"),
        }
    }

    #[must_use]
    pub const fn db(&self) -> &Database {
        &self.db
    }

    #[must_use]
    pub const fn files(&self) -> &TestFiles {
        &self.files
    }

    /// Create `name` (if missing) with its own name as content and apply the tags
    ///
    /// # Panics
    /// Panics if the file cannot be created or tagged.
    pub fn tag(&self, name: &str, tags: &[&str]) -> PathBuf {
        let path = self.files.path().join(name);
        if !path.exists() {
            self.files.create(name, name.as_bytes());
        }
        for tag in tags {
            let spec = tag.parse().expect("tag spec parses");
            self.db.tag_file(&path, &spec).expect("Failed to tag file");
        }
        path
    }

    /// Record `implying => implied`
    ///
    /// # Panics
    /// Panics if the implication cannot be stored.
    pub fn imply(&self, implying: &str, implied: &str) {
        let implying = implying.parse().expect("tag spec parses");
        let implied = implied.parse().expect("tag spec parses");
        self.db
            .add_implication(&implying, &implied)
            .expect("Failed to add implication");
    }

    /// Sorted basenames of the given files
    ///
    /// # Panics
    /// Panics if a file id is unknown.
    #[must_use]
    pub fn basenames(&self, ids: &FileIds) -> Vec<String> {
        let mut names: Vec<String> = ids
            .iter()
            .map(|id| self.db.file_by_id(*id).expect("store readable").expect("file exists").basename())
            .collect();
        names.sort();
        names
    }
}

impl Default for TestStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_tags_real_files() {
        let store = TestStore::new();
        let path = store.tag("a.txt", &["photo", "rating=5"]);

        assert!(path.exists());
        assert_eq!(fs::read(&path).unwrap(), b"a.txt");
        assert_eq!(store.db().count().unwrap(), 1);
        assert_eq!(store.db().tags().unwrap().len(), 2);
    }

    #[test]
    fn test_tagging_twice_keeps_one_file() {
        let store = TestStore::new();
        store.tag("a.txt", &["x"]);
        store.tag("a.txt", &["y"]);
        assert_eq!(store.db().count().unwrap(), 1);
    }

    #[test]
    fn test_files_nested_create() {
        let files = TestFiles::new();
        let path = files.create("dir/sub/file.txt", b"x");
        assert!(path.starts_with(files.path()));
        assert!(path.exists());
    }
}
