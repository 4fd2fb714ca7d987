//! Tag store backed by SQLite
//!
//! Provides the persistent store for files, tags, values, taggings and
//! implications. SQLite is used so that a mounted virtual filesystem (one
//! process) and tagging commands (other processes) can share one database.
//!
//! Tables:
//! - `file`: tracked files with fingerprint, size and modification time
//! - `tag` / `value`: names
//! - `file_tag`: taggings, value id 0 meaning "no value"
//! - `implication`: tag/value pair rules
//! - `meta`: the generation counter, bumped by triggers on every change

use crate::query::{CompareOp, is_keyword};
use rusqlite::{Connection, OpenFlags, OptionalExtension, Row, params};
use sha2::{Digest, Sha256};
use std::collections::BTreeSet;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub mod error;
pub mod store;
pub mod types;

pub use error::DbError;
pub use store::TagStore;
pub use types::{
    File, FileId, FileIds, Implication, Tag, TagId, TagSpec, TagValuePair, Tagging, Value,
    ValueId, ValueIds, Values,
};

const SCHEMA_SQL: &str = include_str!("schema.sql");

/// How long a statement waits on a lock held by another process
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Database wrapper that encapsulates all tag store operations
pub struct Database {
    conn: Connection,
    path: Option<PathBuf>,
}

impl Database {
    /// Opens or creates a database at the specified path
    ///
    /// # Arguments
    /// * `path` - Path to the database file
    ///
    /// # Examples
    /// ```no_run
    /// use tagfs::db::Database;
    /// let db = Database::open("tags.db").unwrap();
    /// ```
    ///
    /// # Errors
    ///
    /// Returns `DbError` if the parent directory cannot be created, the database
    /// cannot be opened, or the schema cannot be applied.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, DbError> {
        let path = path.as_ref();

        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)?;
        }

        let conn = Connection::open_with_flags(
            path,
            OpenFlags::SQLITE_OPEN_READ_WRITE
                | OpenFlags::SQLITE_OPEN_CREATE
                | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )?;
        conn.busy_timeout(BUSY_TIMEOUT)?;
        conn.execute_batch(SCHEMA_SQL)?;

        Ok(Self { conn, path: Some(path.to_path_buf()) })
    }

    /// Opens an existing database without write access
    ///
    /// Used by the virtual filesystem daemon, which must never write the store.
    ///
    /// # Errors
    ///
    /// Returns `DbError::NotFound` if the file does not exist, or `DbError` if
    /// SQLite cannot open it.
    pub fn open_read_only<P: AsRef<Path>>(path: P) -> Result<Self, DbError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(DbError::NotFound(path.display().to_string()));
        }

        let conn = Connection::open_with_flags(
            path,
            OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )?;
        conn.busy_timeout(BUSY_TIMEOUT)?;

        Ok(Self { conn, path: Some(path.to_path_buf()) })
    }

    /// Creates an in-memory database (for tests)
    ///
    /// # Errors
    ///
    /// Returns `DbError` if the schema cannot be applied.
    pub fn in_memory() -> Result<Self, DbError> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch(SCHEMA_SQL)?;
        Ok(Self { conn, path: None })
    }

    /// Path of the database file, `None` for in-memory databases
    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Add a file to the store, or refresh its recorded metadata
    ///
    /// The path is canonicalized so the same file is always recorded once.
    ///
    /// # Errors
    ///
    /// Returns `DbError::FileNotFound` if the file does not exist, or `DbError` if
    /// reading the file or writing the store fails.
    pub fn add_file<P: AsRef<Path>>(&self, path: P) -> Result<File, DbError> {
        let path = path.as_ref();
        let path = path
            .canonicalize()
            .map_err(|_| DbError::FileNotFound(path.display().to_string()))?;

        let metadata = fs::metadata(&path)?;
        let fingerprint = if metadata.is_dir() { String::new() } else { fingerprint(&path)? };
        let size = if metadata.is_dir() { 0 } else { metadata.len() };
        let mod_time: chrono::DateTime<chrono::Utc> = metadata.modified()?.into();
        let path_text = path_text(&path)?;

        self.conn.execute(
            "INSERT INTO file (path, fingerprint, mod_time, size) VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT (path) DO UPDATE SET
                 fingerprint = excluded.fingerprint,
                 mod_time = excluded.mod_time,
                 size = excluded.size
             WHERE fingerprint != excluded.fingerprint
                OR mod_time != excluded.mod_time
                OR size != excluded.size",
            params![path_text, fingerprint, mod_time, to_sql_id(size)],
        )?;

        self.file_by_path(&path)?
            .ok_or_else(|| DbError::FileNotFound(path.display().to_string()))
    }

    /// Get or create a tag
    ///
    /// # Errors
    ///
    /// Returns `DbError::InvalidName` for unusable names, or `DbError` if the store
    /// cannot be written.
    pub fn add_tag(&self, name: &str) -> Result<Tag, DbError> {
        validate_tag_name(name)?;
        self.conn
            .execute("INSERT OR IGNORE INTO tag (name) VALUES (?1)", params![name])?;
        self.tag_by_name(name)?
            .ok_or_else(|| DbError::UnknownTag(name.to_string()))
    }

    /// Get or create a value
    ///
    /// # Errors
    ///
    /// Returns `DbError::InvalidName` for unusable names, or `DbError` if the store
    /// cannot be written.
    pub fn add_value(&self, name: &str) -> Result<Value, DbError> {
        validate_name(name)?;
        self.conn
            .execute("INSERT OR IGNORE INTO value (name) VALUES (?1)", params![name])?;
        self.value_by_name(name)?
            .ok_or_else(|| DbError::UnknownValue(name.to_string()))
    }

    /// Apply a tag (and optional value) to a file, adding the file if needed
    ///
    /// # Examples
    /// ```no_run
    /// use tagfs::db::{Database, TagSpec};
    ///
    /// let db = Database::open("tags.db").unwrap();
    /// db.tag_file("photo.jpg", &"rating=5".parse::<TagSpec>().unwrap()).unwrap();
    /// ```
    ///
    /// # Errors
    ///
    /// Returns `DbError` if the file does not exist, a name is invalid, or the store
    /// cannot be written.
    pub fn tag_file<P: AsRef<Path>>(&self, path: P, spec: &TagSpec) -> Result<File, DbError> {
        let file = self.add_file(path)?;
        let tag = self.add_tag(&spec.tag)?;
        let value = spec.value.as_deref().map(|v| self.add_value(v)).transpose()?;

        self.conn.execute(
            "INSERT OR IGNORE INTO file_tag (file_id, tag_id, value_id) VALUES (?1, ?2, ?3)",
            params![
                to_sql_id(file.id.0),
                to_sql_id(tag.id.0),
                value.map_or(0, |v| to_sql_id(v.id.0))
            ],
        )?;

        Ok(file)
    }

    /// Remove a tagging from a file
    ///
    /// Without a value every tagging of the tag is removed from the file.
    ///
    /// # Returns
    /// `true` if at least one tagging was removed
    ///
    /// # Errors
    ///
    /// Returns `DbError` if the file is not tracked, the tag or value does not exist,
    /// or the store cannot be written.
    pub fn untag_file<P: AsRef<Path>>(&self, path: P, spec: &TagSpec) -> Result<bool, DbError> {
        let path = path.as_ref();
        let canonical = path
            .canonicalize()
            .unwrap_or_else(|_| path.to_path_buf());
        let file = self
            .file_by_path(&canonical)?
            .ok_or_else(|| DbError::FileNotFound(path.display().to_string()))?;
        let tag = self
            .tag_by_name(&spec.tag)?
            .ok_or_else(|| DbError::UnknownTag(spec.tag.clone()))?;

        let removed = match &spec.value {
            Some(name) => {
                let value = self
                    .value_by_name(name)?
                    .ok_or_else(|| DbError::UnknownValue(name.clone()))?;
                self.conn.execute(
                    "DELETE FROM file_tag WHERE file_id = ?1 AND tag_id = ?2 AND value_id = ?3",
                    params![to_sql_id(file.id.0), to_sql_id(tag.id.0), to_sql_id(value.id.0)],
                )?
            }
            None => self.conn.execute(
                "DELETE FROM file_tag WHERE file_id = ?1 AND tag_id = ?2",
                params![to_sql_id(file.id.0), to_sql_id(tag.id.0)],
            )?,
        };

        Ok(removed > 0)
    }

    /// Record that `implying` entails `implied`
    ///
    /// # Errors
    ///
    /// Returns `DbError` if a name is invalid or the store cannot be written.
    pub fn add_implication(&self, implying: &TagSpec, implied: &TagSpec) -> Result<Implication, DbError> {
        let implication = Implication {
            implying: self.pair_for(implying)?,
            implied: self.pair_for(implied)?,
        };

        self.conn.execute(
            "INSERT OR IGNORE INTO implication (tag_id, value_id, implied_tag_id, implied_value_id)
             VALUES (?1, ?2, ?3, ?4)",
            implication_params(&implication),
        )?;

        Ok(implication)
    }

    /// Delete an implication
    ///
    /// # Returns
    /// `true` if the implication existed
    ///
    /// # Errors
    ///
    /// Returns `DbError` if a tag or value does not exist or the store cannot be written.
    pub fn remove_implication(&self, implying: &TagSpec, implied: &TagSpec) -> Result<bool, DbError> {
        let implication = Implication {
            implying: self.existing_pair(implying)?,
            implied: self.existing_pair(implied)?,
        };

        let removed = self.conn.execute(
            "DELETE FROM implication
             WHERE tag_id = ?1 AND value_id = ?2 AND implied_tag_id = ?3 AND implied_value_id = ?4",
            implication_params(&implication),
        )?;

        Ok(removed > 0)
    }

    /// All tracked files, ordered by path
    ///
    /// # Errors
    ///
    /// Returns `DbError` if the store cannot be queried.
    pub fn files(&self) -> Result<Vec<File>, DbError> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, path, fingerprint, size, mod_time FROM file ORDER BY path")?;
        let files = stmt.query_map([], file_from_row)?;
        Ok(files.collect::<Result<_, _>>()?)
    }

    /// Tag and value names applied to a file, ordered by tag then value
    ///
    /// # Errors
    ///
    /// Returns `DbError` if the store cannot be queried.
    pub fn tag_specs_for_file(&self, file_id: FileId) -> Result<Vec<TagSpec>, DbError> {
        let mut stmt = self.conn.prepare(
            "SELECT t.name, v.name FROM file_tag ft
             JOIN tag t ON t.id = ft.tag_id
             LEFT JOIN value v ON v.id = ft.value_id
             WHERE ft.file_id = ?1
             ORDER BY t.name, v.name",
        )?;
        let specs = stmt.query_map(params![to_sql_id(file_id.0)], |row| {
            Ok(TagSpec::new(row.get::<_, String>(0)?, row.get::<_, Option<String>>(1)?))
        })?;
        Ok(specs.collect::<Result<_, _>>()?)
    }

    /// Number of distinct files carrying a tag
    ///
    /// # Errors
    ///
    /// Returns `DbError` if the store cannot be queried.
    pub fn file_count_for_tag(&self, tag_id: TagId) -> Result<usize, DbError> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(DISTINCT file_id) FROM file_tag WHERE tag_id = ?1",
            params![to_sql_id(tag_id.0)],
            |row| row.get(0),
        )?;
        Ok(usize::try_from(count).unwrap_or_default())
    }

    /// Render a pair back into names
    ///
    /// # Errors
    ///
    /// Returns `DbError` if the store cannot be queried.
    pub fn spec_for_pair(&self, pair: &TagValuePair) -> Result<TagSpec, DbError> {
        let tag: String = self.conn.query_row(
            "SELECT name FROM tag WHERE id = ?1",
            params![to_sql_id(pair.tag_id.0)],
            |row| row.get(0),
        )?;
        let value = match pair.value_id {
            Some(id) => Some(self.conn.query_row(
                "SELECT name FROM value WHERE id = ?1",
                params![to_sql_id(id.0)],
                |row| row.get::<_, String>(0),
            )?),
            None => None,
        };
        Ok(TagSpec::new(tag, value))
    }

    /// Get the number of tracked files
    ///
    /// # Errors
    ///
    /// Returns `DbError` if the store cannot be queried.
    pub fn count(&self) -> Result<usize, DbError> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM file", [], |row| row.get(0))?;
        Ok(usize::try_from(count).unwrap_or_default())
    }

    fn pair_for(&self, spec: &TagSpec) -> Result<TagValuePair, DbError> {
        let tag = self.add_tag(&spec.tag)?;
        let value = spec.value.as_deref().map(|v| self.add_value(v)).transpose()?;
        Ok(TagValuePair::new(tag.id, value.map(|v| v.id)))
    }

    fn existing_pair(&self, spec: &TagSpec) -> Result<TagValuePair, DbError> {
        let tag = self
            .tag_by_name(&spec.tag)?
            .ok_or_else(|| DbError::UnknownTag(spec.tag.clone()))?;
        let value = match &spec.value {
            Some(name) => Some(
                self.value_by_name(name)?
                    .ok_or_else(|| DbError::UnknownValue(name.clone()))?,
            ),
            None => None,
        };
        Ok(TagValuePair::new(tag.id, value.map(|v| v.id)))
    }
}

impl TagStore for Database {
    fn tag_by_name(&self, name: &str) -> Result<Option<Tag>, DbError> {
        Ok(self
            .conn
            .query_row("SELECT id, name FROM tag WHERE name = ?1", params![name], tag_from_row)
            .optional()?)
    }

    fn tags(&self) -> Result<Vec<Tag>, DbError> {
        let mut stmt = self.conn.prepare("SELECT id, name FROM tag ORDER BY name")?;
        let tags = stmt.query_map([], tag_from_row)?;
        Ok(tags.collect::<Result<_, _>>()?)
    }

    fn value_by_name(&self, name: &str) -> Result<Option<Value>, DbError> {
        Ok(self
            .conn
            .query_row("SELECT id, name FROM value WHERE name = ?1", params![name], value_from_row)
            .optional()?)
    }

    fn values(&self) -> Result<Values, DbError> {
        let mut stmt = self.conn.prepare("SELECT id, name FROM value ORDER BY name")?;
        let values = stmt.query_map([], value_from_row)?;
        Ok(values.collect::<Result<Values, _>>()?)
    }

    fn values_for_tag(&self, tag_id: TagId) -> Result<Values, DbError> {
        let mut stmt = self.conn.prepare(
            "SELECT DISTINCT v.id, v.name FROM value v
             JOIN file_tag ft ON ft.value_id = v.id
             WHERE ft.tag_id = ?1
             ORDER BY v.name",
        )?;
        let values = stmt.query_map(params![to_sql_id(tag_id.0)], value_from_row)?;
        Ok(values.collect::<Result<Values, _>>()?)
    }

    fn taggings_for_tag(&self, tag_id: TagId) -> Result<Vec<Tagging>, DbError> {
        let mut stmt = self.conn.prepare(
            "SELECT file_id, tag_id, value_id FROM file_tag WHERE tag_id = ?1 ORDER BY file_id",
        )?;
        let taggings = stmt.query_map(params![to_sql_id(tag_id.0)], tagging_from_row)?;
        Ok(taggings.collect::<Result<_, _>>()?)
    }

    fn taggings_for_file(&self, file_id: FileId) -> Result<Vec<Tagging>, DbError> {
        let mut stmt = self.conn.prepare(
            "SELECT file_id, tag_id, value_id FROM file_tag WHERE file_id = ?1 ORDER BY tag_id",
        )?;
        let taggings = stmt.query_map(params![to_sql_id(file_id.0)], tagging_from_row)?;
        Ok(taggings.collect::<Result<_, _>>()?)
    }

    fn implications_for(&self, implied_tag: TagId) -> Result<Vec<Implication>, DbError> {
        let mut stmt = self.conn.prepare(
            "SELECT tag_id, value_id, implied_tag_id, implied_value_id FROM implication
             WHERE implied_tag_id = ?1",
        )?;
        let implications = stmt.query_map(params![to_sql_id(implied_tag.0)], implication_from_row)?;
        Ok(implications.collect::<Result<_, _>>()?)
    }

    fn implications(&self) -> Result<Vec<Implication>, DbError> {
        let mut stmt = self.conn.prepare(
            "SELECT tag_id, value_id, implied_tag_id, implied_value_id FROM implication
             ORDER BY tag_id, value_id, implied_tag_id, implied_value_id",
        )?;
        let implications = stmt.query_map([], implication_from_row)?;
        Ok(implications.collect::<Result<_, _>>()?)
    }

    fn file_by_id(&self, id: FileId) -> Result<Option<File>, DbError> {
        Ok(self
            .conn
            .query_row(
                "SELECT id, path, fingerprint, size, mod_time FROM file WHERE id = ?1",
                params![to_sql_id(id.0)],
                file_from_row,
            )
            .optional()?)
    }

    fn file_by_path(&self, path: &Path) -> Result<Option<File>, DbError> {
        let path_text = path_text(path)?;
        Ok(self
            .conn
            .query_row(
                "SELECT id, path, fingerprint, size, mod_time FROM file WHERE path = ?1",
                params![path_text],
                file_from_row,
            )
            .optional()?)
    }

    fn tagged_file_ids(&self) -> Result<FileIds, DbError> {
        let mut stmt = self.conn.prepare("SELECT DISTINCT file_id FROM file_tag")?;
        let ids = stmt.query_map([], |row| Ok(FileId(from_sql_id(row.get(0)?))))?;
        Ok(ids.collect::<Result<BTreeSet<_>, _>>()?)
    }

    fn generation(&self) -> Result<u64, DbError> {
        let generation: i64 = self.conn.query_row(
            "SELECT value FROM meta WHERE key = 'generation'",
            [],
            |row| row.get(0),
        )?;
        Ok(from_sql_id(generation))
    }
}

/// Reject names that cannot be used as a directory entry in the virtual tree
fn validate_name(name: &str) -> Result<(), DbError> {
    if name.is_empty() {
        return Err(DbError::InvalidName(name.to_string(), "must not be empty"));
    }
    if name.contains('/') {
        return Err(DbError::InvalidName(name.to_string(), "contains '/'"));
    }
    if name == "." || name == ".." {
        return Err(DbError::InvalidName(name.to_string(), "reserved name"));
    }
    Ok(())
}

/// Tag names also must not read as an operator entry of a query directory
fn validate_tag_name(name: &str) -> Result<(), DbError> {
    validate_name(name)?;
    if is_keyword(name) || name == "(" || name == ")" || CompareOp::from_symbol(name).is_some() {
        return Err(DbError::InvalidName(name.to_string(), "reserved query operator"));
    }
    Ok(())
}

/// SHA-256 of the file content, hex encoded
fn fingerprint(path: &Path) -> io::Result<String> {
    let mut file = fs::File::open(path)?;
    let mut hasher = Sha256::new();
    io::copy(&mut file, &mut hasher)?;
    Ok(format!("{:x}", hasher.finalize()))
}

fn path_text(path: &Path) -> Result<&str, DbError> {
    path.to_str()
        .ok_or_else(|| DbError::InvalidName(path.display().to_string(), "path is not valid UTF-8"))
}

#[allow(clippy::cast_possible_wrap)]
const fn to_sql_id(id: u64) -> i64 {
    id as i64
}

#[allow(clippy::cast_sign_loss)]
const fn from_sql_id(id: i64) -> u64 {
    id as u64
}

fn optional_value_id(raw: i64) -> Option<ValueId> {
    (raw != 0).then(|| ValueId(from_sql_id(raw)))
}

fn implication_params(implication: &Implication) -> [i64; 4] {
    [
        to_sql_id(implication.implying.tag_id.0),
        implication.implying.value_id.map_or(0, |v| to_sql_id(v.0)),
        to_sql_id(implication.implied.tag_id.0),
        implication.implied.value_id.map_or(0, |v| to_sql_id(v.0)),
    ]
}

fn tag_from_row(row: &Row<'_>) -> rusqlite::Result<Tag> {
    Ok(Tag { id: TagId(from_sql_id(row.get(0)?)), name: row.get(1)? })
}

fn value_from_row(row: &Row<'_>) -> rusqlite::Result<Value> {
    Ok(Value { id: ValueId(from_sql_id(row.get(0)?)), name: row.get(1)? })
}

fn tagging_from_row(row: &Row<'_>) -> rusqlite::Result<Tagging> {
    Ok(Tagging {
        file_id: FileId(from_sql_id(row.get(0)?)),
        tag_id: TagId(from_sql_id(row.get(1)?)),
        value_id: optional_value_id(row.get(2)?),
    })
}

fn implication_from_row(row: &Row<'_>) -> rusqlite::Result<Implication> {
    Ok(Implication {
        implying: TagValuePair::new(TagId(from_sql_id(row.get(0)?)), optional_value_id(row.get(1)?)),
        implied: TagValuePair::new(TagId(from_sql_id(row.get(2)?)), optional_value_id(row.get(3)?)),
    })
}

fn file_from_row(row: &Row<'_>) -> rusqlite::Result<File> {
    Ok(File {
        id: FileId(from_sql_id(row.get(0)?)),
        path: PathBuf::from(row.get::<_, String>(1)?),
        fingerprint: row.get(2)?,
        size: from_sql_id(row.get(3)?),
        mod_time: row.get(4)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::TestFiles;

    fn spec(s: &str) -> TagSpec {
        s.parse().unwrap()
    }

    #[test]
    fn test_create_database() {
        let dir = tempfile::tempdir().unwrap();
        let db_path = dir.path().join("nested").join("tags.db");

        let db = Database::open(&db_path).unwrap();

        assert!(db_path.exists());
        assert_eq!(db.count().unwrap(), 0);
        assert_eq!(db.path(), Some(db_path.as_path()));
    }

    #[test]
    fn test_open_read_only_missing() {
        let dir = tempfile::tempdir().unwrap();
        let result = Database::open_read_only(dir.path().join("missing.db"));
        assert!(matches!(result, Err(DbError::NotFound(_))));
    }

    #[test]
    fn test_reopen_existing_database() {
        let dir = tempfile::tempdir().unwrap();
        let files = TestFiles::new();
        let file = files.create("persistent.txt", b"saved");
        let db_path = dir.path().join("tags.db");

        {
            let db = Database::open(&db_path).unwrap();
            db.tag_file(&file, &spec("saved")).unwrap();
        }

        let db = Database::open_read_only(&db_path).unwrap();
        assert_eq!(db.count().unwrap(), 1);
        let tag = db.tag_by_name("saved").unwrap().unwrap();
        assert_eq!(db.taggings_for_tag(tag.id).unwrap().len(), 1);
    }

    #[test]
    fn test_add_file_records_metadata() {
        let files = TestFiles::new();
        let path = files.create("a.txt", b"hello");
        let db = Database::in_memory().unwrap();

        let file = db.add_file(&path).unwrap();

        assert_eq!(file.size, 5);
        assert_eq!(
            file.fingerprint,
            "2cf24dba5fb0a30e26e83b2ac5b9e29e1b161e5c1fa7425e73043362938b9824"
        );
        assert!(file.path.is_absolute());
    }

    #[test]
    fn test_add_file_is_idempotent() {
        let files = TestFiles::new();
        let path = files.create("a.txt", b"hello");
        let db = Database::in_memory().unwrap();

        let first = db.add_file(&path).unwrap();
        let second = db.add_file(&path).unwrap();

        assert_eq!(first.id, second.id);
        assert_eq!(db.count().unwrap(), 1);
    }

    #[test]
    fn test_add_missing_file() {
        let db = Database::in_memory().unwrap();
        let result = db.add_file("definitely/not/here.txt");
        assert!(matches!(result, Err(DbError::FileNotFound(_))));
    }

    #[test]
    fn test_tag_names_are_validated() {
        let db = Database::in_memory().unwrap();
        assert!(matches!(db.add_tag(""), Err(DbError::InvalidName(..))));
        assert!(matches!(db.add_tag("a/b"), Err(DbError::InvalidName(..))));
        assert!(matches!(db.add_tag(".."), Err(DbError::InvalidName(..))));
        assert!(db.add_tag("has space").is_ok());
    }

    #[test]
    fn test_tag_names_must_not_be_operators() {
        let db = Database::in_memory().unwrap();
        for name in ["and", "OR", "not", "(", ")", "=", "<=", "!="] {
            assert!(matches!(db.add_tag(name), Err(DbError::InvalidName(..))), "{name}");
        }
        assert!(db.add_tag("f(x)").is_ok());
        assert!(db.add_tag("x<y").is_ok());
        assert!(db.add_value("and").is_ok());
    }

    #[test]
    fn test_tag_file_with_value() {
        let files = TestFiles::new();
        let path = files.create("song.mp3", b"la");
        let db = Database::in_memory().unwrap();

        let file = db.tag_file(&path, &spec("rating=5")).unwrap();
        db.tag_file(&path, &spec("music")).unwrap();

        let rating = db.tag_by_name("rating").unwrap().unwrap();
        let taggings = db.taggings_for_tag(rating.id).unwrap();
        assert_eq!(taggings.len(), 1);
        assert_eq!(taggings[0].file_id, file.id);
        let five = db.value_by_name("5").unwrap().unwrap();
        assert_eq!(taggings[0].value_id, Some(five.id));

        let specs = db.tag_specs_for_file(file.id).unwrap();
        assert_eq!(specs, vec![spec("music"), spec("rating=5")]);
    }

    #[test]
    fn test_values_for_tag_sorted() {
        let files = TestFiles::new();
        let a = files.create("a", b"a");
        let b = files.create("b", b"b");
        let db = Database::in_memory().unwrap();

        db.tag_file(&a, &spec("year=2024")).unwrap();
        db.tag_file(&b, &spec("year=1999")).unwrap();
        db.tag_file(&b, &spec("other=zzz")).unwrap();

        let year = db.tag_by_name("year").unwrap().unwrap();
        assert_eq!(db.values_for_tag(year.id).unwrap().names(), vec!["1999", "2024"]);
    }

    #[test]
    fn test_untag_file() {
        let files = TestFiles::new();
        let path = files.create("a.txt", b"a");
        let db = Database::in_memory().unwrap();

        db.tag_file(&path, &spec("photo")).unwrap();
        db.tag_file(&path, &spec("rating=3")).unwrap();
        db.tag_file(&path, &spec("rating=4")).unwrap();

        assert!(db.untag_file(&path, &spec("rating=3")).unwrap());
        let file = db.file_by_path(&path.canonicalize().unwrap()).unwrap().unwrap();
        assert_eq!(db.tag_specs_for_file(file.id).unwrap(), vec![spec("photo"), spec("rating=4")]);

        assert!(db.untag_file(&path, &spec("rating")).unwrap());
        assert!(!db.untag_file(&path, &spec("rating")).unwrap());
        assert_eq!(db.tagged_file_ids().unwrap().len(), 1);
    }

    #[test]
    fn test_untag_unknown_tag() {
        let files = TestFiles::new();
        let path = files.create("a.txt", b"a");
        let db = Database::in_memory().unwrap();
        db.tag_file(&path, &spec("photo")).unwrap();

        let result = db.untag_file(&path, &spec("video"));
        assert!(matches!(result, Err(DbError::UnknownTag(_))));
    }

    #[test]
    fn test_implications_round_trip() {
        let db = Database::in_memory().unwrap();

        let implication = db.add_implication(&spec("mp3"), &spec("music")).unwrap();
        let music = db.tag_by_name("music").unwrap().unwrap();

        assert_eq!(db.implications_for(music.id).unwrap(), vec![implication]);
        assert_eq!(db.spec_for_pair(&implication.implying).unwrap(), spec("mp3"));

        assert!(db.remove_implication(&spec("mp3"), &spec("music")).unwrap());
        assert!(db.implications().unwrap().is_empty());
    }

    #[test]
    fn test_generation_changes_on_mutation() {
        let files = TestFiles::new();
        let path = files.create("a.txt", b"a");
        let db = Database::in_memory().unwrap();

        let before = db.generation().unwrap();
        db.tag_file(&path, &spec("photo")).unwrap();
        let after_tag = db.generation().unwrap();
        assert_ne!(before, after_tag);

        // Re-adding an unchanged file does not count as a change
        db.add_file(&path).unwrap();
        assert_eq!(db.generation().unwrap(), after_tag);

        db.untag_file(&path, &spec("photo")).unwrap();
        assert_ne!(db.generation().unwrap(), after_tag);
    }

    #[test]
    fn test_tagged_file_ids_excludes_untagged() {
        let files = TestFiles::new();
        let a = files.create("a", b"a");
        let b = files.create("b", b"b");
        let db = Database::in_memory().unwrap();

        let tagged = db.tag_file(&a, &spec("x")).unwrap();
        db.add_file(&b).unwrap();

        let ids = db.tagged_file_ids().unwrap();
        assert_eq!(ids.into_iter().collect::<Vec<_>>(), vec![tagged.id]);
    }
}
