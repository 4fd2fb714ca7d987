//! Read interface of the tag store
//!
//! Query evaluation and the virtual filesystem only ever see the store through
//! this trait. Implementations must not change state as a side effect of any
//! of these calls.

use super::DbError;
use super::types::{File, FileId, FileIds, Implication, Tag, TagId, Tagging, Value, Values};
use std::path::Path;

/// Read-only view of files, tags, values, taggings and implications
pub trait TagStore {
    /// Resolve a tag by its exact name
    ///
    /// # Errors
    ///
    /// Returns `DbError` if the store cannot be queried.
    fn tag_by_name(&self, name: &str) -> Result<Option<Tag>, DbError>;

    /// All tags, sorted by name
    ///
    /// # Errors
    ///
    /// Returns `DbError` if the store cannot be queried.
    fn tags(&self) -> Result<Vec<Tag>, DbError>;

    /// Resolve a value by its exact name
    ///
    /// # Errors
    ///
    /// Returns `DbError` if the store cannot be queried.
    fn value_by_name(&self, name: &str) -> Result<Option<Value>, DbError>;

    /// Every value in the store, sorted by name
    ///
    /// # Errors
    ///
    /// Returns `DbError` if the store cannot be queried.
    fn values(&self) -> Result<Values, DbError>;

    /// Distinct values used with a tag, sorted by name
    ///
    /// # Errors
    ///
    /// Returns `DbError` if the store cannot be queried.
    fn values_for_tag(&self, tag_id: TagId) -> Result<Values, DbError>;

    /// Every tagging of a tag, with or without a value
    ///
    /// # Errors
    ///
    /// Returns `DbError` if the store cannot be queried.
    fn taggings_for_tag(&self, tag_id: TagId) -> Result<Vec<Tagging>, DbError>;

    /// Every tagging of a file
    ///
    /// # Errors
    ///
    /// Returns `DbError` if the store cannot be queried.
    fn taggings_for_file(&self, file_id: FileId) -> Result<Vec<Tagging>, DbError>;

    /// Implications whose implied side is the given tag
    ///
    /// # Errors
    ///
    /// Returns `DbError` if the store cannot be queried.
    fn implications_for(&self, implied_tag: TagId) -> Result<Vec<Implication>, DbError>;

    /// Every implication in the store
    ///
    /// # Errors
    ///
    /// Returns `DbError` if the store cannot be queried.
    fn implications(&self) -> Result<Vec<Implication>, DbError>;

    /// # Errors
    ///
    /// Returns `DbError` if the store cannot be queried.
    fn file_by_id(&self, id: FileId) -> Result<Option<File>, DbError>;

    /// # Errors
    ///
    /// Returns `DbError` if the store cannot be queried.
    fn file_by_path(&self, path: &Path) -> Result<Option<File>, DbError>;

    /// Ids of all files carrying at least one tag
    ///
    /// This is the universe that negation complements against.
    ///
    /// # Errors
    ///
    /// Returns `DbError` if the store cannot be queried.
    fn tagged_file_ids(&self) -> Result<FileIds, DbError>;

    /// Change counter, different after any committed mutation
    ///
    /// # Errors
    ///
    /// Returns `DbError` if the store cannot be queried.
    fn generation(&self) -> Result<u64, DbError>;
}

impl<T: TagStore + ?Sized> TagStore for &T {
    fn tag_by_name(&self, name: &str) -> Result<Option<Tag>, DbError> {
        (**self).tag_by_name(name)
    }

    fn tags(&self) -> Result<Vec<Tag>, DbError> {
        (**self).tags()
    }

    fn value_by_name(&self, name: &str) -> Result<Option<Value>, DbError> {
        (**self).value_by_name(name)
    }

    fn values(&self) -> Result<Values, DbError> {
        (**self).values()
    }

    fn values_for_tag(&self, tag_id: TagId) -> Result<Values, DbError> {
        (**self).values_for_tag(tag_id)
    }

    fn taggings_for_tag(&self, tag_id: TagId) -> Result<Vec<Tagging>, DbError> {
        (**self).taggings_for_tag(tag_id)
    }

    fn taggings_for_file(&self, file_id: FileId) -> Result<Vec<Tagging>, DbError> {
        (**self).taggings_for_file(file_id)
    }

    fn implications_for(&self, implied_tag: TagId) -> Result<Vec<Implication>, DbError> {
        (**self).implications_for(implied_tag)
    }

    fn implications(&self) -> Result<Vec<Implication>, DbError> {
        (**self).implications()
    }

    fn file_by_id(&self, id: FileId) -> Result<Option<File>, DbError> {
        (**self).file_by_id(id)
    }

    fn file_by_path(&self, path: &Path) -> Result<Option<File>, DbError> {
        (**self).file_by_path(path)
    }

    fn tagged_file_ids(&self) -> Result<FileIds, DbError> {
        (**self).tagged_file_ids()
    }

    fn generation(&self) -> Result<u64, DbError> {
        (**self).generation()
    }
}
