//! Entity types stored in the tag database
//!
//! These are plain data carriers read out of the store. The core never mutates
//! them; it only references files, tags and values by id.
//!
//! # Types
//!
//! - **`File`**: a tracked file with its fingerprint, size and modification time
//! - **`Tag`** / **`Value`**: named labels and optional tag qualifiers
//! - **`Tagging`**: association of a file with a tag and optional value
//! - **`Implication`**: a rule that one tag/value pair entails another
//!
//! # Examples
//!
//! ```
//! use tagfs::db::types::{ValueId, ValueIds};
//!
//! let ids = ValueIds::from(vec![ValueId(3), ValueId(1), ValueId(2), ValueId(1), ValueId(3)]);
//! assert_eq!(ids.uniq().as_slice(), &[ValueId(1), ValueId(2), ValueId(3)]);
//! ```

use chrono::{DateTime, Utc};
use std::collections::BTreeSet;
use std::fmt;
use std::path::PathBuf;

macro_rules! entity_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
        pub struct $name(pub u64);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

entity_id!(
    /// Identifier of a tracked file
    FileId
);
entity_id!(
    /// Identifier of a tag
    TagId
);
entity_id!(
    /// Identifier of a tag value
    ValueId
);

/// Ordered, duplicate-free set of file ids produced by query evaluation
pub type FileIds = BTreeSet<FileId>;

/// A file known to the tag store
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct File {
    pub id: FileId,
    /// Absolute path of the real file
    pub path: PathBuf,
    /// SHA-256 of the content (empty for directories)
    pub fingerprint: String,
    pub size: u64,
    pub mod_time: DateTime<Utc>,
}

impl File {
    /// Final path component, used as the entry name in virtual directories
    #[must_use]
    pub fn basename(&self) -> String {
        self.path
            .file_name()
            .map_or_else(|| self.path.display().to_string(), |n| n.to_string_lossy().into_owned())
    }
}

/// A named label applicable to files
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Tag {
    pub id: TagId,
    pub name: String,
}

/// An optional qualifier on a tagging, e.g. `5` in `rating=5`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Value {
    pub id: ValueId,
    pub name: String,
}

/// Association of a file with a tag and an optional value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Tagging {
    pub file_id: FileId,
    pub tag_id: TagId,
    pub value_id: Option<ValueId>,
}

/// One side of an implication
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TagValuePair {
    pub tag_id: TagId,
    /// `None` on the implying side matches any tagging of the tag
    pub value_id: Option<ValueId>,
}

impl TagValuePair {
    #[must_use]
    pub const fn new(tag_id: TagId, value_id: Option<ValueId>) -> Self {
        Self { tag_id, value_id }
    }

    /// Whether a tagging carries this pair
    #[must_use]
    pub fn covers(&self, tagging: &Tagging) -> bool {
        self.tag_id == tagging.tag_id
            && self.value_id.is_none_or(|value_id| tagging.value_id == Some(value_id))
    }
}

/// Rule that taggings with `implying` also count as taggings with `implied`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Implication {
    pub implying: TagValuePair,
    pub implied: TagValuePair,
}

/// Collection of values
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Values(Vec<Value>);

impl Values {
    #[must_use]
    pub const fn new() -> Self {
        Self(Vec::new())
    }

    /// Whether a value with the same id is present
    #[must_use]
    pub fn contains(&self, value: &Value) -> bool {
        self.0.iter().any(|v| v.id == value.id)
    }

    #[must_use]
    pub fn contains_name(&self, name: &str) -> bool {
        self.0.iter().any(|v| v.name == name)
    }

    pub fn any<F: Fn(&Value) -> bool>(&self, predicate: F) -> bool {
        self.0.iter().any(predicate)
    }

    #[must_use]
    pub fn find_by_name(&self, name: &str) -> Option<&Value> {
        self.0.iter().find(|v| v.name == name)
    }

    #[must_use]
    pub fn find_by_id(&self, id: ValueId) -> Option<&Value> {
        self.0.iter().find(|v| v.id == id)
    }

    /// Sort by name, the order used when listing values
    pub fn sort_by_name(&mut self) {
        self.0.sort_by(|a, b| a.name.cmp(&b.name));
    }

    #[must_use]
    pub fn names(&self) -> Vec<String> {
        self.0.iter().map(|v| v.name.clone()).collect()
    }

    #[must_use]
    pub fn ids(&self) -> ValueIds {
        ValueIds(self.0.iter().map(|v| v.id).collect())
    }

    pub fn push(&mut self, value: Value) {
        self.0.push(value);
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Value> {
        self.0.iter()
    }
}

impl From<Vec<Value>> for Values {
    fn from(values: Vec<Value>) -> Self {
        Self(values)
    }
}

impl FromIterator<Value> for Values {
    fn from_iter<I: IntoIterator<Item = Value>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl<'a> IntoIterator for &'a Values {
    type Item = &'a Value;
    type IntoIter = std::slice::Iter<'a, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// A tag name with an optional value, as written on the command line (`rating=5`)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagSpec {
    pub tag: String,
    pub value: Option<String>,
}

impl TagSpec {
    #[must_use]
    pub fn new(tag: impl Into<String>, value: Option<String>) -> Self {
        Self { tag: tag.into(), value }
    }
}

impl std::str::FromStr for TagSpec {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.split_once('=') {
            Some((tag, value)) => Self::new(tag, Some(value.to_string())),
            None => Self::new(s, None),
        })
    }
}

impl fmt::Display for TagSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.value {
            Some(value) => write!(f, "{}={value}", self.tag),
            None => write!(f, "{}", self.tag),
        }
    }
}

/// List of value ids
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValueIds(Vec<ValueId>);

impl ValueIds {
    /// Sort ascending and drop duplicates
    #[must_use]
    pub fn uniq(mut self) -> Self {
        self.0.sort_unstable();
        self.0.dedup();
        self
    }

    #[must_use]
    pub fn as_slice(&self) -> &[ValueId] {
        &self.0
    }

    #[must_use]
    pub fn into_inner(self) -> Vec<ValueId> {
        self.0
    }
}

impl From<Vec<ValueId>> for ValueIds {
    fn from(ids: Vec<ValueId>) -> Self {
        Self(ids)
    }
}

#[cfg(test)]
#[path = "types_tests.rs"]
mod types_tests;
