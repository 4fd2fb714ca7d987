//! Directory listings of the virtual tree

use crate::db::{File, FileId};
use std::collections::{BTreeSet, HashMap};
use std::path::{Path, PathBuf};

/// Operator pseudo-entries, in listing order
pub const OPERATORS: [&str; 3] = ["and", "or", "not"];

/// What a directory entry stands for
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntryKind {
    Tag,
    Value,
    Operator,
    /// Leaf delegating to a real file or directory
    File { file_id: FileId, path: PathBuf },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirEntry {
    pub name: String,
    pub kind: EntryKind,
}

impl DirEntry {
    #[must_use]
    pub fn tag(name: impl Into<String>) -> Self {
        Self { name: name.into(), kind: EntryKind::Tag }
    }

    #[must_use]
    pub fn value(name: impl Into<String>) -> Self {
        Self { name: name.into(), kind: EntryKind::Value }
    }

    #[must_use]
    pub fn operator(name: &str) -> Self {
        Self { name: name.to_string(), kind: EntryKind::Operator }
    }

    #[must_use]
    pub fn file(name: impl Into<String>, file_id: FileId, path: PathBuf) -> Self {
        Self { name: name.into(), kind: EntryKind::File { file_id, path } }
    }

    /// Real path behind a file leaf
    #[must_use]
    pub fn real_path(&self) -> Option<&Path> {
        match &self.kind {
            EntryKind::File { path, .. } => Some(path),
            _ => None,
        }
    }

    /// Synthesized entries are always directories, file leaves follow the real path
    #[must_use]
    pub fn is_dir(&self) -> bool {
        match &self.kind {
            EntryKind::File { path, .. } => path.is_dir(),
            _ => true,
        }
    }
}

/// Ordered entries of one virtual directory
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Listing {
    entries: Vec<DirEntry>,
}

impl Listing {
    /// Assemble a listing in display order
    ///
    /// Tags are sorted and deduplicated, files are sorted by name, and file
    /// names shadow tags and operators. Operators are only added when at least
    /// one tag or file is present.
    #[must_use]
    pub fn assemble(tags: impl IntoIterator<Item = String>, mut files: Vec<DirEntry>, operators: &[&str]) -> Self {
        files.sort_by(|a, b| a.name.cmp(&b.name));
        let file_names: BTreeSet<&str> = files.iter().map(|f| f.name.as_str()).collect();

        let tags: BTreeSet<String> = tags
            .into_iter()
            .filter(|t| !file_names.contains(t.as_str()))
            .collect();

        let mut entries: Vec<DirEntry> = tags.into_iter().map(DirEntry::tag).collect();
        let has_operands = !entries.is_empty() || !files.is_empty();
        let operators: Vec<DirEntry> = if has_operands {
            operators
                .iter()
                .filter(|op| !file_names.contains(**op))
                .map(|op| DirEntry::operator(op))
                .collect()
        } else {
            Vec::new()
        };

        entries.extend(files);
        entries.extend(operators);
        Self { entries }
    }

    #[must_use]
    pub fn find(&self, name: &str) -> Option<&DirEntry> {
        self.entries.iter().find(|e| e.name == name)
    }

    /// The file leaf named `name`, if any
    #[must_use]
    pub fn find_file(&self, name: &str) -> Option<&DirEntry> {
        self.find(name).filter(|e| matches!(e.kind, EntryKind::File { .. }))
    }

    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        self.entries.iter().map(|e| e.name.as_str()).collect()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, DirEntry> {
        self.entries.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl From<Vec<DirEntry>> for Listing {
    fn from(entries: Vec<DirEntry>) -> Self {
        Self { entries }
    }
}

impl<'a> IntoIterator for &'a Listing {
    type Item = &'a DirEntry;
    type IntoIter = std::slice::Iter<'a, DirEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

/// File leaf entries for `files`, renaming colliding basenames to `stem.<id>.ext`
#[must_use]
pub fn file_entries(files: &[File]) -> Vec<DirEntry> {
    let mut counts: HashMap<String, usize> = HashMap::new();
    for file in files {
        *counts.entry(file.basename()).or_default() += 1;
    }

    files
        .iter()
        .map(|file| {
            let basename = file.basename();
            let name = if counts.get(&basename).copied().unwrap_or_default() > 1 {
                disambiguate(&file.path, file.id)
            } else {
                basename
            };
            DirEntry::file(name, file.id, file.path.clone())
        })
        .collect()
}

fn disambiguate(path: &Path, id: FileId) -> String {
    let stem = path
        .file_stem()
        .map_or_else(String::new, |s| s.to_string_lossy().into_owned());
    match path.extension() {
        Some(ext) => format!("{stem}.{id}.{}", ext.to_string_lossy()),
        None => format!("{stem}.{id}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn file(id: u64, path: &str) -> File {
        File {
            id: FileId(id),
            path: PathBuf::from(path),
            fingerprint: String::new(),
            size: 0,
            mod_time: Utc::now(),
        }
    }

    #[test]
    fn test_assemble_order() {
        let files = vec![
            DirEntry::file("z.txt", FileId(1), PathBuf::from("/z.txt")),
            DirEntry::file("a.txt", FileId(2), PathBuf::from("/a.txt")),
        ];
        let listing = Listing::assemble(["music".to_string(), "art".to_string()], files, &OPERATORS);
        assert_eq!(
            listing.names(),
            vec!["art", "music", "a.txt", "z.txt", "and", "or", "not"]
        );
    }

    #[test]
    fn test_assemble_without_operands_has_no_operators() {
        let listing = Listing::assemble(Vec::new(), Vec::new(), &OPERATORS);
        assert!(listing.is_empty());
    }

    #[test]
    fn test_file_shadows_tag_and_operator() {
        let files = vec![
            DirEntry::file("photo", FileId(1), PathBuf::from("/x/photo")),
            DirEntry::file("or", FileId(2), PathBuf::from("/x/or")),
        ];
        let listing = Listing::assemble(["photo".to_string()], files, &OPERATORS);
        assert_eq!(listing.names(), vec!["or", "photo", "and", "not"]);
        assert!(listing.find_file("photo").is_some());
        assert!(listing.find_file("or").is_some());
    }

    #[test]
    fn test_colliding_basenames() {
        let files = [file(3, "/a/notes.txt"), file(7, "/b/notes.txt"), file(9, "/c/README")];
        let names: Vec<String> = file_entries(&files).into_iter().map(|e| e.name).collect();
        assert_eq!(names, vec!["notes.3.txt", "notes.7.txt", "README"]);
    }

    #[test]
    fn test_colliding_basenames_without_extension() {
        let files = [file(1, "/a/Makefile"), file(2, "/b/Makefile")];
        let names: Vec<String> = file_entries(&files).into_iter().map(|e| e.name).collect();
        assert_eq!(names, vec!["Makefile.1", "Makefile.2"]);
    }

    #[test]
    fn test_synthesized_entries_are_directories() {
        assert!(DirEntry::tag("x").is_dir());
        assert!(DirEntry::operator("and").is_dir());
        assert!(DirEntry::tag("x").real_path().is_none());
    }
}
