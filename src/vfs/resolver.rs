//! Virtual path resolution
//!
//! Each path segment extends an incremental query state. For example
//! `/photo/and/not/draft` builds `photo and not draft`, `/rating/>=` lists
//! the values of `rating`, and `/photo/a.jpg` reaches the real file behind
//! `a.jpg`. Segments are tried in this order:
//!
//! 1. below a file leaf, a child of the real path
//! 2. below a value directory, one of its values
//! 3. in a complete query, a file leaf of the current listing
//! 4. operator keywords and parentheses
//! 5. a bare comparison operator after a tag, opening a value directory
//! 6. the exact name of a tag, so every listed tag reads back as itself
//! 7. a query fragment, joined with an implicit `and`

use super::cache::{DirectoryCache, ListingKey};
use super::listing::{DirEntry, EntryKind, Listing, OPERATORS, file_entries};
use super::VfsError;
use crate::db::{FileId, TagStore, Values};
use crate::query::{self, CompareOp, Query, TagClause};
use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;
use tracing::debug;

/// One path segment's contribution to a query state
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    Operand(Query),
    And,
    Or,
    Not,
    Open,
    Close,
}

/// Query accumulated from the segments of a virtual path
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryState {
    steps: Vec<Step>,
}

impl QueryState {
    #[must_use]
    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    /// The parsed query, `None` while the state is incomplete
    #[must_use]
    pub fn query(&self) -> Option<Query> {
        if self.steps.is_empty() {
            return None;
        }
        query::parse(&self.to_string()).ok()
    }

    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.query().is_some()
    }

    fn push(&mut self, step: Step) {
        self.steps.push(step);
    }

    fn ends_with_operand(&self) -> bool {
        matches!(self.steps.last(), Some(Step::Operand(_) | Step::Close))
    }

    fn open_groups(&self) -> usize {
        let opened = self.steps.iter().filter(|s| **s == Step::Open).count();
        let closed = self.steps.iter().filter(|s| **s == Step::Close).count();
        opened.saturating_sub(closed)
    }

    /// The trailing clause if it is a bare tag name
    fn trailing_bare_tag(&self) -> Option<&str> {
        match self.steps.last() {
            Some(Step::Operand(Query::Tag(TagClause { name, comparison: None }))) => Some(name),
            _ => None,
        }
    }
}

impl fmt::Display for QueryState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, step) in self.steps.iter().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            match step {
                Step::Operand(q @ Query::Tag(_)) => write!(f, "{q}")?,
                Step::Operand(q) => write!(f, "({q})")?,
                Step::And => f.write_str("and")?,
                Step::Or => f.write_str("or")?,
                Step::Not => f.write_str("not")?,
                Step::Open => f.write_str("(")?,
                Step::Close => f.write_str(")")?,
            }
        }
        Ok(())
    }
}

/// Node a virtual path resolves to
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    Root,
    /// Query directory, complete or pending
    Query(QueryState),
    /// Values of `tag` that can complete `tag op value`
    TagValues { state: QueryState, tag: String, op: CompareOp, values: Values },
    /// Leaf delegating to a real path
    File { file_id: FileId, path: PathBuf },
}

impl Node {
    #[must_use]
    pub const fn is_synthesized(&self) -> bool {
        !matches!(self, Self::File { .. })
    }
}

/// Resolves virtual paths and builds their listings
pub struct Resolver<'a, S: TagStore + ?Sized> {
    store: &'a S,
    cache: &'a DirectoryCache,
    explicit: bool,
}

impl<'a, S: TagStore + ?Sized> Resolver<'a, S> {
    #[must_use]
    pub const fn new(store: &'a S, cache: &'a DirectoryCache, explicit: bool) -> Self {
        Self { store, cache, explicit }
    }

    /// Resolve a virtual path relative to the mount root
    ///
    /// # Errors
    ///
    /// Returns `VfsError::NotFound` if a segment cannot be interpreted, or a
    /// store/evaluation error raised while building intermediate listings.
    pub fn resolve_path(&self, path: &Path) -> Result<Node, VfsError> {
        let segments: Vec<String> = path
            .components()
            .filter_map(|c| match c {
                Component::Normal(s) => Some(s.to_string_lossy().into_owned()),
                _ => None,
            })
            .collect();
        self.resolve(&segments)
    }

    /// Resolve path segments starting at the root
    ///
    /// # Errors
    ///
    /// Same as [`Resolver::resolve_path`].
    pub fn resolve<T: AsRef<str>>(&self, segments: &[T]) -> Result<Node, VfsError> {
        segments
            .iter()
            .try_fold(Node::Root, |node, segment| self.lookup(&node, segment.as_ref()))
    }

    /// Resolve a single segment below `parent`
    ///
    /// # Errors
    ///
    /// Returns `VfsError::NotFound` if `name` has no meaning below `parent`.
    pub fn lookup(&self, parent: &Node, name: &str) -> Result<Node, VfsError> {
        let node = self.step(parent, name)?;
        debug!(segment = name, ?node, "resolved");
        Ok(node)
    }

    fn step(&self, parent: &Node, name: &str) -> Result<Node, VfsError> {
        let not_found = || VfsError::NotFound(name.to_string());

        let state = match parent {
            Node::File { file_id, path } => {
                let child = path.join(name);
                if name == ".." || name == "." || std::fs::symlink_metadata(&child).is_err() {
                    return Err(not_found());
                }
                return Ok(Node::File { file_id: *file_id, path: child });
            }
            Node::TagValues { state, tag, op, values } => {
                if !values.contains_name(name) {
                    return Err(not_found());
                }
                let mut state = state.clone();
                state.steps.pop();
                state.push(Step::Operand(Query::compare(tag.clone(), *op, name)));
                return Ok(Node::Query(state));
            }
            Node::Root => QueryState::default(),
            Node::Query(state) => {
                if state.is_complete() {
                    let listing = self.listing(parent)?;
                    if let Some(DirEntry { kind: EntryKind::File { file_id, path }, .. }) = listing.find_file(name) {
                        return Ok(Node::File { file_id: *file_id, path: path.clone() });
                    }
                }
                state.clone()
            }
        };

        self.extend(state, name)
    }

    /// Extend a query state with an operator, a value directory, an exact tag
    /// name or a query fragment, in that order
    fn extend(&self, mut state: QueryState, name: &str) -> Result<Node, VfsError> {
        let keyword = match name.to_ascii_lowercase().as_str() {
            "and" if state.ends_with_operand() => Some(Step::And),
            "or" if state.ends_with_operand() => Some(Step::Or),
            "not" => Some(Step::Not),
            "(" => Some(Step::Open),
            ")" if state.ends_with_operand() && state.open_groups() > 0 => Some(Step::Close),
            _ => None,
        };
        if let Some(step) = keyword {
            state.push(step);
            return Ok(Node::Query(state));
        }

        if let Some(op) = CompareOp::from_symbol(name)
            && let Some(tag_name) = state.trailing_bare_tag()
            && let Some(tag) = self.store.tag_by_name(tag_name)?
        {
            let values = self.store.values_for_tag(tag.id)?;
            return Ok(Node::TagValues { tag: tag.name, op, values, state });
        }

        if let Some(tag) = self.store.tag_by_name(name)? {
            state.push(Step::Operand(Query::tag(tag.name)));
            return Ok(Node::Query(state));
        }

        let fragment = query::parse(name).map_err(|_| VfsError::NotFound(name.to_string()))?;
        state.push(Step::Operand(fragment));
        Ok(Node::Query(state))
    }

    /// Listing of a directory node
    ///
    /// # Errors
    ///
    /// Returns `VfsError::NotADirectory` for leaves backed by regular files, or
    /// a store/evaluation/I/O error.
    pub fn listing(&self, node: &Node) -> Result<Arc<Listing>, VfsError> {
        match node {
            Node::File { file_id, path } => Ok(Arc::new(real_listing(*file_id, path)?)),
            Node::TagValues { tag, values, .. } => {
                let generation = self.store.generation()?;
                self.cache.listing(&ListingKey::Values(tag.clone()), generation, || {
                    let mut values = values.clone();
                    values.sort_by_name();
                    Ok(Listing::from(values.iter().map(|v| DirEntry::value(v.name.clone())).collect::<Vec<_>>()))
                })
            }
            Node::Root => self.all_tags_listing(),
            Node::Query(state) => match state.query() {
                None => self.all_tags_listing(),
                Some(query) => {
                    let generation = self.store.generation()?;
                    self.cache
                        .listing(&ListingKey::query(&query), generation, || self.query_listing(&query))
                }
            },
        }
    }

    fn all_tags_listing(&self) -> Result<Arc<Listing>, VfsError> {
        let generation = self.store.generation()?;
        self.cache.listing(&ListingKey::AllTags, generation, || {
            let tags = self.store.tags()?.into_iter().map(|t| t.name);
            Ok(Listing::assemble(tags, Vec::new(), &["not"]))
        })
    }

    fn query_listing(&self, query: &Query) -> Result<Listing, VfsError> {
        let matched = query::evaluate(query, self.store, self.explicit)?;

        let mut files = Vec::with_capacity(matched.len());
        for id in &matched {
            match self.store.file_by_id(*id)? {
                Some(file) => files.push(file),
                None => debug!(file_id = %id, "tagging refers to missing file"),
            }
        }

        let named = query.tag_names();
        let tag_names: HashMap<_, _> = self.store.tags()?.into_iter().map(|t| (t.id, t.name)).collect();
        let mut tags = BTreeSet::new();
        for file in &files {
            for tagging in self.store.taggings_for_file(file.id)? {
                if let Some(name) = tag_names.get(&tagging.tag_id)
                    && !named.contains(name.as_str())
                {
                    tags.insert(name.clone());
                }
            }
        }

        Ok(Listing::assemble(tags, file_entries(&files), &OPERATORS))
    }
}

/// Children of a real directory behind a file leaf
fn real_listing(file_id: FileId, path: &Path) -> Result<Listing, VfsError> {
    if !path.is_dir() {
        return Err(VfsError::NotADirectory(path.display().to_string()));
    }

    let mut entries = Vec::new();
    for entry in std::fs::read_dir(path)? {
        let entry = entry?;
        entries.push(DirEntry::file(entry.file_name().to_string_lossy().into_owned(), file_id, entry.path()));
    }
    entries.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(Listing::from(entries))
}
