//! Query evaluation against a tag store
//!
//! Evaluation is a pure function of the query tree and the store contents:
//! nothing is cached between calls and the store is only read.
//!
//! Implications widen clauses: with `mp3 => music` recorded, a query for
//! `music` also matches files tagged `mp3`. The expansion follows chains of
//! implications and stops on cycles. Explicit evaluation skips it.

use super::{CompareOp, EvalError, Query, TagClause};
use crate::db::{FileIds, TagId, TagStore, TagValuePair, Tagging};
use std::collections::hash_map::Entry;
use std::collections::{BTreeSet, HashMap, VecDeque};
use tracing::debug;

/// Evaluate a query leniently, optionally without implication expansion
///
/// # Errors
///
/// Returns `EvalError::Store` if the tag store cannot be read.
pub fn evaluate<S: TagStore + ?Sized>(query: &Query, store: &S, explicit: bool) -> Result<FileIds, EvalError> {
    Evaluator::new(store).explicit(explicit).evaluate(query)
}

/// Configurable query evaluator
///
/// # Examples
/// ```no_run
/// use tagfs::db::Database;
/// use tagfs::query::{parse, Evaluator};
///
/// let db = Database::open("tags.db").unwrap();
/// let query = parse("photo and not draft").unwrap();
/// let files = Evaluator::new(&db).strict(true).evaluate(&query).unwrap();
/// ```
pub struct Evaluator<'s, S: TagStore + ?Sized> {
    store: &'s S,
    explicit: bool,
    strict: bool,
}

impl<'s, S: TagStore + ?Sized> Evaluator<'s, S> {
    #[must_use]
    pub const fn new(store: &'s S) -> Self {
        Self { store, explicit: false, strict: false }
    }

    /// Only match taggings applied directly, ignoring implications
    #[must_use]
    pub const fn explicit(mut self, explicit: bool) -> Self {
        self.explicit = explicit;
        self
    }

    /// Fail on tag names unknown to the store instead of matching nothing
    #[must_use]
    pub const fn strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    /// Compute the set of file ids matching `query`
    ///
    /// # Errors
    ///
    /// Returns `EvalError::UnknownTag` in strict mode for unknown tag names,
    /// or `EvalError::Store` if the tag store cannot be read.
    pub fn evaluate(&self, query: &Query) -> Result<FileIds, EvalError> {
        let mut taggings = HashMap::new();
        self.eval(query, &mut taggings)
    }

    fn eval(&self, query: &Query, taggings: &mut TaggingCache) -> Result<FileIds, EvalError> {
        match query {
            Query::Empty => Ok(self.store.tagged_file_ids()?),
            Query::Tag(clause) => self.eval_clause(clause, taggings),
            Query::And(left, right) => {
                let left = self.eval(left, taggings)?;
                if left.is_empty() {
                    return Ok(left);
                }
                let right = self.eval(right, taggings)?;
                Ok(left.intersection(&right).copied().collect())
            }
            Query::Or(left, right) => {
                let mut left = self.eval(left, taggings)?;
                left.extend(self.eval(right, taggings)?);
                Ok(left)
            }
            Query::Not(inner) => {
                let excluded = self.eval(inner, taggings)?;
                let universe = self.store.tagged_file_ids()?;
                Ok(universe.difference(&excluded).copied().collect())
            }
        }
    }

    fn eval_clause(&self, clause: &TagClause, taggings: &mut TaggingCache) -> Result<FileIds, EvalError> {
        let Some(tag) = self.store.tag_by_name(&clause.name)? else {
            if self.strict {
                return Err(EvalError::UnknownTag(clause.name.clone()));
            }
            debug!(tag = %clause.name, "unknown tag in query, matching nothing");
            return Ok(FileIds::new());
        };

        let targets: Vec<TagValuePair> = match &clause.comparison {
            None => vec![TagValuePair::new(tag.id, None)],
            Some(comparison) => self
                .store
                .values()?
                .iter()
                .filter(|value| compare(&value.name, comparison.op, &comparison.value))
                .map(|value| TagValuePair::new(tag.id, Some(value.id)))
                .collect(),
        };

        let pairs = if self.explicit {
            targets.into_iter().collect()
        } else {
            self.expand(targets)?
        };

        let mut files = FileIds::new();
        for pair in &pairs {
            let tag_taggings = match taggings.entry(pair.tag_id) {
                Entry::Occupied(entry) => entry.into_mut(),
                Entry::Vacant(entry) => entry.insert(self.store.taggings_for_tag(pair.tag_id)?),
            };
            files.extend(tag_taggings.iter().filter(|t| pair.covers(t)).map(|t| t.file_id));
        }
        Ok(files)
    }

    /// All pairs that imply, directly or transitively, one of `targets`
    fn expand(&self, targets: Vec<TagValuePair>) -> Result<BTreeSet<TagValuePair>, EvalError> {
        let mut seen: BTreeSet<TagValuePair> = targets.iter().copied().collect();
        let mut queue: VecDeque<TagValuePair> = targets.into();

        while let Some(pair) = queue.pop_front() {
            for implication in self.store.implications_for(pair.tag_id)? {
                let satisfies = pair.value_id.is_none_or(|v| implication.implied.value_id == Some(v));
                if satisfies && seen.insert(implication.implying) {
                    queue.push_back(implication.implying);
                }
            }
        }

        Ok(seen)
    }
}

type TaggingCache = HashMap<TagId, Vec<Tagging>>;

/// Compare a stored value against a query value
///
/// Numeric when both sides parse as numbers, lexicographic otherwise.
fn compare(actual: &str, op: CompareOp, expected: &str) -> bool {
    let ordering = match (actual.parse::<f64>(), expected.parse::<f64>()) {
        (Ok(a), Ok(b)) => a.partial_cmp(&b),
        _ => Some(actual.cmp(expected)),
    };
    ordering.is_some_and(|o| op.accepts(o))
}
