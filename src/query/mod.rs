//! Tag query language
//!
//! A query is a boolean expression over tag clauses:
//!
//! ```text
//! photo and not (draft or rating<3)
//! ```
//!
//! Adjacent clauses are joined with an implicit `and`. The [`Display`] form of
//! a [`Query`] is its canonical serialization and always parses back to the
//! same tree.
//!
//! [`Display`]: std::fmt::Display

use std::cmp::Ordering;
use std::collections::BTreeSet;
use std::fmt;

pub mod error;
pub mod evaluator;
pub mod parser;

pub use error::{EvalError, ParseError};
pub use evaluator::{Evaluator, evaluate};
pub use parser::parse;

/// Operator keywords recognized by the parser (case-insensitive)
pub const KEYWORDS: [&str; 3] = ["and", "or", "not"];

/// Comparison operator of a valued clause
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum CompareOp {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

impl CompareOp {
    pub const ALL: [Self; 6] = [Self::Eq, Self::Ne, Self::Lt, Self::Le, Self::Gt, Self::Ge];

    #[must_use]
    pub const fn symbol(self) -> &'static str {
        match self {
            Self::Eq => "=",
            Self::Ne => "!=",
            Self::Lt => "<",
            Self::Le => "<=",
            Self::Gt => ">",
            Self::Ge => ">=",
        }
    }

    /// Parse an operator written on its own, e.g. a path segment
    #[must_use]
    pub fn from_symbol(symbol: &str) -> Option<Self> {
        match symbol {
            "=" | "==" => Some(Self::Eq),
            "!=" => Some(Self::Ne),
            "<" => Some(Self::Lt),
            "<=" => Some(Self::Le),
            ">" => Some(Self::Gt),
            ">=" => Some(Self::Ge),
            _ => None,
        }
    }

    /// Whether `actual.cmp(expected) == ordering` satisfies this operator
    #[must_use]
    pub const fn accepts(self, ordering: Ordering) -> bool {
        match self {
            Self::Eq => ordering.is_eq(),
            Self::Ne => ordering.is_ne(),
            Self::Lt => ordering.is_lt(),
            Self::Le => ordering.is_le(),
            Self::Gt => ordering.is_gt(),
            Self::Ge => ordering.is_ge(),
        }
    }
}

impl fmt::Display for CompareOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

/// `op value` part of a clause such as `rating>=4`
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Comparison {
    pub op: CompareOp,
    pub value: String,
}

/// A single tag reference, optionally constrained by value
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TagClause {
    pub name: String,
    pub comparison: Option<Comparison>,
}

/// Parsed tag query
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Query {
    /// Matches every tagged file
    Empty,
    Tag(TagClause),
    And(Box<Query>, Box<Query>),
    Or(Box<Query>, Box<Query>),
    Not(Box<Query>),
}

impl Query {
    #[must_use]
    pub fn tag(name: impl Into<String>) -> Self {
        Self::Tag(TagClause { name: name.into(), comparison: None })
    }

    #[must_use]
    pub fn compare(name: impl Into<String>, op: CompareOp, value: impl Into<String>) -> Self {
        Self::Tag(TagClause {
            name: name.into(),
            comparison: Some(Comparison { op, value: value.into() }),
        })
    }

    #[must_use]
    pub fn and(left: Self, right: Self) -> Self {
        Self::And(Box::new(left), Box::new(right))
    }

    #[must_use]
    pub fn or(left: Self, right: Self) -> Self {
        Self::Or(Box::new(left), Box::new(right))
    }

    #[allow(clippy::should_implement_trait)]
    #[must_use]
    pub fn not(inner: Self) -> Self {
        Self::Not(Box::new(inner))
    }

    /// Join two queries with `and`, treating `Empty` as the identity
    #[must_use]
    pub fn conjoin(self, other: Self) -> Self {
        match (self, other) {
            (Self::Empty, q) | (q, Self::Empty) => q,
            (l, r) => Self::and(l, r),
        }
    }

    /// Normal form shared by logically equal queries
    ///
    /// Nested `and`/`or` chains are flattened, their operands sorted and the
    /// tree rebuilt left-deep, so `a and (c and b)` and `(b and a) and c`
    /// produce the same value.
    #[must_use]
    pub fn canonical(&self) -> Self {
        match self {
            Self::Empty | Self::Tag(_) => self.clone(),
            Self::Not(inner) => Self::not(inner.canonical()),
            Self::And(..) => {
                let mut operands = Vec::new();
                self.collect_and(&mut operands);
                rebuild(operands, Self::and)
            }
            Self::Or(..) => {
                let mut operands = Vec::new();
                self.collect_or(&mut operands);
                rebuild(operands, Self::or)
            }
        }
    }

    fn collect_and(&self, out: &mut Vec<Self>) {
        match self {
            Self::And(l, r) => {
                l.collect_and(out);
                r.collect_and(out);
            }
            other => out.push(other.canonical()),
        }
    }

    fn collect_or(&self, out: &mut Vec<Self>) {
        match self {
            Self::Or(l, r) => {
                l.collect_or(out);
                r.collect_or(out);
            }
            other => out.push(other.canonical()),
        }
    }

    /// Names of every tag referenced by a clause
    #[must_use]
    pub fn tag_names(&self) -> BTreeSet<&str> {
        let mut names = BTreeSet::new();
        self.visit_clauses(&mut |clause| {
            names.insert(clause.name.as_str());
        });
        names
    }

    fn visit_clauses<'a>(&'a self, f: &mut impl FnMut(&'a TagClause)) {
        match self {
            Self::Empty => {}
            Self::Tag(clause) => f(clause),
            Self::And(l, r) | Self::Or(l, r) => {
                l.visit_clauses(f);
                r.visit_clauses(f);
            }
            Self::Not(inner) => inner.visit_clauses(f),
        }
    }

    const fn precedence(&self) -> u8 {
        match self {
            Self::Or(..) => 1,
            Self::And(..) => 2,
            Self::Not(_) => 3,
            Self::Empty | Self::Tag(_) => 4,
        }
    }

    fn fmt_operand(&self, f: &mut fmt::Formatter<'_>, min_precedence: u8) -> fmt::Result {
        if self.precedence() < min_precedence {
            write!(f, "({self})")
        } else {
            write!(f, "{self}")
        }
    }
}

fn rebuild(mut operands: Vec<Query>, join: fn(Query, Query) -> Query) -> Query {
    operands.sort();
    let mut iter = operands.into_iter();
    let first = iter.next().unwrap_or(Query::Empty);
    iter.fold(first, join)
}

impl fmt::Display for Query {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => Ok(()),
            Self::Tag(clause) => write!(f, "{clause}"),
            Self::And(l, r) => {
                l.fmt_operand(f, 2)?;
                f.write_str(" and ")?;
                r.fmt_operand(f, 3)
            }
            Self::Or(l, r) => {
                l.fmt_operand(f, 1)?;
                f.write_str(" or ")?;
                r.fmt_operand(f, 2)
            }
            Self::Not(inner) => {
                f.write_str("not ")?;
                inner.fmt_operand(f, 3)
            }
        }
    }
}

impl fmt::Display for TagClause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&quote(&self.name))?;
        if let Some(comparison) = &self.comparison {
            write!(f, "{}{}", comparison.op, quote(&comparison.value))?;
        }
        Ok(())
    }
}

/// Whether a character ends an unquoted name
#[must_use]
pub fn is_reserved(c: char) -> bool {
    c.is_whitespace() || matches!(c, '(' | ')' | '=' | '!' | '<' | '>' | '"' | '\\')
}

/// Whether a word is an operator keyword
#[must_use]
pub fn is_keyword(word: &str) -> bool {
    KEYWORDS.iter().any(|k| k.eq_ignore_ascii_case(word))
}

/// Write a name or value so the parser reads it back unchanged
#[must_use]
pub fn quote(text: &str) -> String {
    if !text.is_empty() && !text.chars().any(is_reserved) && !is_keyword(text) {
        return text.to_string();
    }

    let mut quoted = String::with_capacity(text.len() + 2);
    quoted.push('"');
    for c in text.chars() {
        if matches!(c, '"' | '\\') {
            quoted.push('\\');
        }
        quoted.push(c);
    }
    quoted.push('"');
    quoted
}
