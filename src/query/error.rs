//! Query error types
//!
//! - **`ParseError`**: the text is not a well-formed query; no partial tree is produced
//! - **`EvalError`**: evaluation could not complete against the tag store

use crate::db::DbError;
use thiserror::Error;

/// Errors produced while parsing query text
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    /// A token appeared where it is not allowed
    #[error("Unexpected {0}")]
    UnexpectedToken(String),

    #[error("Unbalanced parentheses")]
    UnbalancedParens,

    /// Blank query or an empty group such as `()`
    #[error("Empty expression")]
    EmptyExpression,

    #[error("Unterminated quote")]
    UnterminatedQuote,
}

/// Errors produced while evaluating a query
#[derive(Debug, Error)]
pub enum EvalError {
    /// Tag name not present in the store (strict evaluation only)
    #[error("No such tag: {0}")]
    UnknownTag(String),

    #[error(transparent)]
    Store(#[from] DbError),
}

#[cfg(test)]
#[path = "error_tests.rs"]
mod error_tests;
