//! Files command - list files matching a query

use super::Result;
use crate::config::PathFormat;
use crate::db::{Database, File, TagStore};
use crate::output;
use crate::query::{Evaluator, Query, parse};

/// Files matching `query_text`, ordered by id
///
/// Blank text matches every tagged file. Unknown tag names are errors.
///
/// # Errors
/// Returns an error if the query cannot be parsed, names an unknown tag, or
/// database operations fail
pub fn matching_files(db: &Database, query_text: &str, explicit: bool) -> Result<Vec<File>> {
    let query = if query_text.trim().is_empty() { Query::Empty } else { parse(query_text)? };
    let ids = Evaluator::new(db).explicit(explicit).strict(true).evaluate(&query)?;

    let mut files = Vec::with_capacity(ids.len());
    for id in ids {
        if let Some(file) = db.file_by_id(id)? {
            files.push(file);
        }
    }
    Ok(files)
}

/// Execute the files command
///
/// # Errors
/// Returns an error if the query is invalid or database operations fail
pub fn execute(db: &Database, query: &[String], explicit: bool, format: PathFormat, quiet: bool) -> Result<()> {
    let mut files = matching_files(db, &query.join(" "), explicit)?;
    files.sort_by(|a, b| a.path.cmp(&b.path));

    for file in &files {
        if quiet {
            println!("{}", output::format_path(&file.path, format));
        } else {
            println!("{}", output::colorize_path(&file.path, format));
        }
    }
    Ok(())
}
