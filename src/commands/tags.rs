//! Tags and values commands

use super::Result;
use crate::db::{Database, DbError, TagSpec, TagStore};
use crate::output;
use std::path::Path;

/// Every tag with the number of files carrying it
///
/// # Errors
/// Returns an error if database operations fail
pub fn tag_counts(db: &Database) -> Result<Vec<(String, usize)>> {
    db.tags()?
        .into_iter()
        .map(|tag| Ok((tag.name, db.file_count_for_tag(tag.id)?)))
        .collect()
}

/// Tags applied to one file
///
/// # Errors
/// Returns an error if the file is not tracked or database operations fail
pub fn file_tags(db: &Database, file: &Path) -> Result<Vec<TagSpec>> {
    let canonical = file.canonicalize().unwrap_or_else(|_| file.to_path_buf());
    let tracked = db
        .file_by_path(&canonical)?
        .ok_or_else(|| DbError::FileNotFound(file.display().to_string()))?;
    Ok(db.tag_specs_for_file(tracked.id)?)
}

/// Execute the tags command
///
/// # Errors
/// Returns an error if the file is not tracked or database operations fail
pub fn execute(db: &Database, file: Option<&Path>, quiet: bool) -> Result<()> {
    match file {
        Some(file) => println!("{}", output::tag_specs(&file_tags(db, file)?)),
        None => {
            for (name, count) in tag_counts(db)? {
                println!("{}", output::tag_with_count(&name, count, quiet));
            }
        }
    }
    Ok(())
}
