//! Tag and untag commands

use super::Result;
use crate::db::{Database, TagSpec};
use crate::output;
use std::convert::Infallible;
use std::path::Path;
use tracing::warn;

/// Parse `TAG[=VALUE]` arguments
#[must_use]
pub fn parse_specs(args: &[String]) -> Vec<TagSpec> {
    args.iter()
        .map(|arg| arg.parse().unwrap_or_else(|never: Infallible| match never {}))
        .collect()
}

/// Execute the tag command - apply tags to a file
///
/// # Errors
/// Returns an error if the file does not exist, a tag name is invalid, or
/// database operations fail
pub fn execute(db: &Database, file: &Path, tags: &[String], quiet: bool) -> Result<()> {
    let specs = parse_specs(tags);
    for spec in &specs {
        db.tag_file(file, spec)?;
    }

    if !quiet {
        println!("Tagged {} with: {}", file.display(), output::tag_specs(&specs));
    }
    Ok(())
}

/// Execute the untag command - remove tags from a file
///
/// # Errors
/// Returns an error if the file is not tracked, a tag does not exist, or
/// database operations fail
pub fn untag(db: &Database, file: &Path, tags: &[String], quiet: bool) -> Result<()> {
    let mut removed = Vec::new();
    for spec in parse_specs(tags) {
        if db.untag_file(file, &spec)? {
            removed.push(spec);
        } else {
            warn!(file = %file.display(), tag = %spec, "file was not tagged");
        }
    }

    if !quiet && !removed.is_empty() {
        println!("Removed {} from {}", output::tag_specs(&removed), file.display());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::TagfsError;
    use crate::db::{DbError, TagStore};
    use crate::testing::TestFiles;

    fn args(values: &[&str]) -> Vec<String> {
        values.iter().map(ToString::to_string).collect()
    }

    #[test]
    fn test_parse_specs() {
        let specs = parse_specs(&args(&["photo", "rating=5", "eq=a=b"]));
        assert_eq!(specs[0], TagSpec::new("photo", None));
        assert_eq!(specs[1], TagSpec::new("rating", Some("5".into())));
        assert_eq!(specs[2], TagSpec::new("eq", Some("a=b".into())));
    }

    #[test]
    fn test_tag_and_untag() {
        let files = TestFiles::new();
        let path = files.create("a.txt", b"a");
        let db = Database::in_memory().unwrap();

        execute(&db, &path, &args(&["photo", "rating=5"]), true).unwrap();
        let file = db.file_by_path(&path.canonicalize().unwrap()).unwrap().unwrap();
        assert_eq!(db.tag_specs_for_file(file.id).unwrap().len(), 2);

        untag(&db, &path, &args(&["rating"]), true).unwrap();
        assert_eq!(db.tag_specs_for_file(file.id).unwrap(), vec![TagSpec::new("photo", None)]);
    }

    #[test]
    fn test_tag_missing_file() {
        let files = TestFiles::new();
        let db = Database::in_memory().unwrap();
        let result = execute(&db, &files.path().join("missing"), &args(&["photo"]), true);
        assert!(matches!(result, Err(TagfsError::Db(DbError::FileNotFound(_)))));
    }

    #[test]
    fn test_untag_unknown_tag() {
        let files = TestFiles::new();
        let path = files.create("a.txt", b"a");
        let db = Database::in_memory().unwrap();
        execute(&db, &path, &args(&["photo"]), true).unwrap();

        let result = untag(&db, &path, &args(&["music"]), true);
        assert!(matches!(result, Err(TagfsError::Db(DbError::UnknownTag(_)))));
    }
}
