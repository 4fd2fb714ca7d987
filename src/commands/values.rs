//! Values command - list the values used with a tag

use super::Result;
use crate::db::{Database, DbError, TagStore};

/// Value names used with `tag`, sorted
///
/// # Errors
/// Returns an error if the tag does not exist or database operations fail
pub fn tag_values(db: &Database, tag: &str) -> Result<Vec<String>> {
    let tag = db
        .tag_by_name(tag)?
        .ok_or_else(|| DbError::UnknownTag(tag.to_string()))?;
    Ok(db.values_for_tag(tag.id)?.names())
}

/// Execute the values command
///
/// # Errors
/// Returns an error if the tag does not exist or database operations fail
pub fn execute(db: &Database, tag: &str) -> Result<()> {
    for value in tag_values(db, tag)? {
        println!("{value}");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::TagfsError;
    use crate::testing::TestStore;

    #[test]
    fn test_values_sorted() {
        let store = TestStore::new();
        store.tag("a.jpg", &["year=2021", "photo"]);
        store.tag("b.jpg", &["year=2019"]);
        assert_eq!(tag_values(store.db(), "year").unwrap(), vec!["2019", "2021"]);
        assert!(tag_values(store.db(), "photo").unwrap().is_empty());
    }

    #[test]
    fn test_unknown_tag() {
        let store = TestStore::new();
        let result = tag_values(store.db(), "year");
        assert!(matches!(result, Err(TagfsError::Db(DbError::UnknownTag(_)))));
    }
}
