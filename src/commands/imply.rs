//! Imply command - manage tag implications

use super::Result;
use super::tag::parse_specs;
use crate::TagfsError;
use crate::db::{Database, TagSpec, TagStore};
use crate::output;

/// Every implication rendered back to names, ordered by implying then implied
///
/// # Errors
/// Returns an error if database operations fail
pub fn implications(db: &Database) -> Result<Vec<(TagSpec, TagSpec)>> {
    let mut rules = db
        .implications()?
        .iter()
        .map(|rule| Ok((db.spec_for_pair(&rule.implying)?, db.spec_for_pair(&rule.implied)?)))
        .collect::<Result<Vec<_>>>()?;
    rules.sort_by(|a, b| (a.0.to_string(), a.1.to_string()).cmp(&(b.0.to_string(), b.1.to_string())));
    Ok(rules)
}

/// Execute the imply command
///
/// Without pairs, lists implications. With two, adds (or deletes) one.
///
/// # Errors
/// Returns an error for a single pair, an unknown implication to delete, or
/// failing database operations
pub fn execute(db: &Database, pairs: &[String], delete: bool, quiet: bool) -> Result<()> {
    let specs = parse_specs(pairs);
    match (specs.as_slice(), delete) {
        ([], false) => {
            for line in output::implications(&implications(db)?) {
                println!("{line}");
            }
        }
        ([implying, implied], false) => {
            db.add_implication(implying, implied)?;
            if !quiet {
                println!("Added {}", output::implication(implying, implied));
            }
        }
        ([implying, implied], true) => {
            if !db.remove_implication(implying, implied)? {
                return Err(TagfsError::InvalidInput(format!(
                    "No such implication: {}",
                    output::implication(implying, implied)
                )));
            }
            if !quiet {
                println!("Removed {}", output::implication(implying, implied));
            }
        }
        _ => {
            return Err(TagfsError::InvalidInput(
                "Both an implying and an implied tag are required.".into(),
            ));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::TestStore;

    fn args(values: &[&str]) -> Vec<String> {
        values.iter().map(ToString::to_string).collect()
    }

    #[test]
    fn test_add_list_delete() {
        let store = TestStore::new();
        let db = store.db();

        execute(db, &args(&["mp3", "music"]), false, true).unwrap();
        execute(db, &args(&["flac", "music=lossless"]), false, true).unwrap();
        let listed = output::implications(&implications(db).unwrap());
        assert_eq!(listed, vec!["flac -> music=lossless", "mp3 -> music"]);

        execute(db, &args(&["mp3", "music"]), true, true).unwrap();
        assert_eq!(implications(db).unwrap().len(), 1);
    }

    #[test]
    fn test_delete_missing_implication() {
        let store = TestStore::new();
        store.imply("a", "b");
        let result = execute(store.db(), &args(&["b", "a"]), true, true);
        assert!(matches!(result, Err(TagfsError::InvalidInput(ref m)) if m.contains("b -> a")));
    }

    #[test]
    fn test_single_pair_rejected() {
        let store = TestStore::new();
        let result = execute(store.db(), &args(&["mp3"]), false, true);
        assert!(matches!(result, Err(TagfsError::InvalidInput(_))));

        let result = execute(store.db(), &[], true, true);
        assert!(matches!(result, Err(TagfsError::InvalidInput(_))));
    }
}
