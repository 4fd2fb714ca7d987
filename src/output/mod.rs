//! Output formatting for CLI display
//!
//! This module provides utilities for formatting output in the CLI,
//! including path display formatting and tag/file formatting.

use crate::config::PathFormat;
use crate::db::TagSpec;
use colored::Colorize;
use std::fmt::Display;
use std::io::Write;
use std::path::Path;

/// Format a path according to the display mode
#[must_use]
pub fn format_path(path: &Path, format: PathFormat) -> String {
    match format {
        PathFormat::Absolute => path.display().to_string(),
        PathFormat::Relative => {
            if let Ok(cwd) = std::env::current_dir()
                && let Ok(rel_path) = path.strip_prefix(&cwd)
            {
                return rel_path.display().to_string();
            }
            // Fallback to absolute if relative path cannot be computed
            path.display().to_string()
        }
    }
}

/// Color a path based on file existence (green if exists, red if missing)
#[must_use]
pub fn colorize_path(path: &Path, format: PathFormat) -> String {
    let formatted = format_path(path, format);
    if path.exists() {
        formatted.green().to_string()
    } else {
        formatted.red().to_string()
    }
}

/// Format a tag with usage count
#[must_use]
pub fn tag_with_count(tag: &str, count: usize, quiet: bool) -> String {
    if quiet {
        tag.to_string()
    } else {
        format!("  {} (used by {count} file(s))", tag.cyan())
    }
}

/// Space separated `TAG[=VALUE]` list
#[must_use]
pub fn tag_specs(specs: &[TagSpec]) -> String {
    specs.iter().map(ToString::to_string).collect::<Vec<_>>().join(" ")
}

#[must_use]
pub fn implication(implying: &TagSpec, implied: &TagSpec) -> String {
    format!("{implying} -> {implied}")
}

/// Format implications resolved to names, one per line
#[must_use]
pub fn implications(rules: &[(TagSpec, TagSpec)]) -> Vec<String> {
    rules.iter().map(|(a, b)| implication(a, b)).collect()
}

/// Write a one-line error report
///
/// A detached mount daemon outlives the reader of its stderr, so write
/// failures are ignored rather than turned into a panic.
pub fn report_error(out: &mut impl Write, error: &impl Display) {
    let _ = writeln!(out, "{} {error}", "tagfs:".red());
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_format_absolute() {
        let path = PathBuf::from("/data/photos/a.jpg");
        assert_eq!(format_path(&path, PathFormat::Absolute), "/data/photos/a.jpg");
    }

    #[test]
    fn test_format_relative() {
        let cwd = std::env::current_dir().unwrap();
        let path = cwd.join("notes").join("a.txt");
        assert_eq!(format_path(&path, PathFormat::Relative), "notes/a.txt");

        let outside = PathBuf::from("/definitely/not/under/cwd");
        assert_eq!(format_path(&outside, PathFormat::Relative), "/definitely/not/under/cwd");
    }

    #[test]
    fn test_tag_with_count_quiet() {
        assert_eq!(tag_with_count("photo", 3, true), "photo");
        assert!(tag_with_count("photo", 3, false).contains("used by 3 file(s)"));
    }

    #[test]
    fn test_tag_specs_and_implications() {
        let specs = vec![TagSpec::new("photo", None), TagSpec::new("rating", Some("5".into()))];
        assert_eq!(tag_specs(&specs), "photo rating=5");
        assert_eq!(implication(&specs[0], &specs[1]), "photo -> rating=5");
        assert_eq!(implications(&[(specs[1].clone(), specs[0].clone())]), vec!["rating=5 -> photo"]);
    }

    struct ClosedPipe;

    impl Write for ClosedPipe {
        fn write(&mut self, _buf: &[u8]) -> std::io::Result<usize> {
            Err(std::io::ErrorKind::BrokenPipe.into())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Err(std::io::ErrorKind::BrokenPipe.into())
        }
    }

    #[test]
    fn test_report_error() {
        let mut out = Vec::new();
        report_error(&mut out, &"Invalid query: unexpected end of query");
        let line = String::from_utf8(out).unwrap();
        assert!(line.contains("tagfs:"));
        assert!(line.ends_with(" Invalid query: unexpected end of query\n"));
        assert_eq!(line.lines().count(), 1);
    }

    #[test]
    fn test_report_error_ignores_closed_stderr() {
        report_error(&mut ClosedPipe, &"could not mount VFS");
    }
}
