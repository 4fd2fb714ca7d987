//! Command-line interface definitions and parsing
//!
//! This module defines the complete CLI structure for tagfs using the `clap` crate.
//!
//! # Commands
//!
//! - **tag** / **untag**: Apply or remove `TAG[=VALUE]` taggings
//! - **files**: List files matching a query
//! - **tags** / **values**: Inspect tags and their values
//! - **imply**: Manage tag implications
//! - **mount** / **unmount**: Manage virtual filesystem mounts
//!
//! # Examples
//!
//! ```
//! use tagfs::cli::{Cli, Commands};
//!
//! let cli = Cli::parse_from_args(["tagfs", "files", "photo", "and", "not", "draft"]);
//! assert!(matches!(cli.command, Commands::Files { .. }));
//! ```

use crate::config::PathFormat;
use clap::{ArgAction, Parser, Subcommand};
use std::path::PathBuf;

/// Main CLI structure for parsing command-line arguments
#[derive(Parser, Debug)]
#[command(name = "tagfs")]
#[command(about = "Tag files and browse tag queries as directories", long_about = None)]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Database to use: a configured database name or a path
    #[arg(long = "db", value_name = "DATABASE", global = true)]
    pub db: Option<String>,

    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short = 'v', long = "verbose", action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress informational output (only print results)
    #[arg(short = 'q', long = "quiet", global = true)]
    pub quiet: bool,

    /// Display absolute paths (overrides config)
    #[arg(long = "absolute", global = true, conflicts_with = "relative")]
    pub absolute: bool,

    /// Display relative paths (overrides config)
    #[arg(long = "relative", global = true, conflicts_with = "absolute")]
    pub relative: bool,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Apply tags to a file
    #[command(visible_alias = "t")]
    Tag {
        /// File to tag
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Tags to apply
        #[arg(value_name = "TAG[=VALUE]", required = true)]
        tags: Vec<String>,
    },

    /// Remove tags from a file
    Untag {
        /// File to untag
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Tags to remove; a bare tag removes every value of it
        #[arg(value_name = "TAG[=VALUE]", required = true)]
        tags: Vec<String>,
    },

    /// List files matching a query
    #[command(visible_alias = "f")]
    Files {
        /// Match only taggings applied directly, ignoring implications
        #[arg(short = 'e', long = "explicit")]
        explicit: bool,

        /// Query, e.g. `photo and not draft` or `rating >= 4`
        #[arg(value_name = "QUERY")]
        query: Vec<String>,
    },

    /// List all tags with usage counts, or the tags of one file
    Tags {
        #[arg(value_name = "FILE")]
        file: Option<PathBuf>,
    },

    /// List the values used with a tag
    Values {
        #[arg(value_name = "TAG")]
        tag: String,
    },

    /// Add, remove or list tag implications
    Imply {
        /// Remove the implication instead of adding it
        #[arg(short = 'd', long = "delete")]
        delete: bool,

        /// Implying and implied tag; none lists every implication
        #[arg(value_name = "TAG[=VALUE]", num_args = 0..=2)]
        pairs: Vec<String>,
    },

    /// Mount the virtual filesystem, or list mounts without arguments
    Mount {
        /// `[DATABASE] MOUNTPOINT`
        #[arg(value_name = "PATH")]
        paths: Vec<PathBuf>,
    },

    /// Unmount a virtual filesystem
    #[command(visible_alias = "umount")]
    Unmount {
        #[arg(value_name = "MOUNTPOINT", required_unless_present = "all", conflicts_with = "all")]
        mountpoint: Option<PathBuf>,

        /// Unmount every mounted virtual filesystem
        #[arg(short = 'a', long = "all")]
        all: bool,
    },

    /// Manage named databases
    Db {
        #[command(subcommand)]
        command: DbCommands,
    },

    /// Serve the virtual filesystem in the foreground
    #[command(hide = true)]
    Vfs {
        #[arg(value_name = "DATABASE")]
        database: PathBuf,

        #[arg(value_name = "MOUNTPOINT")]
        mountpoint: PathBuf,
    },
}

/// Database management subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum DbCommands {
    /// Register a database under a name
    Add {
        name: String,

        /// Path to the database file
        #[arg(value_name = "PATH")]
        path: PathBuf,
    },

    /// List configured databases
    #[command(visible_alias = "ls")]
    List,

    /// Remove a database from configuration (the file is kept)
    #[command(visible_alias = "rm")]
    Remove { name: String },

    /// Set the database used when `--db` and `TAGFS_DB` are absent
    #[command(name = "set-default")]
    SetDefault { name: String },
}

impl Cli {
    /// Parse command-line arguments
    #[must_use]
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Parse from an explicit argument list
    #[must_use]
    pub fn parse_from_args<I, T>(args: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<std::ffi::OsString> + Clone,
    {
        Self::parse_from(args)
    }

    /// Get path format override from CLI flags
    #[must_use]
    pub const fn get_path_format(&self) -> Option<PathFormat> {
        if self.absolute {
            Some(PathFormat::Absolute)
        } else if self.relative {
            Some(PathFormat::Relative)
        } else {
            None
        }
    }

    /// Log filter used when `RUST_LOG` is unset
    #[must_use]
    pub const fn log_level(&self) -> &'static str {
        match self.verbose {
            0 => "warn",
            1 => "info",
            _ => "debug",
        }
    }
}
