//! Db command - manage named databases in the config file

use super::Result;
use crate::cli::DbCommands;
use crate::config::TagfsConfig;
use std::path::{self, Path};

/// One line per configured database, sorted by name
#[must_use]
pub fn database_lines(config: &TagfsConfig, quiet: bool) -> Vec<String> {
    let mut names: Vec<&String> = config.databases.keys().collect();
    names.sort();

    names
        .into_iter()
        .map(|name| {
            if quiet {
                return name.clone();
            }
            let marker = if config.default_database.as_ref() == Some(name) { " (default)" } else { "" };
            format!("  {name} -> {}{marker}", config.databases[name].display())
        })
        .collect()
}

/// Execute a db subcommand against the config file at `config_path`
///
/// # Errors
/// Returns an error if the config cannot be loaded or saved, or the named
/// database is missing (or already present, for `add`)
pub fn execute(config_path: &Path, command: &DbCommands, quiet: bool) -> Result<()> {
    let mut config = TagfsConfig::load_from(config_path)?;

    match command {
        DbCommands::Add { name, path } => {
            let path = path::absolute(path)?;
            config.add_database(name.clone(), path.clone())?;
            if !quiet {
                println!("Database '{name}' added at {}", path.display());
            }
            if config.databases.len() == 1 {
                config.set_default_database(name.clone())?;
                if !quiet {
                    println!("Set '{name}' as default database");
                }
            }
        }
        DbCommands::List => {
            if config.databases.is_empty() {
                if !quiet {
                    println!("No databases configured.");
                }
                return Ok(());
            }
            for line in database_lines(&config, quiet) {
                println!("{line}");
            }
            return Ok(());
        }
        DbCommands::Remove { name } => {
            let path = config.remove_database(name)?;
            if !quiet {
                println!("Database '{name}' removed from configuration");
                println!("Note: {} was not deleted", path.display());
            }
        }
        DbCommands::SetDefault { name } => {
            config.set_default_database(name.clone())?;
            if !quiet {
                println!("Default database set to '{name}'");
            }
        }
    }

    config.save_to(config_path)?;
    Ok(())
}
