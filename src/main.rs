//! tagfs CLI application entry point
//!
//! # Usage
//!
//! ```bash
//! # Tag files
//! tagfs tag holiday.jpg photo year=2023
//! tagfs imply mp3 music
//!
//! # Query
//! tagfs files photo and not draft
//! tagfs files "rating >= 4"
//!
//! # Browse queries as directories
//! tagfs mount ~/tags
//! ls ~/tags/photo/and/year/=/2023
//! tagfs unmount ~/tags
//! ```
//!
//! # Configuration
//!
//! Configuration is read from the user's config directory
//! (`~/.config/tagfs/config.toml` on Linux). The database is chosen by
//! `--db`, then `TAGFS_DB`, then the configured default, then `~/.tagfs/db`.

use std::path::PathBuf;
use tagfs::{
    TagfsError,
    cli::{Cli, Commands},
    commands,
    config::{self, ConfigError, TagfsConfig},
    db::Database,
    output,
};
use tracing::warn;
use tracing_subscriber::EnvFilter;

type Result<T> = std::result::Result<T, TagfsError>;

fn init_logging(cli: &Cli) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(cli.log_level()));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn load_config() -> Result<TagfsConfig> {
    match TagfsConfig::load() {
        Err(ConfigError::MissingHome) => {
            warn!("no config directory, using default configuration");
            Ok(TagfsConfig::default())
        }
        other => Ok(other?),
    }
}

fn database_path(cli: &Cli, config: &TagfsConfig) -> Result<PathBuf> {
    let env_value = std::env::var(config::DATABASE_ENV).ok();
    Ok(config::resolve_database_path(
        cli.db.as_deref(),
        env_value.as_deref(),
        config,
        dirs::home_dir().as_deref(),
    )?)
}

fn open_database(cli: &Cli, config: &TagfsConfig) -> Result<Database> {
    Ok(Database::open(database_path(cli, config)?)?)
}

fn run(cli: &Cli) -> Result<()> {
    let config = load_config()?;
    let quiet = cli.quiet;
    let format = cli.get_path_format().unwrap_or(config.path_format);

    match &cli.command {
        Commands::Tag { file, tags } => commands::tag(&open_database(cli, &config)?, file, tags, quiet),
        Commands::Untag { file, tags } => commands::untag(&open_database(cli, &config)?, file, tags, quiet),
        Commands::Files { explicit, query } => {
            commands::files(&open_database(cli, &config)?, query, *explicit, format, quiet)
        }
        Commands::Tags { file } => commands::tags(&open_database(cli, &config)?, file.as_deref(), quiet),
        Commands::Values { tag } => commands::values(&open_database(cli, &config)?, tag),
        Commands::Imply { delete, pairs } => commands::imply(&open_database(cli, &config)?, pairs, *delete, quiet),
        Commands::Mount { paths } => commands::mount(&database_path(cli, &config)?, paths, quiet),
        Commands::Unmount { mountpoint, all } => commands::unmount(mountpoint.as_deref(), *all, quiet),
        Commands::Db { command } => commands::db(&TagfsConfig::config_path()?, command, quiet),
        Commands::Vfs { database, mountpoint } => commands::vfs(database, mountpoint, &config),
    }
}

fn main() {
    let cli = Cli::parse_args();
    init_logging(&cli);

    if let Err(e) = run(&cli) {
        output::report_error(&mut std::io::stderr(), &e);
        std::process::exit(1);
    }
}
