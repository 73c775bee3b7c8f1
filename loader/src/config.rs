//! Command-line configuration for the loader.
//!
//! Every flag can also be set through an environment variable, so the loader
//! can run unattended from a container or CI job.

use clap::Parser;
use std::path::PathBuf;

use crate::persistence::schema::is_valid_identifier;
use crate::persistence::DbKind;

const DEFAULT_INPUT_PATH: &str = "./cah-cards-compact.json";
const DEFAULT_SQLITE_PATH: &str = "./cards.db";
const DEFAULT_SCHEMA: &str = "public";

/// Load a compact card pack into a relational database.
#[derive(Parser, Debug)]
#[command(name = "cardpack-loader", version)]
pub struct Cli {
    /// Path to the compact JSON card pack.
    #[arg(short, long, env = "CARDPACK_INPUT", default_value = DEFAULT_INPUT_PATH)]
    pub input: PathBuf,

    /// Destination database kind.
    #[arg(long, env = "CARDPACK_DB_TYPE", value_enum, default_value_t = DbKind::Sqlite)]
    pub db_type: DbKind,

    /// SQLite database file, used with `--db-type sqlite`.
    #[arg(long, env = "CARDPACK_SQLITE_PATH", default_value = DEFAULT_SQLITE_PATH)]
    pub sqlite_path: PathBuf,

    /// Connection URL, required with `--db-type postgres`.
    #[arg(long, env = "DATABASE_URL")]
    pub database_url: Option<String>,

    /// Schema the tables live in. Ignored by SQLite.
    #[arg(long, env = "CARDPACK_SCHEMA", default_value = DEFAULT_SCHEMA)]
    pub schema: String,

    /// Read and expand the pack without touching the database.
    #[arg(long)]
    pub dry_run: bool,
}

/// Errors raised while validating configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("--database-url (or DATABASE_URL) is required for {0} destinations")]
    MissingDatabaseUrl(DbKind),
    #[error("Invalid schema name {0:?}: expected letters, digits and underscores")]
    InvalidSchema(String),
}

/// Where rows are written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DestinationConfig {
    Sqlite { path: PathBuf },
    Postgres { url: String },
}

impl DestinationConfig {
    pub fn kind(&self) -> DbKind {
        match self {
            DestinationConfig::Sqlite { .. } => DbKind::Sqlite,
            DestinationConfig::Postgres { .. } => DbKind::Postgres,
        }
    }
}

/// Validated loader settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoaderConfig {
    pub input: PathBuf,
    pub destination: DestinationConfig,
    pub schema: String,
    pub dry_run: bool,
}

impl TryFrom<Cli> for LoaderConfig {
    type Error = ConfigError;

    fn try_from(cli: Cli) -> Result<Self, Self::Error> {
        if !is_valid_identifier(&cli.schema) {
            return Err(ConfigError::InvalidSchema(cli.schema));
        }

        let destination = match cli.db_type {
            DbKind::Sqlite => DestinationConfig::Sqlite {
                path: cli.sqlite_path,
            },
            DbKind::Postgres => match cli.database_url {
                Some(url) if !url.trim().is_empty() => DestinationConfig::Postgres { url },
                _ => return Err(ConfigError::MissingDatabaseUrl(DbKind::Postgres)),
            },
        };

        Ok(Self {
            input: cli.input,
            destination,
            schema: cli.schema,
            dry_run: cli.dry_run,
        })
    }
}
