//! Configuration management
//!
//! Loaded once before job start from environment variables (with `.env`
//! support) over compiled defaults; the CLI may override individual values
//! after loading.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::{JobError, Result};

// ============================================================================
// Job Configuration Constants
// ============================================================================

/// Default records per chunk; one batched write per chunk and lane. Trades
/// memory for write-call overhead.
pub const DEFAULT_CHUNK_SIZE: usize = 10_000;

/// Default comment-line marker in the input files.
pub const DEFAULT_COMMENT_MARKER: &str = "--";

/// Default people input file.
pub const DEFAULT_PEOPLE_FILE: &str = "files/people.csv";

/// Default bank-accounts input file.
pub const DEFAULT_BANK_ACCOUNTS_FILE: &str = "files/bank_accounts.csv";

/// Default output file for people that fail validation.
pub const DEFAULT_INVALID_PEOPLE_FILE: &str = "files/invalid_people.csv";

/// Default database URL for local development.
pub const DEFAULT_DATABASE_URL: &str = "postgresql://localhost/migra";

/// Default maximum database connections in the pool. The pool is shared by
/// two concurrent batched-write callers.
pub const DEFAULT_DATABASE_MAX_CONNECTIONS: u32 = 10;

/// Default minimum database connections in the pool.
pub const DEFAULT_DATABASE_MIN_CONNECTIONS: u32 = 2;

/// Default database connection timeout in seconds.
pub const DEFAULT_DATABASE_CONNECT_TIMEOUT_SECS: u64 = 10;

/// Default database idle timeout in seconds.
pub const DEFAULT_DATABASE_IDLE_TIMEOUT_SECS: u64 = 600;

/// Job configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub job: JobConfig,
    pub files: FileConfig,
    pub database: DatabaseConfig,
}

/// Chunking and input-format settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobConfig {
    pub chunk_size: usize,
    pub comment_marker: String,
}

/// Input and output file locations
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileConfig {
    pub people: PathBuf,
    pub bank_accounts: PathBuf,
    pub invalid_people: PathBuf,
}

/// Database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
    pub connect_timeout_secs: u64,
    pub idle_timeout_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            job: JobConfig {
                chunk_size: DEFAULT_CHUNK_SIZE,
                comment_marker: DEFAULT_COMMENT_MARKER.to_string(),
            },
            files: FileConfig {
                people: PathBuf::from(DEFAULT_PEOPLE_FILE),
                bank_accounts: PathBuf::from(DEFAULT_BANK_ACCOUNTS_FILE),
                invalid_people: PathBuf::from(DEFAULT_INVALID_PEOPLE_FILE),
            },
            database: DatabaseConfig {
                url: DEFAULT_DATABASE_URL.to_string(),
                max_connections: DEFAULT_DATABASE_MAX_CONNECTIONS,
                min_connections: DEFAULT_DATABASE_MIN_CONNECTIONS,
                connect_timeout_secs: DEFAULT_DATABASE_CONNECT_TIMEOUT_SECS,
                idle_timeout_secs: DEFAULT_DATABASE_IDLE_TIMEOUT_SECS,
            },
        }
    }
}

impl Config {
    /// Load configuration from environment and defaults.
    ///
    /// Environment variables:
    /// - `MIGRA_CHUNK_SIZE`, `MIGRA_COMMENT_MARKER`
    /// - `MIGRA_PEOPLE_FILE`, `MIGRA_BANK_ACCOUNTS_FILE`,
    ///   `MIGRA_INVALID_PEOPLE_FILE`
    /// - `DATABASE_URL`, `DATABASE_MAX_CONNECTIONS`,
    ///   `DATABASE_MIN_CONNECTIONS`, `DATABASE_CONNECT_TIMEOUT`,
    ///   `DATABASE_IDLE_TIMEOUT`
    pub fn load() -> Result<Self> {
        dotenvy::dotenv().ok();

        let defaults = Config::default();
        let config = Config {
            job: JobConfig {
                chunk_size: env_parsed("MIGRA_CHUNK_SIZE", defaults.job.chunk_size),
                comment_marker: std::env::var("MIGRA_COMMENT_MARKER")
                    .unwrap_or(defaults.job.comment_marker),
            },
            files: FileConfig {
                people: env_path("MIGRA_PEOPLE_FILE", defaults.files.people),
                bank_accounts: env_path("MIGRA_BANK_ACCOUNTS_FILE", defaults.files.bank_accounts),
                invalid_people: env_path(
                    "MIGRA_INVALID_PEOPLE_FILE",
                    defaults.files.invalid_people,
                ),
            },
            database: DatabaseConfig {
                url: std::env::var("DATABASE_URL").unwrap_or(defaults.database.url),
                max_connections: env_parsed(
                    "DATABASE_MAX_CONNECTIONS",
                    defaults.database.max_connections,
                ),
                min_connections: env_parsed(
                    "DATABASE_MIN_CONNECTIONS",
                    defaults.database.min_connections,
                ),
                connect_timeout_secs: env_parsed(
                    "DATABASE_CONNECT_TIMEOUT",
                    defaults.database.connect_timeout_secs,
                ),
                idle_timeout_secs: env_parsed(
                    "DATABASE_IDLE_TIMEOUT",
                    defaults.database.idle_timeout_secs,
                ),
            },
        };

        config.validate()?;
        Ok(config)
    }

    /// Reject settings the pipelines cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.job.chunk_size == 0 {
            return Err(JobError::Config(
                "chunk size must be at least 1".to_string(),
            ));
        }
        if self.job.comment_marker.is_empty() {
            return Err(JobError::Config(
                "comment marker must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}

fn env_parsed<T: std::str::FromStr>(var: &str, default: T) -> T {
    std::env::var(var)
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(default)
}

fn env_path(var: &str, default: PathBuf) -> PathBuf {
    std::env::var(var).map(PathBuf::from).unwrap_or(default)
}
