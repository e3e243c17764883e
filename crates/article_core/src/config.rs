//! Store configuration from a single connection string.
//!
//! # Responsibility
//! - Parse the externally supplied `DATABASE_URL` into a database location.
//!
//! # Invariants
//! - The connection string is the only environment-driven input.
//! - Parsing never touches the filesystem.

use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};

/// Environment variable holding the connection string.
pub const DATABASE_URL_ENV: &str = "DATABASE_URL";

const MEMORY_URLS: &[&str] = &[":memory:", "sqlite::memory:", "sqlite://:memory:"];
const PATH_PREFIXES: &[&str] = &["sqlite://", "sqlite:", "file:"];

/// Where the article database lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DatabaseLocation {
    /// Process-private database, discarded on close.
    Memory,
    File(PathBuf),
}

/// Parsed store configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreConfig {
    database_url: String,
    location: DatabaseLocation,
}

impl StoreConfig {
    /// Parses a connection string.
    ///
    /// Accepted forms: `:memory:`, `sqlite::memory:`, `sqlite://PATH`,
    /// `sqlite:PATH`, `file:PATH` and bare filesystem paths. Query strings
    /// (`?mode=rwc`) are ignored.
    ///
    /// # Errors
    /// - `Empty` for blank input.
    /// - `UnsupportedScheme` for URLs naming another backend
    ///   (for example `postgres://`).
    /// - `MissingPath` when a sqlite URL has no path component.
    pub fn parse(database_url: &str) -> Result<Self, ConfigError> {
        let trimmed = database_url.trim();
        if trimmed.is_empty() {
            return Err(ConfigError::Empty);
        }

        let without_query = trimmed.split('?').next().unwrap_or(trimmed);
        let location = parse_location(without_query)?;
        Ok(Self {
            database_url: trimmed.to_string(),
            location,
        })
    }

    /// Reads and parses `DATABASE_URL`.
    pub fn from_env() -> Result<Self, ConfigError> {
        match std::env::var(DATABASE_URL_ENV) {
            Ok(value) => Self::parse(&value),
            Err(_) => Err(ConfigError::MissingEnv(DATABASE_URL_ENV)),
        }
    }

    /// Configuration for a throwaway in-memory database.
    pub fn in_memory() -> Self {
        Self {
            database_url: MEMORY_URLS[1].to_string(),
            location: DatabaseLocation::Memory,
        }
    }

    /// Configuration for a database file at `path`.
    pub fn file(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref().to_path_buf();
        Self {
            database_url: format!("sqlite://{}", path.display()),
            location: DatabaseLocation::File(path),
        }
    }

    pub fn database_url(&self) -> &str {
        &self.database_url
    }

    pub fn location(&self) -> &DatabaseLocation {
        &self.location
    }
}

fn parse_location(url: &str) -> Result<DatabaseLocation, ConfigError> {
    if MEMORY_URLS.contains(&url) {
        return Ok(DatabaseLocation::Memory);
    }

    for prefix in PATH_PREFIXES {
        if let Some(rest) = url.strip_prefix(prefix) {
            if rest.is_empty() {
                return Err(ConfigError::MissingPath(url.to_string()));
            }
            return Ok(DatabaseLocation::File(PathBuf::from(rest)));
        }
    }

    if let Some((scheme, _)) = url.split_once("://") {
        return Err(ConfigError::UnsupportedScheme(scheme.to_string()));
    }

    Ok(DatabaseLocation::File(PathBuf::from(url)))
}

/// Connection string problems.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    Empty,
    MissingEnv(&'static str),
    MissingPath(String),
    UnsupportedScheme(String),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Empty => write!(f, "database url cannot be empty"),
            Self::MissingEnv(name) => write!(f, "environment variable `{name}` is not set"),
            Self::MissingPath(url) => write!(f, "database url `{url}` has no path"),
            Self::UnsupportedScheme(scheme) => {
                write!(f, "unsupported database scheme `{scheme}`; expected sqlite")
            }
        }
    }
}

impl Error for ConfigError {}
