//! Repository backend configuration.
//!
//! # Responsibility
//! - Name the three interchangeable repository backends.
//! - Resolve a connection string into a database file path.
//!
//! # Invariants
//! - Exactly one backend is selected per configuration.
//! - In-memory databases are rejected: every repository call opens its own
//!   connection, so an in-memory store would not survive between calls.

use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;
use std::str::FromStr;

pub const ENV_REPOSITORY_MODE: &str = "POSTDESK_REPOSITORY_MODE";
pub const ENV_DATABASE: &str = "POSTDESK_DATABASE";

/// Data-access style used to talk to the post store.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RepositoryMode {
    /// Hand-written statements with positional column reads (`rusqlite`).
    #[serde(alias = "statement")]
    DirectStatement,
    /// Hand-written SQL mapped into `Post` by column name (`sqlx`).
    #[serde(alias = "mapped")]
    LightweightMapping,
    /// Entity model and query builder (`sea-orm`).
    #[default]
    #[serde(alias = "orm")]
    FullMapping,
}

impl RepositoryMode {
    pub const ALL: [Self; 3] = [
        Self::DirectStatement,
        Self::LightweightMapping,
        Self::FullMapping,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::DirectStatement => "DirectStatement",
            Self::LightweightMapping => "LightweightMapping",
            Self::FullMapping => "FullMapping",
        }
    }

    /// Short label used in log records.
    pub fn short_name(self) -> &'static str {
        match self {
            Self::DirectStatement => "statement",
            Self::LightweightMapping => "mapped",
            Self::FullMapping => "orm",
        }
    }
}

impl Display for RepositoryMode {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RepositoryMode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|mode| {
                normalized == mode.as_str().to_ascii_lowercase() || normalized == mode.short_name()
            })
            .ok_or_else(|| ConfigError::UnknownMode(s.trim().to_string()))
    }
}

/// Configuration errors raised before any backend is constructed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    UnknownMode(String),
    MissingConnectionString,
    InMemoryUnsupported(String),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnknownMode(value) => write!(
                f,
                "unknown repository mode `{value}`; expected DirectStatement|LightweightMapping|FullMapping"
            ),
            Self::MissingConnectionString => write!(f, "connection string cannot be empty"),
            Self::InMemoryUnsupported(value) => write!(
                f,
                "in-memory database `{value}` is not supported; use a file path"
            ),
        }
    }
}

impl Error for ConfigError {}

/// Backend selection plus the store it connects to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepositoryConfig {
    #[serde(default)]
    pub mode: RepositoryMode,
    /// SQLite file path, optionally prefixed with `sqlite://` or `sqlite:`.
    pub connection_string: String,
}

impl RepositoryConfig {
    pub fn new(mode: RepositoryMode, connection_string: impl Into<String>) -> Self {
        Self {
            mode,
            connection_string: connection_string.into(),
        }
    }

    /// Loads configuration from process environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Loads configuration through an arbitrary key lookup.
    ///
    /// A missing mode selects the default backend; a missing database is an
    /// error.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mode = match lookup(ENV_REPOSITORY_MODE) {
            Some(value) if !value.trim().is_empty() => value.parse()?,
            _ => RepositoryMode::default(),
        };
        let connection_string = lookup(ENV_DATABASE).ok_or(ConfigError::MissingConnectionString)?;
        let config = Self::new(mode, connection_string);
        config.database_path()?;
        Ok(config)
    }

    /// Resolves the database file path named by the connection string.
    pub fn database_path(&self) -> Result<PathBuf, ConfigError> {
        let trimmed = self.connection_string.trim();
        let without_scheme = trimmed
            .strip_prefix("sqlite://")
            .or_else(|| trimmed.strip_prefix("sqlite:"))
            .unwrap_or(trimmed);
        let path = without_scheme
            .split_once('?')
            .map_or(without_scheme, |(path, _)| path);

        if path.is_empty() {
            return Err(ConfigError::MissingConnectionString);
        }
        if path == ":memory:" || trimmed.contains("mode=memory") {
            return Err(ConfigError::InMemoryUnsupported(trimmed.to_string()));
        }
        Ok(PathBuf::from(path))
    }
}
