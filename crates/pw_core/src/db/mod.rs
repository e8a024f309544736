//! SQLite option store: connection bootstrap, schema upgrades and errors.
//!
//! # Responsibility
//! - Open the file (or in-memory database) that backs `SqliteOptionRepository`.
//! - Bring the `options` table up to the schema this build understands.
//!
//! # Invariants
//! - Schema version is tracked via `PRAGMA user_version`.
//! - A returned connection has an `options` table with every column the
//!   repository queries.
//! - Errors name the store they came from.

use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};

pub mod migrations;
mod open;

pub use open::{open_db, open_db_in_memory};

pub type StoreResult<T> = Result<T, StoreError>;

/// Where an option store lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreLocation {
    File(PathBuf),
    Memory,
}

impl StoreLocation {
    pub fn file(path: &Path) -> Self {
        Self::File(path.to_path_buf())
    }

    fn mode(&self) -> &'static str {
        match self {
            Self::File(_) => "file",
            Self::Memory => "memory",
        }
    }
}

impl Display for StoreLocation {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::File(path) => write!(f, "{}", path.display()),
            Self::Memory => f.write_str(":memory:"),
        }
    }
}

#[derive(Debug)]
pub enum StoreError {
    /// The store could not be opened or configured at all.
    Open {
        location: StoreLocation,
        source: rusqlite::Error,
    },
    /// The store was written by a newer build.
    NewerSchema {
        location: StoreLocation,
        found: u32,
        supported: u32,
    },
    /// The `options` table exists but lacks a column the repository reads.
    MissingColumn {
        location: StoreLocation,
        column: &'static str,
    },
    Sqlite(rusqlite::Error),
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Open { location, source } => {
                write!(f, "cannot open option store `{location}`: {source}")
            }
            Self::NewerSchema {
                location,
                found,
                supported,
            } => write!(
                f,
                "option store `{location}` has schema version {found}, this build supports up to {supported}"
            ),
            Self::MissingColumn { location, column } => write!(
                f,
                "option store `{location}` has no `options.{column}` column"
            ),
            Self::Sqlite(err) => write!(f, "option store query failed: {err}"),
        }
    }
}

impl Error for StoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Open { source, .. } => Some(source),
            Self::Sqlite(err) => Some(err),
            Self::NewerSchema { .. } | Self::MissingColumn { .. } => None,
        }
    }
}

impl From<rusqlite::Error> for StoreError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Sqlite(value)
    }
}
