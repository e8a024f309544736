//! Option repository contracts with SQLite and in-memory implementations.
//!
//! # Responsibility
//! - Persist named option values as JSON documents.
//! - Keep SQL details behind the `OptionRepository` boundary.
//!
//! # Invariants
//! - Option names are non-empty after trimming.
//! - `add_option` never overwrites an existing value.
//! - `update_option` inserts the option when it does not exist yet.
//! - Read paths reject undecodable persisted values instead of masking them.

use crate::db::StoreError;
use log::debug;
use rusqlite::{params, Connection, OptionalExtension};
use serde_json::Value;
use std::cell::RefCell;
use std::collections::BTreeMap;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type RepoResult<T> = Result<T, RepoError>;

/// Repository error for option persistence.
#[derive(Debug)]
pub enum RepoError {
    Store(StoreError),
    InvalidName(String),
    InvalidData(String),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Store(err) => write!(f, "{err}"),
            Self::InvalidName(name) => write!(f, "invalid option name: `{name}`"),
            Self::InvalidData(message) => write!(f, "invalid persisted option data: {message}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Store(err) => Some(err),
            Self::InvalidName(_) | Self::InvalidData(_) => None,
        }
    }
}

impl From<StoreError> for RepoError {
    fn from(value: StoreError) -> Self {
        Self::Store(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Store(StoreError::Sqlite(value))
    }
}

/// One stored option row.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredOption {
    pub name: String,
    pub value: Value,
    pub autoload: bool,
}

/// Storage contract for named option values.
pub trait OptionRepository {
    /// Returns the stored value, or `None` when the option does not exist.
    fn get_option(&self, name: &str) -> RepoResult<Option<Value>>;
    /// Inserts the option when absent. Returns `false` when it already existed.
    fn add_option(&self, name: &str, value: &Value, autoload: bool) -> RepoResult<bool>;
    /// Replaces the stored value, inserting it (autoloaded) when absent.
    fn update_option(&self, name: &str, value: &Value) -> RepoResult<()>;
    /// Removes the option. Returns `false` when nothing was stored.
    fn delete_option(&self, name: &str) -> RepoResult<bool>;
    /// Lists stored options ordered by name.
    fn list_options(&self, autoload_only: bool) -> RepoResult<Vec<StoredOption>>;
}

impl<R: OptionRepository + ?Sized> OptionRepository for &R {
    fn get_option(&self, name: &str) -> RepoResult<Option<Value>> {
        (**self).get_option(name)
    }

    fn add_option(&self, name: &str, value: &Value, autoload: bool) -> RepoResult<bool> {
        (**self).add_option(name, value, autoload)
    }

    fn update_option(&self, name: &str, value: &Value) -> RepoResult<()> {
        (**self).update_option(name, value)
    }

    fn delete_option(&self, name: &str) -> RepoResult<bool> {
        (**self).delete_option(name)
    }

    fn list_options(&self, autoload_only: bool) -> RepoResult<Vec<StoredOption>> {
        (**self).list_options(autoload_only)
    }
}

/// SQLite-backed option repository.
pub struct SqliteOptionRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteOptionRepository<'conn> {
    /// Wraps a connection returned by `open_db`/`open_db_in_memory`.
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl OptionRepository for SqliteOptionRepository<'_> {
    fn get_option(&self, name: &str) -> RepoResult<Option<Value>> {
        let name = normalize_name(name)?;
        let raw: Option<String> = self
            .conn
            .query_row(
                "SELECT value FROM options WHERE name = ?1;",
                [name],
                |row| row.get(0),
            )
            .optional()?;

        raw.map(|text| decode_value(name, &text)).transpose()
    }

    fn add_option(&self, name: &str, value: &Value, autoload: bool) -> RepoResult<bool> {
        let name = normalize_name(name)?;
        let changed = self.conn.execute(
            "INSERT INTO options (name, value, autoload)
             VALUES (?1, ?2, ?3)
             ON CONFLICT(name) DO NOTHING;",
            params![name, encode_value(value)?, bool_to_int(autoload)],
        )?;
        debug!("event=option_add module=repo name={name} inserted={}", changed > 0);
        Ok(changed > 0)
    }

    fn update_option(&self, name: &str, value: &Value) -> RepoResult<()> {
        let name = normalize_name(name)?;
        self.conn.execute(
            "INSERT INTO options (name, value)
             VALUES (?1, ?2)
             ON CONFLICT(name) DO UPDATE SET
                value = excluded.value,
                updated_at = (strftime('%s', 'now') * 1000);",
            params![name, encode_value(value)?],
        )?;
        debug!("event=option_update module=repo name={name}");
        Ok(())
    }

    fn delete_option(&self, name: &str) -> RepoResult<bool> {
        let name = normalize_name(name)?;
        let changed = self
            .conn
            .execute("DELETE FROM options WHERE name = ?1;", [name])?;
        Ok(changed > 0)
    }

    fn list_options(&self, autoload_only: bool) -> RepoResult<Vec<StoredOption>> {
        let mut stmt = self.conn.prepare(
            "SELECT name, value, autoload
             FROM options
             WHERE (?1 = 0 OR autoload = 1)
             ORDER BY name ASC;",
        )?;
        let mut rows = stmt.query([bool_to_int(autoload_only)])?;
        let mut options = Vec::new();

        while let Some(row) = rows.next()? {
            let name: String = row.get("name")?;
            let text: String = row.get("value")?;
            let autoload = match row.get::<_, i64>("autoload")? {
                0 => false,
                1 => true,
                other => {
                    return Err(RepoError::InvalidData(format!(
                        "invalid autoload value `{other}` for option `{name}`"
                    )));
                }
            };
            let value = decode_value(&name, &text)?;
            options.push(StoredOption {
                name,
                value,
                autoload,
            });
        }

        Ok(options)
    }
}

/// Process-local option repository, used by tests and the CLI.
#[derive(Debug, Default)]
pub struct MemoryOptionRepository {
    options: RefCell<BTreeMap<String, StoredOption>>,
}

impl MemoryOptionRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

impl OptionRepository for MemoryOptionRepository {
    fn get_option(&self, name: &str) -> RepoResult<Option<Value>> {
        let name = normalize_name(name)?;
        Ok(self
            .options
            .borrow()
            .get(name)
            .map(|stored| stored.value.clone()))
    }

    fn add_option(&self, name: &str, value: &Value, autoload: bool) -> RepoResult<bool> {
        let name = normalize_name(name)?;
        let mut options = self.options.borrow_mut();
        if options.contains_key(name) {
            return Ok(false);
        }
        options.insert(
            name.to_string(),
            StoredOption {
                name: name.to_string(),
                value: value.clone(),
                autoload,
            },
        );
        Ok(true)
    }

    fn update_option(&self, name: &str, value: &Value) -> RepoResult<()> {
        let name = normalize_name(name)?;
        self.options
            .borrow_mut()
            .entry(name.to_string())
            .and_modify(|stored| stored.value = value.clone())
            .or_insert_with(|| StoredOption {
                name: name.to_string(),
                value: value.clone(),
                autoload: true,
            });
        Ok(())
    }

    fn delete_option(&self, name: &str) -> RepoResult<bool> {
        let name = normalize_name(name)?;
        Ok(self.options.borrow_mut().remove(name).is_some())
    }

    fn list_options(&self, autoload_only: bool) -> RepoResult<Vec<StoredOption>> {
        Ok(self
            .options
            .borrow()
            .values()
            .filter(|stored| !autoload_only || stored.autoload)
            .cloned()
            .collect())
    }
}

fn normalize_name(name: &str) -> RepoResult<&str> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(RepoError::InvalidName(name.to_string()));
    }
    Ok(trimmed)
}

fn encode_value(value: &Value) -> RepoResult<String> {
    serde_json::to_string(value)
        .map_err(|err| RepoError::InvalidData(format!("failed to encode option value: {err}")))
}

fn decode_value(name: &str, text: &str) -> RepoResult<Value> {
    serde_json::from_str(text).map_err(|err| {
        RepoError::InvalidData(format!("option `{name}` is not valid JSON: {err}"))
    })
}

fn bool_to_int(value: bool) -> i64 {
    if value {
        1
    } else {
        0
    }
}

#[cfg(test)]
mod tests {
    use super::{MemoryOptionRepository, OptionRepository, RepoError};
    use serde_json::json;

    #[test]
    fn memory_add_does_not_overwrite() {
        let repo = MemoryOptionRepository::new();
        assert!(repo.add_option("demo", &json!({"a": 1}), true).unwrap());
        assert!(!repo.add_option("demo", &json!({"a": 2}), true).unwrap());
        assert_eq!(repo.get_option("demo").unwrap(), Some(json!({"a": 1})));
    }

    #[test]
    fn memory_update_inserts_missing_option() {
        let repo = MemoryOptionRepository::new();
        repo.update_option("fresh", &json!("x")).unwrap();
        assert_eq!(repo.get_option("fresh").unwrap(), Some(json!("x")));
        assert_eq!(repo.list_options(true).unwrap().len(), 1);
    }

    #[test]
    fn blank_names_are_rejected() {
        let repo = MemoryOptionRepository::new();
        let err = repo.get_option("  ").unwrap_err();
        assert!(matches!(err, RepoError::InvalidName(_)));
    }
}
