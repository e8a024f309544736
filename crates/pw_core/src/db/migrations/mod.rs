//! Schema upgrades for the `options` table.
//!
//! Each step is a SQL script paired with the `user_version` it leaves
//! behind. Steps run in one transaction, so a store is never left half
//! upgraded.

use crate::db::{StoreError, StoreLocation, StoreResult};
use log::info;
use rusqlite::Connection;

const SCHEMA_STEPS: &[(u32, &str)] = &[(1, include_str!("0001_options.sql"))];

/// Columns `SqliteOptionRepository` reads and writes.
const REQUIRED_COLUMNS: &[&str] = &["name", "value", "autoload"];

/// Schema version a fully upgraded store reports.
pub fn latest_version() -> u32 {
    SCHEMA_STEPS.last().map_or(0, |(version, _)| *version)
}

/// Runs pending steps, then checks the `options` table is usable.
pub fn upgrade_options_store(conn: &mut Connection, location: &StoreLocation) -> StoreResult<()> {
    let found: u32 = conn.pragma_query_value(None, "user_version", |row| row.get(0))?;
    let supported = latest_version();
    if found > supported {
        return Err(StoreError::NewerSchema {
            location: location.clone(),
            found,
            supported,
        });
    }

    if found < supported {
        let tx = conn.transaction()?;
        for (version, script) in SCHEMA_STEPS.iter().filter(|(version, _)| *version > found) {
            tx.execute_batch(script)?;
            tx.pragma_update(None, "user_version", *version)?;
        }
        tx.commit()?;
        info!(
            "event=db_migrate module=db status=ok location={location} from_version={found} to_version={supported}"
        );
    }

    verify_options_table(conn, location)
}

fn verify_options_table(conn: &Connection, location: &StoreLocation) -> StoreResult<()> {
    let mut stmt = conn.prepare("SELECT name FROM pragma_table_info('options');")?;
    let columns = stmt
        .query_map([], |row| row.get::<_, String>(0))?
        .collect::<Result<Vec<_>, _>>()?;

    for column in REQUIRED_COLUMNS {
        if !columns.iter().any(|name| name.as_str() == *column) {
            return Err(StoreError::MissingColumn {
                location: location.clone(),
                column: *column,
            });
        }
    }
    Ok(())
}
