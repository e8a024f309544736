//! Opening option stores.
//!
//! Every open logs one `db_open` start event and exactly one ok/error event.

use super::migrations::upgrade_options_store;
use super::{StoreError, StoreLocation, StoreResult};
use log::{error, info};
use rusqlite::Connection;
use std::path::Path;
use std::time::{Duration, Instant};

/// Other processes may hold the file while saving a page.
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Opens (creating if needed) an option store file.
pub fn open_db(path: impl AsRef<Path>) -> StoreResult<Connection> {
    let path = path.as_ref();
    open_store(StoreLocation::file(path), || Connection::open(path))
}

/// Opens a throwaway option store. Used by tests and one-shot CLI runs.
pub fn open_db_in_memory() -> StoreResult<Connection> {
    open_store(StoreLocation::Memory, Connection::open_in_memory)
}

fn open_store(
    location: StoreLocation,
    connect: impl FnOnce() -> rusqlite::Result<Connection>,
) -> StoreResult<Connection> {
    let started_at = Instant::now();
    let mode = location.mode();
    info!("event=db_open module=db status=start mode={mode} location={location}");

    let result = connect()
        .and_then(|conn| conn.busy_timeout(BUSY_TIMEOUT).map(|()| conn))
        .map_err(|source| StoreError::Open {
            location: location.clone(),
            source,
        })
        .and_then(|mut conn| upgrade_options_store(&mut conn, &location).map(|()| conn));

    match &result {
        Ok(_) => info!(
            "event=db_open module=db status=ok mode={mode} duration_ms={}",
            started_at.elapsed().as_millis()
        ),
        Err(err) => error!(
            "event=db_open module=db status=error mode={mode} duration_ms={} error={err}",
            started_at.elapsed().as_millis()
        ),
    }
    result
}
