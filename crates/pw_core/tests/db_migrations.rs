use pw_core::db::migrations::latest_version;
use pw_core::db::{open_db, open_db_in_memory, StoreError, StoreLocation};
use rusqlite::Connection;

#[test]
fn in_memory_database_gets_options_table() {
    let conn = open_db_in_memory().unwrap();

    assert_eq!(user_version(&conn), latest_version());
    assert!(table_exists(&conn, "options"));
}

#[test]
fn reopening_file_keeps_schema_and_rows() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("options.db");

    let conn = open_db(&path).unwrap();
    conn.execute(
        "INSERT INTO options (name, value, autoload) VALUES ('site', '{\"a\":\"1\"}', 1);",
        [],
    )
    .unwrap();
    drop(conn);

    let conn = open_db(&path).unwrap();
    assert_eq!(user_version(&conn), latest_version());
    let value: String = conn
        .query_row("SELECT value FROM options WHERE name = 'site';", [], |row| {
            row.get(0)
        })
        .unwrap();
    assert_eq!(value, "{\"a\":\"1\"}");
}

#[test]
fn empty_option_name_violates_schema() {
    let conn = open_db_in_memory().unwrap();
    let result = conn.execute(
        "INSERT INTO options (name, value) VALUES ('', '{}');",
        [],
    );
    assert!(result.is_err());
}

#[test]
fn newer_schema_version_is_refused() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("future.db");

    let conn = Connection::open(&path).unwrap();
    conn.execute_batch("PRAGMA user_version = 42;").unwrap();
    drop(conn);

    match open_db(&path).unwrap_err() {
        StoreError::NewerSchema {
            location,
            found,
            supported,
        } => {
            assert_eq!(location, StoreLocation::File(path.clone()));
            assert_eq!(found, 42);
            assert_eq!(supported, latest_version());
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn options_table_without_required_column_is_refused() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("legacy.db");

    let conn = Connection::open(&path).unwrap();
    conn.execute_batch(
        "CREATE TABLE options (name TEXT PRIMARY KEY NOT NULL, value TEXT NOT NULL);
         PRAGMA user_version = 1;",
    )
    .unwrap();
    drop(conn);

    let err = open_db(&path).unwrap_err();
    assert!(matches!(
        err,
        StoreError::MissingColumn {
            column: "autoload",
            ..
        }
    ));
    assert!(err.to_string().contains("legacy.db"));
}

#[test]
fn unopenable_path_names_the_store() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("missing").join("options.db");

    let err = open_db(&path).unwrap_err();
    assert!(matches!(err, StoreError::Open { .. }));
    assert!(err.to_string().contains("options.db"));
}

fn user_version(conn: &Connection) -> u32 {
    conn.query_row("PRAGMA user_version;", [], |row| row.get(0))
        .unwrap()
}

fn table_exists(conn: &Connection, name: &str) -> bool {
    conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = ?1);",
        [name],
        |row| row.get::<_, i64>(0),
    )
    .unwrap()
        == 1
}
