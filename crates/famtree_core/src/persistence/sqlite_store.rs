//! SQLite-backed key-value store.
//!
//! # Responsibility
//! - Open file or in-memory SQLite connections for the `kv_entries` table.
//! - Apply schema migrations before any key is read or written.
//!
//! # Invariants
//! - Returned stores have `foreign_keys=ON` and migrations fully applied.
//! - Migration version is mirrored to `PRAGMA user_version`.
//! - A database written by a newer schema is rejected, never downgraded.

use super::kv_store::{KeyValueStore, StorageError, StorageResult};
use log::{debug, error, info};
use rusqlite::{params, Connection, OptionalExtension};
use std::cmp::Ordering;
use std::path::Path;
use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy)]
struct Migration {
    version: u32,
    sql: &'static str,
}

const MIGRATIONS: &[Migration] = &[Migration {
    version: 1,
    sql: include_str!("migrations/0001_kv_entries.sql"),
}];

/// Returns the latest schema version known by this binary.
pub fn latest_schema_version() -> u32 {
    MIGRATIONS.last().map_or(0, |migration| migration.version)
}

/// Durable `KeyValueStore` over one SQLite connection.
#[derive(Debug)]
pub struct SqliteKeyValueStore {
    conn: Connection,
}

impl SqliteKeyValueStore {
    /// Opens a database file, creating it when missing.
    ///
    /// # Side effects
    /// - Emits `db_open` events with duration and status.
    pub fn open(path: impl AsRef<Path>) -> StorageResult<Self> {
        open_logged("file", || Connection::open(path))
    }

    /// Opens a private in-memory database.
    pub fn open_in_memory() -> StorageResult<Self> {
        open_logged("memory", Connection::open_in_memory)
    }

    /// Wraps an existing connection and migrates it.
    pub fn from_connection(mut conn: Connection) -> StorageResult<Self> {
        bootstrap_connection(&mut conn)?;
        Ok(Self { conn })
    }

    /// Returns the schema version recorded in the database.
    pub fn schema_version(&self) -> StorageResult<u32> {
        current_user_version(&self.conn)
    }
}

impl KeyValueStore for SqliteKeyValueStore {
    fn get(&self, key: &str) -> StorageResult<Option<String>> {
        let value = self
            .conn
            .query_row(
                "SELECT value FROM kv_entries WHERE key = ?1;",
                params![key],
                |row| row.get::<_, String>(0),
            )
            .optional()?;
        Ok(value)
    }

    fn set(&mut self, key: &str, value: &str) -> StorageResult<()> {
        self.conn.execute(
            "INSERT INTO kv_entries (key, value, updated_at)
             VALUES (?1, ?2, CAST(strftime('%s', 'now') AS INTEGER) * 1000)
             ON CONFLICT(key) DO UPDATE SET
                value = excluded.value,
                updated_at = excluded.updated_at;",
            params![key, value],
        )?;
        debug!(
            "event=kv_set module=persistence status=ok bytes={}",
            value.len()
        );
        Ok(())
    }

    fn remove(&mut self, key: &str) -> StorageResult<()> {
        self.conn
            .execute("DELETE FROM kv_entries WHERE key = ?1;", params![key])?;
        Ok(())
    }
}

fn open_logged(
    mode: &str,
    connect: impl FnOnce() -> rusqlite::Result<Connection>,
) -> StorageResult<SqliteKeyValueStore> {
    let started_at = Instant::now();
    info!("event=db_open module=persistence status=start mode={mode}");

    let conn = connect().map_err(|err| {
        error!(
            "event=db_open module=persistence status=error mode={mode} duration_ms={} error_code=db_open_failed error={err}",
            started_at.elapsed().as_millis()
        );
        StorageError::from(err)
    })?;

    match SqliteKeyValueStore::from_connection(conn) {
        Ok(store) => {
            info!(
                "event=db_open module=persistence status=ok mode={mode} duration_ms={}",
                started_at.elapsed().as_millis()
            );
            Ok(store)
        }
        Err(err) => {
            error!(
                "event=db_open module=persistence status=error mode={mode} duration_ms={} error_code=db_bootstrap_failed error={err}",
                started_at.elapsed().as_millis()
            );
            Err(err)
        }
    }
}

fn bootstrap_connection(conn: &mut Connection) -> StorageResult<()> {
    conn.pragma_update(None, "foreign_keys", true)?;
    conn.busy_timeout(Duration::from_secs(5))?;

    let found = current_user_version(conn)?;
    let pending: Vec<&Migration> = match found.cmp(&latest_schema_version()) {
        Ordering::Greater => {
            return Err(StorageError::UnsupportedSchemaVersion {
                db_version: found,
                latest_supported: latest_schema_version(),
            })
        }
        Ordering::Equal => return Ok(()),
        Ordering::Less => MIGRATIONS.iter().skip_while(|m| m.version <= found).collect(),
    };

    // kv_entries and user_version move together or not at all.
    let tx = conn.transaction()?;
    let mut reached = found;
    for migration in pending {
        tx.execute_batch(migration.sql)?;
        tx.pragma_update(None, "user_version", migration.version)?;
        reached = migration.version;
    }
    tx.commit()?;

    info!("event=db_migrate module=persistence status=ok from_version={found} to_version={reached}");
    Ok(())
}

fn current_user_version(conn: &Connection) -> StorageResult<u32> {
    Ok(conn.pragma_query_value(None, "user_version", |row| row.get(0))?)
}

#[cfg(test)]
mod tests {
    use super::{latest_schema_version, SqliteKeyValueStore};
    use crate::persistence::kv_store::KeyValueStore;
    use rusqlite::Connection;

    #[test]
    fn in_memory_store_is_migrated_to_latest() {
        let store = SqliteKeyValueStore::open_in_memory().unwrap();
        assert_eq!(store.schema_version().unwrap(), latest_schema_version());
    }

    #[test]
    fn set_overwrites_and_remove_deletes() {
        let mut store = SqliteKeyValueStore::open_in_memory().unwrap();
        store.set("family-tree-theme", "dark").unwrap();
        store.set("family-tree-theme", "light").unwrap();
        assert_eq!(
            store.get("family-tree-theme").unwrap().as_deref(),
            Some("light")
        );

        store.remove("family-tree-theme").unwrap();
        assert_eq!(store.get("family-tree-theme").unwrap(), None);
    }

    #[test]
    fn wrapped_connection_is_bootstrapped_once() {
        let store = SqliteKeyValueStore::from_connection(Connection::open_in_memory().unwrap())
            .unwrap();
        let foreign_keys: i64 = store
            .conn
            .pragma_query_value(None, "foreign_keys", |row| row.get(0))
            .unwrap();
        assert_eq!(foreign_keys, 1);

        let conn = store.conn;
        let again = SqliteKeyValueStore::from_connection(conn).unwrap();
        assert_eq!(again.schema_version().unwrap(), latest_schema_version());
    }
}
