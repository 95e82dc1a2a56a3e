//! Durable key-value persistence for snapshots and preferences.
//!
//! # Responsibility
//! - Abstract the durable store behind `KeyValueStore`.
//! - Serialize member snapshots, export documents and the theme key.
//!
//! # Invariants
//! - A corrupt or missing blob loads as empty state, never partially.
//! - Import never yields members unless the whole document decodes.

pub mod kv_store;
pub mod snapshot;
pub mod sqlite_store;

pub use kv_store::{KeyValueStore, MemoryKeyValueStore, StorageError, StorageResult};
pub use snapshot::{
    export_file_name, export_snapshot, import_snapshot, ExportDocument, ExportMetadata, LoadedState, PersistedState,
    PersistenceAdapter, PersistenceError, APP_VERSION, STORE_KEY, THEME_KEY,
};
pub use sqlite_store::{latest_schema_version, SqliteKeyValueStore};
