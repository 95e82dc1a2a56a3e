//! Snapshot, export and preference documents over a `KeyValueStore`.
//!
//! # Responsibility
//! - Save and load the full member collection with its collapse state.
//! - Produce and parse portable export documents.
//! - Read and write the standalone theme preference key.
//!
//! # Invariants
//! - `load` returns either the complete stored state or an error.
//! - `import_snapshot` yields members only when `members` is a JSON array
//!   and every element decodes as a member.

use super::kv_store::{KeyValueStore, StorageError};
use crate::model::member::{format_timestamp, Member, MemberId};
use crate::model::view_state::Theme;
use chrono::{DateTime, Utc};
use log::{info, warn};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeSet;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Document format version written into blobs and exports.
pub const APP_VERSION: &str = "2.1.0";
/// Key holding the full persisted state blob.
pub const STORE_KEY: &str = "family-tree-builder-data";
/// Key holding the theme preference.
pub const THEME_KEY: &str = "family-tree-theme";

/// Persistence failures surfaced to the service layer.
#[derive(Debug)]
pub enum PersistenceError {
    /// Durable store read/write failed.
    Storage(StorageError),
    /// State could not be encoded as JSON.
    Serialize(serde_json::Error),
    /// Stored or imported document has an invalid shape.
    Format(String),
}

impl Display for PersistenceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Storage(err) => write!(f, "storage error: {err}"),
            Self::Serialize(err) => write!(f, "serialization error: {err}"),
            Self::Format(message) => write!(f, "invalid document: {message}"),
        }
    }
}

impl Error for PersistenceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Storage(err) => Some(err),
            Self::Serialize(err) => Some(err),
            Self::Format(_) => None,
        }
    }
}

impl From<StorageError> for PersistenceError {
    fn from(value: StorageError) -> Self {
        Self::Storage(value)
    }
}

/// Blob stored under [`STORE_KEY`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersistedState {
    #[serde(default)]
    pub members: Vec<Member>,
    #[serde(default)]
    pub collapsed_nodes: Vec<MemberId>,
    #[serde(default)]
    pub theme: Option<Theme>,
    #[serde(default)]
    pub version: String,
    #[serde(default)]
    pub saved_at: String,
}

/// Portable document produced by export and accepted by import.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportDocument {
    pub members: Vec<Member>,
    pub metadata: ExportMetadata,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportMetadata {
    pub exported_at: String,
    pub version: String,
    pub member_count: usize,
}

/// State recovered from the durable store.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LoadedState {
    pub members: Vec<Member>,
    pub collapsed_nodes: BTreeSet<MemberId>,
    /// Theme recorded in the blob; `None` when absent.
    pub theme: Option<Theme>,
}

/// Maps member state onto keys of a `KeyValueStore`.
#[derive(Debug)]
pub struct PersistenceAdapter<S> {
    kv: S,
}

impl<S: KeyValueStore> PersistenceAdapter<S> {
    pub fn new(kv: S) -> Self {
        Self { kv }
    }

    pub fn kv(&self) -> &S {
        &self.kv
    }

    pub fn into_inner(self) -> S {
        self.kv
    }

    /// Writes the full state blob under [`STORE_KEY`].
    ///
    /// # Errors
    /// - `PersistenceError::Storage` when the store rejects the write.
    pub fn save(
        &mut self,
        members: &[Member],
        collapsed: &BTreeSet<MemberId>,
        theme: Theme,
        now: DateTime<Utc>,
    ) -> Result<(), PersistenceError> {
        let state = PersistedState {
            members: members.to_vec(),
            collapsed_nodes: collapsed.iter().cloned().collect(),
            theme: Some(theme),
            version: APP_VERSION.to_string(),
            saved_at: format_timestamp(now),
        };
        let blob = serde_json::to_string(&state).map_err(PersistenceError::Serialize)?;

        if let Err(err) = self.kv.set(STORE_KEY, &blob) {
            warn!(
                "event=snapshot_save module=persistence status=error bytes={} error={err}",
                blob.len()
            );
            return Err(err.into());
        }
        info!(
            "event=snapshot_save module=persistence status=ok member_count={} bytes={}",
            members.len(),
            blob.len()
        );
        Ok(())
    }

    /// Reads the state blob.
    ///
    /// A missing key is an empty state. Missing fields inside a present blob
    /// default to empty values.
    ///
    /// # Errors
    /// - `PersistenceError::Storage` when the store cannot be read.
    /// - `PersistenceError::Format` when the blob is not a valid state document.
    pub fn load(&self) -> Result<LoadedState, PersistenceError> {
        let Some(blob) = self.kv.get(STORE_KEY)? else {
            info!("event=snapshot_load module=persistence status=empty");
            return Ok(LoadedState::default());
        };

        let state: PersistedState = serde_json::from_str(&blob).map_err(|err| {
            warn!("event=snapshot_load module=persistence status=error error_code=malformed_blob");
            PersistenceError::Format(err.to_string())
        })?;

        info!(
            "event=snapshot_load module=persistence status=ok member_count={} version={}",
            state.members.len(),
            if state.version.is_empty() { "unknown" } else { state.version.as_str() }
        );
        Ok(LoadedState {
            members: state.members,
            collapsed_nodes: state.collapsed_nodes.into_iter().collect(),
            theme: state.theme,
        })
    }

    /// Reads [`THEME_KEY`]; `None` when the key was never written.
    pub fn load_theme(&self) -> Result<Option<Theme>, PersistenceError> {
        Ok(self.kv.get(THEME_KEY)?.map(|value| Theme::parse(&value)))
    }

    pub fn save_theme(&mut self, theme: Theme) -> Result<(), PersistenceError> {
        self.kv.set(THEME_KEY, theme.as_str())?;
        Ok(())
    }

    /// Removes every key this adapter owns.
    pub fn clear(&mut self) -> Result<(), PersistenceError> {
        self.kv.remove(STORE_KEY)?;
        self.kv.remove(THEME_KEY)?;
        Ok(())
    }
}

/// Renders `members` as a pretty-printed export document.
///
/// # Errors
/// - `PersistenceError::Serialize` when encoding fails.
pub fn export_snapshot(members: &[Member], now: DateTime<Utc>) -> Result<String, PersistenceError> {
    let document = ExportDocument {
        members: members.to_vec(),
        metadata: ExportMetadata {
            exported_at: format_timestamp(now),
            version: APP_VERSION.to_string(),
            member_count: members.len(),
        },
    };
    serde_json::to_string_pretty(&document).map_err(PersistenceError::Serialize)
}

/// Parses an import document and returns its members.
///
/// Only `members` is required; `metadata` and unknown fields are ignored.
///
/// # Errors
/// - `PersistenceError::Format` when the text is not JSON, `members` is
///   missing or not an array, or any element is not a member.
pub fn import_snapshot(document: &str) -> Result<Vec<Member>, PersistenceError> {
    let value: Value = serde_json::from_str(document)
        .map_err(|err| PersistenceError::Format(format!("not valid JSON: {err}")))?;

    let members = match value.get("members") {
        Some(Value::Array(items)) => items.clone(),
        Some(_) => return Err(PersistenceError::Format("`members` must be an array".to_string())),
        None => return Err(PersistenceError::Format("missing `members` array".to_string())),
    };

    members
        .into_iter()
        .enumerate()
        .map(|(index, item)| {
            serde_json::from_value::<Member>(item).map_err(|err| {
                PersistenceError::Format(format!("member at index {index} is invalid: {err}"))
            })
        })
        .collect()
}

/// Suggested download name for an export made at `now`.
pub fn export_file_name(now: DateTime<Utc>) -> String {
    format!("family-tree-{}.json", now.format("%Y-%m-%d"))
}
