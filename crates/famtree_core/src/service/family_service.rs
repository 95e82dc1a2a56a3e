//! Family tree use-case service.
//!
//! # Responsibility
//! - Compose the member store with persistence behind one facade.
//! - Auto-save after every mutation.
//! - Record user-facing notices for every outcome worth reporting.
//!
//! # Invariants
//! - Failed operations leave members and view state unchanged.
//! - Save failures are logged and surfaced as warning notices; they never
//!   fail the mutation that triggered them.
//! - A corrupt persisted blob opens as an empty tree, never a partial one.

use crate::model::member::{Member, MemberDraft, MemberId, MemberPatch, MemberValidationError};
use crate::model::view_state::{Theme, ViewState};
use crate::persistence::kv_store::KeyValueStore;
use crate::persistence::snapshot::{
    export_file_name, export_snapshot, import_snapshot, PersistenceAdapter, PersistenceError,
};
use crate::query::{self, FamilyStats, MemberCard, MemberDetails, RelationSlot, SortKey};
use crate::sample::sample_family;
use crate::store::member_store::{Clock, MemberStore, RepairReport, StoreError};
use crate::tree::{self, TreeNode, TreeRow};
use chrono::{NaiveDate, Utc};
use log::{error, info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Severity of a user-facing notice.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Info,
    Success,
    Warning,
    Error,
}

impl NoticeLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Info => "info",
            Self::Success => "success",
            Self::Warning => "warning",
            Self::Error => "error",
        }
    }
}

/// Transient message for the presentation layer to display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

impl Notice {
    fn new(level: NoticeLevel, message: impl Into<String>) -> Self {
        Self {
            level,
            message: message.into(),
        }
    }
}

/// Errors returned by family tree service operations.
#[derive(Debug)]
pub enum FamilyServiceError {
    /// Member input failed validation.
    Validation(MemberValidationError),
    /// Target member does not exist.
    MemberNotFound(MemberId),
    /// Imported document has an invalid shape.
    Format(String),
    /// Durable storage failed.
    Storage(PersistenceError),
}

impl Display for FamilyServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::MemberNotFound(id) => write!(f, "member not found: {id}"),
            Self::Format(message) => write!(f, "invalid file format: {message}"),
            Self::Storage(err) => write!(f, "{err}"),
        }
    }
}

impl Error for FamilyServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Storage(err) => Some(err),
            _ => None,
        }
    }
}

impl From<StoreError> for FamilyServiceError {
    fn from(value: StoreError) -> Self {
        match value {
            StoreError::Validation(err) => Self::Validation(err),
            StoreError::NotFound(id) => Self::MemberNotFound(id),
        }
    }
}

impl From<PersistenceError> for FamilyServiceError {
    fn from(value: PersistenceError) -> Self {
        match value {
            PersistenceError::Format(message) => Self::Format(message),
            other => Self::Storage(other),
        }
    }
}

impl FamilyServiceError {
    /// Stable machine-readable code for envelopes and logs.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Validation(_) => "validation",
            Self::MemberNotFound(_) => "member_not_found",
            Self::Format(_) => "invalid_format",
            Self::Storage(_) => "storage",
        }
    }
}

pub type ServiceResult<T> = Result<T, FamilyServiceError>;

/// Export payload plus its suggested file name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportedSnapshot {
    pub file_name: String,
    pub contents: String,
}

/// Family tree service facade.
pub struct FamilyTreeService<S: KeyValueStore> {
    store: MemberStore,
    persistence: PersistenceAdapter<S>,
    notices: Vec<Notice>,
}

impl<S: KeyValueStore> FamilyTreeService<S> {
    /// Opens the service over `kv` and loads any persisted state.
    pub fn open(kv: S) -> Self {
        Self::open_with_clock(kv, Utc::now)
    }

    /// Opens the service with a caller-provided clock.
    pub fn open_with_clock(kv: S, clock: Clock) -> Self {
        let persistence = PersistenceAdapter::new(kv);
        let mut notices = Vec::new();

        let loaded = match persistence.load() {
            Ok(loaded) => {
                if !loaded.members.is_empty() {
                    notices.push(Notice::new(NoticeLevel::Success, "Data loaded successfully"));
                }
                loaded
            }
            Err(err) => {
                error!("event=service_open module=service status=error error_code=load_failed error={err}");
                notices.push(Notice::new(NoticeLevel::Error, "Failed to load saved data"));
                Default::default()
            }
        };

        let stored_theme = persistence.load_theme().unwrap_or_else(|err| {
            warn!("event=theme_load module=service status=error error={err}");
            None
        });
        let view = ViewState {
            collapsed_nodes: loaded.collapsed_nodes,
            theme: stored_theme.or(loaded.theme).unwrap_or_default(),
            ..ViewState::default()
        };

        let store = MemberStore::from_parts(loaded.members, view, clock);
        info!(
            "event=service_open module=service status=ok member_count={}",
            store.len()
        );
        Self {
            store,
            persistence,
            notices,
        }
    }

    pub fn members(&self) -> &[Member] {
        self.store.members()
    }

    pub fn view(&self) -> &ViewState {
        self.store.view()
    }

    pub fn persistence(&self) -> &PersistenceAdapter<S> {
        &self.persistence
    }

    /// Current UTC date from the service clock, used for ages.
    pub fn today(&self) -> NaiveDate {
        self.store.now().date_naive()
    }

    pub fn get_member(&self, id: &str) -> Option<&Member> {
        self.store.get(id)
    }

    /// Creates a member and saves.
    pub fn create_member(&mut self, draft: MemberDraft) -> ServiceResult<Member> {
        let member = self.store.create(draft).map_err(|err| self.fail(err))?;
        self.save();
        self.notify(
            NoticeLevel::Success,
            format!("{} added to family tree", member.name),
        );
        Ok(member)
    }

    /// Applies `patch` to one member and saves.
    pub fn update_member(&mut self, id: &str, patch: MemberPatch) -> ServiceResult<Member> {
        let member = self.store.update(id, patch).map_err(|err| self.fail(err))?;
        self.save();
        self.notify(
            NoticeLevel::Success,
            format!("{} updated successfully", member.name),
        );
        Ok(member)
    }

    /// Deletes one member with reference repair. Unknown ids are a no-op.
    pub fn delete_member(&mut self, id: &str) -> Option<Member> {
        let removed = self.store.delete(id)?;
        self.save();
        self.notify(
            NoticeLevel::Warning,
            format!("{} removed from family tree", removed.name),
        );
        Some(removed)
    }

    /// Returns the detail-panel view of one member.
    pub fn member_details(&self, id: &str, today: NaiveDate) -> ServiceResult<MemberDetails> {
        let member = self
            .store
            .get(id)
            .ok_or_else(|| FamilyServiceError::MemberNotFound(id.to_string()))?;
        Ok(query::details(self.store.members(), member, today))
    }

    pub fn list_members(&self, search: &str, sort: SortKey) -> Vec<&Member> {
        query::list(self.store.members(), search, sort)
    }

    pub fn member_cards(&self, search: &str, sort: SortKey, today: NaiveDate) -> Vec<MemberCard> {
        query::list(self.store.members(), search, sort)
            .into_iter()
            .map(|member| query::card(member, today))
            .collect()
    }

    pub fn relation_candidates(&self, slot: RelationSlot, editing_id: Option<&str>) -> Vec<&Member> {
        query::relation_candidates(self.store.members(), slot, editing_id)
    }

    pub fn stats(&self) -> FamilyStats {
        query::stats(self.store.members())
    }

    /// Builds the render forest under the current collapse state.
    pub fn tree(&self) -> Vec<TreeNode> {
        tree::build(self.store.members(), &self.store.view().collapsed_nodes)
    }

    pub fn tree_rows(&self) -> Vec<TreeRow> {
        tree::flatten(&self.tree())
    }

    /// Flips one member's collapse state and saves.
    pub fn toggle_collapsed(&mut self, id: &str) -> ServiceResult<bool> {
        let collapsed = self.store.toggle_collapsed(id).map_err(|err| self.fail(err))?;
        self.save();
        Ok(collapsed)
    }

    pub fn expand_all(&mut self) {
        self.store.expand_all();
        self.save();
    }

    pub fn collapse_all(&mut self) {
        self.store.collapse_all();
        self.save();
    }

    pub fn select_member(&mut self, id: &str) -> ServiceResult<()> {
        self.store.select(id).map_err(|err| self.fail(err))
    }

    pub fn clear_selection(&mut self) {
        self.store.clear_selection();
    }

    /// Switches between light and dark and returns the new theme.
    pub fn toggle_theme(&mut self) -> Theme {
        let theme = self.store.view().theme.toggled();
        self.set_theme(theme);
        theme
    }

    /// Sets the theme, writing both the theme key and the state blob.
    pub fn set_theme(&mut self, theme: Theme) {
        self.store.set_theme(theme);
        if let Err(err) = self.persistence.save_theme(theme) {
            warn!("event=theme_save module=service status=error error={err}");
            self.notify(NoticeLevel::Warning, "Failed to save theme preference");
        }
        self.save();
        let label = match theme {
            Theme::Light => "Light",
            Theme::Dark => "Dark",
        };
        self.notify(NoticeLevel::Info, format!("{label} mode activated"));
    }

    pub fn zoom_in(&mut self) -> f64 {
        self.store.zoom_in()
    }

    pub fn zoom_out(&mut self) -> f64 {
        self.store.zoom_out()
    }

    /// Renders the export document for the current members.
    pub fn export_json(&mut self) -> ServiceResult<ExportedSnapshot> {
        let now = self.store.now();
        let contents = export_snapshot(self.store.members(), now).map_err(|err| self.fail(err))?;
        info!(
            "event=export module=service status=ok member_count={} bytes={}",
            self.store.len(),
            contents.len()
        );
        self.notify(NoticeLevel::Success, "Family tree exported successfully");
        Ok(ExportedSnapshot {
            file_name: export_file_name(now),
            contents,
        })
    }

    /// Replaces all members with the ones in `document` and saves.
    ///
    /// Returns the number of imported members.
    ///
    /// # Errors
    /// - `FamilyServiceError::Format` when the document is rejected. Current
    ///   members stay untouched.
    pub fn import_json(&mut self, document: &str) -> ServiceResult<usize> {
        let members = match import_snapshot(document) {
            Ok(members) => members,
            Err(err) => {
                warn!("event=import module=service status=error error_code=invalid_format");
                self.notices.push(Notice::new(
                    NoticeLevel::Error,
                    "Failed to import data. Invalid file format.",
                ));
                return Err(err.into());
            }
        };

        let count = members.len();
        self.store.replace_all(members);
        self.save();
        info!("event=import module=service status=ok member_count={count}");
        self.notify(
            NoticeLevel::Success,
            format!("Successfully imported {count} members"),
        );
        Ok(count)
    }

    /// Removes every member and saves the empty state.
    pub fn clear_all(&mut self) {
        self.store.clear_all();
        self.save();
        self.notify(NoticeLevel::Warning, "All data cleared");
    }

    /// Loads the sample family when no members exist.
    ///
    /// Returns `true` when the sample was seeded.
    pub fn seed_sample_if_empty(&mut self) -> bool {
        if !self.store.is_empty() {
            return false;
        }
        let members = sample_family(self.store.now());
        self.store.replace_all(members);
        self.save();
        self.notify(NoticeLevel::Success, "Sample family tree loaded!");
        true
    }

    /// Drops dangling and self references, saving when anything changed.
    pub fn repair_references(&mut self) -> RepairReport {
        let report = self.store.repair_references();
        if report.total() > 0 {
            self.save();
            self.notify(
                NoticeLevel::Info,
                format!("Repaired {} broken relationship links", report.total()),
            );
        }
        report
    }

    /// Returns and clears pending notices in emission order.
    pub fn drain_notices(&mut self) -> Vec<Notice> {
        std::mem::take(&mut self.notices)
    }

    fn save(&mut self) {
        let view = self.store.view();
        let result = self.persistence.save(
            self.store.members(),
            &view.collapsed_nodes,
            view.theme,
            self.store.now(),
        );
        if let Err(err) = result {
            warn!("event=auto_save module=service status=error error={err}");
            self.notify(NoticeLevel::Warning, "Failed to save data");
        }
    }

    fn fail(&mut self, err: impl Into<FamilyServiceError>) -> FamilyServiceError {
        let err = err.into();
        warn!(
            "event=service_op module=service status=error error_code={}",
            err.code()
        );
        let message = match &err {
            FamilyServiceError::Validation(MemberValidationError::EmptyName) => {
                "Please enter a name".to_string()
            }
            FamilyServiceError::MemberNotFound(_) => "Member not found".to_string(),
            other => other.to_string(),
        };
        self.notices.push(Notice::new(NoticeLevel::Error, message));
        err
    }

    fn notify(&mut self, level: NoticeLevel, message: impl Into<String>) {
        self.notices.push(Notice::new(level, message));
    }
}
