//! Member store over an owned in-memory collection.
//!
//! # Responsibility
//! - Create, update, delete and bulk-replace members.
//! - Track collapse/selection/theme view state next to the collection.
//!
//! # Invariants
//! - After `delete(x)` no remaining member references `x` in
//!   `father`/`mother`/`spouse`/`children`.
//! - Failed operations leave both members and view state unchanged.
//! - `delete` on an unknown id is a no-op.

use crate::model::member::{Member, MemberDraft, MemberId, MemberPatch, MemberValidationError};
use crate::model::view_state::{Theme, ViewState};
use chrono::{DateTime, Utc};
use log::{debug, info};
use std::collections::HashSet;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type StoreResult<T> = Result<T, StoreError>;

/// Clock used to stamp `created_at`/`updated_at`.
pub type Clock = fn() -> DateTime<Utc>;

/// Errors from member store operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// Draft or patch failed member validation.
    Validation(MemberValidationError),
    /// Target member does not exist.
    NotFound(MemberId),
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::NotFound(id) => write!(f, "member not found: {id}"),
        }
    }
}

impl Error for StoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::NotFound(_) => None,
        }
    }
}

impl From<MemberValidationError> for StoreError {
    fn from(value: MemberValidationError) -> Self {
        Self::Validation(value)
    }
}

/// Outcome of a reference repair pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RepairReport {
    /// References pointing at ids that do not exist.
    pub dangling_removed: usize,
    /// References pointing at the owning member itself.
    pub self_references_removed: usize,
}

impl RepairReport {
    pub fn total(&self) -> usize {
        self.dangling_removed + self.self_references_removed
    }
}

/// Owned member collection plus view state.
#[derive(Debug, Clone)]
pub struct MemberStore {
    members: Vec<Member>,
    view: ViewState,
    clock: Clock,
}

impl Default for MemberStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemberStore {
    /// Creates an empty store stamped by the system clock.
    pub fn new() -> Self {
        Self::with_clock(Utc::now)
    }

    /// Creates an empty store with a caller-provided clock.
    pub fn with_clock(clock: Clock) -> Self {
        Self {
            members: Vec::new(),
            view: ViewState::default(),
            clock,
        }
    }

    /// Creates a store from previously persisted state.
    pub fn from_parts(members: Vec<Member>, view: ViewState, clock: Clock) -> Self {
        Self {
            members,
            view,
            clock,
        }
    }

    /// Returns the current time from the store clock.
    pub fn now(&self) -> DateTime<Utc> {
        (self.clock)()
    }

    pub fn members(&self) -> &[Member] {
        &self.members
    }

    pub fn view(&self) -> &ViewState {
        &self.view
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&Member> {
        self.members.iter().find(|member| member.id == id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.get(id).is_some()
    }

    /// Creates one member from draft input and appends it.
    ///
    /// # Errors
    /// - `StoreError::Validation` when the trimmed name is blank.
    pub fn create(&mut self, draft: MemberDraft) -> StoreResult<Member> {
        let member = Member::from_draft(draft, (self.clock)())?;
        self.members.push(member.clone());
        info!(
            "event=member_create module=store status=ok member_count={}",
            self.members.len()
        );
        Ok(member)
    }

    /// Merges `patch` over an existing member.
    ///
    /// # Errors
    /// - `StoreError::NotFound` when `id` is unknown.
    /// - `StoreError::Validation` when the patch carries a blank name.
    pub fn update(&mut self, id: &str, patch: MemberPatch) -> StoreResult<Member> {
        let now = (self.clock)();
        let member = self
            .members
            .iter_mut()
            .find(|member| member.id == id)
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;

        member.apply_patch(patch, now)?;
        info!("event=member_update module=store status=ok");
        Ok(member.clone())
    }

    /// Deletes one member and repairs every reference to it.
    ///
    /// Returns the removed member, or `None` when `id` was unknown.
    pub fn delete(&mut self, id: &str) -> Option<Member> {
        let index = self.members.iter().position(|member| member.id == id)?;

        let mut repaired = 0usize;
        for member in &mut self.members {
            let before = member.children.len();
            member.children.retain(|child| child != id);
            repaired += before - member.children.len();

            for slot in [&mut member.spouse, &mut member.father, &mut member.mother] {
                if slot.as_deref() == Some(id) {
                    *slot = None;
                    repaired += 1;
                }
            }
        }

        let removed = self.members.remove(index);
        self.view.collapsed_nodes.remove(id);
        if self.view.selected_member_id.as_deref() == Some(id) {
            self.view.selected_member_id = None;
        }

        info!(
            "event=member_delete module=store status=ok references_repaired={} member_count={}",
            repaired,
            self.members.len()
        );
        Some(removed)
    }

    /// Replaces the whole collection, as used by import.
    ///
    /// Resets collapse and selection state. No relation validation is done;
    /// call `repair_references` afterwards when clean links are required.
    pub fn replace_all(&mut self, members: Vec<Member>) {
        self.members = members;
        self.view.reset_navigation();
        info!(
            "event=member_replace_all module=store status=ok member_count={}",
            self.members.len()
        );
    }

    /// Removes all members and navigation state.
    pub fn clear_all(&mut self) {
        self.members.clear();
        self.view.reset_navigation();
        info!("event=member_clear module=store status=ok");
    }

    /// Drops dangling and self references across the whole collection.
    pub fn repair_references(&mut self) -> RepairReport {
        let known: HashSet<MemberId> = self.members.iter().map(|member| member.id.clone()).collect();
        let mut report = RepairReport::default();

        for member in &mut self.members {
            report.self_references_removed += member.strip_self_references();

            for slot in [&mut member.spouse, &mut member.father, &mut member.mother] {
                if slot.as_ref().is_some_and(|target| !known.contains(target)) {
                    *slot = None;
                    report.dangling_removed += 1;
                }
            }

            let before = member.children.len();
            member.children.retain(|child| known.contains(child));
            report.dangling_removed += before - member.children.len();
        }

        self.view
            .collapsed_nodes
            .retain(|collapsed| known.contains(collapsed));
        if self
            .view
            .selected_member_id
            .as_ref()
            .is_some_and(|selected| !known.contains(selected))
        {
            self.view.selected_member_id = None;
        }

        info!(
            "event=member_repair module=store status=ok dangling_removed={} self_references_removed={}",
            report.dangling_removed, report.self_references_removed
        );
        report
    }

    /// Flips collapse state for one member.
    ///
    /// Returns `true` when the member is collapsed afterwards.
    ///
    /// # Errors
    /// - `StoreError::NotFound` when `id` is unknown.
    pub fn toggle_collapsed(&mut self, id: &str) -> StoreResult<bool> {
        if !self.contains(id) {
            return Err(StoreError::NotFound(id.to_string()));
        }
        let collapsed = if self.view.collapsed_nodes.remove(id) {
            false
        } else {
            self.view.collapsed_nodes.insert(id.to_string());
            true
        };
        debug!("event=node_toggle module=store status=ok collapsed={collapsed}");
        Ok(collapsed)
    }

    pub fn expand_all(&mut self) {
        self.view.collapsed_nodes.clear();
    }

    pub fn collapse_all(&mut self) {
        self.view.collapsed_nodes = self.members.iter().map(|member| member.id.clone()).collect();
    }

    /// Marks one member as focused.
    ///
    /// # Errors
    /// - `StoreError::NotFound` when `id` is unknown.
    pub fn select(&mut self, id: &str) -> StoreResult<()> {
        if !self.contains(id) {
            return Err(StoreError::NotFound(id.to_string()));
        }
        self.view.selected_member_id = Some(id.to_string());
        Ok(())
    }

    pub fn clear_selection(&mut self) {
        self.view.selected_member_id = None;
    }

    pub fn set_theme(&mut self, theme: Theme) {
        self.view.theme = theme;
    }

    pub fn zoom_in(&mut self) -> f64 {
        self.view.zoom_in()
    }

    pub fn zoom_out(&mut self) -> f64 {
        self.view.zoom_out()
    }
}
