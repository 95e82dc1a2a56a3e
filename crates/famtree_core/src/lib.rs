//! Core domain logic for the family tree builder.
//! This crate is the single source of truth for member and relationship
//! invariants; FFI and CLI front ends only call into it.

pub mod config;
pub mod logging;
pub mod model;
pub mod persistence;
pub mod query;
pub mod resolver;
pub mod sample;
pub mod service;
pub mod store;
pub mod tree;

pub use config::CoreConfig;
pub use logging::{default_log_level, init_logging, logging_status};
pub use model::member::{Gender, Member, MemberDraft, MemberId, MemberPatch, MemberValidationError};
pub use model::view_state::{Theme, ViewState};
pub use persistence::{
    KeyValueStore, MemoryKeyValueStore, PersistenceAdapter, PersistenceError, SqliteKeyValueStore,
    StorageError,
};
pub use query::{FamilyStats, MemberCard, MemberDetails, RelationSlot, SortKey};
pub use service::family_service::{
    ExportedSnapshot, FamilyServiceError, FamilyTreeService, Notice, NoticeLevel, ServiceResult,
};
pub use store::member_store::{MemberStore, RepairReport, StoreError, StoreResult};
pub use tree::{TreeNode, TreeRow};

/// Minimal health-check API for early integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
