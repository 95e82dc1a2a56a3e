//! FFI use-case API for Flutter-facing calls.
//!
//! # Responsibility
//! - Expose family tree use cases to Dart via FRB.
//! - Translate core results and notices into flat response envelopes.
//!
//! # Invariants
//! - Exported functions must not panic across the FFI boundary.
//! - Each call opens storage, runs one use case and saves under a
//!   process-wide lock, so concurrent calls never interleave writes.

use famtree_core::{
    core_version as core_version_inner, init_logging as init_logging_inner, ping as ping_inner,
    CoreConfig, FamilyServiceError, FamilyStats, FamilyTreeService, Gender, Member, MemberCard,
    MemberDraft, MemberPatch, Notice, NoticeLevel, SortKey, SqliteKeyValueStore, TreeRow,
};
use log::warn;
use std::path::PathBuf;
use std::sync::{Mutex, OnceLock};

static DB_PATH: OnceLock<Mutex<Option<PathBuf>>> = OnceLock::new();
static SERVICE_LOCK: Mutex<()> = Mutex::new(());

/// Minimal health-check API for FRB smoke integration.
///
/// # FFI contract
/// - Sync call, non-blocking.
/// - Never throws; always returns a UTF-8 string.
#[flutter_rust_bridge::frb(sync)]
pub fn ping() -> String {
    ping_inner().to_owned()
}

/// Expose core crate version through FFI.
#[flutter_rust_bridge::frb(sync)]
pub fn core_version() -> String {
    core_version_inner().to_owned()
}

/// Initializes Rust core logging once per process.
///
/// # FFI contract
/// - Safe to call repeatedly with the same `level + log_dir`.
/// - Returns empty string on success and error message on failure.
#[flutter_rust_bridge::frb(sync)]
pub fn init_logging(level: String, log_dir: String) -> String {
    match init_logging_inner(level.as_str(), log_dir.as_str()) {
        Ok(()) => String::new(),
        Err(err) => err,
    }
}

/// Points subsequent calls at `db_path`.
///
/// Without this call the path comes from `FAMTREE_DB_PATH` or the temp dir.
/// Returns empty string on success and error message on failure.
#[flutter_rust_bridge::frb(sync)]
pub fn configure_storage(db_path: String) -> String {
    let trimmed = db_path.trim();
    if trimmed.is_empty() {
        return "db_path cannot be empty".to_string();
    }
    let mut slot = db_path_slot()
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner());
    *slot = Some(PathBuf::from(trimmed));
    String::new()
}

/// Member form payload. Empty strings mean "not set".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MemberInput {
    pub name: String,
    /// `male|female|other`; anything else is stored as `other`.
    pub gender: String,
    pub dob: String,
    pub birth_place: String,
    pub occupation: String,
    pub email: String,
    pub bio: String,
    pub photo: String,
    pub spouse: Option<String>,
    pub father: Option<String>,
    pub mother: Option<String>,
    pub children: Vec<String>,
}

/// Full member record as shown in forms and detail panels.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemberView {
    pub id: String,
    pub name: String,
    pub gender: String,
    pub dob: String,
    pub birth_place: String,
    pub occupation: String,
    pub email: String,
    pub bio: String,
    pub photo: String,
    pub spouse: Option<String>,
    pub father: Option<String>,
    pub mother: Option<String>,
    pub children: Vec<String>,
    pub created_at: String,
    pub updated_at: String,
}

/// Toast-style message produced by a use case.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NoticeView {
    /// `info|success|warning|error`.
    pub level: String,
    pub message: String,
}

/// Generic action envelope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FamilyActionResponse {
    pub ok: bool,
    /// Stable error code on failure (`validation|member_not_found|invalid_format|storage|db_open`).
    pub error_code: Option<String>,
    /// Member produced or touched by the action, when any.
    pub member: Option<MemberView>,
    pub message: String,
    pub notices: Vec<NoticeView>,
}

impl FamilyActionResponse {
    fn success(message: impl Into<String>, member: Option<MemberView>, notices: Vec<NoticeView>) -> Self {
        Self {
            ok: true,
            error_code: None,
            member,
            message: message.into(),
            notices,
        }
    }

    fn failure(code: &str, message: impl Into<String>, notices: Vec<NoticeView>) -> Self {
        Self {
            ok: false,
            error_code: Some(code.to_string()),
            member: None,
            message: message.into(),
            notices,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemberCardView {
    pub id: String,
    pub name: String,
    pub initials: String,
    pub gender: String,
    pub dob: String,
    pub age: Option<u32>,
    pub occupation: String,
    pub has_photo: bool,
    pub parents_count: u32,
    pub has_spouse: bool,
    pub children_count: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FamilyStatsView {
    pub total: u32,
    pub male: u32,
    pub female: u32,
    pub other: u32,
    pub generations: u32,
}

/// List view envelope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemberListResponse {
    pub items: Vec<MemberCardView>,
    pub stats: FamilyStatsView,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeRowView {
    pub member_id: String,
    pub name: String,
    pub gender: String,
    pub depth: u32,
    pub collapsed: bool,
    pub has_children: bool,
}

/// Tree view envelope in preorder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeResponse {
    pub rows: Vec<TreeRowView>,
    pub theme: String,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportResponse {
    pub ok: bool,
    pub file_name: String,
    pub contents: String,
    pub message: String,
}

/// Creates one member from form input.
///
/// # FFI contract
/// - Sync call, DB-backed execution.
/// - Never panics.
/// - Returns the created member on success.
#[flutter_rust_bridge::frb(sync)]
pub fn family_create_member(input: MemberInput) -> FamilyActionResponse {
    run_action(|service| {
        service
            .create_member(to_draft(input))
            .map(|member| ("Member created.".to_string(), Some(to_member_view(&member))))
    })
}

/// Replaces every form field of an existing member.
#[flutter_rust_bridge::frb(sync)]
pub fn family_update_member(id: String, input: MemberInput) -> FamilyActionResponse {
    run_action(|service| {
        service
            .update_member(id.trim(), to_patch(input))
            .map(|member| ("Member updated.".to_string(), Some(to_member_view(&member))))
    })
}

/// Deletes one member; unknown ids succeed as a no-op.
#[flutter_rust_bridge::frb(sync)]
pub fn family_delete_member(id: String) -> FamilyActionResponse {
    run_action(|service| {
        let message = match service.delete_member(id.trim()) {
            Some(_) => "Member deleted.",
            None => "Nothing to delete.",
        };
        Ok((message.to_string(), None))
    })
}

#[flutter_rust_bridge::frb(sync)]
pub fn family_get_member(id: String) -> FamilyActionResponse {
    run_action(|service| {
        service
            .get_member(id.trim())
            .map(|member| ("Member found.".to_string(), Some(to_member_view(member))))
            .ok_or_else(|| FamilyServiceError::MemberNotFound(id.trim().to_string()))
    })
}

/// Lists member cards filtered by `search` and ordered by `sort_by`
/// (`name|dob|gender`).
#[flutter_rust_bridge::frb(sync)]
pub fn family_list_members(search: String, sort_by: String) -> MemberListResponse {
    let sort = SortKey::parse(&sort_by);
    match with_service(|service| {
        let today = service.today();
        let items = service
            .member_cards(&search, sort, today)
            .into_iter()
            .map(to_card_view)
            .collect::<Vec<_>>();
        Ok((items, to_stats_view(service.stats())))
    }) {
        Ok(((items, stats), _)) => {
            let message = if items.is_empty() {
                "No members.".to_string()
            } else {
                format!("Found {} member(s).", items.len())
            };
            MemberListResponse {
                items,
                stats,
                message,
            }
        }
        Err(response) => MemberListResponse {
            items: Vec::new(),
            stats: to_stats_view(FamilyStats::default()),
            message: response.message,
        },
    }
}

/// Returns the flattened tree under the persisted collapse state.
#[flutter_rust_bridge::frb(sync)]
pub fn family_tree() -> TreeResponse {
    match with_service(|service| {
        let rows = service.tree_rows().into_iter().map(to_tree_row_view).collect();
        Ok((rows, service.view().theme.as_str().to_string()))
    }) {
        Ok(((rows, theme), _)) => TreeResponse {
            rows,
            theme,
            message: String::new(),
        },
        Err(response) => TreeResponse {
            rows: Vec::new(),
            theme: String::new(),
            message: response.message,
        },
    }
}

#[flutter_rust_bridge::frb(sync)]
pub fn family_toggle_collapsed(id: String) -> FamilyActionResponse {
    run_action(|service| {
        service.toggle_collapsed(id.trim()).map(|collapsed| {
            let message = if collapsed { "Collapsed." } else { "Expanded." };
            (message.to_string(), None)
        })
    })
}

#[flutter_rust_bridge::frb(sync)]
pub fn family_expand_all() -> FamilyActionResponse {
    run_action(|service| {
        service.expand_all();
        Ok(("Expanded all.".to_string(), None))
    })
}

#[flutter_rust_bridge::frb(sync)]
pub fn family_collapse_all() -> FamilyActionResponse {
    run_action(|service| {
        service.collapse_all();
        Ok(("Collapsed all.".to_string(), None))
    })
}

/// Flips the theme; `message` carries the new theme label.
#[flutter_rust_bridge::frb(sync)]
pub fn family_toggle_theme() -> FamilyActionResponse {
    run_action(|service| Ok((service.toggle_theme().as_str().to_string(), None)))
}

#[flutter_rust_bridge::frb(sync)]
pub fn family_export() -> ExportResponse {
    match with_service(|service| service.export_json()) {
        Ok((snapshot, _)) => ExportResponse {
            ok: true,
            file_name: snapshot.file_name,
            contents: snapshot.contents,
            message: "Family tree exported.".to_string(),
        },
        Err(response) => ExportResponse {
            ok: false,
            file_name: String::new(),
            contents: String::new(),
            message: response.message,
        },
    }
}

/// Replaces all members with the contents of an export document.
#[flutter_rust_bridge::frb(sync)]
pub fn family_import(contents: String) -> FamilyActionResponse {
    run_action(|service| {
        service
            .import_json(&contents)
            .map(|count| (format!("Imported {count} member(s)."), None))
    })
}

#[flutter_rust_bridge::frb(sync)]
pub fn family_clear_all() -> FamilyActionResponse {
    run_action(|service| {
        service.clear_all();
        Ok(("All data cleared.".to_string(), None))
    })
}

/// Seeds the sample family when the tree is empty.
#[flutter_rust_bridge::frb(sync)]
pub fn family_seed_sample() -> FamilyActionResponse {
    run_action(|service| {
        let message = if service.seed_sample_if_empty() {
            "Sample family loaded."
        } else {
            "Tree is not empty."
        };
        Ok((message.to_string(), None))
    })
}

#[flutter_rust_bridge::frb(sync)]
pub fn family_repair_references() -> FamilyActionResponse {
    run_action(|service| {
        let report = service.repair_references();
        Ok((format!("Repaired {} reference(s).", report.total()), None))
    })
}

type ServiceCall<T> = Result<T, FamilyServiceError>;

fn run_action(
    f: impl FnOnce(
        &mut FamilyTreeService<SqliteKeyValueStore>,
    ) -> ServiceCall<(String, Option<MemberView>)>,
) -> FamilyActionResponse {
    match with_service(f) {
        Ok(((message, member), notices)) => FamilyActionResponse::success(message, member, notices),
        Err(response) => response,
    }
}

fn with_service<T>(
    f: impl FnOnce(&mut FamilyTreeService<SqliteKeyValueStore>) -> ServiceCall<T>,
) -> Result<(T, Vec<NoticeView>), FamilyActionResponse> {
    let _guard = SERVICE_LOCK
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner());

    let db_path = resolve_db_path();
    let kv = SqliteKeyValueStore::open(&db_path).map_err(|err| {
        warn!("event=ffi_call module=ffi status=error error_code=db_open");
        FamilyActionResponse::failure("db_open", format!("storage open failed: {err}"), Vec::new())
    })?;

    let mut service = FamilyTreeService::open(kv);
    // Each call reopens storage, so a successful load is not news.
    let mut notices: Vec<NoticeView> = service
        .drain_notices()
        .into_iter()
        .filter(|notice| notice.level != NoticeLevel::Success)
        .map(to_notice_view)
        .collect();

    let result = f(&mut service);
    notices.extend(service.drain_notices().into_iter().map(to_notice_view));
    match result {
        Ok(value) => Ok((value, notices)),
        Err(err) => Err(FamilyActionResponse::failure(
            err.code(),
            err.to_string(),
            notices,
        )),
    }
}

fn db_path_slot() -> &'static Mutex<Option<PathBuf>> {
    DB_PATH.get_or_init(|| Mutex::new(None))
}

fn resolve_db_path() -> PathBuf {
    let slot = db_path_slot()
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner());
    slot.clone()
        .unwrap_or_else(|| CoreConfig::from_env().db_path)
}

fn to_draft(input: MemberInput) -> MemberDraft {
    MemberDraft {
        name: input.name,
        gender: Some(Gender::parse(&input.gender).unwrap_or_default()),
        dob: Some(input.dob),
        birth_place: Some(input.birth_place),
        occupation: Some(input.occupation),
        email: Some(input.email),
        bio: Some(input.bio),
        photo: Some(input.photo),
        spouse: input.spouse,
        father: input.father,
        mother: input.mother,
        children: input.children,
    }
}

fn to_patch(input: MemberInput) -> MemberPatch {
    MemberPatch {
        name: Some(input.name),
        gender: Some(Gender::parse(&input.gender).unwrap_or_default()),
        dob: Some(input.dob),
        birth_place: Some(input.birth_place),
        occupation: Some(input.occupation),
        email: Some(input.email),
        bio: Some(input.bio),
        photo: Some(input.photo),
        spouse: Some(input.spouse),
        father: Some(input.father),
        mother: Some(input.mother),
        children: Some(input.children),
    }
}

fn to_member_view(member: &Member) -> MemberView {
    MemberView {
        id: member.id.clone(),
        name: member.name.clone(),
        gender: member.gender.as_str().to_string(),
        dob: member.dob.clone(),
        birth_place: member.birth_place.clone(),
        occupation: member.occupation.clone(),
        email: member.email.clone(),
        bio: member.bio.clone(),
        photo: member.photo.clone(),
        spouse: member.spouse.clone(),
        father: member.father.clone(),
        mother: member.mother.clone(),
        children: member.children.clone(),
        created_at: member.created_at.clone(),
        updated_at: member.updated_at.clone(),
    }
}

fn to_card_view(card: MemberCard) -> MemberCardView {
    MemberCardView {
        id: card.id,
        name: card.name,
        initials: card.initials,
        gender: card.gender.as_str().to_string(),
        dob: card
            .dob
            .map(|date| date.format("%Y-%m-%d").to_string())
            .unwrap_or_default(),
        age: card.age,
        occupation: card.occupation,
        has_photo: card.has_photo,
        parents_count: saturating_u32(card.parents_count),
        has_spouse: card.has_spouse,
        children_count: saturating_u32(card.children_count),
    }
}

fn to_stats_view(stats: FamilyStats) -> FamilyStatsView {
    FamilyStatsView {
        total: saturating_u32(stats.total),
        male: saturating_u32(stats.male),
        female: saturating_u32(stats.female),
        other: saturating_u32(stats.other),
        generations: saturating_u32(stats.generations),
    }
}

fn to_tree_row_view(row: TreeRow) -> TreeRowView {
    TreeRowView {
        member_id: row.member_id,
        name: row.name,
        gender: row.gender.as_str().to_string(),
        depth: saturating_u32(row.depth),
        collapsed: row.collapsed,
        has_children: row.has_children,
    }
}

fn to_notice_view(notice: Notice) -> NoticeView {
    NoticeView {
        level: notice.level.as_str().to_string(),
        message: notice.message,
    }
}

fn saturating_u32(value: usize) -> u32 {
    u32::try_from(value).unwrap_or(u32::MAX)
}

#[cfg(test)]
mod tests {
    use super::{
        configure_storage, core_version, family_clear_all, family_create_member,
        family_delete_member, family_export, family_get_member, family_import,
        family_list_members, family_seed_sample, family_toggle_collapsed, family_tree,
        init_logging, ping, MemberInput,
    };
    use std::sync::{Mutex, MutexGuard, OnceLock};

    static TEST_DIR: OnceLock<tempfile::TempDir> = OnceLock::new();
    static TEST_SERIAL: Mutex<()> = Mutex::new(());

    /// Points storage at a per-process temp DB and serializes tests that
    /// reset shared state.
    fn isolated() -> MutexGuard<'static, ()> {
        let guard = TEST_SERIAL
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        let dir = TEST_DIR.get_or_init(|| tempfile::tempdir().unwrap());
        let path = dir.path().join("famtree_ffi_test.sqlite3");
        assert_eq!(configure_storage(path.to_str().unwrap().to_string()), "");
        assert!(family_clear_all().ok);
        guard
    }

    fn input(name: &str) -> MemberInput {
        MemberInput {
            name: name.to_string(),
            gender: "female".to_string(),
            ..MemberInput::default()
        }
    }

    #[test]
    fn ping_returns_pong() {
        assert_eq!(ping(), "pong");
    }

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }

    #[test]
    fn init_logging_rejects_empty_log_dir() {
        assert!(!init_logging("info".to_string(), String::new()).is_empty());
    }

    #[test]
    fn configure_storage_rejects_blank_path() {
        assert!(!configure_storage("  ".to_string()).is_empty());
    }

    #[test]
    fn create_then_get_round_trips_through_storage() {
        let _guard = isolated();
        let created = family_create_member(input("Ada"));
        assert!(created.ok, "{}", created.message);
        let member = created.member.unwrap();
        assert_eq!(member.gender, "female");
        assert!(created
            .notices
            .iter()
            .any(|notice| notice.level == "success"));

        let fetched = family_get_member(member.id.clone());
        assert!(fetched.ok);
        assert_eq!(fetched.member.unwrap().name, "Ada");
    }

    #[test]
    fn blank_name_returns_validation_envelope() {
        let _guard = isolated();
        let response = family_create_member(input("   "));
        assert!(!response.ok);
        assert_eq!(response.error_code.as_deref(), Some("validation"));
        assert_eq!(response.notices[0].level, "error");
    }

    #[test]
    fn unknown_member_returns_not_found_envelope() {
        let _guard = isolated();
        let response = family_toggle_collapsed("member_missing".to_string());
        assert_eq!(response.error_code.as_deref(), Some("member_not_found"));
        assert!(family_delete_member("member_missing".to_string()).ok);
    }

    #[test]
    fn sample_tree_lists_and_exports() {
        let _guard = isolated();
        assert!(family_seed_sample().ok);

        let list = family_list_members("priya".to_string(), "name".to_string());
        assert_eq!(list.items.len(), 1);
        assert_eq!(list.items[0].initials, "PK");
        assert_eq!(list.stats.total, 4);

        assert!(family_toggle_collapsed("sample_1".to_string()).ok);
        let tree = family_tree();
        let first = &tree.rows[0];
        assert_eq!(first.member_id, "sample_1");
        assert!(first.collapsed);
        assert_eq!(tree.rows[1].member_id, "sample_2");

        let export = family_export();
        assert!(export.ok);
        assert!(family_clear_all().ok);
        let imported = family_import(export.contents);
        assert!(imported.ok, "{}", imported.message);
        assert_eq!(
            family_list_members(String::new(), "dob".to_string())
                .items
                .len(),
            4
        );
    }

    #[test]
    fn invalid_import_returns_format_envelope() {
        let _guard = isolated();
        let response = family_import("{\"people\": []}".to_string());
        assert!(!response.ok);
        assert_eq!(response.error_code.as_deref(), Some("invalid_format"));
    }
}
