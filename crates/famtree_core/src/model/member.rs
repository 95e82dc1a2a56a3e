//! Member domain model.
//!
//! # Responsibility
//! - Define the canonical person record persisted and exported by core.
//! - Define draft/patch inputs used by store create/update paths.
//!
//! # Invariants
//! - `id` is stable and never reused for another member.
//! - `name` is non-empty after trim for every member created by core.
//! - A member never references its own `id` after `strip_self_references`.
//! - Optional text fields use the empty string for "absent".

use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// Stable identifier for one member.
///
/// Kept as a plain string because imported documents carry ids created by
/// other tools (for example `sample_1`).
pub type MemberId = String;

const MEMBER_ID_PREFIX: &str = "member_";
const PHOTO_PAYLOAD_PREFIX: &str = "data:image";

/// Recorded gender of a member.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    Male,
    Female,
    /// Default for missing or unrecognized values.
    #[default]
    #[serde(other)]
    Other,
}

impl Gender {
    /// Returns the stable wire label.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Male => "male",
            Self::Female => "female",
            Self::Other => "other",
        }
    }

    /// Parses a wire label; unknown labels yield `None`.
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "male" => Some(Self::Male),
            "female" => Some(Self::Female),
            "other" => Some(Self::Other),
            _ => None,
        }
    }
}

impl Display for Gender {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Validation failures for member create/update input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MemberValidationError {
    /// `name` is blank after trim.
    EmptyName,
}

impl Display for MemberValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyName => write!(f, "member name must not be blank"),
        }
    }
}

impl Error for MemberValidationError {}

/// Canonical person record.
///
/// Relation fields are weak references by id. The store repairs them on
/// delete; readers must still tolerate ids that no longer resolve.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Member {
    pub id: MemberId,
    pub name: String,
    #[serde(default)]
    pub gender: Gender,
    /// ISO date (`YYYY-MM-DD`); empty when unknown.
    #[serde(default, deserialize_with = "text_or_empty")]
    pub dob: String,
    #[serde(default, deserialize_with = "text_or_empty")]
    pub birth_place: String,
    #[serde(default, deserialize_with = "text_or_empty")]
    pub occupation: String,
    #[serde(default, deserialize_with = "text_or_empty")]
    pub email: String,
    #[serde(default, deserialize_with = "text_or_empty")]
    pub bio: String,
    /// Embedded `data:image/...` payload; empty when absent.
    #[serde(default, deserialize_with = "text_or_empty")]
    pub photo: String,
    #[serde(default, deserialize_with = "optional_reference")]
    pub spouse: Option<MemberId>,
    #[serde(default, deserialize_with = "optional_reference")]
    pub father: Option<MemberId>,
    #[serde(default, deserialize_with = "optional_reference")]
    pub mother: Option<MemberId>,
    /// Display order equals insertion order.
    #[serde(default, deserialize_with = "reference_list")]
    pub children: Vec<MemberId>,
    #[serde(default)]
    pub created_at: String,
    #[serde(default)]
    pub updated_at: String,
}

impl Member {
    /// Builds a new member from validated draft input with a generated id.
    ///
    /// # Errors
    /// - `MemberValidationError::EmptyName` when the trimmed name is blank.
    pub fn from_draft(draft: MemberDraft, now: DateTime<Utc>) -> Result<Self, MemberValidationError> {
        let name = normalize_name(&draft.name)?;
        let timestamp = format_timestamp(now);
        let mut member = Self {
            id: generate_member_id(),
            name,
            gender: draft.gender.unwrap_or_default(),
            dob: draft.dob.map(|value| value.trim().to_string()).unwrap_or_default(),
            birth_place: draft.birth_place.unwrap_or_default(),
            occupation: draft.occupation.unwrap_or_default(),
            email: draft.email.unwrap_or_default(),
            bio: draft.bio.unwrap_or_default(),
            photo: normalize_photo(draft.photo.unwrap_or_default()),
            spouse: non_empty_reference(draft.spouse),
            father: non_empty_reference(draft.father),
            mother: non_empty_reference(draft.mother),
            children: draft
                .children
                .into_iter()
                .filter(|child| !child.trim().is_empty())
                .collect(),
            created_at: timestamp.clone(),
            updated_at: timestamp,
        };
        member.strip_self_references();
        Ok(member)
    }

    /// Applies a patch with override-if-present semantics.
    ///
    /// `id` and `created_at` are never touched. `updated_at` is refreshed.
    ///
    /// # Errors
    /// - `MemberValidationError::EmptyName` when the patch carries a blank
    ///   name. The member is left unchanged in that case.
    pub fn apply_patch(
        &mut self,
        patch: MemberPatch,
        now: DateTime<Utc>,
    ) -> Result<(), MemberValidationError> {
        let name = match patch.name {
            Some(value) => Some(normalize_name(&value)?),
            None => None,
        };

        if let Some(name) = name {
            self.name = name;
        }
        if let Some(gender) = patch.gender {
            self.gender = gender;
        }
        if let Some(dob) = patch.dob {
            self.dob = dob.trim().to_string();
        }
        if let Some(birth_place) = patch.birth_place {
            self.birth_place = birth_place;
        }
        if let Some(occupation) = patch.occupation {
            self.occupation = occupation;
        }
        if let Some(email) = patch.email {
            self.email = email;
        }
        if let Some(bio) = patch.bio {
            self.bio = bio;
        }
        if let Some(photo) = patch.photo {
            self.photo = normalize_photo(photo);
        }
        if let Some(spouse) = patch.spouse {
            self.spouse = non_empty_reference(spouse);
        }
        if let Some(father) = patch.father {
            self.father = non_empty_reference(father);
        }
        if let Some(mother) = patch.mother {
            self.mother = non_empty_reference(mother);
        }
        if let Some(children) = patch.children {
            self.children = children
                .into_iter()
                .filter(|child| !child.trim().is_empty())
                .collect();
        }

        self.strip_self_references();
        self.updated_at = format_timestamp(now);
        Ok(())
    }

    /// Removes every relation that points at this member's own id.
    ///
    /// Returns the number of references removed.
    pub fn strip_self_references(&mut self) -> usize {
        let mut removed = 0;
        for slot in [&mut self.father, &mut self.mother, &mut self.spouse] {
            if slot.as_deref() == Some(self.id.as_str()) {
                *slot = None;
                removed += 1;
            }
        }
        let before = self.children.len();
        let own_id = self.id.clone();
        self.children.retain(|child| *child != own_id);
        removed + (before - self.children.len())
    }

    /// Returns whether this member has no recorded father or mother.
    pub fn is_root(&self) -> bool {
        self.father.is_none() && self.mother.is_none()
    }

    /// Parses `dob` as an ISO calendar date.
    pub fn birth_date(&self) -> Option<NaiveDate> {
        parse_dob(&self.dob)
    }

    /// Returns whether a photo payload is attached.
    pub fn has_photo(&self) -> bool {
        !self.photo.is_empty()
    }
}

/// Input for creating a member. Absent fields fall back to defaults.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MemberDraft {
    pub name: String,
    pub gender: Option<Gender>,
    pub dob: Option<String>,
    pub birth_place: Option<String>,
    pub occupation: Option<String>,
    pub email: Option<String>,
    pub bio: Option<String>,
    pub photo: Option<String>,
    pub spouse: Option<MemberId>,
    pub father: Option<MemberId>,
    pub mother: Option<MemberId>,
    pub children: Vec<MemberId>,
}

impl MemberDraft {
    /// Creates a draft with only the required name set.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }
}

/// Partial update for an existing member.
///
/// `None` keeps the current value. Reference fields use a nested option so a
/// patch can clear a relation (`Some(None)`) as well as set one.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MemberPatch {
    pub name: Option<String>,
    pub gender: Option<Gender>,
    pub dob: Option<String>,
    pub birth_place: Option<String>,
    pub occupation: Option<String>,
    pub email: Option<String>,
    pub bio: Option<String>,
    pub photo: Option<String>,
    pub spouse: Option<Option<MemberId>>,
    pub father: Option<Option<MemberId>>,
    pub mother: Option<Option<MemberId>>,
    pub children: Option<Vec<MemberId>>,
}

impl MemberPatch {
    /// Returns whether the patch would change nothing but `updated_at`.
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// Formats a timestamp the way persisted documents store it.
pub fn format_timestamp(value: DateTime<Utc>) -> String {
    value.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Parses an ISO `YYYY-MM-DD` date, ignoring surrounding whitespace.
pub fn parse_dob(value: &str) -> Option<NaiveDate> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return None;
    }
    NaiveDate::parse_from_str(trimmed, "%Y-%m-%d").ok()
}

fn generate_member_id() -> MemberId {
    format!("{MEMBER_ID_PREFIX}{}", Uuid::new_v4().simple())
}

fn normalize_name(value: &str) -> Result<String, MemberValidationError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(MemberValidationError::EmptyName);
    }
    Ok(trimmed.to_string())
}

fn normalize_photo(value: String) -> String {
    if value.starts_with(PHOTO_PAYLOAD_PREFIX) {
        value
    } else {
        String::new()
    }
}

fn non_empty_reference(value: Option<MemberId>) -> Option<MemberId> {
    value.filter(|id| !id.trim().is_empty())
}

fn text_or_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

fn optional_reference<'de, D>(deserializer: D) -> Result<Option<MemberId>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(non_empty_reference(Option::<String>::deserialize(
        deserializer,
    )?))
}

fn reference_list<'de, D>(deserializer: D) -> Result<Vec<MemberId>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Vec<String>>::deserialize(deserializer)?
        .unwrap_or_default()
        .into_iter()
        .filter(|id| !id.trim().is_empty())
        .collect())
}
