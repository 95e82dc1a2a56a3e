//! Listing and read-model queries for member-oriented screens.
//!
//! # Responsibility
//! - Filter and order members for the list view.
//! - Project members into card and detail read models.
//! - Compute collection statistics and relation-picker candidates.
//!
//! # Invariants
//! - Every function is read-only over the input slice.
//! - Sorting is stable, so ties keep collection order.

use crate::model::member::{parse_dob, Gender, Member, MemberId};
use crate::resolver::{children_of, find, generation_count, parents_of};
use chrono::NaiveDate;
use std::cmp::Ordering;

/// Ordering applied to the member list.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortKey {
    #[default]
    Name,
    /// ISO date string order; members without `dob` come first.
    Dob,
    Gender,
}

impl SortKey {
    /// Parses a sort label; unknown labels fall back to `Name`.
    pub fn parse(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "dob" => Self::Dob,
            "gender" => Self::Gender,
            _ => Self::Name,
        }
    }
}

/// Relation picker whose options are being listed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelationSlot {
    Father,
    Mother,
    Spouse,
    Child,
}

/// Collection-wide counters shown in the header and footer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FamilyStats {
    pub total: usize,
    pub male: usize,
    pub female: usize,
    pub other: usize,
    pub generations: usize,
}

/// Compact list-view projection of one member.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemberCard {
    pub id: MemberId,
    pub name: String,
    pub initials: String,
    pub gender: Gender,
    pub dob: Option<NaiveDate>,
    pub age: Option<u32>,
    pub occupation: String,
    pub birth_place: String,
    pub has_photo: bool,
    /// Recorded `father`/`mother` ids, whether or not they resolve.
    pub parents_count: usize,
    pub has_spouse: bool,
    pub children_count: usize,
}

/// Detail-panel projection with relation names resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemberDetails {
    pub member: Member,
    pub age: Option<u32>,
    pub father_name: Option<String>,
    pub mother_name: Option<String>,
    /// `None` when no spouse is recorded or the id no longer resolves.
    pub spouse_name: Option<String>,
    pub children_names: Vec<String>,
}

/// Filters by a trimmed, case-insensitive substring of name or occupation.
pub fn search<'a>(members: &'a [Member], text: &str) -> Vec<&'a Member> {
    let needle = text.trim().to_lowercase();
    members
        .iter()
        .filter(|member| {
            needle.is_empty()
                || member.name.to_lowercase().contains(&needle)
                || member.occupation.to_lowercase().contains(&needle)
        })
        .collect()
}

/// Sorts members in place by `key`.
pub fn sort_members(members: &mut [&Member], key: SortKey) {
    members.sort_by(|left, right| compare(left, right, key));
}

/// Applies `search` then `sort_members`.
pub fn list<'a>(members: &'a [Member], text: &str, key: SortKey) -> Vec<&'a Member> {
    let mut matches = search(members, text);
    sort_members(&mut matches, key);
    matches
}

pub fn stats(members: &[Member]) -> FamilyStats {
    let mut stats = FamilyStats {
        total: members.len(),
        generations: generation_count(members),
        ..FamilyStats::default()
    };
    for member in members {
        match member.gender {
            Gender::Male => stats.male += 1,
            Gender::Female => stats.female += 1,
            Gender::Other => stats.other += 1,
        }
    }
    stats
}

/// First letters of the first two words of `name`, uppercased.
pub fn initials(name: &str) -> String {
    name.split_whitespace()
        .filter_map(|word| word.chars().next())
        .take(2)
        .flat_map(char::to_uppercase)
        .collect()
}

/// Whole years between `dob` and `today`; `None` for missing or future dates.
pub fn age_on(dob: &str, today: NaiveDate) -> Option<u32> {
    today.years_since(parse_dob(dob)?)
}

pub fn card(member: &Member, today: NaiveDate) -> MemberCard {
    MemberCard {
        id: member.id.clone(),
        name: member.name.clone(),
        initials: initials(&member.name),
        gender: member.gender,
        dob: member.birth_date(),
        age: age_on(&member.dob, today),
        occupation: member.occupation.clone(),
        birth_place: member.birth_place.clone(),
        has_photo: member.has_photo(),
        parents_count: usize::from(member.father.is_some()) + usize::from(member.mother.is_some()),
        has_spouse: member.spouse.is_some(),
        children_count: member.children.len(),
    }
}

pub fn details(members: &[Member], member: &Member, today: NaiveDate) -> MemberDetails {
    let (father, mother) = parents_of(members, member);
    MemberDetails {
        member: member.clone(),
        age: age_on(&member.dob, today),
        father_name: father.map(|parent| parent.name.clone()),
        mother_name: mother.map(|parent| parent.name.clone()),
        spouse_name: member
            .spouse
            .as_deref()
            .and_then(|id| find(members, id))
            .map(|spouse| spouse.name.clone()),
        children_names: children_of(members, member)
            .into_iter()
            .map(|child| child.name.clone())
            .collect(),
    }
}

/// Lists members eligible for one relation picker.
///
/// Parent slots filter by gender. Spouse and child slots exclude the member
/// being edited so it cannot be linked to itself.
pub fn relation_candidates<'a>(
    members: &'a [Member],
    slot: RelationSlot,
    editing_id: Option<&str>,
) -> Vec<&'a Member> {
    members
        .iter()
        .filter(|member| editing_id != Some(member.id.as_str()))
        .filter(|member| match slot {
            RelationSlot::Father => member.gender == Gender::Male,
            RelationSlot::Mother => member.gender == Gender::Female,
            RelationSlot::Spouse | RelationSlot::Child => true,
        })
        .collect()
}

fn compare(left: &Member, right: &Member, key: SortKey) -> Ordering {
    match key {
        SortKey::Name => left
            .name
            .to_lowercase()
            .cmp(&right.name.to_lowercase())
            .then_with(|| left.name.cmp(&right.name)),
        SortKey::Dob => left.dob.cmp(&right.dob),
        SortKey::Gender => left.gender.as_str().cmp(right.gender.as_str()),
    }
}

#[cfg(test)]
mod tests {
    use super::{
        age_on, card, initials, list, relation_candidates, stats, RelationSlot, SortKey,
    };
    use crate::model::member::{Gender, Member, MemberDraft};
    use chrono::{NaiveDate, Utc};

    fn person(id: &str, name: &str, gender: Gender, dob: &str) -> Member {
        let mut member = Member::from_draft(MemberDraft::named(name), Utc::now()).unwrap();
        member.id = id.to_string();
        member.gender = gender;
        member.dob = dob.to_string();
        member
    }

    fn family() -> Vec<Member> {
        let mut amit = person("c1", "amit Kumar", Gender::Male, "1985-07-10");
        amit.occupation = "Doctor".to_string();
        amit.father = Some("p1".to_string());
        vec![
            person("p1", "Rajesh Kumar", Gender::Male, "1955-03-15"),
            person("p2", "Sushma Kumar", Gender::Female, ""),
            amit,
        ]
    }

    #[test]
    fn search_matches_name_or_occupation_case_insensitively() {
        let members = family();
        let ids: Vec<&str> = list(&members, "  DOC ", SortKey::Name)
            .iter()
            .map(|m| m.id.as_str())
            .collect();
        assert_eq!(ids, vec!["c1"]);
        assert_eq!(list(&members, "", SortKey::Name).len(), 3);
    }

    #[test]
    fn sort_orders_by_key() {
        let members = family();
        let by_name: Vec<&str> = list(&members, "", SortKey::Name)
            .iter()
            .map(|m| m.id.as_str())
            .collect();
        assert_eq!(by_name, vec!["c1", "p1", "p2"]);

        let by_dob: Vec<&str> = list(&members, "", SortKey::parse("dob"))
            .iter()
            .map(|m| m.id.as_str())
            .collect();
        assert_eq!(by_dob, vec!["p2", "p1", "c1"]);

        let by_gender: Vec<&str> = list(&members, "", SortKey::Gender)
            .iter()
            .map(|m| m.id.as_str())
            .collect();
        assert_eq!(by_gender, vec!["p2", "p1", "c1"]);
    }

    #[test]
    fn stats_count_genders_and_generations() {
        let stats = stats(&family());
        assert_eq!(stats.total, 3);
        assert_eq!(stats.male, 2);
        assert_eq!(stats.female, 1);
        assert_eq!(stats.other, 0);
        assert_eq!(stats.generations, 2);
    }

    #[test]
    fn initials_take_first_two_words() {
        assert_eq!(initials("rajesh kumar sharma"), "RK");
        assert_eq!(initials("  Priya "), "P");
        assert_eq!(initials(""), "");
    }

    #[test]
    fn age_counts_whole_years() {
        let today = NaiveDate::from_ymd_opt(2024, 3, 14).unwrap();
        assert_eq!(age_on("1955-03-15", today), Some(68));
        assert_eq!(age_on("1955-03-14", today), Some(69));
        assert_eq!(age_on("", today), None);
        assert_eq!(age_on("not-a-date", today), None);
    }

    #[test]
    fn relation_candidates_filter_by_slot() {
        let members = family();
        let fathers: Vec<&str> = relation_candidates(&members, RelationSlot::Father, None)
            .iter()
            .map(|m| m.id.as_str())
            .collect();
        assert_eq!(fathers, vec!["p1", "c1"]);

        let spouses = relation_candidates(&members, RelationSlot::Spouse, Some("p1"));
        assert!(spouses.iter().all(|m| m.id != "p1"));
        assert_eq!(spouses.len(), 2);
    }

    #[test]
    fn relation_candidates_never_offer_the_member_being_edited() {
        let members = family();
        for slot in [
            RelationSlot::Father,
            RelationSlot::Mother,
            RelationSlot::Spouse,
            RelationSlot::Child,
        ] {
            let candidates = relation_candidates(&members, slot, Some("p1"));
            assert!(candidates.iter().all(|m| m.id != "p1"), "{slot:?}");
        }
        let fathers: Vec<&str> = relation_candidates(&members, RelationSlot::Father, Some("p1"))
            .iter()
            .map(|m| m.id.as_str())
            .collect();
        assert_eq!(fathers, vec!["c1"]);
    }

    #[test]
    fn card_counts_recorded_parent_ids() {
        let mut orphan = person("x", "Orphaned Link", Gender::Other, "");
        orphan.father = Some("gone".to_string());
        orphan.mother = Some("p2".to_string());
        let today = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();

        let view = card(&orphan, today);
        assert_eq!(view.parents_count, 2);
        assert_eq!(view.initials, "OL");
        assert!(!view.has_spouse);
    }
}
