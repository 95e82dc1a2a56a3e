//! Read-only relationship derivations over a member collection.
//!
//! # Responsibility
//! - Derive roots, parents, children and generation depth from id fields.
//!
//! # Invariants
//! - Functions never mutate input and tolerate dangling ids.
//! - Upward walks stop on a revisited id instead of looping forever.
//!
//! `children` (downward) and `father`/`mother` (upward) are not required to
//! agree, so results of the two directions may differ for the same data.

use crate::model::member::Member;
use std::collections::HashSet;

/// Looks up one member by id.
pub fn find<'a>(members: &'a [Member], id: &str) -> Option<&'a Member> {
    members.iter().find(|member| member.id == id)
}

/// Returns members with neither `father` nor `mother`, in collection order.
pub fn roots_of(members: &[Member]) -> Vec<&Member> {
    members.iter().filter(|member| member.is_root()).collect()
}

/// Resolves `member.children` in display order, skipping unknown ids.
pub fn children_of<'a>(members: &'a [Member], member: &Member) -> Vec<&'a Member> {
    member
        .children
        .iter()
        .filter_map(|child_id| find(members, child_id))
        .collect()
}

/// Resolves `(father, mother)` for one member.
pub fn parents_of<'a>(
    members: &'a [Member],
    member: &Member,
) -> (Option<&'a Member>, Option<&'a Member>) {
    let father = member.father.as_deref().and_then(|id| find(members, id));
    let mother = member.mother.as_deref().and_then(|id| find(members, id));
    (father, mother)
}

/// Counts generations from `member` upward, starting at 1 for itself.
///
/// Each step follows `father` when set, otherwise `mother`. This yields one
/// lineage's depth, not the maximum across both parents. A parent id that
/// does not resolve ends the walk without counting; so does a revisit.
pub fn ancestor_chain_length(members: &[Member], member: &Member) -> usize {
    let mut generation = 1;
    let mut visited: HashSet<&str> = HashSet::new();
    visited.insert(member.id.as_str());

    let mut current = member;
    while let Some(parent_id) = current.father.as_deref().or(current.mother.as_deref()) {
        let Some(parent) = find(members, parent_id) else {
            break;
        };
        if !visited.insert(parent.id.as_str()) {
            break;
        }
        generation += 1;
        current = parent;
    }
    generation
}

/// Returns the deepest `ancestor_chain_length` in the collection, or 0.
pub fn generation_count(members: &[Member]) -> usize {
    members
        .iter()
        .map(|member| ancestor_chain_length(members, member))
        .max()
        .unwrap_or(0)
}
