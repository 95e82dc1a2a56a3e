//! Render-forest builder for the hierarchical tree view.
//!
//! # Responsibility
//! - Turn the flat member collection plus collapsed ids into nested nodes.
//! - Provide a flattened preorder projection for list-shaped renderers.
//!
//! # Invariants
//! - One tree per root; every member is a childless root when no member
//!   qualifies as a root but the collection is non-empty.
//! - `children` is `Some` only for expanded members with at least one
//!   resolvable, non-cyclic child.
//! - Within one root's traversal a member is expanded at most once. A child
//!   already on the current path is omitted; a child expanded elsewhere in
//!   the same tree appears again as a leaf. Node count stays linear in the
//!   number of `children` links.

use crate::model::member::{Gender, Member, MemberId};
use crate::resolver::{find, roots_of};
use std::collections::{BTreeSet, HashSet};

/// One member in the render forest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeNode {
    pub member: Member,
    /// Distance from the root of this tree (roots are 0).
    pub depth: usize,
    /// Whether the member id is in the collapsed set.
    pub collapsed: bool,
    /// Set when a child was omitted because it is already an ancestor here.
    pub cycle_truncated: bool,
    /// Child nodes in `member.children` order.
    pub children: Option<Vec<TreeNode>>,
}

impl TreeNode {
    pub fn id(&self) -> &str {
        self.member.id.as_str()
    }

    pub fn child_nodes(&self) -> &[TreeNode] {
        self.children.as_deref().unwrap_or(&[])
    }

    /// Counts this node and every descendant node.
    pub fn node_count(&self) -> usize {
        1 + self.child_nodes().iter().map(TreeNode::node_count).sum::<usize>()
    }
}

/// Flat display row produced by a preorder walk of the forest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeRow {
    pub member_id: MemberId,
    pub name: String,
    pub gender: Gender,
    pub depth: usize,
    pub collapsed: bool,
    /// Whether the member lists children, even if they are hidden.
    pub has_children: bool,
}

/// Builds the render forest for `members` with `collapsed` subtrees hidden.
pub fn build(members: &[Member], collapsed: &BTreeSet<MemberId>) -> Vec<TreeNode> {
    if members.is_empty() {
        return Vec::new();
    }

    let roots = roots_of(members);
    if roots.is_empty() {
        return members
            .iter()
            .map(|member| TreeNode {
                member: member.clone(),
                depth: 0,
                collapsed: collapsed.contains(&member.id),
                cycle_truncated: false,
                children: None,
            })
            .collect();
    }

    roots
        .into_iter()
        .map(|root| {
            let mut walk = Walk::default();
            build_node(members, collapsed, root, 0, &mut walk)
        })
        .collect()
}

/// Flattens a forest into preorder rows.
pub fn flatten(forest: &[TreeNode]) -> Vec<TreeRow> {
    let mut rows = Vec::new();
    let mut stack: Vec<&TreeNode> = forest.iter().rev().collect();
    while let Some(node) = stack.pop() {
        rows.push(TreeRow {
            member_id: node.member.id.clone(),
            name: node.member.name.clone(),
            gender: node.member.gender,
            depth: node.depth,
            collapsed: node.collapsed,
            has_children: !node.member.children.is_empty(),
        });
        stack.extend(node.child_nodes().iter().rev());
    }
    rows
}

/// Per-root traversal state.
#[derive(Default)]
struct Walk<'a> {
    path: Vec<&'a str>,
    expanded: HashSet<&'a str>,
}

fn build_node<'a>(
    members: &'a [Member],
    collapsed: &BTreeSet<MemberId>,
    member: &'a Member,
    depth: usize,
    walk: &mut Walk<'a>,
) -> TreeNode {
    let is_collapsed = collapsed.contains(&member.id);
    let mut node = TreeNode {
        member: member.clone(),
        depth,
        collapsed: is_collapsed,
        cycle_truncated: false,
        children: None,
    };
    if is_collapsed || member.children.is_empty() || !walk.expanded.insert(member.id.as_str()) {
        return node;
    }

    walk.path.push(member.id.as_str());
    let mut children = Vec::with_capacity(member.children.len());
    for child_id in &member.children {
        if walk.path.contains(&child_id.as_str()) {
            node.cycle_truncated = true;
            continue;
        }
        if let Some(child) = find(members, child_id) {
            children.push(build_node(members, collapsed, child, depth + 1, walk));
        }
    }
    walk.path.pop();

    if !children.is_empty() {
        node.children = Some(children);
    }
    node
}

#[cfg(test)]
mod tests {
    use super::{build, flatten};
    use crate::model::member::{Member, MemberDraft};
    use chrono::Utc;
    use std::collections::BTreeSet;

    fn member(id: &str, children: &[&str]) -> Member {
        let mut member = Member::from_draft(MemberDraft::named(id), Utc::now()).unwrap();
        member.id = id.to_string();
        member.children = children.iter().map(|c| c.to_string()).collect();
        member
    }

    #[test]
    fn dangling_child_ids_are_skipped() {
        let members = vec![member("a", &["ghost"])];
        let forest = build(&members, &BTreeSet::new());

        assert_eq!(forest.len(), 1);
        assert!(forest[0].children.is_none());
        assert!(!forest[0].cycle_truncated);
    }

    #[test]
    fn shared_child_appears_under_each_parent_root() {
        let mut child = member("c", &[]);
        child.father = Some("f".to_string());
        child.mother = Some("m".to_string());
        let members = vec![member("f", &["c"]), member("m", &["c"]), child];

        let forest = build(&members, &BTreeSet::new());
        assert_eq!(forest.len(), 2);
        assert_eq!(forest[0].child_nodes()[0].id(), "c");
        assert_eq!(forest[1].child_nodes()[0].id(), "c");
    }

    #[test]
    fn flat_fallback_when_every_member_has_a_parent() {
        let mut a = member("a", &["b"]);
        a.father = Some("b".to_string());
        let mut b = member("b", &["a"]);
        b.father = Some("a".to_string());

        let forest = build(&[a, b], &BTreeSet::new());
        assert_eq!(forest.len(), 2);
        assert!(forest.iter().all(|node| node.children.is_none()));
    }

    #[test]
    fn flatten_emits_preorder_rows_with_depth() {
        let mut b = member("b", &["c"]);
        b.father = Some("a".to_string());
        let mut c = member("c", &[]);
        c.father = Some("b".to_string());
        let mut d = member("d", &[]);
        d.father = Some("a".to_string());
        let members = vec![member("a", &["b", "d"]), b, c, d, member("z", &[])];

        let rows = flatten(&build(&members, &BTreeSet::new()));
        let order: Vec<(&str, usize)> = rows
            .iter()
            .map(|row| (row.member_id.as_str(), row.depth))
            .collect();
        assert_eq!(
            order,
            vec![("a", 0), ("b", 1), ("c", 2), ("d", 1), ("z", 0)]
        );
        assert!(rows[0].has_children);
        assert!(!rows[2].has_children);
    }

    #[test]
    fn node_count_covers_whole_subtree() {
        let members = vec![member("a", &["b", "c"]), member("b", &[]), member("c", &[])];
        // b and c have no parents recorded, so they are also roots.
        let forest = build(&members, &BTreeSet::new());
        assert_eq!(forest.len(), 3);
        assert_eq!(forest[0].node_count(), 3);
    }
}
