use famtree_core::resolver::{ancestor_chain_length, generation_count, roots_of};
use famtree_core::tree::{build, flatten};
use famtree_core::{Member, MemberDraft, MemberId};
use std::collections::BTreeSet;

fn member(id: &str, father: Option<&str>, children: &[&str]) -> Member {
    let mut member = Member::from_draft(MemberDraft::named(id.to_uppercase()), chrono::Utc::now())
        .unwrap();
    member.id = id.to_string();
    member.father = father.map(str::to_string);
    member.children = children.iter().map(|child| child.to_string()).collect();
    member
}

fn chain() -> Vec<Member> {
    vec![
        member("a", None, &["b"]),
        member("b", Some("a"), &["c"]),
        member("c", Some("b"), &[]),
    ]
}

fn collapsed(ids: &[&str]) -> BTreeSet<MemberId> {
    ids.iter().map(|id| id.to_string()).collect()
}

#[test]
fn chain_builds_single_tree_three_deep() {
    let members = chain();
    let forest = build(&members, &BTreeSet::new());

    assert_eq!(forest.len(), 1);
    let a = &forest[0];
    assert_eq!(a.id(), "a");
    assert_eq!(a.depth, 0);

    let b = &a.child_nodes()[0];
    assert_eq!(b.id(), "b");
    assert_eq!(b.depth, 1);

    let c = &b.child_nodes()[0];
    assert_eq!(c.id(), "c");
    assert_eq!(c.depth, 2);
    assert!(c.children.is_none());

    assert_eq!(ancestor_chain_length(&members, &members[2]), 3);
    assert_eq!(generation_count(&members), 3);
}

#[test]
fn collapsing_middle_member_hides_its_subtree() {
    let members = chain();
    let forest = build(&members, &collapsed(&["b"]));

    let b = &forest[0].child_nodes()[0];
    assert_eq!(b.id(), "b");
    assert!(b.collapsed);
    assert!(b.children.is_none());
    assert_eq!(forest[0].node_count(), 2);

    let rows = flatten(&forest);
    assert_eq!(rows.len(), 2);
    assert!(rows[1].collapsed);
    assert!(rows[1].has_children);
}

#[test]
fn cyclic_children_terminate_with_each_member_shown_once_per_path() {
    let members = vec![
        member("r", None, &["x"]),
        member("x", Some("r"), &["y"]),
        member("y", Some("x"), &["x"]),
    ];

    let forest = build(&members, &BTreeSet::new());
    let x = &forest[0].child_nodes()[0];
    let y = &x.child_nodes()[0];
    assert_eq!(y.id(), "y");
    assert!(y.children.is_none());
    assert!(y.cycle_truncated);
    assert!(!x.cycle_truncated);
}

#[test]
fn mutual_children_without_roots_fall_back_to_flat_leaves() {
    // Each member lists the other as child and parent, so no root exists.
    let members = vec![
        member("a", Some("b"), &["b"]),
        member("b", Some("a"), &["a"]),
    ];

    let forest = build(&members, &BTreeSet::new());
    let ids: Vec<&str> = forest.iter().map(|node| node.id()).collect();
    assert_eq!(ids, vec!["a", "b"]);
    assert!(forest.iter().all(|node| node.children.is_none()));
}

#[test]
fn mutual_children_under_roots_show_each_other_as_leaves() {
    let members = vec![member("a", None, &["b"]), member("b", None, &["a"])];

    let forest = build(&members, &BTreeSet::new());
    assert_eq!(forest.len(), 2);
    assert_eq!(forest[0].child_nodes()[0].id(), "b");
    assert!(forest[0].child_nodes()[0].children.is_none());
    assert_eq!(forest[1].child_nodes()[0].id(), "a");
    assert!(forest[1].child_nodes()[0].children.is_none());
}

#[test]
fn empty_collection_has_no_roots_and_empty_forest() {
    assert!(roots_of(&[]).is_empty());
    assert!(build(&[], &BTreeSet::new()).is_empty());
    assert!(flatten(&[]).is_empty());
}

#[test]
fn shared_descendants_are_expanded_once_per_tree() {
    // m_i lists m_{i+1} and m_{i+2}, so every descendant is reachable by many routes.
    let size = 40;
    let ids: Vec<String> = (0..size).map(|i| format!("m{i}")).collect();
    let members: Vec<Member> = (0..size)
        .map(|i| {
            let children: Vec<&str> = [i + 1, i + 2]
                .into_iter()
                .filter(|&next| next < size)
                .map(|next| ids[next].as_str())
                .collect();
            let father = i.checked_sub(1).map(|prev| ids[prev].as_str());
            member(&ids[i], father, &children)
        })
        .collect();

    let forest = build(&members, &BTreeSet::new());
    assert_eq!(forest.len(), 1);
    // One expanded node per member plus one leaf per second-child link.
    assert_eq!(forest[0].node_count(), size + (size - 2));
    assert_eq!(flatten(&forest).len(), size + (size - 2));

    let m1 = &forest[0].child_nodes()[0];
    let repeated_m3 = &m1.child_nodes()[1];
    assert_eq!(repeated_m3.id(), "m3");
    assert!(repeated_m3.children.is_none());
    let shared_leaf = &forest[0].child_nodes()[1];
    assert_eq!(shared_leaf.id(), "m2");
    assert!(shared_leaf.children.is_none());
    assert!(!shared_leaf.cycle_truncated);
}
