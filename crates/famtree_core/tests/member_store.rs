use famtree_core::{MemberDraft, MemberPatch, MemberStore, MemberValidationError, StoreError};

fn linked_family(store: &mut MemberStore) -> (String, String, String) {
    let father = store.create(MemberDraft::named("Father")).unwrap();
    let mother = store
        .create(MemberDraft {
            spouse: Some(father.id.clone()),
            ..MemberDraft::named("Mother")
        })
        .unwrap();
    let child = store
        .create(MemberDraft {
            father: Some(father.id.clone()),
            mother: Some(mother.id.clone()),
            ..MemberDraft::named("Child")
        })
        .unwrap();
    store
        .update(
            &father.id,
            MemberPatch {
                spouse: Some(Some(mother.id.clone())),
                children: Some(vec![child.id.clone()]),
                ..MemberPatch::default()
            },
        )
        .unwrap();
    store
        .update(
            &mother.id,
            MemberPatch {
                children: Some(vec![child.id.clone()]),
                ..MemberPatch::default()
            },
        )
        .unwrap();
    (father.id, mother.id, child.id)
}

#[test]
fn delete_repairs_every_reference_to_removed_member() {
    let mut store = MemberStore::new();
    let (father, mother, child) = linked_family(&mut store);

    let removed = store.delete(&father).unwrap();
    assert_eq!(removed.id, father);

    for member in store.members() {
        assert_ne!(member.father.as_deref(), Some(father.as_str()));
        assert_ne!(member.mother.as_deref(), Some(father.as_str()));
        assert_ne!(member.spouse.as_deref(), Some(father.as_str()));
        assert!(!member.children.contains(&father));
    }

    let child = store.get(&child).unwrap();
    assert_eq!(child.father, None);
    assert_eq!(child.mother.as_deref(), Some(mother.as_str()));
    assert_eq!(store.get(&mother).unwrap().spouse, None);
}

#[test]
fn delete_preserves_sibling_order() {
    let mut store = MemberStore::new();
    let a = store.create(MemberDraft::named("A")).unwrap();
    let b = store.create(MemberDraft::named("B")).unwrap();
    let c = store.create(MemberDraft::named("C")).unwrap();
    let parent = store
        .create(MemberDraft {
            children: vec![a.id.clone(), b.id.clone(), c.id.clone()],
            ..MemberDraft::named("Parent")
        })
        .unwrap();

    store.delete(&b.id);
    assert_eq!(store.get(&parent.id).unwrap().children, vec![a.id, c.id]);
}

#[test]
fn deleting_twice_is_a_no_op_the_second_time() {
    let mut store = MemberStore::new();
    let (father, _, _) = linked_family(&mut store);

    store.delete(&father);
    let after_first = store.members().to_vec();

    assert!(store.delete(&father).is_none());
    assert_eq!(store.members(), after_first.as_slice());
}

#[test]
fn create_with_blank_name_fails_and_leaves_store_unchanged() {
    let mut store = MemberStore::new();
    linked_family(&mut store);
    let before = store.members().to_vec();

    let err = store.create(MemberDraft::named("")).unwrap_err();
    assert_eq!(err, StoreError::Validation(MemberValidationError::EmptyName));
    assert_eq!(store.members(), before.as_slice());
}

#[test]
fn update_unknown_id_fails_and_leaves_store_unchanged() {
    let mut store = MemberStore::new();
    linked_family(&mut store);
    let before = store.members().to_vec();

    let err = store
        .update(
            "member_unknown",
            MemberPatch {
                name: Some("Renamed".to_string()),
                ..MemberPatch::default()
            },
        )
        .unwrap_err();
    assert_eq!(err, StoreError::NotFound("member_unknown".to_string()));
    assert_eq!(store.members(), before.as_slice());
}

#[test]
fn update_with_blank_name_is_rejected() {
    let mut store = MemberStore::new();
    let member = store.create(MemberDraft::named("Named")).unwrap();

    let err = store
        .update(
            &member.id,
            MemberPatch {
                name: Some("  ".to_string()),
                ..MemberPatch::default()
            },
        )
        .unwrap_err();
    assert!(matches!(err, StoreError::Validation(_)));
    assert_eq!(store.get(&member.id).unwrap().name, "Named");
}

#[test]
fn replace_all_resets_navigation_without_validating_links() {
    let mut store = MemberStore::new();
    let (father, _, _) = linked_family(&mut store);
    store.select(&father).unwrap();
    store.toggle_collapsed(&father).unwrap();

    let mut orphan = store.get(&father).unwrap().clone();
    orphan.children = vec!["member_missing".to_string()];
    store.replace_all(vec![orphan]);

    assert_eq!(store.len(), 1);
    assert!(store.view().collapsed_nodes.is_empty());
    assert_eq!(store.view().selected_member_id, None);
    assert_eq!(store.members()[0].children, vec!["member_missing".to_string()]);
}

#[test]
fn repair_references_drops_dangling_and_self_links() {
    let mut store = MemberStore::new();
    let member = store.create(MemberDraft::named("Solo")).unwrap();

    let mut broken = member.clone();
    broken.father = Some("member_gone".to_string());
    broken.spouse = Some(member.id.clone());
    broken.children = vec![member.id.clone(), "member_gone".to_string()];
    store.replace_all(vec![broken]);

    let report = store.repair_references();
    assert_eq!(report.self_references_removed, 2);
    assert_eq!(report.dangling_removed, 2);

    let repaired = store.get(&member.id).unwrap();
    assert_eq!(repaired.father, None);
    assert_eq!(repaired.spouse, None);
    assert!(repaired.children.is_empty());
    assert_eq!(store.repair_references().total(), 0);
}
