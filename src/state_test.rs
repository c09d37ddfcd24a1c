use super::test_helpers::*;
use super::*;

#[test]
fn owner_state_default_is_empty() {
    let owner = OwnerState::default();
    assert!(owner.annotations.is_empty());
    assert!(owner.dirty.is_empty());
    assert!(owner.deleted.is_empty());
}

#[test]
fn owner_state_lookup_by_id() {
    let owner_id = Uuid::new_v4();
    let owner = OwnerState {
        annotations: vec![dummy_annotation(owner_id, "rect-1"), dummy_annotation(owner_id, "rect-2")],
        ..OwnerState::default()
    };
    assert_eq!(owner.position("rect-2"), Some(1));
    assert_eq!(owner.get("rect-1").map(|a| a.id.as_str()), Some("rect-1"));
    assert!(owner.get("rect-3").is_none());
}

#[test]
fn stored_annotation_serializes_owner_and_timestamps() {
    let owner_id = Uuid::new_v4();
    let value = serde_json::to_value(dummy_annotation(owner_id, "rect-1")).unwrap();
    assert_eq!(value["id"], "rect-1");
    assert_eq!(value["owner_id"], owner_id.to_string());
    assert_eq!(value["created_at"], 1);
    assert_eq!(value["fill"], "transparent");
}

#[test]
fn now_millis_is_after_2020() {
    assert!(now_millis() > 1_577_836_800_000);
}

#[tokio::test]
async fn hydrate_groups_annotations_by_owner_in_order() {
    let state = test_app_state();
    let alice = Uuid::new_v4();
    let bob = Uuid::new_v4();
    let snapshot = Snapshot {
        users: vec![User {
            id: alice,
            username: "alice".into(),
            password_hash: "h".into(),
            created_at: 0,
        }],
        sessions: vec![("tok".into(), alice)],
        annotations: vec![
            dummy_annotation(alice, "a1"),
            dummy_annotation(bob, "b1"),
            dummy_annotation(alice, "a2"),
        ],
    };

    state.hydrate(snapshot).await;

    let accounts = state.accounts.read().await;
    assert_eq!(accounts.user_by_name("alice").map(|u| u.id), Some(alice));
    assert_eq!(accounts.sessions.get("tok"), Some(&alice));
    assert!(accounts.dirty_users.is_empty());
    drop(accounts);

    let owners = state.owners.read().await;
    let ids: Vec<&str> = owners[&alice]
        .annotations
        .iter()
        .map(|a| a.id.as_str())
        .collect();
    assert_eq!(ids, vec!["a1", "a2"]);
    assert_eq!(owners[&bob].annotations.len(), 1);
    assert!(owners[&alice].dirty.is_empty());
}
