#![allow(clippy::float_cmp)]

use super::*;
use crate::state::test_helpers::test_app_state;

fn new_annotation(id: &str) -> NewAnnotation {
    NewAnnotation {
        id: id.to_owned(),
        x: 100.0,
        y: 100.0,
        width: 150.0,
        height: 80.0,
        fill: None,
        stroke: None,
    }
}

fn changes(x: f64, y: f64) -> AnnotationChanges {
    AnnotationChanges { x, y, width: 150.0, height: 80.0, fill: None, stroke: None }
}

// =============================================================================
// create / list
// =============================================================================

#[tokio::test]
async fn create_applies_color_defaults_and_timestamps() {
    let state = test_app_state();
    let owner = Uuid::new_v4();
    let created = create(&state, owner, new_annotation("rect-1")).await.unwrap();

    assert_eq!(created.fill, DEFAULT_FILL);
    assert_eq!(created.stroke, DEFAULT_STROKE);
    assert_eq!(created.owner_id, owner);
    assert!(created.created_at > 0);
    assert_eq!(created.created_at, created.updated_at);

    let owners = state.owners.read().await;
    assert!(owners[&owner].dirty.contains("rect-1"));
}

#[tokio::test]
async fn create_keeps_supplied_colors() {
    let state = test_app_state();
    let mut input = new_annotation("rect-1");
    input.fill = Some("rgba(99,102,241,0.25)".into());
    input.stroke = Some("#6366f1".into());
    let created = create(&state, Uuid::new_v4(), input).await.unwrap();
    assert_eq!(created.fill, "rgba(99,102,241,0.25)");
    assert_eq!(created.stroke, "#6366f1");
}

#[tokio::test]
async fn list_returns_insertion_order_per_owner() {
    let state = test_app_state();
    let alice = Uuid::new_v4();
    let bob = Uuid::new_v4();
    create(&state, alice, new_annotation("b")).await.unwrap();
    create(&state, alice, new_annotation("a")).await.unwrap();
    create(&state, bob, new_annotation("c")).await.unwrap();

    let ids: Vec<String> = list(&state, alice).await.into_iter().map(|a| a.id).collect();
    assert_eq!(ids, vec!["b", "a"]);
    assert_eq!(list(&state, bob).await.len(), 1);
    assert!(list(&state, Uuid::new_v4()).await.is_empty());
}

#[tokio::test]
async fn create_rejects_duplicate_id_for_same_owner() {
    let state = test_app_state();
    let owner = Uuid::new_v4();
    create(&state, owner, new_annotation("rect-1")).await.unwrap();
    assert_eq!(
        create(&state, owner, new_annotation("rect-1")).await,
        Err(AnnotationError::AlreadyExists("rect-1".into()))
    );
    create(&state, Uuid::new_v4(), new_annotation("rect-1")).await.unwrap();
}

#[tokio::test]
async fn create_rejects_bad_geometry() {
    let state = test_app_state();
    let owner = Uuid::new_v4();

    let mut nan = new_annotation("rect-1");
    nan.x = f64::NAN;
    assert!(matches!(create(&state, owner, nan).await, Err(AnnotationError::Invalid(_))));

    let mut negative = new_annotation("rect-2");
    negative.width = -5.0;
    assert!(matches!(create(&state, owner, negative).await, Err(AnnotationError::Invalid(_))));

    assert!(matches!(create(&state, owner, new_annotation("  ")).await, Err(AnnotationError::Invalid(_))));
    assert!(list(&state, owner).await.is_empty());
}

// =============================================================================
// update
// =============================================================================

#[tokio::test]
async fn update_replaces_geometry_and_colors() {
    let state = test_app_state();
    let owner = Uuid::new_v4();
    let created = create(&state, owner, new_annotation("rect-1")).await.unwrap();

    let mut change = changes(120.0, 90.0);
    change.fill = Some("#ff000055".into());
    change.stroke = Some("#ff0000".into());
    let updated = update(&state, owner, "rect-1", change).await.unwrap();

    assert_eq!((updated.x, updated.y), (120.0, 90.0));
    assert_eq!(updated.fill, "#ff000055");
    assert_eq!(updated.stroke, "#ff0000");
    assert!(updated.updated_at > created.updated_at);
    assert_eq!(updated.created_at, created.created_at);
    assert_eq!(list(&state, owner).await, vec![updated]);
}

#[tokio::test]
async fn update_without_colors_keeps_them() {
    let state = test_app_state();
    let owner = Uuid::new_v4();
    create(&state, owner, new_annotation("rect-1")).await.unwrap();
    let updated = update(&state, owner, "rect-1", changes(0.0, 0.0)).await.unwrap();
    assert_eq!(updated.stroke, DEFAULT_STROKE);
}

#[tokio::test]
async fn update_is_scoped_to_owner() {
    let state = test_app_state();
    let alice = Uuid::new_v4();
    create(&state, alice, new_annotation("rect-1")).await.unwrap();
    assert_eq!(
        update(&state, Uuid::new_v4(), "rect-1", changes(0.0, 0.0)).await,
        Err(AnnotationError::NotFound("rect-1".into()))
    );
    assert_eq!(
        update(&state, alice, "rect-9", changes(0.0, 0.0)).await,
        Err(AnnotationError::NotFound("rect-9".into()))
    );
}

// =============================================================================
// delete
// =============================================================================

#[tokio::test]
async fn delete_removes_and_marks_deleted() {
    let state = test_app_state();
    let owner = Uuid::new_v4();
    create(&state, owner, new_annotation("rect-1")).await.unwrap();
    delete(&state, owner, "rect-1").await.unwrap();

    assert!(list(&state, owner).await.is_empty());
    let owners = state.owners.read().await;
    assert!(owners[&owner].deleted.contains("rect-1"));
    assert!(!owners[&owner].dirty.contains("rect-1"));
}

#[tokio::test]
async fn delete_missing_leaves_store_unchanged() {
    let state = test_app_state();
    let owner = Uuid::new_v4();
    create(&state, owner, new_annotation("rect-1")).await.unwrap();
    assert_eq!(
        delete(&state, owner, "rect-2").await,
        Err(AnnotationError::NotFound("rect-2".into()))
    );
    assert_eq!(list(&state, owner).await.len(), 1);
}

#[tokio::test]
async fn recreate_after_delete_clears_tombstone() {
    let state = test_app_state();
    let owner = Uuid::new_v4();
    create(&state, owner, new_annotation("rect-1")).await.unwrap();
    delete(&state, owner, "rect-1").await.unwrap();
    create(&state, owner, new_annotation("rect-1")).await.unwrap();

    let owners = state.owners.read().await;
    assert!(owners[&owner].deleted.is_empty());
    assert!(owners[&owner].dirty.contains("rect-1"));
}
