#![allow(clippy::float_cmp)]

use canvas::doc::AnnotationId;
use canvas::geom::Point;
use canvas::input::{Button, Mode};

use super::*;
use crate::test_support::{UNREACHABLE_API, spawn_service};

fn pt(x: f64, y: f64) -> Point {
    Point::new(x, y)
}

fn gesture(core: &mut EngineCore, from: Point, to: Point) -> Vec<Action> {
    let mut actions = core.on_pointer_down(from, Button::Primary);
    actions.extend(core.on_pointer_move(to));
    actions.extend(core.on_pointer_up(to, Button::Primary));
    actions
}

fn click(core: &mut EngineCore, at: Point) -> Vec<Action> {
    gesture(core, at, at)
}

async fn signed_in(api: &ApiClient, dir: &tempfile::TempDir) -> Session {
    let mut session = Session::load(dir.path().join("session")).unwrap();
    register(api, &mut session, "alice", "pw").await.unwrap();
    session
}

async fn open_client(dir: &tempfile::TempDir) -> (CanvasClient, ApiClient) {
    let api = ApiClient::new(&spawn_service().await);
    let session = signed_in(&api, dir).await;
    let client = CanvasClient::open(api.clone(), session).await.unwrap();
    (client, api)
}

fn token(client: &CanvasClient) -> String {
    client.session().token().unwrap().to_owned()
}

// =============================================================
// Session gating
// =============================================================

#[tokio::test]
async fn open_without_token_requires_login() {
    let dir = tempfile::tempdir().unwrap();
    let session = Session::load(dir.path().join("session")).unwrap();
    let result = CanvasClient::open(ApiClient::new(UNREACHABLE_API), session).await;
    assert!(matches!(result, Err(ClientError::LoginRequired)));
}

#[tokio::test]
async fn open_with_stale_token_clears_session() {
    let dir = tempfile::tempdir().unwrap();
    let mut session = Session::load(dir.path().join("session")).unwrap();
    session.set("stale").unwrap();

    let api = ApiClient::new(&spawn_service().await);
    let result = CanvasClient::open(api, session).await;
    assert!(matches!(result, Err(ClientError::LoginRequired)));
    assert!(Session::load(dir.path().join("session")).unwrap().token().is_none());
}

#[tokio::test]
async fn open_hydrates_existing_annotations() {
    let dir = tempfile::tempdir().unwrap();
    let (mut client, api) = open_client(&dir).await;
    client
        .apply(|core| gesture(core, pt(100.0, 100.0), pt(250.0, 180.0)))
        .await
        .unwrap();

    let session = Session::load(dir.path().join("session")).unwrap();
    let reopened = CanvasClient::open(api, session).await.unwrap();
    assert_eq!(reopened.core().doc.len(), 1);
    let a = reopened.core().annotations().next().unwrap();
    assert_eq!((a.x, a.y, a.width, a.height), (100.0, 100.0, 150.0, 80.0));
}

// =============================================================
// Sync scenarios
// =============================================================

#[tokio::test]
async fn draw_drag_recolor_delete_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let (mut client, api) = open_client(&dir).await;

    client
        .apply(|core| gesture(core, pt(100.0, 100.0), pt(250.0, 180.0)))
        .await
        .unwrap();
    let id = client.core().annotations().next().unwrap().id.clone();
    let local = client.core().annotation(&id).unwrap();
    assert!(local.extra.contains_key("owner_id"));
    assert_eq!(local.name.as_deref(), Some("Rect 1"));

    client
        .try_apply(|core| core.set_mode(Mode::Select))
        .await
        .unwrap();
    client
        .apply(|core| gesture(core, pt(150.0, 150.0), pt(170.0, 140.0)))
        .await
        .unwrap();
    client
        .try_apply(|core| core.set_color("#ff0000"))
        .await
        .unwrap();

    let remote = api.list(&token(&client)).await.unwrap();
    assert_eq!(remote.len(), 1);
    assert_eq!((remote[0].x, remote[0].y), (120.0, 90.0));
    assert_eq!(remote[0].stroke, "#ff0000");
    assert_eq!(remote[0].fill, "#ff000055");

    client.apply(EngineCore::delete_selected).await.unwrap();
    assert!(client.core().annotation(&id).is_none());
    assert!(api.list(&token(&client)).await.unwrap().is_empty());
}

#[tokio::test]
async fn failed_create_rolls_back() {
    let dir = tempfile::tempdir().unwrap();
    let mut session = Session::load(dir.path().join("session")).unwrap();
    session.set("tok").unwrap();
    let mut client = CanvasClient::new(ApiClient::new(UNREACHABLE_API), session, EngineCore::new());

    let actions = client
        .apply(|core| gesture(core, pt(100.0, 100.0), pt(250.0, 180.0)))
        .await
        .unwrap();

    assert!(client.core().doc.is_empty());
    assert!(actions.contains(&Action::RenderNeeded));
    assert!(!actions.iter().any(|a| matches!(a, Action::Persist(_))));
}

#[tokio::test]
async fn failed_update_keeps_local_change() {
    let dir = tempfile::tempdir().unwrap();
    let mut session = Session::load(dir.path().join("session")).unwrap();
    session.set("tok").unwrap();
    let mut core = EngineCore::new();
    let mut seed = canvas::doc::Annotation::drafted(AnnotationId::from("rect-1"), pt(100.0, 100.0), None);
    seed.width = 150.0;
    seed.height = 80.0;
    core.load_snapshot(vec![seed]);
    let mut client = CanvasClient::new(ApiClient::new(UNREACHABLE_API), session, core);

    client
        .try_apply(|core| core.set_mode(Mode::Select))
        .await
        .unwrap();
    client
        .apply(|core| gesture(core, pt(150.0, 150.0), pt(170.0, 140.0)))
        .await
        .unwrap();

    let a = client.core().annotation(&AnnotationId::from("rect-1")).unwrap();
    assert_eq!((a.x, a.y), (120.0, 90.0));
}

#[tokio::test]
async fn expired_session_rolls_back_and_requires_login() {
    let dir = tempfile::tempdir().unwrap();
    let (client, api) = open_client(&dir).await;
    drop(client);

    let mut session = Session::load(dir.path().join("session")).unwrap();
    session.set("revoked").unwrap();
    let mut client = CanvasClient::new(api, session, EngineCore::new());

    let result = client
        .apply(|core| gesture(core, pt(100.0, 100.0), pt(250.0, 180.0)))
        .await;
    assert!(matches!(result, Err(ClientError::LoginRequired)));
    assert!(client.core().doc.is_empty());
    assert!(!client.session().is_authenticated());
}

#[tokio::test]
async fn refused_command_surfaces_engine_error() {
    let dir = tempfile::tempdir().unwrap();
    let (mut client, _) = open_client(&dir).await;
    let result = client.try_apply(|core| core.set_mode(Mode::Select)).await;
    assert!(matches!(result, Err(ClientError::Engine(EngineError::NothingToSelect))));
}

#[tokio::test]
async fn selection_click_dispatches_nothing_remote() {
    let dir = tempfile::tempdir().unwrap();
    let (mut client, _) = open_client(&dir).await;
    client
        .apply(|core| gesture(core, pt(100.0, 100.0), pt(250.0, 180.0)))
        .await
        .unwrap();
    client
        .try_apply(|core| core.set_mode(Mode::Select))
        .await
        .unwrap();

    let actions = client
        .apply(|core| click(core, pt(150.0, 150.0)))
        .await
        .unwrap();
    assert_eq!(actions.len(), 1);
    assert!(matches!(actions[0], Action::SelectionChanged(Some(_))));
}
