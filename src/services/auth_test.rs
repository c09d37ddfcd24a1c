use super::*;
use crate::state::test_helpers::test_app_state;

#[test]
fn bytes_to_hex_pads_each_byte() {
    assert_eq!(bytes_to_hex(&[0x00, 0x0f, 0xff]), "000fff");
}

#[test]
fn generate_token_is_64_hex_chars() {
    let token = generate_token();
    assert_eq!(token.len(), 64);
    assert!(token.chars().all(|c| c.is_ascii_hexdigit()));
    assert_ne!(token, generate_token());
}

#[test]
fn hash_password_is_salted_argon2() {
    let a = hash_password("hunter2").unwrap();
    let b = hash_password("hunter2").unwrap();
    assert!(a.starts_with("$argon2id$"));
    assert_ne!(a, b);
    assert!(verify_password("hunter2", &a));
    assert!(verify_password("hunter2", &b));
}

#[test]
fn verify_password_rejects_wrong_or_malformed() {
    let stored = hash_password("hunter2").unwrap();
    assert!(!verify_password("hunter3", &stored));
    assert!(!verify_password("hunter2", "not-a-phc-string"));
    assert!(!verify_password("hunter2", ""));
}

#[tokio::test]
async fn register_issues_valid_token() {
    let state = test_app_state();
    let token = register(&state, "alice", "pw").await.unwrap();
    let user_id = validate_token(&state, &token).await.unwrap();

    let accounts = state.accounts.read().await;
    let user = accounts.user_by_name("alice").unwrap();
    assert_eq!(user.id, user_id);
    assert_ne!(user.password_hash, "pw");
    assert!(verify_password("pw", &user.password_hash));
    assert!(accounts.dirty_users.contains(&user_id));
    assert!(accounts.dirty_sessions.contains(&token));
}

#[tokio::test]
async fn register_rejects_duplicate_username() {
    let state = test_app_state();
    register(&state, "alice", "pw").await.unwrap();
    assert_eq!(register(&state, " alice ", "other").await, Err(AuthError::UsernameTaken));
}

#[tokio::test]
async fn register_requires_both_fields() {
    let state = test_app_state();
    assert_eq!(register(&state, "  ", "pw").await, Err(AuthError::MissingCredentials));
    assert_eq!(register(&state, "bob", "").await, Err(AuthError::MissingCredentials));
}

#[tokio::test]
async fn login_checks_password() {
    let state = test_app_state();
    register(&state, "alice", "pw").await.unwrap();

    let token = login(&state, "alice", "pw").await.unwrap();
    assert!(validate_token(&state, &token).await.is_some());
    assert_eq!(login(&state, "alice", "nope").await, Err(AuthError::InvalidCredentials));
    assert_eq!(login(&state, "mallory", "pw").await, Err(AuthError::InvalidCredentials));
}

#[tokio::test]
async fn unknown_token_is_rejected() {
    let state = test_app_state();
    assert!(validate_token(&state, "deadbeef").await.is_none());
}
