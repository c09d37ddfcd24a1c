//! Account service: registration, password login, bearer sessions.
//!
//! DESIGN
//! ======
//! Passwords are stored as Argon2id PHC strings (salt and parameters
//! embedded) and checked with the verifier, never by string comparison. A
//! successful register or login issues a fresh 32-byte random token; tokens
//! do not expire and are never revoked server-side.

use std::fmt::Write;

use argon2::password_hash::SaltString;
use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier};
use rand::Rng;
use uuid::Uuid;

use crate::state::{Accounts, AppState, User, now_millis};

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum AuthError {
    #[error("Username and password are required")]
    MissingCredentials,
    #[error("User already exists")]
    UsernameTaken,
    #[error("Invalid credentials")]
    InvalidCredentials,
    #[error("Password hashing failed")]
    Hashing,
}

pub(crate) fn bytes_to_hex(bytes: &[u8]) -> String {
    let mut s = String::with_capacity(bytes.len() * 2);
    for b in bytes {
        let _ = write!(s, "{b:02x}");
    }
    s
}

/// Generate a cryptographically random 32-byte hex token.
#[must_use]
pub fn generate_token() -> String {
    let bytes: [u8; 32] = rand::rng().random();
    bytes_to_hex(&bytes)
}

/// Hash `password` with Argon2id under a fresh random salt.
///
/// # Errors
///
/// `Hashing` if the salt cannot be encoded or the hasher fails.
pub fn hash_password(password: &str) -> Result<String, AuthError> {
    let bytes: [u8; 16] = rand::rng().random();
    let salt = SaltString::encode_b64(&bytes).map_err(|_| AuthError::Hashing)?;
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|_| AuthError::Hashing)?;
    Ok(hash.to_string())
}

/// Check `password` against a stored PHC string. Malformed hashes never match.
#[must_use]
pub fn verify_password(password: &str, stored: &str) -> bool {
    PasswordHash::new(stored).is_ok_and(|parsed| Argon2::default().verify_password(password.as_bytes(), &parsed).is_ok())
}

fn issue_session(accounts: &mut Accounts, user_id: Uuid) -> String {
    let token = generate_token();
    accounts.sessions.insert(token.clone(), user_id);
    accounts.dirty_sessions.insert(token.clone());
    token
}

fn normalize(username: &str, password: &str) -> Result<String, AuthError> {
    let username = username.trim();
    if username.is_empty() || password.is_empty() {
        return Err(AuthError::MissingCredentials);
    }
    Ok(username.to_owned())
}

/// Create an account and return a session token for it.
///
/// # Errors
///
/// `MissingCredentials` for a blank username or empty password,
/// `UsernameTaken` if the username is registered.
pub async fn register(state: &AppState, username: &str, password: &str) -> Result<String, AuthError> {
    let username = normalize(username, password)?;
    let mut accounts = state.accounts.write().await;
    if accounts.by_username.contains_key(&username) {
        return Err(AuthError::UsernameTaken);
    }

    let user = User {
        id: Uuid::new_v4(),
        password_hash: hash_password(password)?,
        username,
        created_at: now_millis(),
    };
    let user_id = user.id;
    tracing::info!(%user_id, username = %user.username, "user registered");
    accounts.dirty_users.insert(user_id);
    accounts.load_user(user);

    Ok(issue_session(&mut accounts, user_id))
}

/// Check a password and return a new session token.
///
/// # Errors
///
/// `MissingCredentials` for blank input, `InvalidCredentials` for an unknown
/// user or a wrong password.
pub async fn login(state: &AppState, username: &str, password: &str) -> Result<String, AuthError> {
    let username = normalize(username, password)?;
    let mut accounts = state.accounts.write().await;
    let user_id = match accounts.user_by_name(&username) {
        Some(user) if verify_password(password, &user.password_hash) => user.id,
        _ => return Err(AuthError::InvalidCredentials),
    };
    Ok(issue_session(&mut accounts, user_id))
}

/// Resolve a bearer token to its user.
pub async fn validate_token(state: &AppState, token: &str) -> Option<Uuid> {
    let accounts = state.accounts.read().await;
    accounts
        .sessions
        .get(token)
        .copied()
        .filter(|id| accounts.users.contains_key(id))
}

#[cfg(test)]
#[path = "auth_test.rs"]
mod tests;
