//! Shared application state.
//!
//! DESIGN
//! ======
//! `AppState` is injected into Axum handlers via the `State` extractor.
//! In-memory state is authoritative: accounts and per-owner annotation lists
//! live behind `RwLock`s, and every mutation records a dirty marker that the
//! persistence task drains when a database is configured.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use time::OffsetDateTime;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::db::Snapshot;

/// Milliseconds since the Unix epoch.
#[must_use]
pub fn now_millis() -> i64 {
    #[allow(clippy::cast_possible_truncation)]
    let millis = (OffsetDateTime::now_utc().unix_timestamp_nanos() / 1_000_000) as i64;
    millis
}

// =============================================================================
// RECORDS
// =============================================================================

/// Registered account. Mirrors the `users` table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    /// Argon2id PHC string; carries its own salt.
    pub password_hash: String,
    pub created_at: i64,
}

/// Stored annotation. Mirrors the `annotations` table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredAnnotation {
    pub id: String,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    pub fill: String,
    pub stroke: String,
    pub owner_id: Uuid,
    pub created_at: i64,
    pub updated_at: i64,
}

// =============================================================================
// ACCOUNTS
// =============================================================================

/// Users and their bearer sessions.
#[derive(Debug, Default)]
pub struct Accounts {
    pub users: HashMap<Uuid, User>,
    pub by_username: HashMap<String, Uuid>,
    /// Bearer token -> user id.
    pub sessions: HashMap<String, Uuid>,
    pub dirty_users: HashSet<Uuid>,
    pub dirty_sessions: HashSet<String>,
}

impl Accounts {
    #[must_use]
    pub fn user_by_name(&self, username: &str) -> Option<&User> {
        self.by_username
            .get(username)
            .and_then(|id| self.users.get(id))
    }

    /// Insert a user without marking it dirty.
    pub fn load_user(&mut self, user: User) {
        self.by_username.insert(user.username.clone(), user.id);
        self.users.insert(user.id, user);
    }
}

// =============================================================================
// OWNER STATE
// =============================================================================

/// One user's annotations in insertion order, plus pending persistence work.
#[derive(Debug, Default)]
pub struct OwnerState {
    pub annotations: Vec<StoredAnnotation>,
    /// Ids created or updated since last flush.
    pub dirty: HashSet<String>,
    /// Ids removed since last flush.
    pub deleted: HashSet<String>,
}

impl OwnerState {
    #[must_use]
    pub fn position(&self, id: &str) -> Option<usize> {
        self.annotations.iter().position(|a| a.id == id)
    }

    #[must_use]
    pub fn get(&self, id: &str) -> Option<&StoredAnnotation> {
        self.annotations.iter().find(|a| a.id == id)
    }
}

// =============================================================================
// APP STATE
// =============================================================================

/// Shared application state, injected into Axum handlers via State extractor.
#[derive(Clone)]
pub struct AppState {
    /// `None` when running without `DATABASE_URL`.
    pub pool: Option<PgPool>,
    pub accounts: Arc<RwLock<Accounts>>,
    pub owners: Arc<RwLock<HashMap<Uuid, OwnerState>>>,
}

impl AppState {
    #[must_use]
    pub fn new(pool: Option<PgPool>) -> Self {
        Self {
            pool,
            accounts: Arc::new(RwLock::new(Accounts::default())),
            owners: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Replace in-memory state with a database snapshot. Nothing is marked dirty.
    pub async fn hydrate(&self, snapshot: Snapshot) {
        {
            let mut accounts = self.accounts.write().await;
            *accounts = Accounts::default();
            for user in snapshot.users {
                accounts.load_user(user);
            }
            accounts.sessions.extend(snapshot.sessions);
        }

        let mut owners = self.owners.write().await;
        owners.clear();
        for annotation in snapshot.annotations {
            owners
                .entry(annotation.owner_id)
                .or_default()
                .annotations
                .push(annotation);
        }
    }
}

// =============================================================================
// TEST HELPERS
// =============================================================================


#[cfg(test)]
#[path = "state_test.rs"]
mod tests;
