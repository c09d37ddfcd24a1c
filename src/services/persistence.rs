//! Persistence service: background flush of dirty in-memory state.
//!
//! DESIGN
//! ======
//! A background task snapshots dirty users, sessions, annotations and
//! deletions under the state locks, writes them to Postgres in one
//! transaction with the locks released, then sleeps `FLUSH_INTERVAL_MS`
//! before the next cycle.
//!
//! ERROR HANDLING
//! ==============
//! Dirty flags are cleared only after a successful commit, and an annotation
//! flag only when the record still equals what was written. A failed cycle
//! is logged and retried on the next tick.

use std::time::Duration;

use sqlx::PgPool;
use tokio::task::JoinHandle;
use tracing::{error, info};
use uuid::Uuid;

use crate::state::{AppState, StoredAnnotation, User};

const DEFAULT_FLUSH_INTERVAL_MS: u64 = 250;

/// Read `key` from the environment, falling back to `default` when unset or unparsable.
pub fn env_parse<T>(key: &str, default: T) -> T
where
    T: std::str::FromStr + Copy,
{
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse::<T>().ok())
        .unwrap_or(default)
}

/// Spawn the background persistence task. Returns a handle for shutdown.
pub fn spawn_persistence_task(state: AppState, pool: PgPool) -> JoinHandle<()> {
    let flush_interval_ms = env_parse("FLUSH_INTERVAL_MS", DEFAULT_FLUSH_INTERVAL_MS);
    info!(flush_interval_ms, "persistence flush configured");
    tokio::spawn(async move {
        loop {
            flush_all_dirty(&state, &pool).await;
            tokio::time::sleep(Duration::from_millis(flush_interval_ms)).await;
        }
    })
}

/// Everything modified since the last successful flush.
#[derive(Debug, Default)]
pub struct DirtyBatch {
    pub users: Vec<User>,
    pub sessions: Vec<(String, Uuid)>,
    pub annotations: Vec<StoredAnnotation>,
    /// `(owner_id, annotation_id)` pairs removed in memory.
    pub deleted: Vec<(Uuid, String)>,
}

impl DirtyBatch {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.users.is_empty() && self.sessions.is_empty() && self.annotations.is_empty() && self.deleted.is_empty()
    }
}

async fn flush_all_dirty(state: &AppState, pool: &PgPool) {
    let batch = collect_dirty(state).await;
    if batch.is_empty() {
        return;
    }

    match write_batch(pool, &batch).await {
        Ok(()) => clear_flushed(state, &batch).await,
        Err(e) => {
            error!(
                error = %e,
                users = batch.users.len(),
                annotations = batch.annotations.len(),
                deleted = batch.deleted.len(),
                "persistence flush failed"
            );
        }
    }
}

/// Clone every dirty record under the locks so I/O can run lock-free.
pub async fn collect_dirty(state: &AppState) -> DirtyBatch {
    let mut batch = DirtyBatch::default();
    {
        let accounts = state.accounts.read().await;
        batch.users = accounts
            .dirty_users
            .iter()
            .filter_map(|id| accounts.users.get(id).cloned())
            .collect();
        batch.sessions = accounts
            .dirty_sessions
            .iter()
            .filter_map(|token| accounts.sessions.get(token).map(|id| (token.clone(), *id)))
            .collect();
    }

    let owners = state.owners.read().await;
    for (owner_id, owner) in owners.iter() {
        batch.annotations.extend(
            owner
                .dirty
                .iter()
                .filter_map(|id| owner.get(id).cloned()),
        );
        batch
            .deleted
            .extend(owner.deleted.iter().map(|id| (*owner_id, id.clone())));
    }
    batch
}

/// Drop dirty markers for what `batch` wrote, keeping any record changed since.
pub async fn clear_flushed(state: &AppState, batch: &DirtyBatch) {
    {
        let mut accounts = state.accounts.write().await;
        for user in &batch.users {
            accounts.dirty_users.remove(&user.id);
        }
        for (token, _) in &batch.sessions {
            accounts.dirty_sessions.remove(token);
        }
    }

    let mut owners = state.owners.write().await;
    for flushed in &batch.annotations {
        let Some(owner) = owners.get_mut(&flushed.owner_id) else {
            continue;
        };
        // EDGE: keep the flag if the record was updated again after snapshot.
        let can_clear = match owner.get(&flushed.id) {
            Some(current) => current == flushed,
            None => true,
        };
        if can_clear {
            owner.dirty.remove(&flushed.id);
        }
    }
    for (owner_id, id) in &batch.deleted {
        if let Some(owner) = owners.get_mut(owner_id) {
            owner.deleted.remove(id);
        }
    }
}

async fn write_batch(pool: &PgPool, batch: &DirtyBatch) -> Result<(), sqlx::Error> {
    let mut tx = pool.begin().await?;

    for (owner_id, id) in &batch.deleted {
        sqlx::query("DELETE FROM annotations WHERE owner_id = $1 AND id = $2")
            .bind(owner_id)
            .bind(id)
            .execute(tx.as_mut())
            .await?;
    }

    for user in &batch.users {
        sqlx::query(
            r"INSERT INTO users (id, username, password_hash, created_at)
              VALUES ($1, $2, $3, $4)
              ON CONFLICT (id) DO NOTHING",
        )
        .bind(user.id)
        .bind(&user.username)
        .bind(&user.password_hash)
        .bind(user.created_at)
        .execute(tx.as_mut())
        .await?;
    }

    for (token, user_id) in &batch.sessions {
        sqlx::query("INSERT INTO sessions (token, user_id) VALUES ($1, $2) ON CONFLICT (token) DO NOTHING")
            .bind(token)
            .bind(user_id)
            .execute(tx.as_mut())
            .await?;
    }

    for a in &batch.annotations {
        sqlx::query(
            r"INSERT INTO annotations (owner_id, id, x, y, width, height, fill, stroke, created_at, updated_at)
              VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
              ON CONFLICT (owner_id, id) DO UPDATE SET
                  x = EXCLUDED.x,
                  y = EXCLUDED.y,
                  width = EXCLUDED.width,
                  height = EXCLUDED.height,
                  fill = EXCLUDED.fill,
                  stroke = EXCLUDED.stroke,
                  updated_at = EXCLUDED.updated_at",
        )
        .bind(a.owner_id)
        .bind(&a.id)
        .bind(a.x)
        .bind(a.y)
        .bind(a.width)
        .bind(a.height)
        .bind(&a.fill)
        .bind(&a.stroke)
        .bind(a.created_at)
        .bind(a.updated_at)
        .execute(tx.as_mut())
        .await?;
    }

    tx.commit().await
}

#[cfg(test)]
#[path = "persistence_test.rs"]
mod tests;
