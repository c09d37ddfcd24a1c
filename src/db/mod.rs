//! Database initialization, migrations, and startup hydration.
//!
//! SYSTEM CONTEXT
//! ==============
//! Startup uses this module to create the shared SQLx pool, enforce schema
//! migrations, and read back the state the persistence task wrote before
//! accepting API traffic.

use sqlx::postgres::PgPoolOptions;
use sqlx::{PgPool, Row};
use uuid::Uuid;

use crate::services::persistence::env_parse;
use crate::state::{StoredAnnotation, User};

const DEFAULT_DB_MAX_CONNECTIONS: u32 = 5;

/// Everything needed to rebuild in-memory state.
#[derive(Debug, Default)]
pub struct Snapshot {
    pub users: Vec<User>,
    /// `(token, user_id)` pairs.
    pub sessions: Vec<(String, Uuid)>,
    /// All annotations in insertion order.
    pub annotations: Vec<StoredAnnotation>,
}

/// Initialize the `PostgreSQL` connection pool and run migrations.
///
/// # Errors
///
/// Returns an error if the connection or migrations fail.
pub async fn init_pool(database_url: &str) -> Result<PgPool, sqlx::Error> {
    let pool = PgPoolOptions::new()
        .max_connections(env_parse("DB_MAX_CONNECTIONS", DEFAULT_DB_MAX_CONNECTIONS))
        .connect(database_url)
        .await?;

    sqlx::migrate!("src/db/migrations").run(&pool).await?;

    Ok(pool)
}

/// Read users, sessions and annotations.
///
/// # Errors
///
/// Returns an error if any query fails.
pub async fn load_snapshot(pool: &PgPool) -> Result<Snapshot, sqlx::Error> {
    let users = sqlx::query("SELECT id, username, password_hash, created_at FROM users")
        .fetch_all(pool)
        .await?
        .into_iter()
        .map(|r| User {
            id: r.get("id"),
            username: r.get("username"),
            password_hash: r.get("password_hash"),
            created_at: r.get("created_at"),
        })
        .collect();

    let sessions = sqlx::query("SELECT token, user_id FROM sessions")
        .fetch_all(pool)
        .await?
        .into_iter()
        .map(|r| (r.get("token"), r.get("user_id")))
        .collect();

    let annotations = sqlx::query(
        r"SELECT id, owner_id, x, y, width, height, fill, stroke, created_at, updated_at
          FROM annotations
          ORDER BY seq",
    )
    .fetch_all(pool)
    .await?
    .into_iter()
    .map(|r| StoredAnnotation {
        id: r.get("id"),
        x: r.get("x"),
        y: r.get("y"),
        width: r.get("width"),
        height: r.get("height"),
        fill: r.get("fill"),
        stroke: r.get("stroke"),
        owner_id: r.get("owner_id"),
        created_at: r.get("created_at"),
        updated_at: r.get("updated_at"),
    })
    .collect();

    Ok(Snapshot { users, sessions, annotations })
}
