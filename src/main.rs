use annotate::services::persistence::{self, env_parse};
use annotate::{db, routes, state};

const DEFAULT_PORT: u16 = 5000;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    if let Err(e) = dotenvy::dotenv() {
        if !e.not_found() {
            return Err(e.into());
        }
    }
    tracing_subscriber::fmt::init();

    let port: u16 = env_parse("PORT", DEFAULT_PORT);
    let pool = match std::env::var("DATABASE_URL") {
        Ok(url) => Some(db::init_pool(&url).await?),
        Err(_) => {
            tracing::warn!("DATABASE_URL not set; annotations live in memory only");
            None
        }
    };

    let state = state::AppState::new(pool.clone());
    if let Some(pool) = pool {
        let snapshot = db::load_snapshot(&pool).await?;
        tracing::info!(
            users = snapshot.users.len(),
            annotations = snapshot.annotations.len(),
            "state hydrated from database"
        );
        state.hydrate(snapshot).await;

        // Spawn background persistence task.
        let _persistence = persistence::spawn_persistence_task(state.clone(), pool);
    }

    let app = routes::app(state);
    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{port}")).await?;

    tracing::info!(%port, "annotate listening");
    axum::serve(listener, app).await?;
    Ok(())
}
