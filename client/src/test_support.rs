//! In-process annotation service for end-to-end tests.

use annotate::routes::app;
use annotate::state::AppState;

/// Serve a fresh in-memory service on an ephemeral port; returns its `/api` base URL.
pub(crate) async fn spawn_service() -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app(AppState::new(None))).await.unwrap();
    });
    format!("http://{addr}/api")
}

/// A base URL nothing listens on.
pub(crate) const UNREACHABLE_API: &str = "http://127.0.0.1:9/api";
