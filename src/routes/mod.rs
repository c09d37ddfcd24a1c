//! Router assembly.
//!
//! SYSTEM CONTEXT
//! ==============
//! All API routes live under `/api` behind permissive CORS and a request
//! trace layer. Failures are JSON `{ "msg": ... }` bodies.

pub mod annotations;
pub mod auth;

use axum::Router;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use axum::routing::{get, post, put};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::state::AppState;

/// Build the application router.
pub fn app(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(index))
        .route("/healthz", get(healthz))
        .route("/api/auth/register", post(auth::register))
        .route("/api/auth/login", post(auth::login))
        .route("/api/annotations", get(annotations::list).post(annotations::create))
        .route("/api/annotations/{id}", put(annotations::update).delete(annotations::delete))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// JSON error body shared by every route.
pub(crate) fn error_response(status: StatusCode, msg: impl Into<String>) -> Response {
    (status, Json(serde_json::json!({ "msg": msg.into() }))).into_response()
}

async fn index() -> &'static str {
    "Annotate API is running"
}

async fn healthz() -> StatusCode {
    StatusCode::OK
}
