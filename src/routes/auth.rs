//! Auth routes: registration, login, and the bearer-token extractor.

use axum::extract::rejection::JsonRejection;
use axum::extract::{FromRef, State};
use axum::http::StatusCode;
use axum::http::header::AUTHORIZATION;
use axum::response::{IntoResponse, Json, Response};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::error_response;
use crate::services::auth::{self as auth_svc, AuthError};
use crate::state::AppState;

// =============================================================================
// AUTH EXTRACTOR
// =============================================================================

/// Authenticated user extracted from `Authorization: Bearer <token>`.
/// Use as a handler parameter to require authentication.
pub struct AuthUser {
    pub user_id: Uuid,
}

fn bearer_token(parts: &axum::http::request::Parts) -> Option<&str> {
    parts
        .headers
        .get(AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

impl<S> axum::extract::FromRequestParts<S> for AuthUser
where
    AppState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request_parts(parts: &mut axum::http::request::Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Some(token) = bearer_token(parts) else {
            return Err(error_response(StatusCode::UNAUTHORIZED, "No token, authorization denied"));
        };

        let app_state = AppState::from_ref(state);
        let user_id = auth_svc::validate_token(&app_state, token)
            .await
            .ok_or_else(|| error_response(StatusCode::UNAUTHORIZED, "Token is not valid"))?;

        Ok(Self { user_id })
    }
}

// =============================================================================
// HANDLERS
// =============================================================================

#[derive(Debug, Deserialize)]
pub struct Credentials {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub token: String,
}

pub(crate) fn auth_error_to_status(err: &AuthError) -> StatusCode {
    match err {
        AuthError::MissingCredentials | AuthError::UsernameTaken | AuthError::InvalidCredentials => {
            StatusCode::BAD_REQUEST
        }
        AuthError::Hashing => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn token_result(result: Result<String, AuthError>) -> Response {
    match result {
        Ok(token) => Json(TokenResponse { token }).into_response(),
        Err(e) => error_response(auth_error_to_status(&e), e.to_string()),
    }
}

/// `POST /api/auth/register`: create an account, return `{ token }`.
pub async fn register(State(state): State<AppState>, body: Result<Json<Credentials>, JsonRejection>) -> Response {
    let Ok(Json(creds)) = body else {
        return error_response(StatusCode::BAD_REQUEST, AuthError::MissingCredentials.to_string());
    };
    token_result(auth_svc::register(&state, &creds.username, &creds.password).await)
}

/// `POST /api/auth/login`: check a password, return `{ token }`.
pub async fn login(State(state): State<AppState>, body: Result<Json<Credentials>, JsonRejection>) -> Response {
    let Ok(Json(creds)) = body else {
        return error_response(StatusCode::BAD_REQUEST, AuthError::MissingCredentials.to_string());
    };
    let result = auth_svc::login(&state, &creds.username, &creds.password).await;
    if let Err(e) = &result {
        tracing::info!(username = %creds.username, error = %e, "login rejected");
    }
    token_result(result)
}

#[cfg(test)]
#[path = "auth_test.rs"]
mod tests;
