//! Annotation routes: owner-scoped CRUD.

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};

use super::auth::AuthUser;
use super::error_response;
use crate::services::annotation::{self as annotation_svc, AnnotationChanges, AnnotationError, NewAnnotation};
use crate::state::AppState;

pub(crate) fn annotation_error_to_status(err: &AnnotationError) -> StatusCode {
    match err {
        AnnotationError::NotFound(_) => StatusCode::NOT_FOUND,
        AnnotationError::AlreadyExists(_) => StatusCode::CONFLICT,
        AnnotationError::Invalid(_) => StatusCode::BAD_REQUEST,
    }
}

fn annotation_error_response(err: &AnnotationError) -> Response {
    error_response(annotation_error_to_status(err), err.to_string())
}

fn body_error(rejection: &JsonRejection) -> Response {
    error_response(StatusCode::BAD_REQUEST, format!("Invalid annotation: {}", rejection.body_text()))
}

/// `GET /api/annotations`: the caller's annotations in insertion order.
pub async fn list(State(state): State<AppState>, auth: AuthUser) -> Response {
    Json(annotation_svc::list(&state, auth.user_id).await).into_response()
}

/// `POST /api/annotations`: store a new annotation under the client's id.
pub async fn create(
    State(state): State<AppState>,
    auth: AuthUser,
    body: Result<Json<NewAnnotation>, JsonRejection>,
) -> Response {
    let input = match body {
        Ok(Json(input)) => input,
        Err(rejection) => return body_error(&rejection),
    };
    match annotation_svc::create(&state, auth.user_id, input).await {
        Ok(annotation) => Json(annotation).into_response(),
        Err(e) => {
            tracing::warn!(user_id = %auth.user_id, error = %e, "annotation create rejected");
            annotation_error_response(&e)
        }
    }
}

/// `PUT /api/annotations/{id}`: replace geometry and colors.
pub async fn update(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<String>,
    body: Result<Json<AnnotationChanges>, JsonRejection>,
) -> Response {
    let changes = match body {
        Ok(Json(changes)) => changes,
        Err(rejection) => return body_error(&rejection),
    };
    match annotation_svc::update(&state, auth.user_id, &id, changes).await {
        Ok(annotation) => Json(annotation).into_response(),
        Err(e) => annotation_error_response(&e),
    }
}

/// `DELETE /api/annotations/{id}`.
pub async fn delete(State(state): State<AppState>, auth: AuthUser, Path(id): Path<String>) -> Response {
    match annotation_svc::delete(&state, auth.user_id, &id).await {
        Ok(()) => Json(serde_json::json!({ "msg": "Annotation removed" })).into_response(),
        Err(e) => annotation_error_response(&e),
    }
}

#[cfg(test)]
#[path = "annotations_test.rs"]
mod tests;
