//! REST API client for the annotation and auth services.
//!
//! ERROR HANDLING
//! ==============
//! Non-2xx responses become typed [`ApiError`]s carrying the server's `msg`
//! when it sent one. `401` and `404` get their own variants because the
//! sync layer treats them differently from other failures.

use canvas::doc::{Annotation, AnnotationId};
use canvas::sync::SyncError;
use reqwest::{Method, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[cfg(test)]
#[path = "api_test.rs"]
mod api_test;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("unauthorized: {0}")]
    Unauthorized(String),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("HTTP {status}: {msg}")]
    Rejected { status: u16, msg: String },
    #[error("http request failed: {0}")]
    Http(#[from] reqwest::Error),
}

impl ApiError {
    /// How the sync layer should see this failure.
    #[must_use]
    pub fn to_sync_error(&self) -> SyncError {
        match self {
            Self::Unauthorized(_) => SyncError::Unauthorized,
            Self::NotFound(_) => SyncError::NotFound,
            Self::Rejected { .. } | Self::Http(_) => SyncError::Remote(self.to_string()),
        }
    }

    #[must_use]
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Unauthorized(_))
    }
}

#[derive(Serialize)]
struct Credentials<'a> {
    username: &'a str,
    password: &'a str,
}

#[derive(Deserialize)]
struct TokenResponse {
    token: String,
}

/// Pull `msg` out of an error body, falling back to the status reason.
pub(crate) fn error_message(status: StatusCode, body: &Value) -> String {
    body.get("msg")
        .and_then(Value::as_str)
        .map(ToOwned::to_owned)
        .unwrap_or_else(|| status.canonical_reason().unwrap_or("request failed").to_owned())
}

pub(crate) fn status_error(status: StatusCode, body: &Value) -> ApiError {
    let msg = error_message(status, body);
    match status {
        StatusCode::UNAUTHORIZED => ApiError::Unauthorized(msg),
        StatusCode::NOT_FOUND => ApiError::NotFound(msg),
        _ => ApiError::Rejected { status: status.as_u16(), msg },
    }
}

/// Typed client over `reqwest`. Cheap to clone.
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
}

impl ApiClient {
    /// `base_url` includes the `/api` prefix, e.g. `http://127.0.0.1:5000/api`.
    #[must_use]
    pub fn new(base_url: &str) -> Self {
        Self { http: reqwest::Client::new(), base_url: base_url.trim_end_matches('/').to_owned() }
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn request<B: Serialize + ?Sized>(
        &self,
        method: Method,
        path: &str,
        token: Option<&str>,
        body: Option<&B>,
    ) -> Result<Value, ApiError> {
        let url = format!("{}{path}", self.base_url);
        let mut request = self.http.request(method, &url);
        if let Some(token) = token {
            request = request.bearer_auth(token);
        }
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await?;
        let status = response.status();
        let text = response.text().await?;
        let value = serde_json::from_str::<Value>(&text).unwrap_or(Value::Null);

        if !status.is_success() {
            tracing::debug!(%url, status = status.as_u16(), "api request rejected");
            return Err(status_error(status, &value));
        }
        Ok(value)
    }

    fn decode<T: serde::de::DeserializeOwned>(value: Value) -> Result<T, ApiError> {
        serde_json::from_value(value).map_err(|e| ApiError::Rejected { status: 200, msg: format!("unexpected response: {e}") })
    }

    // --- Auth ---

    /// `POST /auth/register`, returning the new session token.
    ///
    /// # Errors
    ///
    /// `Rejected` with the server's message (e.g. `User already exists`).
    pub async fn register(&self, username: &str, password: &str) -> Result<String, ApiError> {
        let body = Credentials { username, password };
        let value = self
            .request(Method::POST, "/auth/register", None, Some(&body))
            .await?;
        Ok(Self::decode::<TokenResponse>(value)?.token)
    }

    /// `POST /auth/login`, returning a session token.
    ///
    /// # Errors
    ///
    /// `Rejected` with the server's message (e.g. `Invalid credentials`).
    pub async fn login(&self, username: &str, password: &str) -> Result<String, ApiError> {
        let body = Credentials { username, password };
        let value = self
            .request(Method::POST, "/auth/login", None, Some(&body))
            .await?;
        Ok(Self::decode::<TokenResponse>(value)?.token)
    }

    // --- Annotations ---

    /// `GET /annotations`.
    ///
    /// # Errors
    ///
    /// `Unauthorized` for a missing or stale token.
    pub async fn list(&self, token: &str) -> Result<Vec<Annotation>, ApiError> {
        let value = self
            .request::<Value>(Method::GET, "/annotations", Some(token), None)
            .await?;
        Self::decode(value)
    }

    /// `POST /annotations`, returning the stored record.
    ///
    /// # Errors
    ///
    /// `Unauthorized`, or `Rejected` for a duplicate id or bad geometry.
    pub async fn create(&self, token: &str, annotation: &Annotation) -> Result<Annotation, ApiError> {
        let value = self
            .request(Method::POST, "/annotations", Some(token), Some(annotation))
            .await?;
        Self::decode(value)
    }

    /// `PUT /annotations/{id}` with the full record.
    ///
    /// # Errors
    ///
    /// `Unauthorized`, or `NotFound` when the server has no such annotation.
    pub async fn update(&self, token: &str, annotation: &Annotation) -> Result<Annotation, ApiError> {
        let path = format!("/annotations/{}", annotation.id);
        let value = self
            .request(Method::PUT, &path, Some(token), Some(annotation))
            .await?;
        Self::decode(value)
    }

    /// `DELETE /annotations/{id}`.
    ///
    /// # Errors
    ///
    /// `Unauthorized`, or `NotFound` when the server has no such annotation.
    pub async fn delete(&self, token: &str, id: &AnnotationId) -> Result<(), ApiError> {
        let path = format!("/annotations/{id}");
        self.request::<Value>(Method::DELETE, &path, Some(token), None)
            .await?;
        Ok(())
    }
}
