//! Client configuration.

use std::path::PathBuf;

#[cfg(test)]
#[path = "config_test.rs"]
mod config_test;

pub const DEFAULT_API_URL: &str = "http://127.0.0.1:5000/api";

/// Where the service lives and where the session token is kept.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Base URL including the `/api` prefix.
    pub api_url: String,
    pub session_file: PathBuf,
}

impl ClientConfig {
    #[must_use]
    pub fn new(api_url: impl Into<String>, session_file: impl Into<PathBuf>) -> Self {
        Self { api_url: api_url.into(), session_file: session_file.into() }
    }

    /// Load from `ANNOTATE_API_URL` and `ANNOTATE_SESSION_FILE`, with defaults.
    #[must_use]
    pub fn from_env() -> Self {
        let api_url = std::env::var("ANNOTATE_API_URL").unwrap_or_else(|_| DEFAULT_API_URL.to_owned());
        let session_file = std::env::var_os("ANNOTATE_SESSION_FILE").map_or_else(default_session_file, PathBuf::from);
        Self { api_url, session_file }
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self::new(DEFAULT_API_URL, default_session_file())
    }
}

/// `$HOME/.annotate/session`, or a relative `.annotate/session` without a home directory.
#[must_use]
pub fn default_session_file() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_default()
        .join(".annotate")
        .join("session")
}
