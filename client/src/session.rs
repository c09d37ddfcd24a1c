//! File-backed session.
//!
//! DESIGN
//! ======
//! The token is read once when the session is loaded and cached in memory.
//! `set` and `clear` write through to the file, so the next process starts
//! from the same state. A missing file means signed out. On unix the file is
//! readable by its owner only.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

#[cfg(test)]
#[path = "session_test.rs"]
mod session_test;

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("session file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Bearer token persisted at a fixed path.
#[derive(Debug)]
pub struct Session {
    path: PathBuf,
    token: Option<String>,
}

impl Session {
    /// Read the session file at `path`.
    ///
    /// # Errors
    ///
    /// Returns `Io` if the file exists but cannot be read.
    pub fn load(path: impl Into<PathBuf>) -> Result<Self, SessionError> {
        let path = path.into();
        let token = match fs::read_to_string(&path) {
            Ok(raw) => Some(raw.trim().to_owned()).filter(|t| !t.is_empty()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => None,
            Err(source) => return Err(SessionError::Io { path, source }),
        };
        Ok(Self { path, token })
    }

    #[must_use]
    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.token.is_some()
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Store a new token.
    ///
    /// # Errors
    ///
    /// Returns `Io` if the file or its directory cannot be written.
    pub fn set(&mut self, token: &str) -> Result<(), SessionError> {
        if let Some(dir) = self.path.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir).map_err(|source| self.io_error(source))?;
        }
        write_private(&self.path, token).map_err(|source| self.io_error(source))?;
        self.token = Some(token.to_owned());
        Ok(())
    }

    /// Forget the token.
    ///
    /// # Errors
    ///
    /// Returns `Io` if an existing file cannot be removed.
    pub fn clear(&mut self) -> Result<(), SessionError> {
        self.token = None;
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(source) => Err(self.io_error(source)),
        }
    }

    fn io_error(&self, source: io::Error) -> SessionError {
        SessionError::Io { path: self.path.clone(), source }
    }
}

/// Write `contents` to `path`, owner read/write only on unix. An existing
/// file with looser permissions is tightened before the write.
fn write_private(path: &Path, contents: &str) -> io::Result<()> {
    let mut options = fs::OpenOptions::new();
    options.write(true).create(true).truncate(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }
    let mut file = options.open(path)?;
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        file.set_permissions(fs::Permissions::from_mode(0o600))?;
    }
    file.write_all(contents.as_bytes())
}
