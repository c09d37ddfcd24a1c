//! `CanvasClient`: the interaction core wired to the annotation service.
//!
//! DESIGN
//! ======
//! The core never talks to the network. Every input handler returns
//! actions; [`CanvasClient::dispatch`] runs the `Persist` ones in emission
//! order, awaits each response, and reports it back through `confirm_sync`
//! or `reject_sync`. Actions produced by that reconciliation are handed to
//! the caller together with the non-sync actions.
//!
//! ERROR HANDLING
//! ==============
//! A `401` anywhere means the session is dead: the token is cleared, the
//! remaining ops in the batch are rejected as unauthorized (which rolls back
//! optimistic creates), and the caller gets `LoginRequired`. Every other
//! remote failure is absorbed by the core's per-kind failure policy.

use canvas::doc::Annotation;
use canvas::engine::{Action, EngineCore, EngineError};
use canvas::sync::{SyncError, SyncOp};

use crate::net::api::{ApiClient, ApiError};
use crate::session::{Session, SessionError};

#[cfg(test)]
#[path = "canvas_client_test.rs"]
mod canvas_client_test;

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("login required")]
    LoginRequired,
    #[error(transparent)]
    Api(#[from] ApiError),
    #[error(transparent)]
    Session(#[from] SessionError),
    #[error(transparent)]
    Engine(#[from] EngineError),
}

/// Create an account and store its token in `session`.
///
/// # Errors
///
/// `Api` with the server's message, or `Session` if the token can't be saved.
pub async fn register(api: &ApiClient, session: &mut Session, username: &str, password: &str) -> Result<(), ClientError> {
    let token = api.register(username, password).await?;
    session.set(&token)?;
    tracing::info!(%username, "registered");
    Ok(())
}

/// Log in and store the token in `session`.
///
/// # Errors
///
/// `Api` with the server's message, or `Session` if the token can't be saved.
pub async fn login(api: &ApiClient, session: &mut Session, username: &str, password: &str) -> Result<(), ClientError> {
    let token = api.login(username, password).await?;
    session.set(&token)?;
    tracing::info!(%username, "logged in");
    Ok(())
}

/// Interaction core, session and API client in one place.
#[derive(Debug)]
pub struct CanvasClient {
    api: ApiClient,
    session: Session,
    core: EngineCore,
}

impl CanvasClient {
    /// Wrap an already-hydrated core.
    #[must_use]
    pub fn new(api: ApiClient, session: Session, core: EngineCore) -> Self {
        Self { api, session, core }
    }

    /// Fetch the caller's annotations and hydrate a fresh core.
    ///
    /// # Errors
    ///
    /// `LoginRequired` without a token or when the service rejects it;
    /// `Api` for any other failure to load.
    pub async fn open(api: ApiClient, session: Session) -> Result<Self, ClientError> {
        let mut client = Self::new(api, session, EngineCore::new());
        client.reload().await?;
        Ok(client)
    }

    /// Re-read the server listing into the core, dropping selection and gesture.
    ///
    /// # Errors
    ///
    /// Same as [`CanvasClient::open`].
    pub async fn reload(&mut self) -> Result<Vec<Action>, ClientError> {
        let Some(token) = self.session.token() else {
            return Err(ClientError::LoginRequired);
        };
        match self.api.list(token).await {
            Ok(annotations) => {
                tracing::debug!(count = annotations.len(), "annotations loaded");
                Ok(self.core.load_snapshot(annotations))
            }
            Err(e) if e.is_unauthorized() => Err(self.expire_session()),
            Err(e) => Err(e.into()),
        }
    }

    #[must_use]
    pub fn core(&self) -> &EngineCore {
        &self.core
    }

    #[must_use]
    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Run `f` against the core and dispatch whatever it emits.
    ///
    /// # Errors
    ///
    /// See [`CanvasClient::dispatch`].
    pub async fn apply<F>(&mut self, f: F) -> Result<Vec<Action>, ClientError>
    where
        F: FnOnce(&mut EngineCore) -> Vec<Action>,
    {
        let actions = f(&mut self.core);
        self.dispatch(actions).await
    }

    /// Like [`CanvasClient::apply`] for core commands that can be refused.
    ///
    /// # Errors
    ///
    /// `Engine` if the core refuses the command, else see [`CanvasClient::dispatch`].
    pub async fn try_apply<F>(&mut self, f: F) -> Result<Vec<Action>, ClientError>
    where
        F: FnOnce(&mut EngineCore) -> Result<Vec<Action>, EngineError>,
    {
        let actions = f(&mut self.core)?;
        self.dispatch(actions).await
    }

    /// Execute every `Persist` action in order and fold the results back into
    /// the core. Returns the remaining actions plus any produced while
    /// reconciling.
    ///
    /// # Errors
    ///
    /// `LoginRequired` when the service rejects the session; the batch is
    /// still fully reconciled first.
    pub async fn dispatch(&mut self, actions: Vec<Action>) -> Result<Vec<Action>, ClientError> {
        let mut out = Vec::new();
        let mut expired = false;

        for action in actions {
            let Action::Persist(op) = action else {
                out.push(action);
                continue;
            };
            if expired {
                out.extend(self.core.reject_sync(&op, &SyncError::Unauthorized));
                continue;
            }
            match self.execute(&op).await {
                Ok(server) => out.extend(self.core.confirm_sync(&op, server)),
                Err(e) => {
                    out.extend(self.core.reject_sync(&op, &e.to_sync_error()));
                    expired = e.is_unauthorized();
                }
            }
        }

        if expired {
            return Err(self.expire_session());
        }
        Ok(out)
    }

    async fn execute(&self, op: &SyncOp) -> Result<Option<Annotation>, ApiError> {
        let Some(token) = self.session.token() else {
            return Err(ApiError::Unauthorized("no session".into()));
        };
        match op {
            SyncOp::Create { record, .. } => self.api.create(token, record).await.map(Some),
            SyncOp::Update { record, .. } => self.api.update(token, record).await.map(Some),
            SyncOp::Delete { id } => self.api.delete(token, id).await.map(|()| None),
        }
    }

    fn expire_session(&mut self) -> ClientError {
        tracing::warn!("session rejected by service; login required");
        if let Err(e) = self.session.clear() {
            tracing::error!(error = %e, "failed to clear session");
        }
        ClientError::LoginRequired
    }
}
