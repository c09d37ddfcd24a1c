//! Sync layer: optimistic local writes confirmed by best-effort remote calls.
//!
//! DESIGN
//! ======
//! Every mutation is a two-phase commit. Phase one applies the change to the
//! local store and emits a [`SyncOp`]. Phase two happens when the host
//! reports the remote outcome through [`confirm`] or [`reject`].
//!
//! Each op carries the record's local revision at the moment it was issued.
//! A confirmation whose revision still matches takes the server's fields
//! wholesale; one that lost a race with a later local edit only picks up the
//! server-only extras. Confirmations for records that have since left the
//! store are ignored.
//!
//! ERROR HANDLING
//! ==============
//! Failure handling is declared per kind by [`SyncKind::failure_policy`]:
//! a rejected create is rolled back, rejected updates and deletes are logged
//! and left alone until the next full reload. Nothing is retried.

#[cfg(test)]
#[path = "sync_test.rs"]
mod sync_test;

use crate::doc::{Annotation, AnnotationId, AnnotationStore};

/// The remote operation an op maps to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncKind {
    Create,
    Update,
    Delete,
}

/// What to do with the optimistic local change when the remote call fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailurePolicy {
    /// Undo the local change.
    Rollback,
    /// Keep the local change and log the failure.
    LogOnly,
}

impl SyncKind {
    #[must_use]
    pub fn failure_policy(self) -> FailurePolicy {
        match self {
            Self::Create => FailurePolicy::Rollback,
            Self::Update | Self::Delete => FailurePolicy::LogOnly,
        }
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Create => "create",
            Self::Update => "update",
            Self::Delete => "delete",
        }
    }
}

/// A remote call the host must perform for an optimistic local change.
#[derive(Debug, Clone, PartialEq)]
pub enum SyncOp {
    /// Persist a newly drawn annotation.
    Create {
        /// Full record as committed locally.
        record: Annotation,
        /// Local revision at issue time.
        revision: u64,
    },
    /// Persist the full updated record.
    Update {
        /// Full record as committed locally.
        record: Annotation,
        /// Local revision at issue time.
        revision: u64,
    },
    /// Remove an annotation remotely.
    Delete {
        /// Id of the removed annotation.
        id: AnnotationId,
    },
}

impl SyncOp {
    #[must_use]
    pub fn kind(&self) -> SyncKind {
        match self {
            Self::Create { .. } => SyncKind::Create,
            Self::Update { .. } => SyncKind::Update,
            Self::Delete { .. } => SyncKind::Delete,
        }
    }

    #[must_use]
    pub fn id(&self) -> &AnnotationId {
        match self {
            Self::Create { record, .. } | Self::Update { record, .. } => &record.id,
            Self::Delete { id } => id,
        }
    }
}

/// Why a remote call failed, as reported by the host.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SyncError {
    #[error("not authorized")]
    Unauthorized,
    #[error("annotation not found")]
    NotFound,
    #[error("remote call failed: {0}")]
    Remote(String),
}

/// What reconciliation did to the local store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncOutcome {
    /// Server fields were merged (or nothing needed merging).
    Reconciled,
    /// The optimistic record was removed.
    RolledBack,
    /// The failure was logged; local state is unchanged.
    Logged,
    /// The target record is gone locally; nothing to do.
    Ignored,
}

/// Fold a successful remote response into the store.
///
/// `server` is the record the service returned, if any. Its geometry is only
/// taken when the local record is unchanged since `op` was issued and the
/// server's box still meets `min_size`.
pub fn confirm(store: &mut AnnotationStore, op: &SyncOp, server: Option<Annotation>, min_size: f64) -> SyncOutcome {
    let revision = match op {
        SyncOp::Create { revision, .. } | SyncOp::Update { revision, .. } => *revision,
        SyncOp::Delete { .. } => return SyncOutcome::Reconciled,
    };
    let id = op.id();
    let Some(current) = store.revision(id) else {
        log::debug!("{} response for {id} arrived after local removal; ignored", op.kind().as_str());
        return SyncOutcome::Ignored;
    };
    let Some(server) = server else {
        return SyncOutcome::Reconciled;
    };
    let take_fields = current == revision && server.is_committable(min_size);
    store.reconcile(id, |local| local.merge_server(server, take_fields));
    SyncOutcome::Reconciled
}

/// Apply the failure policy for `op` after the remote call failed.
pub fn reject(store: &mut AnnotationStore, op: &SyncOp, err: &SyncError) -> SyncOutcome {
    let id = op.id();
    match op.kind().failure_policy() {
        FailurePolicy::Rollback => {
            if store.remove(id).is_some() {
                log::error!("failed to save annotation {id}: {err}; removed local copy");
                SyncOutcome::RolledBack
            } else {
                log::debug!("failed to save annotation {id}: {err}; already removed locally");
                SyncOutcome::Ignored
            }
        }
        FailurePolicy::LogOnly => {
            log::warn!("failed to {} annotation {id}: {err}", op.kind().as_str());
            SyncOutcome::Logged
        }
    }
}
