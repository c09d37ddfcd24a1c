//! Annotation service: per-owner list, create, update, delete.
//!
//! DESIGN
//! ======
//! Mutations update in-memory state immediately and mark the record dirty
//! (or deleted) for the persistence task. Every lookup is scoped to the
//! owner, so another user's id reads as not found.

use serde::Deserialize;
use uuid::Uuid;

use crate::state::{AppState, StoredAnnotation, now_millis};

pub const DEFAULT_FILL: &str = "transparent";
pub const DEFAULT_STROKE: &str = "red";

// =============================================================================
// TYPES
// =============================================================================

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum AnnotationError {
    #[error("Annotation not found")]
    NotFound(String),
    #[error("Annotation already exists")]
    AlreadyExists(String),
    #[error("Invalid annotation: {0}")]
    Invalid(&'static str),
}

/// Body of `POST /api/annotations`. Unknown fields are ignored.
#[derive(Debug, Clone, Deserialize)]
pub struct NewAnnotation {
    pub id: String,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    #[serde(default)]
    pub fill: Option<String>,
    #[serde(default)]
    pub stroke: Option<String>,
}

/// Body of `PUT /api/annotations/:id`. Omitted colors keep their value.
#[derive(Debug, Clone, Deserialize)]
pub struct AnnotationChanges {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    #[serde(default)]
    pub fill: Option<String>,
    #[serde(default)]
    pub stroke: Option<String>,
}

fn validate_geometry(x: f64, y: f64, width: f64, height: f64) -> Result<(), AnnotationError> {
    if ![x, y, width, height].iter().all(|v| v.is_finite()) {
        return Err(AnnotationError::Invalid("coordinates must be finite"));
    }
    if width < 0.0 || height < 0.0 {
        return Err(AnnotationError::Invalid("width and height must not be negative"));
    }
    Ok(())
}

// =============================================================================
// READ
// =============================================================================

/// All of the owner's annotations in insertion order.
pub async fn list(state: &AppState, owner_id: Uuid) -> Vec<StoredAnnotation> {
    let owners = state.owners.read().await;
    owners
        .get(&owner_id)
        .map(|owner| owner.annotations.clone())
        .unwrap_or_default()
}

// =============================================================================
// CREATE
// =============================================================================

/// Store a new annotation under the client-chosen id.
///
/// # Errors
///
/// `Invalid` for a blank id or bad geometry, `AlreadyExists` if the owner
/// already has that id.
pub async fn create(state: &AppState, owner_id: Uuid, input: NewAnnotation) -> Result<StoredAnnotation, AnnotationError> {
    if input.id.trim().is_empty() {
        return Err(AnnotationError::Invalid("id is required"));
    }
    validate_geometry(input.x, input.y, input.width, input.height)?;

    let mut owners = state.owners.write().await;
    let owner = owners.entry(owner_id).or_default();
    if owner.position(&input.id).is_some() {
        return Err(AnnotationError::AlreadyExists(input.id));
    }

    let now = now_millis();
    let annotation = StoredAnnotation {
        id: input.id,
        x: input.x,
        y: input.y,
        width: input.width,
        height: input.height,
        fill: input.fill.unwrap_or_else(|| DEFAULT_FILL.to_owned()),
        stroke: input.stroke.unwrap_or_else(|| DEFAULT_STROKE.to_owned()),
        owner_id,
        created_at: now,
        updated_at: now,
    };

    owner.deleted.remove(&annotation.id);
    owner.dirty.insert(annotation.id.clone());
    owner.annotations.push(annotation.clone());
    tracing::debug!(%owner_id, id = %annotation.id, "annotation created");
    Ok(annotation)
}

// =============================================================================
// UPDATE
// =============================================================================

/// Replace geometry and colors of an existing annotation.
///
/// # Errors
///
/// `Invalid` for bad geometry, `NotFound` if the owner has no such id.
pub async fn update(
    state: &AppState,
    owner_id: Uuid,
    id: &str,
    changes: AnnotationChanges,
) -> Result<StoredAnnotation, AnnotationError> {
    validate_geometry(changes.x, changes.y, changes.width, changes.height)?;

    let mut owners = state.owners.write().await;
    let owner = owners
        .get_mut(&owner_id)
        .ok_or_else(|| AnnotationError::NotFound(id.to_owned()))?;
    let index = owner
        .position(id)
        .ok_or_else(|| AnnotationError::NotFound(id.to_owned()))?;

    let annotation = &mut owner.annotations[index];
    annotation.x = changes.x;
    annotation.y = changes.y;
    annotation.width = changes.width;
    annotation.height = changes.height;
    if let Some(fill) = changes.fill {
        annotation.fill = fill;
    }
    if let Some(stroke) = changes.stroke {
        annotation.stroke = stroke;
    }
    annotation.updated_at = now_millis().max(annotation.updated_at + 1);

    let result = annotation.clone();
    owner.dirty.insert(result.id.clone());
    Ok(result)
}

// =============================================================================
// DELETE
// =============================================================================

/// Remove an annotation.
///
/// # Errors
///
/// `NotFound` if the owner has no such id; the store is left unchanged.
pub async fn delete(state: &AppState, owner_id: Uuid, id: &str) -> Result<(), AnnotationError> {
    let mut owners = state.owners.write().await;
    let owner = owners
        .get_mut(&owner_id)
        .ok_or_else(|| AnnotationError::NotFound(id.to_owned()))?;
    let index = owner
        .position(id)
        .ok_or_else(|| AnnotationError::NotFound(id.to_owned()))?;

    let removed = owner.annotations.remove(index);
    owner.dirty.remove(&removed.id);
    owner.deleted.insert(removed.id);
    Ok(())
}

#[cfg(test)]
#[path = "annotation_test.rs"]
mod tests;
