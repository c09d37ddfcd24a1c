//! Document model: annotation records, colors, and the in-memory store.
//!
//! `Annotation` is both the wire shape exchanged with the annotation service
//! and the record the renderer reads. Fields the server adds that this crate
//! does not interpret (owner, timestamps, storage ids) ride along in
//! `extra` so a round trip never drops them. `name` is a client-only label
//! and is never serialized.
//!
//! `AnnotationStore` keeps records in insertion order (which is also draw
//! order), tracks a local revision per record for the sync layer, and
//! maintains the id → node-handle index for the renderer.

#[cfg(test)]
#[path = "doc_test.rs"]
mod doc_test;

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::consts::{DEFAULT_FILL, DEFAULT_STROKE, FILL_ALPHA_SUFFIX, ID_PREFIX};
use crate::geom::{Bounds, Point};
use crate::scene::{NodeHandle, SceneIndex};

/// Client-generated identifier for an annotation.
///
/// Assigned before the first server round trip and used as the lookup key
/// for the lifetime of the record.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AnnotationId(String);

impl AnnotationId {
    /// Generate a fresh `rect-<uuid>` id.
    #[must_use]
    pub fn generate() -> Self {
        Self(format!("{ID_PREFIX}{}", Uuid::new_v4().simple()))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for AnnotationId {
    fn from(value: &str) -> Self {
        Self(value.to_owned())
    }
}

impl From<String> for AnnotationId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl fmt::Display for AnnotationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// An opaque `#rrggbb` color.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Color(String);

impl Color {
    /// Parse `#rgb` or `#rrggbb` (case-insensitive), normalizing to lowercase `#rrggbb`.
    #[must_use]
    pub fn parse(input: &str) -> Option<Self> {
        let hex = input.trim().strip_prefix('#')?;
        if !hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return None;
        }
        let expanded = match hex.len() {
            3 => hex.chars().flat_map(|c| [c, c]).collect::<String>(),
            6 => hex.to_owned(),
            _ => return None,
        };
        Some(Self(format!("#{}", expanded.to_ascii_lowercase())))
    }

    /// The opaque form, used as the stroke.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The translucent form, used as the fill: the same color with a fixed alpha byte.
    #[must_use]
    pub fn translucent(&self) -> String {
        format!("{}{FILL_ALPHA_SUFFIX}", self.0)
    }
}

fn default_fill() -> String {
    DEFAULT_FILL.to_owned()
}

fn default_stroke() -> String {
    DEFAULT_STROKE.to_owned()
}

/// A rectangle annotation as stored locally and exchanged with the server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Annotation {
    /// Client-generated identifier.
    pub id: AnnotationId,
    /// Left edge in canvas coordinates.
    pub x: f64,
    /// Top edge in canvas coordinates.
    pub y: f64,
    /// Horizontal extent, never negative once committed.
    pub width: f64,
    /// Vertical extent, never negative once committed.
    pub height: f64,
    /// Fill color; a translucent variant of `stroke`.
    #[serde(default = "default_fill")]
    pub fill: String,
    /// Outline color.
    #[serde(default = "default_stroke")]
    pub stroke: String,
    /// Cosmetic label shown on the canvas. Not tracked by the server.
    #[serde(default, skip_serializing)]
    pub name: Option<String>,
    /// Server-assigned fields this crate carries but does not interpret.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl Annotation {
    /// A zero-extent record anchored at `at`, styled with the default colors.
    #[must_use]
    pub fn drafted(id: AnnotationId, at: Point, name: Option<String>) -> Self {
        Self {
            id,
            x: at.x,
            y: at.y,
            width: 0.0,
            height: 0.0,
            fill: default_fill(),
            stroke: default_stroke(),
            name,
            extra: serde_json::Map::new(),
        }
    }

    #[must_use]
    pub fn bounds(&self) -> Bounds {
        Bounds::new(self.x, self.y, self.width, self.height)
    }

    pub fn set_bounds(&mut self, bounds: Bounds) {
        self.x = bounds.x;
        self.y = bounds.y;
        self.width = bounds.width;
        self.height = bounds.height;
    }

    /// Set the stroke to `color` and the fill to its translucent variant.
    pub fn recolor(&mut self, color: &Color) {
        self.stroke = color.as_str().to_owned();
        self.fill = color.translucent();
    }

    /// Whether all geometry is finite and both extents reach `min`.
    #[must_use]
    pub fn is_committable(&self, min: f64) -> bool {
        [self.x, self.y, self.width, self.height].iter().all(|v| v.is_finite()) && self.bounds().meets_min(min)
    }

    /// Fold a server response into this record.
    ///
    /// Server extras are always merged. Geometry and colors are taken from the
    /// server only when `take_fields` is set; otherwise the local values win.
    /// The id and the client-only `name` are never replaced.
    pub fn merge_server(&mut self, server: Annotation, take_fields: bool) {
        if take_fields {
            self.x = server.x;
            self.y = server.y;
            self.width = server.width;
            self.height = server.height;
            self.fill = server.fill;
            self.stroke = server.stroke;
        }
        self.extra.extend(server.extra);
    }
}

#[derive(Debug, Clone)]
struct Entry {
    annotation: Annotation,
    revision: u64,
}

/// Ordered in-memory store of committed annotations.
#[derive(Debug, Default)]
pub struct AnnotationStore {
    entries: Vec<Entry>,
    scene: SceneIndex,
    next_revision: u64,
}

impl AnnotationStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn bump(&mut self) -> u64 {
        self.next_revision += 1;
        self.next_revision
    }

    fn position(&self, id: &AnnotationId) -> Option<usize> {
        self.entries.iter().position(|e| &e.annotation.id == id)
    }

    /// Replace all records with a server snapshot.
    ///
    /// Records that are too small, non-finite, or repeat an earlier id are
    /// skipped. Returns the number of records skipped.
    pub fn load_snapshot(&mut self, annotations: Vec<Annotation>, min_size: f64) -> usize {
        self.entries.clear();
        self.scene.clear();
        let mut skipped = 0;
        for annotation in annotations {
            if !annotation.is_committable(min_size) {
                log::warn!("skipping annotation {} from snapshot: below minimum size", annotation.id);
                skipped += 1;
                continue;
            }
            if !self.insert(annotation) {
                skipped += 1;
            }
        }
        skipped
    }

    /// Append a record. Returns `false` (and leaves the store untouched) if
    /// the id is already present.
    pub fn insert(&mut self, annotation: Annotation) -> bool {
        if self.position(&annotation.id).is_some() {
            log::warn!("annotation {} already present; insert ignored", annotation.id);
            return false;
        }
        let revision = self.bump();
        self.scene.attach(&annotation.id);
        self.entries.push(Entry { annotation, revision });
        true
    }

    /// Replace the record with the same id, bumping its revision.
    ///
    /// Returns the new revision, or `None` if the id is unknown.
    pub fn replace(&mut self, annotation: Annotation) -> Option<u64> {
        let index = self.position(&annotation.id)?;
        let revision = self.bump();
        self.entries[index] = Entry { annotation, revision };
        Some(revision)
    }

    /// Apply a server-side reconciliation without counting it as a local edit.
    ///
    /// Returns `false` if the id is unknown.
    pub fn reconcile<F>(&mut self, id: &AnnotationId, f: F) -> bool
    where
        F: FnOnce(&mut Annotation),
    {
        let Some(index) = self.position(id) else {
            return false;
        };
        f(&mut self.entries[index].annotation);
        true
    }

    /// Remove a record by id, returning it if it was present.
    pub fn remove(&mut self, id: &AnnotationId) -> Option<Annotation> {
        let index = self.position(id)?;
        self.scene.detach(id);
        Some(self.entries.remove(index).annotation)
    }

    #[must_use]
    pub fn get(&self, id: &AnnotationId) -> Option<&Annotation> {
        self.entries.iter().map(|e| &e.annotation).find(|a| &a.id == id)
    }

    #[must_use]
    pub fn contains(&self, id: &AnnotationId) -> bool {
        self.position(id).is_some()
    }

    /// Local revision of a record; changes on every local edit.
    #[must_use]
    pub fn revision(&self, id: &AnnotationId) -> Option<u64> {
        self.entries.iter().find(|e| &e.annotation.id == id).map(|e| e.revision)
    }

    /// Render handle for a record.
    #[must_use]
    pub fn handle(&self, id: &AnnotationId) -> Option<NodeHandle> {
        self.scene.get(id)
    }

    /// Records in insertion (draw) order.
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &Annotation> {
        self.entries.iter().map(|e| &e.annotation)
    }

    /// Owned copy of all records in draw order.
    #[must_use]
    pub fn to_vec(&self) -> Vec<Annotation> {
        self.iter().cloned().collect()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
