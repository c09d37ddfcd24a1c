//! Explicit id → render-handle mapping kept alongside the annotation store.
//!
//! A renderer allocates one retained node per annotation. Instead of finding
//! those nodes by walking a scene tree and matching id strings, the store
//! hands out a [`NodeHandle`] when a record enters and retires it when the
//! record leaves. Handles are never reused, so a stale handle can't alias a
//! newer node.

#[cfg(test)]
#[path = "scene_test.rs"]
mod scene_test;

use std::collections::HashMap;

use crate::doc::AnnotationId;

/// Opaque handle naming the renderable node for one annotation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeHandle(u64);

impl NodeHandle {
    #[must_use]
    pub fn get(self) -> u64 {
        self.0
    }
}

/// Live mapping from annotation id to its node handle.
#[derive(Debug, Default)]
pub struct SceneIndex {
    handles: HashMap<AnnotationId, NodeHandle>,
    next: u64,
}

impl SceneIndex {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate a handle for `id`, or return the existing one.
    pub fn attach(&mut self, id: &AnnotationId) -> NodeHandle {
        if let Some(handle) = self.handles.get(id) {
            return *handle;
        }
        self.next += 1;
        let handle = NodeHandle(self.next);
        self.handles.insert(id.clone(), handle);
        handle
    }

    /// Retire the handle for `id`, returning it if one was attached.
    pub fn detach(&mut self, id: &AnnotationId) -> Option<NodeHandle> {
        self.handles.remove(id)
    }

    #[must_use]
    pub fn get(&self, id: &AnnotationId) -> Option<NodeHandle> {
        self.handles.get(id).copied()
    }

    /// Drop every mapping. The counter keeps running.
    pub fn clear(&mut self) {
        self.handles.clear();
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.handles.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }
}
