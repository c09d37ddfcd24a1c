//! Hit-testing: which annotation, or which manipulator handle, lies under a point.

#[cfg(test)]
#[path = "hit_test.rs"]
mod hit_test;

use crate::consts::HANDLE_RADIUS_PX;
use crate::doc::{AnnotationId, AnnotationStore};
use crate::geom::{Bounds, Point};

/// Which part of an annotation was hit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HitPart {
    Body,
    ResizeHandle(ResizeAnchor),
}

/// Anchor position for the manipulator's resize handles.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResizeAnchor {
    N,
    Ne,
    E,
    Se,
    S,
    Sw,
    W,
    Nw,
}

impl ResizeAnchor {
    /// All eight anchors, corners first.
    pub const ALL: [ResizeAnchor; 8] = [
        ResizeAnchor::Nw,
        ResizeAnchor::Ne,
        ResizeAnchor::Se,
        ResizeAnchor::Sw,
        ResizeAnchor::N,
        ResizeAnchor::E,
        ResizeAnchor::S,
        ResizeAnchor::W,
    ];

    /// Whether dragging this handle moves the left edge.
    #[must_use]
    pub fn moves_left(self) -> bool {
        matches!(self, Self::Nw | Self::W | Self::Sw)
    }

    /// Whether dragging this handle moves the right edge.
    #[must_use]
    pub fn moves_right(self) -> bool {
        matches!(self, Self::Ne | Self::E | Self::Se)
    }

    /// Whether dragging this handle moves the top edge.
    #[must_use]
    pub fn moves_top(self) -> bool {
        matches!(self, Self::Nw | Self::N | Self::Ne)
    }

    /// Whether dragging this handle moves the bottom edge.
    #[must_use]
    pub fn moves_bottom(self) -> bool {
        matches!(self, Self::Sw | Self::S | Self::Se)
    }

    /// Parse a compass name such as `"se"` or `"N"`.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "n" => Some(Self::N),
            "ne" => Some(Self::Ne),
            "e" => Some(Self::E),
            "se" => Some(Self::Se),
            "s" => Some(Self::S),
            "sw" => Some(Self::Sw),
            "w" => Some(Self::W),
            "nw" => Some(Self::Nw),
            _ => None,
        }
    }
}

/// Result of a hit test.
#[derive(Debug, Clone, PartialEq)]
pub struct Hit {
    pub id: AnnotationId,
    pub part: HitPart,
}

/// Canvas position of a resize handle on `bounds`.
#[must_use]
pub fn handle_position(bounds: &Bounds, anchor: ResizeAnchor) -> Point {
    let cx = bounds.x + bounds.width / 2.0;
    let cy = bounds.y + bounds.height / 2.0;
    let x = if anchor.moves_left() {
        bounds.x
    } else if anchor.moves_right() {
        bounds.right()
    } else {
        cx
    };
    let y = if anchor.moves_top() {
        bounds.y
    } else if anchor.moves_bottom() {
        bounds.bottom()
    } else {
        cy
    };
    Point::new(x, y)
}

/// Test what lies under `pt`.
///
/// Handles of the selected annotation win over any body. Otherwise the
/// topmost (last drawn) annotation containing the point is reported.
#[must_use]
pub fn hit_test(pt: Point, store: &AnnotationStore, selected: Option<&AnnotationId>) -> Option<Hit> {
    if let Some(selected) = selected.and_then(|id| store.get(id)) {
        let bounds = selected.bounds();
        for anchor in ResizeAnchor::ALL {
            if handle_position(&bounds, anchor).distance_to(pt) <= HANDLE_RADIUS_PX {
                return Some(Hit { id: selected.id.clone(), part: HitPart::ResizeHandle(anchor) });
            }
        }
    }

    store
        .iter()
        .rev()
        .find(|a| a.bounds().contains(pt))
        .map(|a| Hit { id: a.id.clone(), part: HitPart::Body })
}
