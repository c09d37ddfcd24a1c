//! Bounding-box manipulator for resizing the selected annotation.
//!
//! The manipulator works the way retained-mode transformer widgets do: while
//! a handle is dragged the node keeps its original extents and carries a
//! scale factor per axis. Every proposed box passes through
//! [`Transformer::bound_box`], which refuses boxes below the minimum size by
//! returning the previous one. On release the scale is baked into new
//! extents and reset to 1×, so successive resizes never compound.
//!
//! There is no rotation handle.

#[cfg(test)]
#[path = "transform_test.rs"]
mod transform_test;

use crate::doc::AnnotationId;
use crate::geom::{Bounds, Point};
use crate::hit::ResizeAnchor;

/// Manipulator configuration.
#[derive(Debug, Clone, Copy)]
pub struct Transformer {
    min_size: f64,
}

impl Transformer {
    #[must_use]
    pub fn new(min_size: f64) -> Self {
        Self { min_size }
    }

    #[must_use]
    pub fn min_size(&self) -> f64 {
        self.min_size
    }

    /// Accept `proposed` unless either extent is under the minimum, in which
    /// case `old` is kept.
    #[must_use]
    pub fn bound_box(&self, old: Bounds, proposed: Bounds) -> Bounds {
        if proposed.width < self.min_size || proposed.height < self.min_size {
            old
        } else {
            proposed
        }
    }

    /// Box produced by dragging `anchor` of `orig` by `delta`.
    ///
    /// Not normalized: dragging an edge past its opposite yields a negative
    /// extent, which [`Self::bound_box`] then rejects.
    #[must_use]
    pub fn proposed_box(orig: &Bounds, anchor: ResizeAnchor, delta: Point) -> Bounds {
        let mut left = orig.x;
        let mut top = orig.y;
        let mut right = orig.right();
        let mut bottom = orig.bottom();
        if anchor.moves_left() {
            left += delta.x;
        }
        if anchor.moves_right() {
            right += delta.x;
        }
        if anchor.moves_top() {
            top += delta.y;
        }
        if anchor.moves_bottom() {
            bottom += delta.y;
        }
        Bounds::new(left, top, right - left, bottom - top)
    }
}

/// Position and per-axis scale of the node under manipulation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NodeTransform {
    pub x: f64,
    pub y: f64,
    pub scale_x: f64,
    pub scale_y: f64,
}

fn ratio(target: f64, orig: f64) -> f64 {
    if orig > 0.0 { target / orig } else { 1.0 }
}

impl NodeTransform {
    /// Unscaled node at the original position.
    #[must_use]
    pub fn neutral(orig: &Bounds) -> Self {
        Self { x: orig.x, y: orig.y, scale_x: 1.0, scale_y: 1.0 }
    }

    /// Node scaled so that `orig` covers `target`.
    #[must_use]
    pub fn fit(orig: &Bounds, target: &Bounds) -> Self {
        Self {
            x: target.x,
            y: target.y,
            scale_x: ratio(target.width, orig.width),
            scale_y: ratio(target.height, orig.height),
        }
    }

    /// The box this node currently covers.
    #[must_use]
    pub fn covered(&self, orig: &Bounds) -> Bounds {
        Bounds::new(self.x, self.y, orig.width * self.scale_x, orig.height * self.scale_y)
    }

    /// Bake the scale into extents floored at `min`, then reset scale to 1×.
    pub fn bake(&mut self, orig: &Bounds, min: f64) -> Bounds {
        let baked = Bounds::new(
            self.x,
            self.y,
            (orig.width * self.scale_x).max(min),
            (orig.height * self.scale_y).max(min),
        );
        self.scale_x = 1.0;
        self.scale_y = 1.0;
        baked
    }
}

/// An in-progress resize of one annotation.
#[derive(Debug, Clone)]
pub struct ResizeSession {
    /// Annotation being resized.
    pub id: AnnotationId,
    /// Handle being dragged.
    pub anchor: ResizeAnchor,
    /// Pointer position at pointer-down.
    pub start: Point,
    /// Annotation box at pointer-down.
    pub orig: Bounds,
    /// Last box the manipulator accepted.
    pub accepted: Bounds,
    /// Current node state.
    pub node: NodeTransform,
}

impl ResizeSession {
    #[must_use]
    pub fn begin(id: AnnotationId, anchor: ResizeAnchor, start: Point, orig: Bounds) -> Self {
        Self { id, anchor, start, orig, accepted: orig, node: NodeTransform::neutral(&orig) }
    }

    /// Feed a pointer position. Returns `true` if the accepted box changed.
    pub fn update(&mut self, pt: Point, transformer: &Transformer) -> bool {
        let proposed = Transformer::proposed_box(&self.orig, self.anchor, pt.delta_from(self.start));
        let accepted = transformer.bound_box(self.accepted, proposed);
        if accepted == self.accepted {
            return false;
        }
        self.accepted = accepted;
        self.node = NodeTransform::fit(&self.orig, &accepted);
        true
    }

    /// Box to preview while the gesture is active.
    #[must_use]
    pub fn preview(&self) -> Bounds {
        self.node.covered(&self.orig)
    }

    /// Finish the gesture and return the committed box.
    pub fn finish(&mut self, transformer: &Transformer) -> Bounds {
        self.node.bake(&self.orig, transformer.min_size())
    }
}
