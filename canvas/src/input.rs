//! Input model: interaction modes, mouse buttons, and the gesture state machine.
//!
//! `Mode` is the toolbar choice between drawing new rectangles and selecting
//! existing ones. `InputState` is the gesture being tracked between
//! pointer-down and pointer-up, carrying everything needed to preview the
//! gesture and to emit the final mutation on release.

#[cfg(test)]
#[path = "input_test.rs"]
mod input_test;

use crate::doc::{Annotation, AnnotationId};
use crate::geom::{Bounds, Point};
use crate::transform::ResizeSession;

/// Which interaction mode is active.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Mode {
    /// Pointer input on empty canvas draws a new rectangle (initial mode).
    #[default]
    Draw,
    /// Pointer input selects, drags, and resizes existing rectangles.
    Select,
}

impl Mode {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Draw => "draw",
            Self::Select => "select",
        }
    }
}

/// Mouse button identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Button {
    /// Left mouse button (or single-finger tap).
    Primary,
    /// Middle mouse button (scroll wheel click).
    Middle,
    /// Right mouse button (or two-finger tap).
    Secondary,
}

/// Persistent UI state visible to the renderer.
#[derive(Debug, Clone, Default)]
pub struct UiState {
    /// Active interaction mode.
    pub mode: Mode,
    /// The sole selected annotation, if any.
    pub selected_id: Option<AnnotationId>,
}

/// Internal state for the gesture state machine.
#[derive(Debug, Clone, Default)]
pub enum InputState {
    /// No gesture in progress; waiting for the next pointer-down.
    #[default]
    Idle,
    /// A new rectangle is being drawn. The draft is not in the store yet.
    Drawing {
        /// Pointer-down position; one corner of the rectangle.
        anchor: Point,
        /// The single in-progress annotation.
        draft: Annotation,
    },
    /// An existing annotation is being dragged.
    Dragging {
        /// Annotation being dragged.
        id: AnnotationId,
        /// Pointer position at pointer-down.
        start: Point,
        /// Annotation box at pointer-down.
        orig: Bounds,
        /// Box under the pointer right now.
        current: Bounds,
    },
    /// The selected annotation is being resized through the manipulator.
    Resizing(ResizeSession),
}

impl InputState {
    #[must_use]
    pub fn is_idle(&self) -> bool {
        matches!(self, Self::Idle)
    }

    /// Id of the stored annotation this gesture manipulates, if any.
    #[must_use]
    pub fn target(&self) -> Option<&AnnotationId> {
        match self {
            Self::Dragging { id, .. } => Some(id),
            Self::Resizing(session) => Some(&session.id),
            Self::Idle | Self::Drawing { .. } => None,
        }
    }
}
