//! Shared numeric and style constants for the canvas crate.

// ── Canvas ──────────────────────────────────────────────────────

/// Fixed drawing surface width in CSS pixels.
pub const CANVAS_WIDTH: f64 = 1100.0;

/// Fixed drawing surface height in CSS pixels.
pub const CANVAS_HEIGHT: f64 = 650.0;

// ── Geometry ────────────────────────────────────────────────────

/// Smallest width or height a committed annotation may have.
///
/// Draw gestures below this on either axis are discarded as accidental clicks,
/// and the resize manipulator refuses boxes smaller than this.
pub const MIN_ANNOTATION_SIZE: f64 = 20.0;

/// Hit slop in pixels around a resize handle's center.
pub const HANDLE_RADIUS_PX: f64 = 8.0;

// ── Style ───────────────────────────────────────────────────────

/// Stroke color for freshly drawn annotations.
pub const DEFAULT_STROKE: &str = "#6366f1";

/// Fill color for freshly drawn annotations.
pub const DEFAULT_FILL: &str = "rgba(99,102,241,0.25)";

/// Two-digit hex alpha appended to a stroke color to derive its fill.
pub const FILL_ALPHA_SUFFIX: &str = "55";

// ── Naming ──────────────────────────────────────────────────────

/// Prefix for client-generated annotation ids.
pub const ID_PREFIX: &str = "rect-";

/// Prefix for the cosmetic label given to drawn annotations (`Rect 1`, `Rect 2`, ...).
pub const NAME_PREFIX: &str = "Rect";
