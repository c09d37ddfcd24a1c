//! Points and axis-aligned boxes in canvas-local coordinates.

#[cfg(test)]
#[path = "geom_test.rs"]
mod geom_test;

/// A point on the canvas, in CSS pixels from the top-left corner.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    #[must_use]
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Component-wise difference `self - other`.
    #[must_use]
    pub fn delta_from(self, other: Point) -> Point {
        Point { x: self.x - other.x, y: self.y - other.y }
    }

    /// Euclidean distance to `other`.
    #[must_use]
    pub fn distance_to(self, other: Point) -> f64 {
        let d = self.delta_from(other);
        d.x.hypot(d.y)
    }
}

/// Axis-aligned box described by its top-left corner and extents.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Bounds {
    #[must_use]
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self { x, y, width, height }
    }

    /// Normalized box spanned by two opposite corners.
    ///
    /// The top-left is the per-axis minimum and the extents are the absolute
    /// differences, so the result never has negative width or height.
    #[must_use]
    pub fn from_corners(a: Point, b: Point) -> Self {
        Self {
            x: a.x.min(b.x),
            y: a.y.min(b.y),
            width: (b.x - a.x).abs(),
            height: (b.y - a.y).abs(),
        }
    }

    /// Whether both extents reach `min`.
    #[must_use]
    pub fn meets_min(&self, min: f64) -> bool {
        self.width >= min && self.height >= min
    }

    /// Inclusive containment test.
    #[must_use]
    pub fn contains(&self, pt: Point) -> bool {
        pt.x >= self.x && pt.x <= self.x + self.width && pt.y >= self.y && pt.y <= self.y + self.height
    }

    /// The same box shifted by `delta`.
    #[must_use]
    pub fn translated(&self, delta: Point) -> Self {
        Self { x: self.x + delta.x, y: self.y + delta.y, ..*self }
    }

    #[must_use]
    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    #[must_use]
    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }
}
