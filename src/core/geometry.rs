//! Screen-space Geometry
//!
//! Points, axis-aligned rectangles and the ray-casting point-in-polygon test.
//! Coordinates follow screen conventions: `x` grows right, `y` grows down.

use serde::{Serialize, Deserialize};

/// A 2D point in screen pixels.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Point {
    /// Horizontal coordinate.
    pub x: f64,
    /// Vertical coordinate (grows downward).
    pub y: f64,
}

impl Point {
    /// Create a new point.
    #[inline]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Axis-aligned bounding box, as reported by a renderer.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    /// Left edge.
    pub left: f64,
    /// Top edge.
    pub top: f64,
    /// Width in pixels.
    pub width: f64,
    /// Height in pixels.
    pub height: f64,
}

impl Rect {
    /// Create a rectangle from its top-left corner and size.
    #[inline]
    pub const fn new(left: f64, top: f64, width: f64, height: f64) -> Self {
        Self { left, top, width, height }
    }

    /// Right edge.
    #[inline]
    pub fn right(&self) -> f64 {
        self.left + self.width
    }

    /// Bottom edge.
    #[inline]
    pub fn bottom(&self) -> f64 {
        self.top + self.height
    }

    /// Point at fractional offsets `(fx, fy)` of this box.
    ///
    /// `(0, 0)` is the top-left corner, `(1, 1)` the bottom-right.
    #[inline]
    pub fn at_fraction(&self, fx: f64, fy: f64) -> Point {
        Point::new(self.left + self.width * fx, self.top + self.height * fy)
    }

    /// Centroid of the box.
    #[inline]
    pub fn center(&self) -> Point {
        self.at_fraction(0.5, 0.5)
    }

    /// True if `self` lies entirely to the left of `other`.
    #[inline]
    pub fn is_left_of(&self, other: &Rect) -> bool {
        self.right() < other.left
    }
}

/// Ray-casting parity test.
///
/// For every edge `(i, j = i - 1)` (wrapping), the flag toggles when the
/// point's `y` lies strictly between the edge endpoints' `y` values and the
/// point is left of the edge at that height. Polygons with fewer than three
/// vertices contain nothing.
pub fn point_in_polygon(point: Point, polygon: &[Point]) -> bool {
    if polygon.len() < 3 {
        return false;
    }

    let mut inside = false;
    let mut j = polygon.len() - 1;

    for i in 0..polygon.len() {
        let pi = polygon[i];
        let pj = polygon[j];

        if (pi.y > point.y) != (pj.y > point.y) {
            // Straddling guarantees pj.y != pi.y, so the division is finite.
            let x_at_y = (pj.x - pi.x) * (point.y - pi.y) / (pj.y - pi.y) + pi.x;
            if point.x < x_at_y {
                inside = !inside;
            }
        }

        j = i;
    }

    inside
}
