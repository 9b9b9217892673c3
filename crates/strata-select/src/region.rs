//! Screen-space selection regions.
//!
//! Each region is a pure geometric test over parallel `x`/`y` arrays of screen
//! coordinates. Degenerate regions (zero area) select nothing.

use glam::Vec2;

/// A 2D region drawn by a selection gesture.
pub trait ScreenRegion {
    /// Tests a single screen coordinate.
    fn contains_point(&self, point: Vec2) -> bool;

    /// Returns true if the region has zero area.
    fn is_degenerate(&self) -> bool;

    /// Tests parallel coordinate arrays, returning one flag per coordinate.
    ///
    /// Non-finite coordinates are never inside. Extra entries in the longer
    /// array are ignored.
    fn contains(&self, xs: &[f32], ys: &[f32]) -> Vec<bool> {
        debug_assert_eq!(xs.len(), ys.len());
        if self.is_degenerate() {
            return vec![false; xs.len().min(ys.len())];
        }
        xs.iter()
            .zip(ys)
            .map(|(&x, &y)| {
                let p = Vec2::new(x, y);
                p.is_finite() && self.contains_point(p)
            })
            .collect()
    }
}

/// Axis-aligned rectangle, edges inclusive.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rectangle {
    min: Vec2,
    max: Vec2,
}

impl Rectangle {
    /// Creates a rectangle from any two opposite corners.
    pub fn new(a: Vec2, b: Vec2) -> Self {
        Self {
            min: a.min(b),
            max: a.max(b),
        }
    }

    /// Returns the minimum corner.
    pub fn min(&self) -> Vec2 {
        self.min
    }

    /// Returns the maximum corner.
    pub fn max(&self) -> Vec2 {
        self.max
    }
}

impl ScreenRegion for Rectangle {
    fn contains_point(&self, p: Vec2) -> bool {
        p.cmpge(self.min).all() && p.cmple(self.max).all()
    }

    fn is_degenerate(&self) -> bool {
        let size = self.max - self.min;
        !size.is_finite() || size.x <= 0.0 || size.y <= 0.0
    }
}

/// Circle, boundary inclusive.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Circle {
    /// Center in screen coordinates.
    pub center: Vec2,
    /// Radius in screen units.
    pub radius: f32,
}

impl Circle {
    /// Creates a circle.
    pub fn new(center: Vec2, radius: f32) -> Self {
        Self { center, radius }
    }
}

impl ScreenRegion for Circle {
    fn contains_point(&self, p: Vec2) -> bool {
        p.distance_squared(self.center) <= self.radius * self.radius
    }

    fn is_degenerate(&self) -> bool {
        !self.center.is_finite() || !self.radius.is_finite() || self.radius <= 0.0
    }
}

/// Closed polygon (lasso), tested with the even-odd rule.
#[derive(Debug, Clone, PartialEq)]
pub struct Polygon {
    vertices: Vec<Vec2>,
}

impl Polygon {
    /// Creates a polygon; the closing edge back to the first vertex is implicit.
    pub fn new(vertices: Vec<Vec2>) -> Self {
        Self { vertices }
    }

    /// Returns the vertices.
    pub fn vertices(&self) -> &[Vec2] {
        &self.vertices
    }

    /// Signed area (positive for counter-clockwise winding).
    pub fn signed_area(&self) -> f32 {
        let n = self.vertices.len();
        if n < 3 {
            return 0.0;
        }
        let twice: f32 = (0..n)
            .map(|i| self.vertices[i].perp_dot(self.vertices[(i + 1) % n]))
            .sum();
        twice * 0.5
    }
}

impl ScreenRegion for Polygon {
    fn contains_point(&self, p: Vec2) -> bool {
        let n = self.vertices.len();
        if n < 3 {
            return false;
        }
        let mut inside = false;
        let mut j = n - 1;
        for i in 0..n {
            let a = self.vertices[i];
            let b = self.vertices[j];
            if (a.y > p.y) != (b.y > p.y) {
                let x_cross = a.x + (p.y - a.y) * (b.x - a.x) / (b.y - a.y);
                if p.x < x_cross {
                    inside = !inside;
                }
            }
            j = i;
        }
        inside
    }

    fn is_degenerate(&self) -> bool {
        self.vertices.len() < 3
            || self.vertices.iter().any(|v| !v.is_finite())
            || self.signed_area().abs() <= f32::EPSILON
    }
}
