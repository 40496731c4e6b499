//! Basic geometry primitives shared by the drag and grid engines
//!
//! All coordinates are logical pixels in drag layer space (the full screen),
//! origin at the top left.

use serde::{Deserialize, Serialize};

/// A point or a 2D vector
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const ZERO: Point = Point { x: 0.0, y: 0.0 };

    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn length(&self) -> f64 {
        (self.x * self.x + self.y * self.y).sqrt()
    }

    pub fn distance_to(&self, other: Point) -> f64 {
        (*self - other).length()
    }

    pub fn dot(&self, other: Point) -> f64 {
        self.x * other.x + self.y * other.y
    }

    /// Angle in radians between two vectors. Zero-length vectors yield PI.
    pub fn angle_to(&self, other: Point) -> f64 {
        let lengths = self.length() * other.length();
        if lengths <= f64::EPSILON {
            return std::f64::consts::PI;
        }
        (self.dot(other) / lengths).clamp(-1.0, 1.0).acos()
    }

    pub fn scale(&self, factor: f64) -> Point {
        Point::new(self.x * factor, self.y * factor)
    }
}

impl std::ops::Add for Point {
    type Output = Point;

    fn add(self, rhs: Point) -> Point {
        Point::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl std::ops::Sub for Point {
    type Output = Point;

    fn sub(self, rhs: Point) -> Point {
        Point::new(self.x - rhs.x, self.y - rhs.y)
    }
}

/// Axis-aligned rectangle
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self { x, y, width, height }
    }

    /// Check if a point is inside this rectangle (right/bottom edges exclusive)
    pub fn contains(&self, x: f64, y: f64) -> bool {
        x >= self.x && x < self.x + self.width &&
        y >= self.y && y < self.y + self.height
    }

    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }

    pub fn center(&self) -> Point {
        Point::new(self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    /// Clamp a point into the rectangle, keeping it strictly inside
    pub fn clamp_point(&self, x: f64, y: f64) -> Point {
        Point::new(
            x.max(self.x).min(self.right() - 1.0),
            y.max(self.y).min(self.bottom() - 1.0),
        )
    }
}

/// Linear interpolation
pub fn lerp(a: f64, b: f64, t: f64) -> f64 {
    a + (b - a) * t
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rect_contains_is_edge_exclusive() {
        let r = Rect::new(10.0, 10.0, 100.0, 50.0);
        assert!(r.contains(10.0, 10.0));
        assert!(r.contains(109.9, 59.9));
        assert!(!r.contains(110.0, 30.0));
        assert!(!r.contains(50.0, 60.0));
    }

    #[test]
    fn test_angle_between_vectors() {
        let up = Point::new(0.0, -1.0);
        let fling = Point::new(0.0, -2000.0);
        assert!(fling.angle_to(up).abs() < 1e-9);

        let sideways = Point::new(1000.0, 0.0);
        assert!((sideways.angle_to(up) - std::f64::consts::FRAC_PI_2).abs() < 1e-9);
    }

    #[test]
    fn test_clamp_point() {
        let r = Rect::new(0.0, 0.0, 100.0, 200.0);
        let p = r.clamp_point(-5.0, 500.0);
        assert_eq!(p, Point::new(0.0, 199.0));
    }
}
