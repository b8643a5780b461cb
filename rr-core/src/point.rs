//! 2D points and axis-aligned bounds
//!
//! Points serialize as `[x, y]` pairs, which is what the wire contract and
//! the browser client expect.

use serde::{Deserialize, Serialize};

/// A point in world or screen space
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(from = "(f64, f64)", into = "(f64, f64)")]
pub struct Point2 {
    pub x: f64,
    pub y: f64,
}

impl Point2 {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn distance(&self, other: Point2) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }

    pub fn lerp(&self, other: Point2, t: f64) -> Point2 {
        Point2::new(
            self.x + (other.x - self.x) * t,
            self.y + (other.y - self.y) * t,
        )
    }
}

impl From<(f64, f64)> for Point2 {
    fn from((x, y): (f64, f64)) -> Self {
        Self { x, y }
    }
}

impl From<Point2> for (f64, f64) {
    fn from(p: Point2) -> Self {
        (p.x, p.y)
    }
}

/// Axis-aligned world bounds
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub x_min: f64,
    pub x_max: f64,
    pub y_min: f64,
    pub y_max: f64,
}

impl Bounds {
    /// Empty bounds that any point will expand
    pub fn empty() -> Self {
        Self {
            x_min: f64::INFINITY,
            x_max: f64::NEG_INFINITY,
            y_min: f64::INFINITY,
            y_max: f64::NEG_INFINITY,
        }
    }

    /// Smallest bounds containing every point of every slice
    pub fn enclosing<'a>(curves: impl IntoIterator<Item = &'a [Point2]>) -> Self {
        let mut bounds = Self::empty();
        for curve in curves {
            for p in curve {
                bounds.include(*p);
            }
        }
        bounds
    }

    pub fn include(&mut self, p: Point2) {
        self.x_min = self.x_min.min(p.x);
        self.x_max = self.x_max.max(p.x);
        self.y_min = self.y_min.min(p.y);
        self.y_max = self.y_max.max(p.y);
    }

    pub fn is_empty(&self) -> bool {
        self.x_min > self.x_max || self.y_min > self.y_max
    }

    pub fn width(&self) -> f64 {
        self.x_max - self.x_min
    }

    pub fn height(&self) -> f64 {
        self.y_max - self.y_min
    }

    pub fn center(&self) -> Point2 {
        Point2::new(
            (self.x_min + self.x_max) / 2.0,
            (self.y_min + self.y_max) / 2.0,
        )
    }

    /// Whether `p` lies inside, allowing `eps` of slack on every side
    pub fn contains(&self, p: Point2, eps: f64) -> bool {
        p.x >= self.x_min - eps
            && p.x <= self.x_max + eps
            && p.y >= self.y_min - eps
            && p.y <= self.y_max + eps
    }

    /// The four corners, counter-clockwise from (x_min, y_min)
    pub fn corners(&self) -> [Point2; 4] {
        [
            Point2::new(self.x_min, self.y_min),
            Point2::new(self.x_max, self.y_min),
            Point2::new(self.x_max, self.y_max),
            Point2::new(self.x_min, self.y_max),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_point_serializes_as_pair() {
        let json = serde_json::to_string(&Point2::new(1.5, -2.0)).unwrap();
        assert_eq!(json, "[1.5,-2.0]");

        let p: Point2 = serde_json::from_str("[3.0, 4.0]").unwrap();
        assert_eq!(p, Point2::new(3.0, 4.0));
    }

    #[test]
    fn test_bounds_enclosing_multiple_curves() {
        let a = [Point2::new(0.0, 0.0), Point2::new(5.0, 2.0)];
        let b = [Point2::new(-3.0, 7.0)];
        let bounds = Bounds::enclosing([&a[..], &b[..]]);
        assert_eq!(bounds.x_min, -3.0);
        assert_eq!(bounds.x_max, 5.0);
        assert_eq!(bounds.y_min, 0.0);
        assert_eq!(bounds.y_max, 7.0);
        assert_eq!(bounds.center(), Point2::new(1.0, 3.5));
    }

    #[test]
    fn test_empty_bounds() {
        assert!(Bounds::empty().is_empty());
        let bounds = Bounds::enclosing([&[Point2::new(1.0, 1.0)][..]]);
        assert!(!bounds.is_empty());
        assert_eq!(bounds.width(), 0.0);
    }
}
