//! Shared spatial vocabulary.
//!
//! Everything in gridjump operates on global display coordinates: a
//! [`Region`] is an axis-aligned rectangle positioned on the virtual
//! desktop, and a resolved [`Point`] can be handed to the pointer backend
//! without any per-display translation.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identity of a display, as reported by the display-enumeration
/// collaborator (e.g. `"DP-1"`).
///
/// Ordered so that multi-display iteration (freestyle fan-out, tie-breaks)
/// is deterministic.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DisplayId(pub String);

impl DisplayId {
    /// Create a display id from anything string-like.
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// The underlying name.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DisplayId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for DisplayId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// A point on the virtual desktop.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

impl fmt::Display for Point {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({:.1}, {:.1})", self.x, self.y)
    }
}

/// An axis-aligned rectangle in global display coordinates.
///
/// A region with non-positive width or height is *degenerate*; the
/// partition engine rejects such regions up front.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Region {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Region {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Midpoint of the rectangle.
    pub fn center(&self) -> Point {
        Point::new(self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    /// Whether the rectangle has no usable area.
    pub fn is_degenerate(&self) -> bool {
        !(self.width > 0.0 && self.height > 0.0)
            || !self.width.is_finite()
            || !self.height.is_finite()
    }

    pub fn area(&self) -> f64 {
        self.width * self.height
    }

    /// Whether `point` lies inside the rectangle (edges inclusive).
    pub fn contains(&self, point: Point) -> bool {
        point.x >= self.x
            && point.x <= self.x + self.width
            && point.y >= self.y
            && point.y <= self.y + self.height
    }

    /// Smallest rectangle covering both `self` and `other`.
    pub fn union(&self, other: &Region) -> Region {
        let x0 = self.x.min(other.x);
        let y0 = self.y.min(other.y);
        let x1 = (self.x + self.width).max(other.x + other.width);
        let y1 = (self.y + self.height).max(other.y + other.height);
        Region::new(x0, y0, x1 - x0, y1 - y0)
    }

    /// Whether the interiors of `self` and `other` intersect.
    pub fn overlaps(&self, other: &Region) -> bool {
        self.x < other.x + other.width
            && other.x < self.x + self.width
            && self.y < other.y + other.height
            && other.y < self.y + self.height
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}x{} at ({}, {})",
            self.width, self.height, self.x, self.y
        )
    }
}

//  Tests

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn center_of_region_at_origin() {
        let r = Region::new(0.0, 0.0, 100.0, 50.0);
        assert_eq!(r.center(), Point::new(50.0, 25.0));
    }

    #[test]
    fn center_respects_origin_offset() {
        let r = Region::new(1920.0, 0.0, 1920.0, 1080.0);
        assert_eq!(r.center(), Point::new(2880.0, 540.0));
    }

    #[test]
    fn degenerate_regions() {
        assert!(Region::new(0.0, 0.0, 0.0, 100.0).is_degenerate());
        assert!(Region::new(0.0, 0.0, 100.0, -1.0).is_degenerate());
        assert!(Region::new(0.0, 0.0, f64::NAN, 100.0).is_degenerate());
        assert!(!Region::new(0.0, 0.0, 1.0, 1.0).is_degenerate());
    }

    #[test]
    fn union_covers_both() {
        let a = Region::new(0.0, 0.0, 10.0, 10.0);
        let b = Region::new(20.0, 5.0, 10.0, 10.0);
        let u = a.union(&b);
        assert_eq!(u, Region::new(0.0, 0.0, 30.0, 15.0));
    }

    #[test]
    fn overlap_is_interior_only() {
        let a = Region::new(0.0, 0.0, 10.0, 10.0);
        let b = Region::new(10.0, 0.0, 10.0, 10.0); // shares an edge
        let c = Region::new(5.0, 5.0, 10.0, 10.0);
        assert!(!a.overlaps(&b));
        assert!(a.overlaps(&c));
    }

    #[test]
    fn contains_is_edge_inclusive() {
        let r = Region::new(0.0, 0.0, 10.0, 10.0);
        assert!(r.contains(Point::new(0.0, 0.0)));
        assert!(r.contains(Point::new(10.0, 10.0)));
        assert!(!r.contains(Point::new(10.1, 5.0)));
    }

    #[test]
    fn display_id_round_trips_through_json() {
        let id = DisplayId::new("DP-1");
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, r#""DP-1""#);
        let back: DisplayId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, id);
    }

    #[test]
    fn region_round_trips_through_json() {
        let r = Region::new(0.0, 0.0, 1200.0, 800.0);
        let json = serde_json::to_string(&r).unwrap();
        let back: Region = serde_json::from_str(&json).unwrap();
        assert_eq!(back, r);
    }
}
