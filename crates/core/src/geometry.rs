//! 2D geometric primitives for the measurement engine
//!
//! All geometry runs on a minimal value type so the engine never depends on
//! a host framework's coordinate machinery. Points live in map/world space;
//! pixel-denominated thresholds are converted at the call site through the
//! session's units-per-pixel scale.

use std::f64::consts::{FRAC_PI_2, PI, TAU};

/// A 2D point in map (world) coordinates
///
/// Immutable for calculation purposes: operations return new points.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct MapPoint {
    pub x: f64,
    pub y: f64,
}

/// Which side of a directed segment a point falls on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Left,
    Right,
    On,
}

impl MapPoint {
    /// Create a new point
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Euclidean distance to another point, in world units
    pub fn distance_to(&self, other: MapPoint) -> f64 {
        let dx = other.x - self.x;
        let dy = other.y - self.y;
        (dx * dx + dy * dy).sqrt()
    }

    /// Direction from this point to another, in radians
    ///
    /// Measured counter-clockwise from the positive X axis, range (-π, π].
    pub fn angle_to(&self, other: MapPoint) -> f64 {
        (other.y - self.y).atan2(other.x - self.x)
    }

    /// Midpoint between this point and another
    pub fn midpoint(&self, other: MapPoint) -> MapPoint {
        MapPoint::new((self.x + other.x) / 2.0, (self.y + other.y) / 2.0)
    }

    /// The point at the given distance and direction from this one
    pub fn project(&self, distance: f64, angle: f64) -> MapPoint {
        MapPoint::new(
            self.x + distance * angle.cos(),
            self.y + distance * angle.sin(),
        )
    }

    /// Translate by a delta
    pub fn offset_by(&self, dx: f64, dy: f64) -> MapPoint {
        MapPoint::new(self.x + dx, self.y + dy)
    }

    /// Classify this point against the directed segment `a -> b`
    pub fn side_of(&self, a: MapPoint, b: MapPoint) -> Side {
        let cross = (b.x - a.x) * (self.y - a.y) - (b.y - a.y) * (self.x - a.x);
        if cross > EPSILON {
            Side::Left
        } else if cross < -EPSILON {
            Side::Right
        } else {
            Side::On
        }
    }
}

const EPSILON: f64 = 1e-9;

/// Intersection of the infinite lines through `a1`-`a2` and `b1`-`b2`
///
/// Uses the homogeneous-coordinates cross-product method: each line is the
/// cross product of its endpoints lifted to (x, y, 1); crossing the two line
/// vectors yields the intersection. Returns `None` for parallel or
/// degenerate configurations (the w component vanishes).
pub fn line_intersection(
    a1: MapPoint,
    a2: MapPoint,
    b1: MapPoint,
    b2: MapPoint,
) -> Option<MapPoint> {
    let la = cross3((a1.x, a1.y, 1.0), (a2.x, a2.y, 1.0));
    let lb = cross3((b1.x, b1.y, 1.0), (b2.x, b2.y, 1.0));
    let (px, py, pw) = cross3(la, lb);
    if pw.abs() < EPSILON {
        return None;
    }
    Some(MapPoint::new(px / pw, py / pw))
}

fn cross3(a: (f64, f64, f64), b: (f64, f64, f64)) -> (f64, f64, f64) {
    (
        a.1 * b.2 - a.2 * b.1,
        a.2 * b.0 - a.0 * b.2,
        a.0 * b.1 - a.1 * b.0,
    )
}

/// Construction segment perpendicular to `base_angle`, centered on `origin`
///
/// Extends `half_extent` world units to either side; used to intersect a
/// measured point back onto a base line.
pub fn perpendicular_through(
    origin: MapPoint,
    base_angle: f64,
    half_extent: f64,
) -> (MapPoint, MapPoint) {
    let normal = base_angle + FRAC_PI_2;
    (
        origin.project(half_extent, normal),
        origin.project(-half_extent, normal),
    )
}

/// Unsigned polygon area via the shoelace formula, in squared world units
///
/// The ring may be open or closed (a duplicated last vertex contributes
/// nothing). Fewer than three vertices yield zero.
pub fn polygon_area(points: &[MapPoint]) -> f64 {
    if points.len() < 3 {
        return 0.0;
    }
    let mut area = 0.0;
    for i in 0..points.len() {
        let j = (i + 1) % points.len();
        area += points[i].x * points[j].y;
        area -= points[j].x * points[i].y;
    }
    (area / 2.0).abs()
}

/// Wrap an angle into [0, 2π)
pub fn normalize_angle(angle: f64) -> f64 {
    angle.rem_euclid(TAU)
}

/// Absolute difference between two directions, folded into [0, π]
pub fn angle_difference(a: f64, b: f64) -> f64 {
    let diff = normalize_angle(a - b);
    if diff > PI {
        TAU - diff
    } else {
        diff
    }
}
