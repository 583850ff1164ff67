//! Drawable output contract
//!
//! Every visual change in a session rebuilds a flat [`DrawableSet`]; hosts
//! replace their previous rendering wholesale rather than diffing. The
//! flattening order is fixed: curves first, then labels, then point markers,
//! so markers and text always paint on top of the lines they annotate.

use std::f64::consts::{FRAC_PI_2, PI};

use crate::geometry::{normalize_angle, MapPoint};
use crate::style::{Color, StrokeStyle, TextAlignment, TextStyle};

/// A styled polyline
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct DrawableCurve {
    pub points: Vec<MapPoint>,
    pub stroke: StrokeStyle,
}

impl DrawableCurve {
    /// Two-point segment
    pub fn segment(a: MapPoint, b: MapPoint, stroke: StrokeStyle) -> Self {
        Self {
            points: vec![a, b],
            stroke,
        }
    }
}

/// A small filled polygon, used for the triangular end ticks
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct DrawableMarker {
    /// Closed outline (first vertex is not repeated)
    pub outline: Vec<MapPoint>,
    pub fill: Color,
}

/// A positioned, rotated text annotation
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct DrawableLabel {
    pub position: MapPoint,
    pub text: String,
    /// Rotation in radians, already folded into the upper hemisphere
    pub rotation: f64,
    pub alignment: TextAlignment,
    pub style: TextStyle,
}

/// The flattened output of one geometry regeneration
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct DrawableSet {
    pub curves: Vec<DrawableCurve>,
    pub labels: Vec<DrawableLabel>,
    pub markers: Vec<DrawableMarker>,
}

impl DrawableSet {
    pub fn clear(&mut self) {
        self.curves.clear();
        self.labels.clear();
        self.markers.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.curves.is_empty() && self.labels.is_empty() && self.markers.is_empty()
    }

    /// Append another set, preserving the fixed z-order within each list
    pub fn append(&mut self, other: &DrawableSet) {
        self.curves.extend(other.curves.iter().cloned());
        self.labels.extend(other.labels.iter().cloned());
        self.markers.extend(other.markers.iter().cloned());
    }
}

/// Fold a direction into the upper hemisphere so label text reads upright
///
/// Directions in (π/2, 3π/2] are flipped by 180°.
pub fn upright_angle(angle: f64) -> f64 {
    let a = normalize_angle(angle);
    if a > FRAC_PI_2 && a <= 3.0 * FRAC_PI_2 {
        normalize_angle(a + PI)
    } else {
        a
    }
}

/// Length label for the segment `a -> b`
///
/// Placed at the segment midpoint, offset perpendicular to the line so the
/// text does not overlap it, rotated to match the (upright-folded) segment
/// direction and center-aligned.
pub fn segment_label(
    a: MapPoint,
    b: MapPoint,
    text: String,
    offset: f64,
    style: TextStyle,
) -> DrawableLabel {
    let angle = a.angle_to(b);
    let position = a.midpoint(b).project(offset, angle + FRAC_PI_2);
    DrawableLabel {
        position,
        text,
        rotation: upright_angle(angle),
        alignment: TextAlignment::Center,
        style,
    }
}

/// Two slim triangles flanking the line at `tip`
///
/// `angle` is the direction of the segment the tick terminates; `length` is
/// the tick size in world units.
pub fn flanking_markers(tip: MapPoint, angle: f64, length: f64, fill: Color) -> [DrawableMarker; 2] {
    let tick = |side: f64| {
        let root = tip.project(length, angle + side * FRAC_PI_2);
        DrawableMarker {
            outline: vec![
                tip,
                root.project(length / 3.0, angle),
                root.project(length / 3.0, angle + PI),
            ],
            fill,
        }
    };
    [tick(1.0), tick(-1.0)]
}
