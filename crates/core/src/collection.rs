//! Per-shape state machine contract
//!
//! A measurement session owns an ordered run of shape collections; exactly
//! one (the last) is active and receives coordinates, the rest are finalized
//! and only rendered. The two concrete collections — the dimensioning chain
//! and the free-form polyline — implement this trait.

use crate::config::MeasureConfig;
use crate::drawable::DrawableSet;
use crate::geometry::MapPoint;
use crate::style::MeasurePalette;
use crate::transform::DistanceCalc;
use crate::units::UnitFormat;

/// Stable identifier for one measured shape
pub type ShapeId = uuid::Uuid;

/// Everything a collection needs to recompute itself
///
/// Borrowed from the session for the duration of one mutation; collections
/// hold no references of their own.
pub struct MeasureContext<'a> {
    /// World units covered by one screen pixel at the current zoom
    pub units_per_pixel: f64,
    pub config: &'a MeasureConfig,
    pub palette: &'a MeasurePalette,
    pub units: UnitFormat,
    pub distance: &'a dyn DistanceCalc,
}

impl MeasureContext<'_> {
    /// Convert a pixel-denominated threshold into world units
    pub fn px(&self, pixels: f64) -> f64 {
        pixels * self.units_per_pixel
    }

    /// Real-world distance between two world points, in meters
    pub fn meters_between(&self, a: MapPoint, b: MapPoint) -> f64 {
        self.distance.distance_meters(a, b)
    }

    /// Local meters-per-world-unit scale near a point
    ///
    /// Probed with a one-unit segment; exact for planar systems and a good
    /// local approximation for geographic ones.
    pub fn meters_per_unit(&self, near: MapPoint) -> f64 {
        self.distance.distance_meters(near, near.offset_by(1.0, 0.0))
    }

    /// Convert an area in squared world units to square meters near a point
    pub fn square_meters(&self, area_units: f64, near: MapPoint) -> f64 {
        let scale = self.meters_per_unit(near);
        area_units * scale * scale
    }
}

/// Which engine produced a shape
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShapeKind {
    Dimension,
    Free,
}

/// Summary of one measured shape, handed to exports and status consumers
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct ShapeMeasurement {
    pub id: ShapeId,
    pub kind: ShapeKind,
    /// Confirmed coordinates in the shape
    pub point_count: usize,
    /// Measured run in meters (path length, or along-run for dimensions)
    pub length_meters: f64,
    /// Enclosed area in square meters, for closed free-form shapes
    pub area_square_meters: Option<f64>,
    pub closed: bool,
    pub finalized: bool,
}

/// Status-bar text derived from the active shape
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize)]
pub struct StatusText {
    /// Current (last) segment readout
    pub segment: String,
    /// Running total readout
    pub total: String,
    /// Running area readout, free-form only
    pub area: String,
}

/// State machine shared by all measurer shape variants
pub trait ElementCollection {
    fn id(&self) -> ShapeId;

    /// A coordinate was confirmed and appended to the session
    fn added_coordinate(&mut self, point: MapPoint, ctx: &MeasureContext);

    /// The hover point moved; treat it as a provisional extension of the
    /// last confirmed coordinate without appending it
    fn moved_coordinate(&mut self, point: MapPoint, ctx: &MeasureContext);

    /// The last confirmed coordinate was removed
    fn deleted_coordinate(&mut self, ctx: &MeasureContext);

    /// Whether a further coordinate may be confirmed right now
    fn can_add_coordinate(&self) -> bool;

    /// Number of confirmed coordinates
    fn coordinate_count(&self) -> usize;

    /// Freeze the shape: drop the trailing hover placeholder and stop
    /// rendering construction guides
    fn finalize(&mut self, ctx: &MeasureContext);

    fn is_finalized(&self) -> bool;

    /// Close the shape into a ring, if the variant supports it
    ///
    /// Returns whether closing took effect.
    fn close(&mut self, ctx: &MeasureContext) -> bool;

    /// Rigid translation of every stored point
    fn translate(&mut self, dx: f64, dy: f64, ctx: &MeasureContext);

    /// Drop all elements but keep the identity, ready for a replay
    fn reset(&mut self);

    /// Recompute against the current scale; returns whether the visual
    /// output changed (pixel-threshold annotations may appear or vanish)
    fn recalculate(&mut self, ctx: &MeasureContext) -> bool;

    /// Append this shape's drawables in the fixed z-order
    fn collect_drawables(&self, out: &mut DrawableSet);

    /// Status-bar readout for this shape
    fn status(&self, ctx: &MeasureContext) -> StatusText;

    /// Measurement summary for exports
    fn measurement(&self, ctx: &MeasureContext) -> ShapeMeasurement;
}
