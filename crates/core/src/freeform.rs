//! Free-form measurer
//!
//! Connects consecutive points with straight segments and annotates
//! per-segment and cumulative length. The stored point list always ends with
//! a provisional hover-tracking point while the shape is live, so a
//! zero-length segment exists from the very first click and something is
//! visible while the user positions the next point. Closing duplicates the
//! first coordinate as the last, producing a ring.

use crate::collection::{
    ElementCollection, MeasureContext, ShapeId, ShapeKind, ShapeMeasurement, StatusText,
};
use crate::drawable::{segment_label, DrawableCurve, DrawableSet};
use crate::geometry::{polygon_area, MapPoint};

/// A free-form polyline shape
#[derive(Debug, Clone)]
pub struct FreeCollection {
    id: ShapeId,
    points: Vec<MapPoint>,
    has_provisional: bool,
    finalized: bool,
    closed: bool,
    drawables: DrawableSet,
}

impl FreeCollection {
    pub fn new() -> Self {
        Self {
            id: ShapeId::new_v4(),
            points: Vec::new(),
            has_provisional: false,
            finalized: false,
            closed: false,
            drawables: DrawableSet::default(),
        }
    }

    /// Stored points, including the trailing provisional one while live
    pub fn points(&self) -> &[MapPoint] {
        &self.points
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    fn confirmed_count(&self) -> usize {
        self.points.len() - usize::from(self.has_provisional)
    }

    /// Confirmed points only, the provisional hover point excluded
    fn confirmed_points(&self) -> &[MapPoint] {
        &self.points[..self.confirmed_count()]
    }

    /// Path length over all stored segments, in meters
    fn path_meters(&self, ctx: &MeasureContext) -> f64 {
        self.points
            .windows(2)
            .map(|w| ctx.meters_between(w[0], w[1]))
            .sum()
    }

    /// Enclosed area in square meters, once three confirmed points exist
    fn area_square_meters(&self, ctx: &MeasureContext) -> Option<f64> {
        let ring = self.confirmed_points();
        if ring.len() < 3 {
            return None;
        }
        let area_units = polygon_area(ring);
        if area_units == 0.0 {
            return None;
        }
        Some(ctx.square_meters(area_units, ring[0]))
    }

    /// Largest bounding-box dimension of the confirmed ring, in world units
    fn ring_extent(&self) -> f64 {
        let ring = self.confirmed_points();
        if ring.is_empty() {
            return 0.0;
        }
        let (mut min_x, mut max_x) = (ring[0].x, ring[0].x);
        let (mut min_y, mut max_y) = (ring[0].y, ring[0].y);
        for point in &ring[1..] {
            min_x = min_x.min(point.x);
            max_x = max_x.max(point.x);
            min_y = min_y.min(point.y);
            max_y = max_y.max(point.y);
        }
        (max_x - min_x).max(max_y - min_y)
    }

    fn rebuild(&mut self, ctx: &MeasureContext) {
        let mut out = DrawableSet::default();

        let segment_count = self.points.len().saturating_sub(1);
        for (i, pair) in self.points.windows(2).enumerate() {
            let is_preview = self.has_provisional && i + 1 == segment_count;
            let stroke = if is_preview {
                ctx.palette.preview.clone()
            } else {
                ctx.palette.measure.clone()
            };
            out.curves
                .push(DrawableCurve::segment(pair[0], pair[1], stroke));

            if pair[0].distance_to(pair[1]) > ctx.px(ctx.config.free_label_min_px) {
                out.labels.push(segment_label(
                    pair[0],
                    pair[1],
                    ctx.units.format_length(ctx.meters_between(pair[0], pair[1])),
                    ctx.px(ctx.config.label_offset_px),
                    ctx.palette.label.clone(),
                ));
            }
        }

        self.drawables = out;
    }
}

impl Default for FreeCollection {
    fn default() -> Self {
        Self::new()
    }
}

impl ElementCollection for FreeCollection {
    fn id(&self) -> ShapeId {
        self.id
    }

    fn added_coordinate(&mut self, point: MapPoint, ctx: &MeasureContext) {
        if self.points.is_empty() {
            // Synthetic duplicate so a zero-length segment exists at once.
            self.points.push(point);
        } else if self.has_provisional {
            let last = self.points.len() - 1;
            self.points[last] = point;
        } else {
            self.points.push(point);
        }
        self.points.push(point);
        self.has_provisional = true;
        self.rebuild(ctx);
    }

    fn moved_coordinate(&mut self, point: MapPoint, ctx: &MeasureContext) {
        if self.points.is_empty() {
            return;
        }
        if self.has_provisional {
            let last = self.points.len() - 1;
            self.points[last] = point;
        } else {
            self.points.push(point);
            self.has_provisional = true;
        }
        self.rebuild(ctx);
    }

    fn deleted_coordinate(&mut self, ctx: &MeasureContext) {
        let confirmed = self.confirmed_count();
        if confirmed == 0 {
            return;
        }
        if confirmed <= 1 {
            self.points.clear();
            self.has_provisional = false;
        } else {
            // Drop the last confirmed point, keeping the hover tracker.
            self.points.remove(confirmed - 1);
        }
        self.rebuild(ctx);
    }

    fn can_add_coordinate(&self) -> bool {
        true
    }

    fn coordinate_count(&self) -> usize {
        self.confirmed_count()
    }

    fn finalize(&mut self, ctx: &MeasureContext) {
        if self.has_provisional {
            self.points.pop();
            self.has_provisional = false;
        }
        self.finalized = true;
        self.rebuild(ctx);
    }

    fn is_finalized(&self) -> bool {
        self.finalized
    }

    fn close(&mut self, ctx: &MeasureContext) -> bool {
        if self.points.len() <= 3 {
            return false;
        }
        let first = self.points[0];
        let last = self.points.len() - 1;
        self.points[last] = first;
        self.has_provisional = false;
        self.closed = true;
        self.rebuild(ctx);
        true
    }

    fn translate(&mut self, dx: f64, dy: f64, ctx: &MeasureContext) {
        for point in &mut self.points {
            *point = point.offset_by(dx, dy);
        }
        self.rebuild(ctx);
    }

    fn reset(&mut self) {
        self.points.clear();
        self.has_provisional = false;
        self.finalized = false;
        self.closed = false;
        self.drawables.clear();
    }

    fn recalculate(&mut self, ctx: &MeasureContext) -> bool {
        let before = self.drawables.clone();
        self.rebuild(ctx);
        before != self.drawables
    }

    fn collect_drawables(&self, out: &mut DrawableSet) {
        out.append(&self.drawables);
    }

    fn status(&self, ctx: &MeasureContext) -> StatusText {
        let mut status = StatusText::default();
        if let Some(pair) = self.points.windows(2).last() {
            status.segment = ctx
                .units
                .format_length(ctx.meters_between(pair[0], pair[1]));
            status.total = ctx.units.format_length(self.path_meters(ctx));
        }
        if self.ring_extent() > ctx.px(ctx.config.area_label_min_px) {
            if let Some(area) = self.area_square_meters(ctx) {
                status.area = ctx.units.format_area(area);
            }
        }
        status
    }

    fn measurement(&self, ctx: &MeasureContext) -> ShapeMeasurement {
        ShapeMeasurement {
            id: self.id,
            kind: ShapeKind::Free,
            point_count: self.confirmed_count(),
            length_meters: self
                .confirmed_points()
                .windows(2)
                .map(|w| ctx.meters_between(w[0], w[1]))
                .sum(),
            area_square_meters: if self.closed {
                self.area_square_meters(ctx)
            } else {
                None
            },
            closed: self.closed,
            finalized: self.finalized,
        }
    }
}
