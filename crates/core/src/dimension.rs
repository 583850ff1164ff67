//! Dimensioning engine
//!
//! Builds a chain of perpendicular "measure" segments against a base
//! direction established by the first two confirmed points. Each further
//! point is dropped onto the base's infinite line through a perpendicular
//! intersection, splitting its offset into an along component (parallel to
//! the base) and an orthogonal component (from the base to the raw point).
//!
//! Elements live in an arena ordered by insertion; the base is element zero
//! conceptually, and each measure element's start is the previous element's
//! intersection point, so no element holds a reference to another.

use crate::collection::{
    ElementCollection, MeasureContext, ShapeId, ShapeKind, ShapeMeasurement, StatusText,
};
use crate::drawable::{flanking_markers, segment_label, DrawableCurve, DrawableSet};
use crate::geometry::{
    angle_difference, line_intersection, perpendicular_through, MapPoint,
};

/// The reference direction of a dimension chain
///
/// Mutable while fewer than three points exist (the second point and the
/// hover preview both re-aim it); read-only once measuring begins, except
/// for the one-shot backward correction in [`DimBase::reverse`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DimBase {
    pub start: MapPoint,
    pub end: MapPoint,
    /// Direction start -> end in radians
    pub angle: f64,
}

impl DimBase {
    fn at(point: MapPoint) -> Self {
        Self {
            start: point,
            end: point,
            angle: 0.0,
        }
    }

    fn set_end(&mut self, end: MapPoint) {
        self.end = end;
        self.angle = self.start.angle_to(end);
    }

    /// Flip the reference direction by reflecting `start` through `end`
    ///
    /// Doubles the base length on the opposite side, so measurements taken
    /// "behind" the original direction become forward of the new one.
    pub fn reverse(&mut self) {
        self.start = MapPoint::new(
            2.0 * self.end.x - self.start.x,
            2.0 * self.end.y - self.start.y,
        );
        self.angle = self.start.angle_to(self.end);
    }

    fn is_degenerate(&self) -> bool {
        self.start == self.end
    }
}

/// One perpendicular measurement against the base
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DimMeasure {
    /// Previous element's intersection point (the base's start for the first)
    pub start: MapPoint,
    /// The raw measured point
    pub end: MapPoint,
    /// `end` dropped perpendicularly onto the base's infinite line
    pub intermediate: MapPoint,
    /// False when the point sits behind the base direction
    pub valid: bool,
    provisional: bool,
}

impl DimMeasure {
    fn compute(start: MapPoint, end: MapPoint, base: &DimBase, ctx: &MeasureContext) -> Self {
        let (g1, g2) = perpendicular_through(end, base.angle, ctx.config.guide_half_extent);
        // Degenerate frames fall back to the chain start so the shape stays
        // visually continuous.
        let intermediate = line_intersection(base.start, base.end, g1, g2).unwrap_or(start);

        let along = start.distance_to(intermediate);
        let backward = along > ctx.px(ctx.config.backward_tolerance_px)
            && angle_difference(start.angle_to(intermediate), base.angle)
                > ctx.config.backward_angle_tolerance_rad;

        Self {
            start,
            end,
            intermediate,
            valid: !backward,
            provisional: false,
        }
    }

    /// Along-component length in world units
    pub fn along_length(&self) -> f64 {
        self.start.distance_to(self.intermediate)
    }

    /// Orthogonal-component length in world units
    pub fn orthogonal_length(&self) -> f64 {
        self.intermediate.distance_to(self.end)
    }
}

/// A dimension chain: base element plus measure elements
#[derive(Debug, Clone)]
pub struct DimensionCollection {
    id: ShapeId,
    base: Option<DimBase>,
    measures: Vec<DimMeasure>,
    confirmed: usize,
    finalized: bool,
    drawables: DrawableSet,
}

impl DimensionCollection {
    pub fn new() -> Self {
        Self {
            id: ShapeId::new_v4(),
            base: None,
            measures: Vec::new(),
            confirmed: 0,
            finalized: false,
            drawables: DrawableSet::default(),
        }
    }

    pub fn base(&self) -> Option<&DimBase> {
        self.base.as_ref()
    }

    pub fn measures(&self) -> &[DimMeasure] {
        &self.measures
    }

    fn confirmed_measure_count(&self) -> usize {
        self.measures.iter().filter(|m| !m.provisional).count()
    }

    fn last_confirmed_measure(&self) -> Option<&DimMeasure> {
        self.measures.iter().rev().find(|m| !m.provisional)
    }

    /// Start of the measure element at `index`: the previous element's
    /// intersection point, or the base's start for the first (the base line
    /// doubles as the first along run)
    fn chain_start(&self, base: &DimBase, index: usize) -> MapPoint {
        if index == 0 {
            base.start
        } else {
            self.measures[index - 1].intermediate
        }
    }

    /// Recompute every element against the current base, chaining each
    /// start from the previous intersection
    fn recompute_chain(&mut self, ctx: &MeasureContext) {
        let Some(base) = self.base else { return };
        let mut start = base.start;
        for measure in &mut self.measures {
            let provisional = measure.provisional;
            *measure = DimMeasure::compute(start, measure.end, &base, ctx);
            measure.provisional = provisional;
            start = measure.intermediate;
        }
    }

    fn rebuild(&mut self, ctx: &MeasureContext) {
        let mut out = DrawableSet::default();

        if let Some(base) = &self.base {
            if !base.is_degenerate() {
                out.curves.push(DrawableCurve::segment(
                    base.start,
                    base.end,
                    ctx.palette.base.clone(),
                ));
                if !self.finalized {
                    for anchor in [base.start, base.end] {
                        let (g1, g2) = perpendicular_through(
                            anchor,
                            base.angle,
                            ctx.config.guide_half_extent,
                        );
                        out.curves
                            .push(DrawableCurve::segment(g1, g2, ctx.palette.guide.clone()));
                    }
                }
            }
        }

        for measure in &self.measures {
            let stroke = if !measure.valid {
                ctx.palette.invalid.clone()
            } else if measure.provisional {
                ctx.palette.preview.clone()
            } else {
                ctx.palette.measure.clone()
            };

            out.curves.push(DrawableCurve::segment(
                measure.start,
                measure.intermediate,
                stroke.clone(),
            ));
            out.curves.push(DrawableCurve::segment(
                measure.intermediate,
                measure.end,
                stroke,
            ));

            let along = measure.along_length();
            let orthogonal = measure.orthogonal_length();
            let offset = ctx.px(ctx.config.label_offset_px);

            if along > ctx.px(ctx.config.dim_label_min_px) {
                out.labels.push(segment_label(
                    measure.start,
                    measure.intermediate,
                    ctx.units
                        .format_length(ctx.meters_between(measure.start, measure.intermediate)),
                    offset,
                    ctx.palette.label.clone(),
                ));
            }
            if orthogonal > ctx.px(ctx.config.dim_label_min_px) {
                out.labels.push(segment_label(
                    measure.intermediate,
                    measure.end,
                    ctx.units
                        .format_length(ctx.meters_between(measure.intermediate, measure.end)),
                    offset,
                    ctx.palette.label.clone(),
                ));
            }

            // Ticks only when both components clear the threshold; a nearly
            // degenerate segment would just smear into clutter.
            let tick_min = ctx.px(ctx.config.marker_min_segment_px);
            if along > tick_min && orthogonal > tick_min {
                let tick_len = ctx.px(ctx.config.marker_length_px);
                let along_angle = measure.start.angle_to(measure.intermediate);
                let ortho_angle = measure.intermediate.angle_to(measure.end);
                for (tip, angle) in [
                    (measure.start, along_angle),
                    (measure.intermediate, along_angle),
                    (measure.end, ortho_angle),
                ] {
                    out.markers
                        .extend(flanking_markers(tip, angle, tick_len, ctx.palette.marker_fill));
                }
            }
        }

        self.drawables = out;
    }

    /// Along/orthogonal running totals over confirmed elements, in meters
    fn totals(&self, ctx: &MeasureContext) -> (f64, f64) {
        self.measures
            .iter()
            .filter(|m| !m.provisional)
            .fold((0.0, 0.0), |(along, ortho), m| {
                (
                    along + ctx.meters_between(m.start, m.intermediate),
                    ortho + ctx.meters_between(m.intermediate, m.end),
                )
            })
    }
}

impl Default for DimensionCollection {
    fn default() -> Self {
        Self::new()
    }
}

impl ElementCollection for DimensionCollection {
    fn id(&self) -> ShapeId {
        self.id
    }

    fn added_coordinate(&mut self, point: MapPoint, ctx: &MeasureContext) {
        match self.confirmed {
            0 => self.base = Some(DimBase::at(point)),
            1 => {
                if let Some(base) = &mut self.base {
                    base.set_end(point);
                }
            }
            _ => {
                if let Some(base) = self.base {
                    let confirm_provisional =
                        matches!(self.measures.last(), Some(m) if m.provisional);
                    if confirm_provisional {
                        if let Some(last) = self.measures.last_mut() {
                            let start = last.start;
                            *last = DimMeasure::compute(start, point, &base, ctx);
                        }
                    } else {
                        let start = self.chain_start(&base, self.measures.len());
                        self.measures
                            .push(DimMeasure::compute(start, point, &base, ctx));
                    }

                    // A lone first element cannot prove direction, so it is
                    // accepted even when invalid; the second element decides.
                    // If the first turned out backward, flip the base and
                    // re-derive the chain against the corrected direction.
                    if self.confirmed_measure_count() == 2 && !self.measures[0].valid {
                        if let Some(base) = &mut self.base {
                            base.reverse();
                        }
                        self.recompute_chain(ctx);
                    }
                }
            }
        }
        self.confirmed += 1;
        self.rebuild(ctx);
    }

    fn moved_coordinate(&mut self, point: MapPoint, ctx: &MeasureContext) {
        match self.confirmed {
            0 => return,
            1 => {
                if let Some(base) = &mut self.base {
                    base.set_end(point);
                }
            }
            _ => {
                if let Some(base) = self.base {
                    let update_provisional =
                        matches!(self.measures.last(), Some(m) if m.provisional);
                    if update_provisional {
                        if let Some(last) = self.measures.last_mut() {
                            let start = last.start;
                            *last = DimMeasure::compute(start, point, &base, ctx);
                            last.provisional = true;
                        }
                    } else {
                        let start = self.chain_start(&base, self.measures.len());
                        let mut measure = DimMeasure::compute(start, point, &base, ctx);
                        measure.provisional = true;
                        self.measures.push(measure);
                    }
                }
            }
        }
        self.rebuild(ctx);
    }

    fn deleted_coordinate(&mut self, ctx: &MeasureContext) {
        if matches!(self.measures.last(), Some(m) if m.provisional) {
            self.measures.pop();
        }
        match self.confirmed {
            0 => {}
            1 => {
                self.base = None;
                self.confirmed = 0;
            }
            2 => {
                if let Some(base) = &mut self.base {
                    *base = DimBase::at(base.start);
                }
                self.confirmed = 1;
            }
            _ => {
                self.measures.pop();
                self.confirmed -= 1;
            }
        }
        self.rebuild(ctx);
    }

    fn can_add_coordinate(&self) -> bool {
        match self.last_confirmed_measure() {
            Some(last) => last.valid || self.confirmed_measure_count() <= 1,
            None => true,
        }
    }

    fn coordinate_count(&self) -> usize {
        self.confirmed
    }

    fn finalize(&mut self, ctx: &MeasureContext) {
        if self.measures.len() > 1 && matches!(self.measures.last(), Some(m) if m.provisional) {
            self.measures.pop();
        }
        self.finalized = true;
        self.rebuild(ctx);
    }

    fn is_finalized(&self) -> bool {
        self.finalized
    }

    fn close(&mut self, _ctx: &MeasureContext) -> bool {
        // A dimension chain has no ring form.
        false
    }

    fn translate(&mut self, dx: f64, dy: f64, ctx: &MeasureContext) {
        if let Some(base) = &mut self.base {
            base.start = base.start.offset_by(dx, dy);
            base.end = base.end.offset_by(dx, dy);
        }
        for measure in &mut self.measures {
            measure.start = measure.start.offset_by(dx, dy);
            measure.end = measure.end.offset_by(dx, dy);
            measure.intermediate = measure.intermediate.offset_by(dx, dy);
        }
        self.rebuild(ctx);
    }

    fn reset(&mut self) {
        self.base = None;
        self.measures.clear();
        self.confirmed = 0;
        self.finalized = false;
        self.drawables.clear();
    }

    fn recalculate(&mut self, ctx: &MeasureContext) -> bool {
        let before = self.drawables.clone();
        self.recompute_chain(ctx);
        self.rebuild(ctx);
        before != self.drawables
    }

    fn collect_drawables(&self, out: &mut DrawableSet) {
        out.append(&self.drawables);
    }

    fn status(&self, ctx: &MeasureContext) -> StatusText {
        let mut status = StatusText::default();
        if let Some(last) = self.measures.last() {
            status.segment = format!(
                "{} / {}",
                ctx.units
                    .format_length(ctx.meters_between(last.start, last.intermediate)),
                ctx.units
                    .format_length(ctx.meters_between(last.intermediate, last.end)),
            );
            let (along, ortho) = self.totals(ctx);
            status.total = format!(
                "{} / {}",
                ctx.units.format_length(along),
                ctx.units.format_length(ortho),
            );
        } else if let Some(base) = &self.base {
            if !base.is_degenerate() {
                let length = ctx.units.format_length(ctx.meters_between(base.start, base.end));
                status.segment = length.clone();
                status.total = length;
            }
        }
        status
    }

    fn measurement(&self, ctx: &MeasureContext) -> ShapeMeasurement {
        let length_meters = if self.measures.iter().any(|m| !m.provisional) {
            self.totals(ctx).0
        } else {
            self.base
                .filter(|b| !b.is_degenerate())
                .map(|b| ctx.meters_between(b.start, b.end))
                .unwrap_or(0.0)
        };
        ShapeMeasurement {
            id: self.id,
            kind: ShapeKind::Dimension,
            point_count: self.confirmed,
            length_meters,
            area_square_meters: None,
            closed: false,
            finalized: self.finalized,
        }
    }
}
