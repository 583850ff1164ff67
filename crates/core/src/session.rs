//! Measurement session lifecycle
//!
//! The session is the root aggregate owned by one active interaction mode:
//! it keeps the confirmed coordinate run, the hover point, the
//! units-per-pixel scale, and an ordered run of shape collections of which
//! exactly the last is active. All operations are synchronous and run on the
//! caller's thread; every visual change rebuilds the flattened drawable set
//! and bumps a revision counter that hosts poll after dispatching input.

use std::sync::Arc;

use crate::collection::{ElementCollection, MeasureContext, ShapeMeasurement, StatusText};
use crate::config::MeasureConfig;
use crate::dimension::DimensionCollection;
use crate::drawable::DrawableSet;
use crate::freeform::FreeCollection;
use crate::geometry::MapPoint;
use crate::style::MeasurePalette;
use crate::transform::DistanceCalc;
use crate::units::UnitFormat;

/// Shared, immutable session environment
struct SessionEnv {
    config: MeasureConfig,
    palette: MeasurePalette,
    units: UnitFormat,
    distance: Arc<dyn DistanceCalc>,
}

impl SessionEnv {
    fn context(&self, units_per_pixel: f64) -> MeasureContext<'_> {
        MeasureContext {
            units_per_pixel,
            config: &self.config,
            palette: &self.palette,
            units: self.units,
            distance: self.distance.as_ref(),
        }
    }
}

/// A live measuring session over one shape variant
pub struct MeasurementSession<C: ElementCollection + Default> {
    env: SessionEnv,
    units_per_pixel: f64,
    coordinates: Vec<MapPoint>,
    last_confirmed: Option<MapPoint>,
    last_hover: Option<MapPoint>,
    collections: Vec<C>,
    drawables: DrawableSet,
    status: StatusText,
    revision: u64,
    changed: bool,
}

/// Session running the dimensioning engine
pub type DimensionSession = MeasurementSession<DimensionCollection>;

/// Session running the free-form measurer
pub type FreeSession = MeasurementSession<FreeCollection>;

impl<C: ElementCollection + Default> MeasurementSession<C> {
    pub fn new(
        config: MeasureConfig,
        palette: MeasurePalette,
        units: UnitFormat,
        distance: Arc<dyn DistanceCalc>,
        units_per_pixel: f64,
    ) -> Self {
        Self {
            env: SessionEnv {
                config,
                palette,
                units,
                distance,
            },
            units_per_pixel,
            coordinates: Vec::new(),
            last_confirmed: None,
            last_hover: None,
            collections: vec![C::default()],
            drawables: DrawableSet::default(),
            status: StatusText::default(),
            revision: 0,
            changed: false,
        }
    }

    /// Begin (or restart) a measuring interaction
    ///
    /// Resets all state, then recomputes against the current scale.
    pub fn start(&mut self) {
        tracing::debug!("measurement session started");
        self.clear();
        let ctx = self.env.context(self.units_per_pixel);
        for collection in &mut self.collections {
            collection.recalculate(&ctx);
        }
        self.regenerate();
    }

    /// Empty the session: no coordinates, one fresh collection, empty
    /// status, and an empty geometry update
    pub fn clear(&mut self) {
        self.coordinates.clear();
        self.last_confirmed = None;
        self.last_hover = None;
        self.collections = vec![C::default()];
        self.regenerate();
    }

    /// Confirm a coordinate
    ///
    /// Silently ignored while the active shape refuses additions (its last
    /// measure element is invalid). Returns whether the point was taken.
    pub fn add_coordinate(&mut self, point: MapPoint) -> bool {
        if !self.active().can_add_coordinate() {
            tracing::debug!(?point, "coordinate refused by active shape");
            return false;
        }
        let ctx = self.env.context(self.units_per_pixel);
        self.coordinates.push(point);
        if let Some(active) = self.collections.last_mut() {
            active.added_coordinate(point, &ctx);
        }
        self.last_confirmed = Some(point);
        self.regenerate();
        true
    }

    /// Update the hover point for live preview
    ///
    /// No-op until at least one coordinate is confirmed.
    pub fn move_coordinate(&mut self, point: MapPoint) {
        if self.last_confirmed.is_none() {
            return;
        }
        self.last_hover = Some(point);
        let ctx = self.env.context(self.units_per_pixel);
        if let Some(active) = self.collections.last_mut() {
            active.moved_coordinate(point, &ctx);
        }
        self.regenerate();
    }

    /// Translate the whole session by a world-space delta
    ///
    /// Finalized shapes shift rigidly; the active shape is rebuilt by
    /// replaying its coordinates, because the perpendicular/intersection
    /// math is re-derived rather than patched in place.
    pub fn move_all(&mut self, dx: f64, dy: f64) {
        for point in &mut self.coordinates {
            *point = point.offset_by(dx, dy);
        }
        self.last_confirmed = self.last_confirmed.map(|p| p.offset_by(dx, dy));
        self.last_hover = self.last_hover.map(|p| p.offset_by(dx, dy));

        let ctx = self.env.context(self.units_per_pixel);
        let last = self.collections.len().saturating_sub(1);
        for collection in &mut self.collections[..last] {
            collection.translate(dx, dy, &ctx);
        }
        if let Some(active) = self.collections.last_mut() {
            active.reset();
            for point in &self.coordinates {
                active.added_coordinate(*point, &ctx);
            }
            if let Some(hover) = self.last_hover {
                active.moved_coordinate(hover, &ctx);
            }
        }
        self.regenerate();
    }

    /// Remove the most recently confirmed coordinate
    pub fn delete_last_coordinate(&mut self) {
        if self.coordinates.is_empty() {
            return;
        }
        self.coordinates.pop();
        self.last_confirmed = self.coordinates.last().copied();
        let ctx = self.env.context(self.units_per_pixel);
        if let Some(active) = self.collections.last_mut() {
            active.deleted_coordinate(&ctx);
        }
        self.regenerate();
    }

    /// Close the active shape, or discard it when it is too short
    ///
    /// Zero confirmed points clears the session. Up to two points roll the
    /// active attempt back (clearing everything when it was the only
    /// shape). Otherwise the shape is closed into a ring where the variant
    /// supports it, and measuring ends.
    pub fn close_measurer(&mut self) {
        match self.coordinates.len() {
            0 => self.clear(),
            1 | 2 => {
                if self.collections.len() > 1 {
                    if let Some(active) = self.collections.last_mut() {
                        active.reset();
                    }
                    self.coordinates.clear();
                    self.last_confirmed = None;
                    self.last_hover = None;
                    self.regenerate();
                } else {
                    self.clear();
                }
            }
            _ => {
                let ctx = self.env.context(self.units_per_pixel);
                if let Some(active) = self.collections.last_mut() {
                    active.close(&ctx);
                }
                self.end_measuring();
            }
        }
    }

    /// Finalize the active shape and open a fresh one
    ///
    /// Idempotent: calling again before any new coordinate is a no-op.
    pub fn end_measuring(&mut self) {
        if self.coordinates.is_empty() {
            return;
        }
        tracing::debug!(points = self.coordinates.len(), "shape finalized");
        let ctx = self.env.context(self.units_per_pixel);
        if let Some(active) = self.collections.last_mut() {
            active.finalize(&ctx);
        }
        self.coordinates.clear();
        self.last_confirmed = None;
        self.last_hover = None;
        self.collections.push(C::default());
        self.regenerate();
    }

    /// Refresh the zoom scale; regenerates only when some shape's visual
    /// output actually changed (pixel-threshold annotations)
    pub fn set_units_per_pixel(&mut self, units_per_pixel: f64) {
        self.units_per_pixel = units_per_pixel;
        let ctx = self.env.context(units_per_pixel);
        let mut any_changed = false;
        for collection in &mut self.collections {
            if collection.recalculate(&ctx) {
                any_changed = true;
            }
        }
        if any_changed {
            self.regenerate();
        }
    }

    /// Whether a button-down drag should pan the map rather than move the
    /// in-progress shape
    pub fn can_move_screen(&self) -> bool {
        self.collections.len() == 1 && {
            let active = self.active();
            active.coordinate_count() > 0
                && active.can_add_coordinate()
                && !active.is_finalized()
        }
    }

    pub fn units_per_pixel(&self) -> f64 {
        self.units_per_pixel
    }

    pub fn config(&self) -> &MeasureConfig {
        &self.env.config
    }

    /// Confirmed coordinates of the active shape
    pub fn coordinates(&self) -> &[MapPoint] {
        &self.coordinates
    }

    /// Flattened drawables for the whole session, fixed z-order
    pub fn drawables(&self) -> &DrawableSet {
        &self.drawables
    }

    /// Status-bar text for the active shape
    pub fn status(&self) -> &StatusText {
        &self.status
    }

    /// Monotonic counter bumped on every visual change
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Whether the geometry changed since the last poll; clears the flag
    pub fn take_changed(&mut self) -> bool {
        std::mem::take(&mut self.changed)
    }

    /// Measurement summaries for every shape holding at least one point
    pub fn measurements(&self) -> Vec<ShapeMeasurement> {
        let ctx = self.env.context(self.units_per_pixel);
        self.collections
            .iter()
            .filter(|c| c.coordinate_count() > 0)
            .map(|c| c.measurement(&ctx))
            .collect()
    }

    fn active(&self) -> &C {
        // Invariant: the collections run is never empty.
        &self.collections[self.collections.len() - 1]
    }

    fn regenerate(&mut self) {
        let ctx = self.env.context(self.units_per_pixel);
        let mut out = DrawableSet::default();
        for collection in &self.collections {
            collection.collect_drawables(&mut out);
        }
        self.status = self
            .collections
            .last()
            .map(|c| c.status(&ctx))
            .unwrap_or_default();
        self.drawables = out;
        self.revision += 1;
        self.changed = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transform::PlanarTransform;

    fn dimension_session() -> DimensionSession {
        MeasurementSession::new(
            MeasureConfig::default(),
            MeasurePalette::default(),
            UnitFormat::default(),
            Arc::new(PlanarTransform::identity()),
            1.0,
        )
    }

    fn free_session() -> FreeSession {
        MeasurementSession::new(
            MeasureConfig::default(),
            MeasurePalette::default(),
            UnitFormat::default(),
            Arc::new(PlanarTransform::identity()),
            1.0,
        )
    }

    fn p(x: f64, y: f64) -> MapPoint {
        MapPoint::new(x, y)
    }

    #[test]
    fn test_add_and_hover_bookkeeping() {
        let mut session = dimension_session();
        assert!(session.add_coordinate(p(0.0, 0.0)));
        assert!(session.add_coordinate(p(100.0, 0.0)));
        session.move_coordinate(p(100.0, 30.0));

        assert_eq!(session.coordinates().len(), 2);
        assert!(!session.drawables().is_empty());
    }

    #[test]
    fn test_move_before_first_point_is_noop() {
        let mut session = dimension_session();
        let revision = session.revision();
        session.move_coordinate(p(10.0, 10.0));
        assert_eq!(session.revision(), revision);
    }

    #[test]
    fn test_blocked_addition_leaves_session_untouched() {
        let mut session = dimension_session();
        session.add_coordinate(p(0.0, 0.0));
        session.add_coordinate(p(100.0, 0.0));
        session.add_coordinate(p(100.0, 40.0));
        // Second measure placed far behind the chain: accepted but invalid.
        assert!(session.add_coordinate(p(-60.0, 40.0)));
        // Anything further is refused until the invalid element is removed.
        assert!(!session.add_coordinate(p(50.0, 80.0)));
        assert_eq!(session.coordinates().len(), 4);

        session.delete_last_coordinate();
        assert!(session.add_coordinate(p(150.0, 80.0)));
    }

    #[test]
    fn test_end_measuring_is_idempotent() {
        let mut session = dimension_session();
        session.add_coordinate(p(0.0, 0.0));
        session.add_coordinate(p(100.0, 0.0));
        session.add_coordinate(p(100.0, 40.0));
        session.end_measuring();

        let drawables = session.drawables().clone();
        let revision = session.revision();
        session.end_measuring();
        assert_eq!(session.revision(), revision);
        assert_eq!(*session.drawables(), drawables);
    }

    #[test]
    fn test_finalized_shape_survives_new_one() {
        let mut session = free_session();
        session.add_coordinate(p(0.0, 0.0));
        session.add_coordinate(p(100.0, 0.0));
        session.add_coordinate(p(100.0, 100.0));
        session.end_measuring();

        session.add_coordinate(p(200.0, 200.0));
        session.add_coordinate(p(300.0, 200.0));

        let measurements = session.measurements();
        assert_eq!(measurements.len(), 2);
        assert!(measurements[0].finalized);
        assert!(!measurements[1].finalized);
    }

    #[test]
    fn test_close_with_no_points_clears_session() {
        let mut session = free_session();
        session.add_coordinate(p(0.0, 0.0));
        session.add_coordinate(p(10.0, 0.0));
        session.add_coordinate(p(10.0, 10.0));
        session.add_coordinate(p(0.0, 10.0));
        session.close_measurer();
        // A fresh collection is active; closing again with zero points
        // wipes the finalized shape too.
        assert_eq!(session.measurements().len(), 1);
        session.close_measurer();
        assert!(session.measurements().is_empty());
        assert!(session.drawables().is_empty());
    }

    #[test]
    fn test_close_with_two_points_and_single_collection_clears() {
        let mut session = free_session();
        session.add_coordinate(p(0.0, 0.0));
        session.add_coordinate(p(10.0, 0.0));
        session.close_measurer();
        assert!(session.measurements().is_empty());
        assert!(session.drawables().is_empty());
        assert!(session.coordinates().is_empty());
    }

    #[test]
    fn test_close_with_two_points_keeps_prior_shapes() {
        let mut session = free_session();
        session.add_coordinate(p(0.0, 0.0));
        session.add_coordinate(p(100.0, 0.0));
        session.add_coordinate(p(100.0, 100.0));
        session.end_measuring();

        // A too-short second attempt is rolled back without touching the
        // finished shape.
        session.add_coordinate(p(300.0, 300.0));
        session.add_coordinate(p(310.0, 300.0));
        session.close_measurer();

        let measurements = session.measurements();
        assert_eq!(measurements.len(), 1);
        assert!(measurements[0].finalized);
        assert!(session.coordinates().is_empty());
    }

    #[test]
    fn test_close_forms_ring_and_ends() {
        let mut session = free_session();
        session.add_coordinate(p(0.0, 0.0));
        session.add_coordinate(p(10.0, 0.0));
        session.add_coordinate(p(10.0, 10.0));
        session.close_measurer();

        let measurements = session.measurements();
        assert_eq!(measurements.len(), 1);
        assert!(measurements[0].closed);
        assert!(measurements[0].finalized);
        // Ready for a fresh shape.
        assert!(session.coordinates().is_empty());
        assert!(session.add_coordinate(p(500.0, 500.0)));
    }

    #[test]
    fn test_move_all_translates_and_replays() {
        let mut session = dimension_session();
        session.add_coordinate(p(0.0, 0.0));
        session.add_coordinate(p(100.0, 0.0));
        session.add_coordinate(p(100.0, 40.0));

        let angle_before = session.collections[0].base().unwrap().angle;
        session.move_all(25.0, -13.0);

        assert_eq!(session.coordinates()[0], p(25.0, -13.0));
        assert_eq!(session.coordinates()[2], p(125.0, 27.0));
        // Base direction is stable under translation.
        let angle_after = session.collections[0].base().unwrap().angle;
        assert!((angle_before - angle_after).abs() < 1e-12);
    }

    #[test]
    fn test_move_all_shifts_finalized_shapes_rigidly() {
        let mut session = free_session();
        session.add_coordinate(p(0.0, 0.0));
        session.add_coordinate(p(100.0, 0.0));
        session.add_coordinate(p(100.0, 100.0));
        session.end_measuring();

        let length_before = session.measurements()[0].length_meters;
        session.move_all(-40.0, 7.0);
        let length_after = session.measurements()[0].length_meters;
        assert!((length_before - length_after).abs() < 1e-9);
    }

    #[test]
    fn test_scale_change_regenerates_only_on_visual_change() {
        let mut session = dimension_session();
        session.add_coordinate(p(0.0, 0.0));
        session.add_coordinate(p(100.0, 0.0));
        session.add_coordinate(p(200.0, 40.0));
        session.take_changed();

        // Zooming far out removes threshold-gated annotations.
        session.set_units_per_pixel(4.0);
        assert!(session.take_changed());

        // Applying the same scale again changes nothing.
        session.set_units_per_pixel(4.0);
        assert!(!session.take_changed());
    }

    #[test]
    fn test_can_move_screen_gate() {
        let mut session = free_session();
        assert!(!session.can_move_screen());
        session.add_coordinate(p(0.0, 0.0));
        assert!(session.can_move_screen());

        session.add_coordinate(p(10.0, 0.0));
        session.add_coordinate(p(10.0, 10.0));
        session.end_measuring();
        // Two collections now exist: dragging no longer pans.
        assert!(!session.can_move_screen());
    }

    #[test]
    fn test_clear_emits_empty_geometry_update() {
        let mut session = free_session();
        session.add_coordinate(p(0.0, 0.0));
        session.add_coordinate(p(50.0, 0.0));
        session.take_changed();

        session.clear();
        assert!(session.take_changed());
        assert!(session.drawables().is_empty());
        assert_eq!(*session.status(), StatusText::default());
    }

    #[test]
    fn test_status_resets_between_shapes() {
        let mut session = free_session();
        session.add_coordinate(p(0.0, 0.0));
        session.add_coordinate(p(100.0, 0.0));
        session.add_coordinate(p(100.0, 100.0));
        assert!(!session.status().total.is_empty());

        session.end_measuring();
        assert!(session.status().total.is_empty());
    }
}
