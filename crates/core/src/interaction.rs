//! Interaction mode adapter
//!
//! Translates pointer and keyboard events from the hosting map control into
//! session calls. The adapter owns the session for the lifetime of the
//! measuring mode; the host feeds it raw events in pixel space and reads the
//! session's drawables back after each one.
//!
//! A failed pixel-to-world transform drops the input sample and leaves the
//! session in its last good state; it is never fatal to the mode.

use std::sync::Arc;

use crate::collection::ElementCollection;
use crate::dimension::DimensionCollection;
use crate::freeform::FreeCollection;
use crate::geometry::MapPoint;
use crate::session::MeasurementSession;
use crate::transform::PixelTransform;

/// Keyboard commands recognized while measuring
///
/// Hosts map their key events onto these: `C` closes the shape, `Enter`
/// finishes it, `Delete`/`Backspace` remove the last point.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    CloseShape,
    Finish,
    DeleteLast,
    Other,
}

/// An input event in map-control pixel coordinates
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InputEvent {
    PointerDown { position: MapPoint },
    PointerMove { position: MapPoint, primary_down: bool },
    PointerUp { position: MapPoint },
    DoubleClick { position: MapPoint },
    KeyDown { key: Key },
    Wheel { delta: f64 },
}

/// Whether the adapter handled an event or left it to the host
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventOutcome {
    Consumed,
    Ignored,
}

/// Which viewport edges may trigger auto-panning
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PanEdges {
    pub top: bool,
    pub bottom: bool,
    pub left: bool,
    pub right: bool,
}

impl Default for PanEdges {
    fn default() -> Self {
        Self {
            top: true,
            bottom: true,
            left: true,
            right: true,
        }
    }
}

/// The hosting map control's visible area, in pixels
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub width_px: f64,
    pub height_px: f64,
    pub pan_edges: PanEdges,
}

impl Viewport {
    pub fn new(width_px: f64, height_px: f64) -> Self {
        Self {
            width_px,
            height_px,
            pan_edges: PanEdges::default(),
        }
    }
}

/// Host-side pan capability
///
/// `pan_by` shifts the visible map by a pixel delta. The adapter follows
/// every auto-pan with a compensating [`MeasurementSession::move_all`] so
/// the in-progress shape appears to stay under the cursor.
pub trait MapSurface {
    fn pan_by(&mut self, dx_px: f64, dy_px: f64);
}

/// Measuring interaction mode over one session
pub struct InteractionAdapter<C: ElementCollection + Default> {
    session: MeasurementSession<C>,
    transform: Arc<dyn PixelTransform>,
    viewport: Viewport,
    keyboard_shortcuts: bool,
    down_at: Option<MapPoint>,
    last_drag: Option<MapPoint>,
}

impl InteractionAdapter<DimensionCollection> {
    /// Dimensioning mode: keyboard shortcuts are active
    pub fn dimensioning(
        session: MeasurementSession<DimensionCollection>,
        transform: Arc<dyn PixelTransform>,
        viewport: Viewport,
    ) -> Self {
        Self::new(session, transform, viewport, true)
    }
}

impl InteractionAdapter<FreeCollection> {
    /// Free-form mode: keyboard shortcuts are left to the host
    pub fn freeform(
        session: MeasurementSession<FreeCollection>,
        transform: Arc<dyn PixelTransform>,
        viewport: Viewport,
    ) -> Self {
        Self::new(session, transform, viewport, false)
    }
}

impl<C: ElementCollection + Default> InteractionAdapter<C> {
    pub fn new(
        session: MeasurementSession<C>,
        transform: Arc<dyn PixelTransform>,
        viewport: Viewport,
        keyboard_shortcuts: bool,
    ) -> Self {
        Self {
            session,
            transform,
            viewport,
            keyboard_shortcuts,
            down_at: None,
            last_drag: None,
        }
    }

    pub fn session(&self) -> &MeasurementSession<C> {
        &self.session
    }

    pub fn session_mut(&mut self) -> &mut MeasurementSession<C> {
        &mut self.session
    }

    pub fn set_viewport(&mut self, viewport: Viewport) {
        self.viewport = viewport;
    }

    /// Feed one host event through the mode
    pub fn handle_event(&mut self, event: InputEvent, surface: &mut dyn MapSurface) -> EventOutcome {
        match event {
            InputEvent::PointerDown { position } => {
                self.down_at = Some(position);
                self.last_drag = Some(position);
                EventOutcome::Consumed
            }
            InputEvent::PointerUp { position } => {
                let down_at = self.down_at.take();
                self.last_drag = None;
                // Only a near-stationary press counts as "click to add";
                // anything farther was a drag.
                if let Some(down) = down_at {
                    if down.distance_to(position) <= self.session.config().click_tolerance_px {
                        if let Some(world) = self.to_world(position) {
                            self.session.add_coordinate(world);
                        }
                    }
                }
                EventOutcome::Consumed
            }
            InputEvent::PointerMove {
                position,
                primary_down: false,
            } => {
                if let Some(world) = self.to_world(position) {
                    self.session.move_coordinate(world);
                }
                self.auto_pan(position, surface);
                EventOutcome::Consumed
            }
            InputEvent::PointerMove {
                position,
                primary_down: true,
            } => {
                if self.session.can_move_screen() {
                    self.last_drag = Some(position);
                    return EventOutcome::Ignored;
                }
                if let Some(previous) = self.last_drag {
                    let upp = self.session.units_per_pixel();
                    let dx = (position.x - previous.x) * upp;
                    let dy = -(position.y - previous.y) * upp;
                    self.session.move_all(dx, dy);
                }
                self.last_drag = Some(position);
                EventOutcome::Consumed
            }
            InputEvent::DoubleClick { .. } => {
                self.session.end_measuring();
                EventOutcome::Consumed
            }
            InputEvent::KeyDown { key } => {
                if !self.keyboard_shortcuts {
                    return EventOutcome::Ignored;
                }
                match key {
                    Key::CloseShape => self.session.close_measurer(),
                    Key::Finish => self.session.end_measuring(),
                    Key::DeleteLast => self.session.delete_last_coordinate(),
                    Key::Other => return EventOutcome::Ignored,
                }
                EventOutcome::Consumed
            }
            // Zooming is suspended while a measuring mode is active.
            InputEvent::Wheel { .. } => EventOutcome::Consumed,
        }
    }

    fn to_world(&self, pixel: MapPoint) -> Option<MapPoint> {
        match self.transform.pixel_to_world(pixel) {
            Ok(world) => Some(world),
            Err(error) => {
                tracing::warn!(%error, x = pixel.x, y = pixel.y, "input sample dropped");
                None
            }
        }
    }

    /// Shift the map when the hover point runs close to a viewport edge
    ///
    /// The map moves by a tenth of the viewport extent toward the edge, and
    /// the session translates by the matching world delta so the shape stays
    /// under the cursor.
    fn auto_pan(&mut self, position: MapPoint, surface: &mut dyn MapSurface) {
        let config = self.session.config();
        let margin = config.edge_pan_margin_px;
        let edges = self.viewport.pan_edges;
        let step_x = self.viewport.width_px / config.pan_step_divisor;
        let step_y = self.viewport.height_px / config.pan_step_divisor;

        let mut dx_px = 0.0;
        let mut dy_px = 0.0;
        if edges.left && position.x <= margin {
            dx_px = -step_x;
        } else if edges.right && position.x >= self.viewport.width_px - margin {
            dx_px = step_x;
        }
        if edges.top && position.y <= margin {
            dy_px = -step_y;
        } else if edges.bottom && position.y >= self.viewport.height_px - margin {
            dy_px = step_y;
        }

        if dx_px == 0.0 && dy_px == 0.0 {
            return;
        }

        surface.pan_by(dx_px, dy_px);
        let upp = self.session.units_per_pixel();
        self.session.move_all(-dx_px * upp, dy_px * upp);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MeasureConfig;
    use crate::session::{DimensionSession, FreeSession, MeasurementSession};
    use crate::style::MeasurePalette;
    use crate::transform::{PlanarTransform, TransformError, TransformResult};
    use crate::units::UnitFormat;

    #[derive(Default)]
    struct RecordingSurface {
        pans: Vec<(f64, f64)>,
    }

    impl MapSurface for RecordingSurface {
        fn pan_by(&mut self, dx_px: f64, dy_px: f64) {
            self.pans.push((dx_px, dy_px));
        }
    }

    /// Transform that fails for any pixel left of x = 0
    struct FailingTransform;

    impl PixelTransform for FailingTransform {
        fn pixel_to_world(&self, pixel: MapPoint) -> TransformResult<MapPoint> {
            if pixel.x < 0.0 {
                Err(TransformError::OutsideMapExtent {
                    x: pixel.x,
                    y: pixel.y,
                })
            } else {
                Ok(pixel)
            }
        }
    }

    fn p(x: f64, y: f64) -> MapPoint {
        MapPoint::new(x, y)
    }

    fn dim_session() -> DimensionSession {
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

    fn dim_adapter() -> InteractionAdapter<DimensionCollection> {
        InteractionAdapter::dimensioning(
            dim_session(),
            Arc::new(PlanarTransform::identity()),
            Viewport::new(800.0, 600.0),
        )
    }

    fn click(adapter: &mut InteractionAdapter<DimensionCollection>, surface: &mut RecordingSurface, at: MapPoint) {
        adapter.handle_event(InputEvent::PointerDown { position: at }, surface);
        adapter.handle_event(InputEvent::PointerUp { position: at }, surface);
    }

    #[test]
    fn test_click_adds_point_drag_does_not() {
        let mut adapter = dim_adapter();
        let mut surface = RecordingSurface::default();

        click(&mut adapter, &mut surface, p(100.0, 100.0));
        assert_eq!(adapter.session().coordinates().len(), 1);

        // Up far from down: a drag, not a click.
        adapter.handle_event(InputEvent::PointerDown { position: p(100.0, 100.0) }, &mut surface);
        adapter.handle_event(InputEvent::PointerUp { position: p(140.0, 100.0) }, &mut surface);
        assert_eq!(adapter.session().coordinates().len(), 1);

        // Within the 3 px click tolerance still counts.
        adapter.handle_event(InputEvent::PointerDown { position: p(200.0, 100.0) }, &mut surface);
        adapter.handle_event(InputEvent::PointerUp { position: p(202.0, 100.0) }, &mut surface);
        assert_eq!(adapter.session().coordinates().len(), 2);
    }

    #[test]
    fn test_hover_updates_preview() {
        let mut adapter = dim_adapter();
        let mut surface = RecordingSurface::default();

        click(&mut adapter, &mut surface, p(100.0, 100.0));
        let revision = adapter.session().revision();
        adapter.handle_event(
            InputEvent::PointerMove { position: p(150.0, 100.0), primary_down: false },
            &mut surface,
        );
        assert!(adapter.session().revision() > revision);
    }

    #[test]
    fn test_failed_transform_drops_sample() {
        let mut adapter = InteractionAdapter::dimensioning(
            dim_session(),
            Arc::new(FailingTransform),
            Viewport::new(800.0, 600.0),
        );
        let mut surface = RecordingSurface::default();

        adapter.handle_event(InputEvent::PointerDown { position: p(-5.0, 100.0) }, &mut surface);
        adapter.handle_event(InputEvent::PointerUp { position: p(-5.0, 100.0) }, &mut surface);
        assert!(adapter.session().coordinates().is_empty());

        // A later good sample still lands.
        adapter.handle_event(InputEvent::PointerDown { position: p(5.0, 100.0) }, &mut surface);
        adapter.handle_event(InputEvent::PointerUp { position: p(5.0, 100.0) }, &mut surface);
        assert_eq!(adapter.session().coordinates().len(), 1);
    }

    #[test]
    fn test_keyboard_shortcuts_in_dimensioning_mode() {
        let mut adapter = dim_adapter();
        let mut surface = RecordingSurface::default();

        click(&mut adapter, &mut surface, p(0.0, 0.0));
        click(&mut adapter, &mut surface, p(100.0, 0.0));
        click(&mut adapter, &mut surface, p(100.0, 40.0));

        let outcome = adapter.handle_event(InputEvent::KeyDown { key: Key::DeleteLast }, &mut surface);
        assert_eq!(outcome, EventOutcome::Consumed);
        assert_eq!(adapter.session().coordinates().len(), 2);

        adapter.handle_event(InputEvent::KeyDown { key: Key::Finish }, &mut surface);
        assert!(adapter.session().coordinates().is_empty());

        let other = adapter.handle_event(InputEvent::KeyDown { key: Key::Other }, &mut surface);
        assert_eq!(other, EventOutcome::Ignored);
    }

    #[test]
    fn test_keyboard_shortcuts_disabled_in_freeform_mode() {
        let mut adapter = InteractionAdapter::freeform(
            free_session(),
            Arc::new(PlanarTransform::identity()),
            Viewport::new(800.0, 600.0),
        );
        let mut surface = RecordingSurface::default();

        adapter.handle_event(InputEvent::PointerDown { position: p(10.0, 10.0) }, &mut surface);
        adapter.handle_event(InputEvent::PointerUp { position: p(10.0, 10.0) }, &mut surface);

        let outcome = adapter.handle_event(InputEvent::KeyDown { key: Key::DeleteLast }, &mut surface);
        assert_eq!(outcome, EventOutcome::Ignored);
        assert_eq!(adapter.session().coordinates().len(), 1);
    }

    #[test]
    fn test_double_click_finishes_shape() {
        let mut adapter = dim_adapter();
        let mut surface = RecordingSurface::default();

        click(&mut adapter, &mut surface, p(0.0, 0.0));
        click(&mut adapter, &mut surface, p(100.0, 0.0));
        click(&mut adapter, &mut surface, p(100.0, 40.0));
        adapter.handle_event(InputEvent::DoubleClick { position: p(100.0, 40.0) }, &mut surface);

        assert!(adapter.session().coordinates().is_empty());
        assert_eq!(adapter.session().measurements().len(), 1);
    }

    #[test]
    fn test_wheel_is_always_swallowed() {
        let mut adapter = dim_adapter();
        let mut surface = RecordingSurface::default();
        let outcome = adapter.handle_event(InputEvent::Wheel { delta: 3.0 }, &mut surface);
        assert_eq!(outcome, EventOutcome::Consumed);
    }

    #[test]
    fn test_edge_hover_pans_and_compensates() {
        let mut adapter = dim_adapter();
        let mut surface = RecordingSurface::default();

        click(&mut adapter, &mut surface, p(700.0, 300.0));
        let before = adapter.session().coordinates()[0];

        // Hovering within 10 px of the right edge: pan a tenth of the width.
        adapter.handle_event(
            InputEvent::PointerMove { position: p(795.0, 300.0), primary_down: false },
            &mut surface,
        );
        assert_eq!(surface.pans, vec![(80.0, 0.0)]);

        // The compensating translation keeps the shape under the cursor.
        let after = adapter.session().coordinates()[0];
        assert_eq!(after.x, before.x - 80.0);
        assert_eq!(after.y, before.y);
    }

    #[test]
    fn test_edge_pan_respects_disabled_edges() {
        let mut session = dim_session();
        session.add_coordinate(p(10.0, 10.0));
        let mut viewport = Viewport::new(800.0, 600.0);
        viewport.pan_edges.left = false;
        viewport.pan_edges.top = false;
        let mut adapter = InteractionAdapter::dimensioning(
            session,
            Arc::new(PlanarTransform::identity()),
            viewport,
        );
        let mut surface = RecordingSurface::default();

        adapter.handle_event(
            InputEvent::PointerMove { position: p(2.0, 2.0), primary_down: false },
            &mut surface,
        );
        assert!(surface.pans.is_empty());
    }

    #[test]
    fn test_drag_moves_shape_when_screen_move_is_blocked() {
        let mut adapter = dim_adapter();
        let mut surface = RecordingSurface::default();

        // Finish one shape so a second collection exists and
        // can_move_screen turns false.
        click(&mut adapter, &mut surface, p(0.0, 0.0));
        click(&mut adapter, &mut surface, p(100.0, 0.0));
        click(&mut adapter, &mut surface, p(100.0, 40.0));
        adapter.handle_event(InputEvent::DoubleClick { position: p(100.0, 40.0) }, &mut surface);
        click(&mut adapter, &mut surface, p(200.0, 200.0));

        assert!(!adapter.session().can_move_screen());
        let before = adapter.session().coordinates()[0];

        adapter.handle_event(InputEvent::PointerDown { position: p(300.0, 300.0) }, &mut surface);
        let outcome = adapter.handle_event(
            InputEvent::PointerMove { position: p(310.0, 290.0), primary_down: true },
            &mut surface,
        );
        assert_eq!(outcome, EventOutcome::Consumed);

        let after = adapter.session().coordinates()[0];
        // Pixel delta (10, -10) in screen space is (+10, +10) in world space.
        assert_eq!(after.x, before.x + 10.0);
        assert_eq!(after.y, before.y + 10.0);
    }

    #[test]
    fn test_drag_pans_map_while_screen_move_allowed() {
        let mut adapter = dim_adapter();
        let mut surface = RecordingSurface::default();

        click(&mut adapter, &mut surface, p(50.0, 50.0));
        assert!(adapter.session().can_move_screen());

        adapter.handle_event(InputEvent::PointerDown { position: p(60.0, 60.0) }, &mut surface);
        let outcome = adapter.handle_event(
            InputEvent::PointerMove { position: p(80.0, 60.0), primary_down: true },
            &mut surface,
        );
        // Left to the host's own pan handling.
        assert_eq!(outcome, EventOutcome::Ignored);
    }
}
