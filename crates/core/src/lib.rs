//! Tapeline measurement engine
//!
//! Interactive dimensioning and free-form measuring over a map surface:
//! turns a sequence of user-supplied points into styled geometric
//! annotations (lines, perpendicular dimension segments, length labels)
//! during live pointer interaction, without committing anything until the
//! user finalizes or cancels.
//!
//! The engine is render-agnostic: the hosting map view supplies a
//! pixel-to-world transform and a distance primitive, and reads back a flat
//! list of styled drawables after every input event.

pub mod collection;
pub mod config;
pub mod csv_export;
pub mod dimension;
pub mod drawable;
pub mod freeform;
pub mod geometry;
pub mod interaction;
pub mod session;
pub mod style;
pub mod transform;
pub mod units;

pub use collection::{
    ElementCollection, MeasureContext, ShapeId, ShapeKind, ShapeMeasurement, StatusText,
};
pub use config::MeasureConfig;
pub use csv_export::{export_measurements_csv, CsvExportConfig, CsvExportError, CsvExportResult};
pub use dimension::{DimBase, DimMeasure, DimensionCollection};
pub use drawable::{DrawableCurve, DrawableLabel, DrawableMarker, DrawableSet};
pub use freeform::FreeCollection;
pub use geometry::{line_intersection, polygon_area, MapPoint, Side};
pub use interaction::{
    EventOutcome, InputEvent, InteractionAdapter, Key, MapSurface, PanEdges, Viewport,
};
pub use session::{DimensionSession, FreeSession, MeasurementSession};
pub use style::{Color, MeasurePalette, StrokeStyle, TextAlignment, TextStyle};
pub use transform::{
    haversine_meters, DistanceCalc, GeographicTransform, PixelTransform, PlanarTransform,
    TransformError, TransformResult,
};
pub use units::{UnitFormat, UnitSystem};
