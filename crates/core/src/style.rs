//! Styling types for measurement drawables
//!
//! All styles are plain data handed to the session at construction time, so
//! the geometry engine carries no rendering-toolkit types and no process-wide
//! style state. Hosts map these onto whatever brush/pen primitives they use.

/// RGBA color representation
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    /// Create a new color
    pub fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// Create an opaque color
    pub fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    /// Convert to normalized RGBA values (0.0 to 1.0)
    pub fn to_normalized(&self) -> (f32, f32, f32, f32) {
        (
            self.r as f32 / 255.0,
            self.g as f32 / 255.0,
            self.b as f32 / 255.0,
            self.a as f32 / 255.0,
        )
    }
}

impl Color {
    pub const RED: Color = Color { r: 220, g: 40, b: 40, a: 255 };
    pub const BLUE: Color = Color { r: 40, g: 90, b: 220, a: 255 };
    pub const BLACK: Color = Color { r: 0, g: 0, b: 0, a: 255 };
    pub const WHITE: Color = Color { r: 255, g: 255, b: 255, a: 255 };
    pub const GRAY: Color = Color { r: 140, g: 140, b: 140, a: 255 };
}

/// Stroke styling for measurement lines
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct StrokeStyle {
    /// Stroke color
    pub color: Color,

    /// Stroke width in pixels
    pub width_px: f64,

    /// Dash pattern in pixels (empty for solid line)
    pub dash_pattern: Vec<f64>,

    /// Opacity (0.0 = transparent, 1.0 = opaque)
    pub opacity: f64,
}

impl StrokeStyle {
    /// Solid stroke of the given color and width
    pub fn solid(color: Color, width_px: f64) -> Self {
        Self {
            color,
            width_px,
            dash_pattern: Vec::new(),
            opacity: 1.0,
        }
    }

    /// Dashed stroke of the given color and width
    pub fn dashed(color: Color, width_px: f64, dash_pattern: Vec<f64>) -> Self {
        Self {
            color,
            width_px,
            dash_pattern,
            opacity: 1.0,
        }
    }
}

/// Text styling for length labels
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct TextStyle {
    /// Text color
    pub color: Color,

    /// Font size in pixels
    pub font_size_px: f64,
}

impl Default for TextStyle {
    fn default() -> Self {
        Self {
            color: Color::BLACK,
            font_size_px: 12.0,
        }
    }
}

/// Horizontal alignment of a label relative to its anchor point
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum TextAlignment {
    Left,
    Center,
    Right,
}

/// The full set of strokes and fills a measurement session draws with
///
/// Supplied once at session construction; every drawable the engine emits
/// references one of these entries.
#[derive(Debug, Clone, PartialEq)]
pub struct MeasurePalette {
    /// Base/reference line of a dimension chain
    pub base: StrokeStyle,

    /// Confirmed measure segments
    pub measure: StrokeStyle,

    /// Measure segments flagged invalid (placed behind the base direction)
    pub invalid: StrokeStyle,

    /// The unconfirmed hover-tracking segment
    pub preview: StrokeStyle,

    /// Construction/guide lines shown while a base is being placed
    pub guide: StrokeStyle,

    /// Fill for the triangular end ticks
    pub marker_fill: Color,

    /// Length label text
    pub label: TextStyle,
}

impl Default for MeasurePalette {
    fn default() -> Self {
        Self {
            base: StrokeStyle::solid(Color::BLUE, 2.0),
            measure: StrokeStyle::solid(Color::BLACK, 2.0),
            invalid: StrokeStyle::solid(Color::RED, 2.0),
            preview: StrokeStyle::solid(Color::GRAY, 1.5),
            guide: StrokeStyle::dashed(Color::GRAY, 1.0, vec![4.0, 4.0]),
            marker_fill: Color::BLACK,
            label: TextStyle::default(),
        }
    }
}
