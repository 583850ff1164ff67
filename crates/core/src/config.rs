//! Measurement engine configuration
//!
//! The thresholds below are taste-tuned pixel values inherited from field
//! use; they are preserved as named, overridable settings rather than
//! re-derived. All pixel-denominated fields adapt to zoom level through the
//! session's units-per-pixel scale at the point of use.

/// Tunable thresholds for measuring behavior and annotation placement
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct MeasureConfig {
    /// Pointer-up within this distance of pointer-down counts as a click
    pub click_tolerance_px: f64,

    /// Along-distance slack before a point counts as placed behind the base
    pub backward_tolerance_px: f64,

    /// Direction mismatch with the base, in radians, for the backward test
    pub backward_angle_tolerance_rad: f64,

    /// Hover distance from a viewport edge that triggers auto-panning
    pub edge_pan_margin_px: f64,

    /// Auto-pan shifts the map by viewport extent divided by this
    pub pan_step_divisor: f64,

    /// Size of the triangular end ticks
    pub marker_length_px: f64,

    /// Both segment components must exceed this before end ticks are drawn
    pub marker_min_segment_px: f64,

    /// Minimum free-form segment length before its label is shown
    pub free_label_min_px: f64,

    /// Half-length of the perpendicular construction segment, in world units
    pub guide_half_extent: f64,

    /// Minimum ring extent before the free-form area is reported
    pub area_label_min_px: f64,

    /// Minimum along/orthogonal segment length before its label is shown
    pub dim_label_min_px: f64,

    /// Minimum accumulated run before cumulative labels would be placed
    pub total_label_min_px: f64,

    /// Perpendicular offset between a segment and its label
    pub label_offset_px: f64,
}

impl Default for MeasureConfig {
    fn default() -> Self {
        Self {
            click_tolerance_px: 3.0,
            backward_tolerance_px: 5.0,
            backward_angle_tolerance_rad: 1.0,
            edge_pan_margin_px: 10.0,
            pan_step_divisor: 10.0,
            marker_length_px: 15.0,
            marker_min_segment_px: 24.0,
            free_label_min_px: 40.0,
            guide_half_extent: 50.0,
            area_label_min_px: 60.0,
            dim_label_min_px: 65.0,
            total_label_min_px: 100.0,
            label_offset_px: 2.0,
        }
    }
}
