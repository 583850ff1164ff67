//! CSV export for measured shapes
//!
//! Writes one row per shape with raw metric values alongside the formatted
//! readouts, for reporting and integration with external tools.

use std::io::Write;

use crate::collection::{ShapeKind, ShapeMeasurement};
use crate::units::UnitFormat;

/// Error types for CSV export
#[derive(Debug, thiserror::Error)]
pub enum CsvExportError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV serialization error: {0}")]
    Csv(#[from] csv::Error),
}

pub type CsvExportResult<T> = Result<T, CsvExportError>;

/// Configuration for CSV export
#[derive(Debug, Clone)]
pub struct CsvExportConfig {
    /// Include column headers in the output
    pub include_headers: bool,

    /// CSV delimiter character
    pub delimiter: u8,

    /// Include shapes that are still in progress
    pub include_unfinalized: bool,
}

impl Default for CsvExportConfig {
    fn default() -> Self {
        Self {
            include_headers: true,
            delimiter: b',',
            include_unfinalized: false,
        }
    }
}

/// Export measurement summaries to CSV
///
/// CSV columns:
/// - ID: Unique shape identifier
/// - Kind: dimension or free
/// - Points: Number of confirmed coordinates
/// - Length (m): Raw measured length in meters
/// - Length: Formatted length in the display unit system
/// - Area (m²): Raw enclosed area, empty for open shapes
/// - Area: Formatted area, empty for open shapes
/// - Closed: Whether the shape forms a ring
pub fn export_measurements_csv<W: Write>(
    writer: W,
    measurements: &[ShapeMeasurement],
    units: UnitFormat,
    config: &CsvExportConfig,
) -> CsvExportResult<()> {
    let mut csv_writer = csv::WriterBuilder::new()
        .delimiter(config.delimiter)
        .has_headers(false)
        .from_writer(writer);

    if config.include_headers {
        csv_writer.write_record([
            "ID",
            "Kind",
            "Points",
            "Length (m)",
            "Length",
            "Area (m²)",
            "Area",
            "Closed",
        ])?;
    }

    for measurement in measurements {
        if !config.include_unfinalized && !measurement.finalized {
            continue;
        }
        let kind = match measurement.kind {
            ShapeKind::Dimension => "dimension",
            ShapeKind::Free => "free",
        };
        let (raw_area, formatted_area) = match measurement.area_square_meters {
            Some(area) => (format!("{area:.3}"), units.format_area(area)),
            None => (String::new(), String::new()),
        };
        csv_writer.write_record([
            measurement.id.to_string(),
            kind.to_string(),
            measurement.point_count.to_string(),
            format!("{:.3}", measurement.length_meters),
            units.format_length(measurement.length_meters),
            raw_area,
            formatted_area,
            measurement.closed.to_string(),
        ])?;
    }

    csv_writer.flush()?;
    Ok(())
}
