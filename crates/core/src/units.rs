//! Length and area formatting
//!
//! Raw measured values are always meters (or square meters); the unit format
//! renders them in the active unit system's preferred display unit, switching
//! magnitude where a human would (m to km, ft to mi).

const FEET_PER_METER: f64 = 3.280_839_895;
const FEET_PER_MILE: f64 = 5280.0;

/// Supported display unit systems
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnitSystem {
    Metric,
    Imperial,
}

/// Formatting settings for measurement labels and status text
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct UnitFormat {
    pub system: UnitSystem,
    /// Decimal places in rendered values
    pub precision: usize,
}

impl Default for UnitFormat {
    fn default() -> Self {
        Self {
            system: UnitSystem::Metric,
            precision: 2,
        }
    }
}

impl UnitFormat {
    pub fn new(system: UnitSystem, precision: usize) -> Self {
        Self { system, precision }
    }

    /// Render a length given in meters
    pub fn format_length(&self, meters: f64) -> String {
        let p = self.precision;
        match self.system {
            UnitSystem::Metric => {
                if meters.abs() < 1000.0 {
                    format!("{meters:.p$} m")
                } else {
                    format!("{:.p$} km", meters / 1000.0)
                }
            }
            UnitSystem::Imperial => {
                let feet = meters * FEET_PER_METER;
                if feet.abs() < FEET_PER_MILE {
                    format!("{feet:.p$} ft")
                } else {
                    format!("{:.p$} mi", feet / FEET_PER_MILE)
                }
            }
        }
    }

    /// Render an area given in square meters
    pub fn format_area(&self, square_meters: f64) -> String {
        let p = self.precision;
        match self.system {
            UnitSystem::Metric => {
                if square_meters.abs() < 1_000_000.0 {
                    format!("{square_meters:.p$} m²")
                } else {
                    format!("{:.p$} km²", square_meters / 1_000_000.0)
                }
            }
            UnitSystem::Imperial => {
                let sq_feet = square_meters * FEET_PER_METER * FEET_PER_METER;
                let sq_feet_per_sq_mile = FEET_PER_MILE * FEET_PER_MILE;
                if sq_feet.abs() < sq_feet_per_sq_mile {
                    format!("{sq_feet:.p$} ft²")
                } else {
                    format!("{:.p$} mi²", sq_feet / sq_feet_per_sq_mile)
                }
            }
        }
    }
}
