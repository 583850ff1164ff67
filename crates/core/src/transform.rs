//! Coordinate and distance boundary
//!
//! The engine consumes exactly two capabilities from the hosting map view: a
//! pixel-to-world transform for turning pointer positions into map
//! coordinates, and a distance primitive that is planar for local/projected
//! coordinate systems and geodetic for geographic ones. Both are narrow
//! traits so no coordinate-reference-system machinery leaks into the engine.

use crate::geometry::MapPoint;

/// Mean Earth radius in meters, used by the geodetic distance path
const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// Errors from the pixel-to-world boundary
///
/// A failed transform is never fatal to a session: the interaction adapter
/// drops the offending input sample and the session keeps its last good
/// state.
#[derive(Debug, thiserror::Error)]
pub enum TransformError {
    #[error("pixel ({x}, {y}) is outside the map extent")]
    OutsideMapExtent { x: f64, y: f64 },

    #[error("coordinate transform unavailable: {0}")]
    Unavailable(String),
}

pub type TransformResult<T> = Result<T, TransformError>;

/// Pixel-space to world-space conversion
pub trait PixelTransform {
    fn pixel_to_world(&self, pixel: MapPoint) -> TransformResult<MapPoint>;
}

/// Real-world distance between two world-space points, in meters
pub trait DistanceCalc {
    fn distance_meters(&self, a: MapPoint, b: MapPoint) -> f64;
}

/// Transform for local and projected coordinate systems
///
/// Maps pixels affinely onto a planar grid (pixel y grows down, world y grows
/// up) and measures with scaled Euclidean distance.
#[derive(Debug, Clone)]
pub struct PlanarTransform {
    /// World coordinate of pixel (0, 0)
    pub origin: MapPoint,

    /// World units covered by one pixel
    pub units_per_pixel: f64,

    /// Meters per world unit
    pub meters_per_unit: f64,

    /// Optional world-space bounds (min, max); pixels mapping outside fail
    pub extent: Option<(MapPoint, MapPoint)>,
}

impl PlanarTransform {
    /// Identity-scaled transform: one pixel per world unit, one meter per unit
    pub fn identity() -> Self {
        Self {
            origin: MapPoint::new(0.0, 0.0),
            units_per_pixel: 1.0,
            meters_per_unit: 1.0,
            extent: None,
        }
    }
}

impl PixelTransform for PlanarTransform {
    fn pixel_to_world(&self, pixel: MapPoint) -> TransformResult<MapPoint> {
        let world = MapPoint::new(
            self.origin.x + pixel.x * self.units_per_pixel,
            self.origin.y - pixel.y * self.units_per_pixel,
        );
        if let Some((min, max)) = self.extent {
            if world.x < min.x || world.x > max.x || world.y < min.y || world.y > max.y {
                return Err(TransformError::OutsideMapExtent {
                    x: pixel.x,
                    y: pixel.y,
                });
            }
        }
        Ok(world)
    }
}

impl DistanceCalc for PlanarTransform {
    fn distance_meters(&self, a: MapPoint, b: MapPoint) -> f64 {
        a.distance_to(b) * self.meters_per_unit
    }
}

/// Transform for geographic coordinate systems
///
/// World points are (longitude, latitude) in degrees. Pixels map linearly
/// from an anchor; distances are great-circle via the haversine formula.
#[derive(Debug, Clone)]
pub struct GeographicTransform {
    /// Lon/lat of pixel (0, 0)
    pub origin_lon_lat: MapPoint,

    /// Degrees covered by one pixel
    pub degrees_per_pixel: f64,
}

impl PixelTransform for GeographicTransform {
    fn pixel_to_world(&self, pixel: MapPoint) -> TransformResult<MapPoint> {
        let lon = self.origin_lon_lat.x + pixel.x * self.degrees_per_pixel;
        let lat = self.origin_lon_lat.y - pixel.y * self.degrees_per_pixel;
        if !(-90.0..=90.0).contains(&lat) {
            return Err(TransformError::OutsideMapExtent {
                x: pixel.x,
                y: pixel.y,
            });
        }
        Ok(MapPoint::new(lon, lat))
    }
}

impl DistanceCalc for GeographicTransform {
    fn distance_meters(&self, a: MapPoint, b: MapPoint) -> f64 {
        haversine_meters(a, b)
    }
}

/// Great-circle distance between two (longitude, latitude) points in degrees
pub fn haversine_meters(a: MapPoint, b: MapPoint) -> f64 {
    let lat1 = a.y.to_radians();
    let lat2 = b.y.to_radians();
    let dlat = (b.y - a.y).to_radians();
    let dlon = (b.x - a.x).to_radians();

    let h = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlon / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_M * h.sqrt().asin()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_planar_pixel_to_world_flips_y() {
        let transform = PlanarTransform {
            origin: MapPoint::new(100.0, 200.0),
            units_per_pixel: 2.0,
            meters_per_unit: 1.0,
            extent: None,
        };
        let world = transform.pixel_to_world(MapPoint::new(10.0, 10.0)).unwrap();
        assert_eq!(world, MapPoint::new(120.0, 180.0));
    }

    #[test]
    fn test_planar_extent_rejects_outside_pixels() {
        let transform = PlanarTransform {
            origin: MapPoint::new(0.0, 0.0),
            units_per_pixel: 1.0,
            meters_per_unit: 1.0,
            extent: Some((MapPoint::new(-10.0, -10.0), MapPoint::new(10.0, 10.0))),
        };
        assert!(transform.pixel_to_world(MapPoint::new(5.0, 5.0)).is_ok());
        assert!(matches!(
            transform.pixel_to_world(MapPoint::new(50.0, 0.0)),
            Err(TransformError::OutsideMapExtent { .. })
        ));
    }

    #[test]
    fn test_planar_distance_scales_to_meters() {
        let transform = PlanarTransform {
            origin: MapPoint::new(0.0, 0.0),
            units_per_pixel: 1.0,
            meters_per_unit: 0.5,
            extent: None,
        };
        let d = transform.distance_meters(MapPoint::new(0.0, 0.0), MapPoint::new(6.0, 8.0));
        assert!((d - 5.0).abs() < 1e-12);
    }

    #[test]
    fn test_haversine_equator_degree() {
        // One degree of longitude at the equator is roughly 111.2 km.
        let d = haversine_meters(MapPoint::new(0.0, 0.0), MapPoint::new(1.0, 0.0));
        assert!((d - 111_195.0).abs() < 100.0);
    }

    #[test]
    fn test_haversine_zero_distance() {
        let p = MapPoint::new(12.5, 41.9);
        assert_eq!(haversine_meters(p, p), 0.0);
    }

    #[test]
    fn test_geographic_rejects_polar_overflow() {
        let transform = GeographicTransform {
            origin_lon_lat: MapPoint::new(0.0, 89.0),
            degrees_per_pixel: 1.0,
        };
        assert!(transform.pixel_to_world(MapPoint::new(0.0, -5.0)).is_err());
    }
}
