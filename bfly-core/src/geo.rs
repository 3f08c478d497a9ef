/// Geodesic and planar position math for monitoring points
use serde::{Deserialize, Serialize};

/// Earth radius in meters (spherical model)
const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// A WGS84 geographic coordinate.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    /// Latitude in decimal degrees
    pub lat: f64,
    /// Longitude in decimal degrees
    pub lon: f64,
}

impl GeoPoint {
    pub fn new(lat: f64, lon: f64) -> Self {
        GeoPoint { lat, lon }
    }

    /// Haversine distance to another point in meters.
    pub fn distance_to(&self, other: &GeoPoint) -> f64 {
        let d_lat = (other.lat - self.lat).to_radians();
        let d_lon = (other.lon - self.lon).to_radians();
        let lat1 = self.lat.to_radians();
        let lat2 = other.lat.to_radians();
        let a = (d_lat / 2.0).sin().powi(2)
            + lat1.cos() * lat2.cos() * (d_lon / 2.0).sin().powi(2);
        let c = 2.0 * a.sqrt().asin();
        EARTH_RADIUS_M * c
    }

    /// Initial bearing towards another point, in radians from north.
    pub fn bearing_to(&self, other: &GeoPoint) -> f64 {
        let lat1 = self.lat.to_radians();
        let lat2 = other.lat.to_radians();
        let d_lon = (other.lon - self.lon).to_radians();
        let y = d_lon.sin() * lat2.cos();
        let x = lat1.cos() * lat2.sin() - lat1.sin() * lat2.cos() * d_lon.cos();
        y.atan2(x)
    }

    /// Destination point after travelling `distance_m` meters along
    /// `bearing_rad` on the great circle.
    pub fn destination(&self, bearing_rad: f64, distance_m: f64) -> GeoPoint {
        let angular = distance_m / EARTH_RADIUS_M;
        let lat1 = self.lat.to_radians();
        let lon1 = self.lon.to_radians();
        let lat2 = (lat1.sin() * angular.cos()
            + lat1.cos() * angular.sin() * bearing_rad.cos())
        .asin();
        let lon2 = lon1
            + (bearing_rad.sin() * angular.sin() * lat1.cos())
                .atan2(angular.cos() - lat1.sin() * lat2.sin());
        GeoPoint {
            lat: lat2.to_degrees(),
            lon: lon2.to_degrees(),
        }
    }

    /// Geodesic midpoint: halfway along the bearing towards `other`.
    pub fn midpoint_to(&self, other: &GeoPoint) -> GeoPoint {
        let distance = self.distance_to(other);
        if distance == 0.0 {
            return *self;
        }
        let bearing = self.bearing_to(other);
        self.destination(bearing, distance / 2.0)
    }
}

/// A planar projected position used for metric distance work.
///
/// The projection itself is a loader concern; the core only consumes the
/// projected values.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PlanarPosition {
    pub x: f64,
    pub y: f64,
    pub z: Option<f64>,
}

impl PlanarPosition {
    pub fn new(x: f64, y: f64, z: Option<f64>) -> Self {
        PlanarPosition { x, y, z }
    }

    /// Planar (X/Y) distance to another position.
    pub fn plane_distance_to(&self, other: &PlanarPosition) -> f64 {
        (other.x - self.x).hypot(other.y - self.y)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_haversine_known_distance() {
        // Paris to London, roughly 344 km
        let paris = GeoPoint::new(48.8566, 2.3522);
        let london = GeoPoint::new(51.5074, -0.1278);
        let distance = paris.distance_to(&london);
        assert!((distance - 344_000.0).abs() < 5_000.0);
    }

    #[test]
    fn test_midpoint_lies_between() {
        let a = GeoPoint::new(45.0, 7.0);
        let b = GeoPoint::new(45.0, 7.001);
        let mid = a.midpoint_to(&b);
        assert!((mid.lat - 45.0).abs() < 1e-6);
        assert!(mid.lon > a.lon && mid.lon < b.lon);
    }

    #[test]
    fn test_midpoint_of_identical_points() {
        let a = GeoPoint::new(45.0, 7.0);
        let mid = a.midpoint_to(&a);
        assert_eq!(mid, a);
    }

    #[test]
    fn test_plane_distance() {
        let a = PlanarPosition::new(0.0, 0.0, None);
        let b = PlanarPosition::new(3.0, 4.0, None);
        assert!((a.plane_distance_to(&b) - 5.0).abs() < 1e-12);
    }
}
