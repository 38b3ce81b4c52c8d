//! Geodetic math: local tangent-plane projection and great-circle helpers.
//!
//! The local projection is equirectangular around a single origin and is
//! only meaningful within a few kilometres of it. The great-circle
//! functions are independent of the origin and use a spherical Earth.

use serde::{Deserialize, Serialize};
use std::fmt;

pub const EARTH_RADIUS_M: f64 = 6_371_000.0;
pub const METERS_PER_DEG_LAT: f64 = 111_111.0;

/// Anchor of the local frame.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Origin {
    pub lat: f64,
    pub lon: f64,
    /// East conversion factor at the origin latitude.
    pub meters_per_deg_lon: f64,
}

impl Origin {
    pub fn new(lat: f64, lon: f64) -> Self {
        Self {
            lat,
            lon,
            meters_per_deg_lon: METERS_PER_DEG_LAT * lat.to_radians().cos(),
        }
    }
}

/// Converts between geodetic coordinates and a local east/north frame.
///
/// Until [`GeoProjector::set_origin`] is called every conversion returns
/// `(0.0, 0.0)` and logs a warning instead of failing.
#[derive(Debug, Clone, Default)]
pub struct GeoProjector {
    origin: Option<Origin>,
}

impl GeoProjector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a projector already anchored at `(lat, lon)`.
    pub fn with_origin(lat: f64, lon: f64) -> Self {
        let mut projector = Self::new();
        projector.set_origin(lat, lon);
        projector
    }

    pub fn set_origin(&mut self, lat: f64, lon: f64) {
        let origin = Origin::new(lat, lon);
        tracing::info!("Coordinate origin set to: {:.8}, {:.8}", lat, lon);
        tracing::info!(
            "Longitude conversion factor: {:.2} m/degree",
            origin.meters_per_deg_lon
        );
        self.origin = Some(origin);
    }

    pub fn is_origin_set(&self) -> bool {
        self.origin.is_some()
    }

    pub fn origin(&self) -> Option<Origin> {
        self.origin
    }

    /// Returns (meters per degree latitude, meters per degree longitude).
    pub fn conversion_factors(&self) -> (f64, Option<f64>) {
        (
            METERS_PER_DEG_LAT,
            self.origin.map(|origin| origin.meters_per_deg_lon),
        )
    }

    /// Project a geodetic point to local `(x east, y north)` meters.
    pub fn to_local(&self, lat: f64, lon: f64) -> (f64, f64) {
        let Some(origin) = self.origin else {
            tracing::warn!("Coordinate origin not set, returning (0, 0)");
            return (0.0, 0.0);
        };

        let y = (lat - origin.lat) * METERS_PER_DEG_LAT;
        let x = (lon - origin.lon) * origin.meters_per_deg_lon;
        (x, y)
    }

    /// Inverse of [`GeoProjector::to_local`].
    pub fn to_geodetic(&self, x: f64, y: f64) -> (f64, f64) {
        let Some(origin) = self.origin else {
            tracing::warn!("Coordinate origin not set, returning (0, 0)");
            return (0.0, 0.0);
        };

        let lat = origin.lat + y / METERS_PER_DEG_LAT;
        let lon = origin.lon + x / origin.meters_per_deg_lon;
        (lat, lon)
    }
}

impl fmt::Display for GeoProjector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.origin {
            Some(origin) => write!(f, "origin: {:.6}, {:.6}", origin.lat, origin.lon),
            None => write!(f, "origin: not set"),
        }
    }
}

/// Calculate distance between two points in meters (Haversine formula).
pub fn great_circle_distance(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let phi1 = lat1.to_radians();
    let phi2 = lat2.to_radians();
    let dphi = (lat2 - lat1).to_radians();
    let dlambda = (lon2 - lon1).to_radians();
    let a = (dphi / 2.0).sin().powi(2) + phi1.cos() * phi2.cos() * (dlambda / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_M * a.sqrt().atan2((1.0 - a).sqrt())
}

/// Initial bearing from point 1 to point 2 in degrees, 0 = north, clockwise.
pub fn bearing(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let phi1 = lat1.to_radians();
    let phi2 = lat2.to_radians();
    let dlambda = (lon2 - lon1).to_radians();

    let y = dlambda.sin() * phi2.cos();
    let x = phi1.cos() * phi2.sin() - phi1.sin() * phi2.cos() * dlambda.cos();

    let deg = y.atan2(x).to_degrees().rem_euclid(360.0);
    // rem_euclid can round up to exactly 360.0 for tiny negative inputs
    if deg >= 360.0 {
        0.0
    } else {
        deg
    }
}

/// Point reached after travelling `distance_m` from `(lat, lon)` on the
/// initial bearing `bearing_deg`.
pub fn destination(lat: f64, lon: f64, distance_m: f64, bearing_deg: f64) -> (f64, f64) {
    if distance_m.abs() <= f64::EPSILON {
        return (lat, lon);
    }

    let lat1 = lat.to_radians();
    let lon1 = lon.to_radians();
    let theta = bearing_deg.to_radians();
    let angular_distance = distance_m / EARTH_RADIUS_M;

    let sin_lat1 = lat1.sin();
    let cos_lat1 = lat1.cos();
    let sin_ad = angular_distance.sin();
    let cos_ad = angular_distance.cos();

    let sin_lat2 = sin_lat1 * cos_ad + cos_lat1 * sin_ad * theta.cos();
    let lat2 = sin_lat2.clamp(-1.0, 1.0).asin();

    let y = theta.sin() * sin_ad * cos_lat1;
    let x = cos_ad - sin_lat1 * sin_lat2;
    let mut lon2 = lon1 + y.atan2(x);
    lon2 =
        (lon2 + std::f64::consts::PI).rem_euclid(2.0 * std::f64::consts::PI) - std::f64::consts::PI;

    (lat2.to_degrees(), lon2.to_degrees())
}

/// Range check for geodetic input. Never clamps.
pub fn validate(lat: f64, lon: f64) -> bool {
    (-90.0..=90.0).contains(&lat) && (-180.0..=180.0).contains(&lon)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_local_projection_matches_known_offset() {
        let projector = GeoProjector::with_origin(24.0, 121.0);
        let (x, y) = projector.to_local(24.001, 121.001);

        let expected_x = 0.001 * 111_111.0 * 24.0_f64.to_radians().cos();
        assert!((x - expected_x).abs() < 1e-6);
        assert!((x - 101.5).abs() < 0.2, "x = {x}");
        assert!((y - 111.111).abs() < 1e-3, "y = {y}");
    }

    #[test]
    fn test_round_trip_near_origin() {
        let projector = GeoProjector::with_origin(24.0, 121.0);
        let (x, y) = projector.to_local(24.0123, 120.9876);
        let (lat, lon) = projector.to_geodetic(x, y);

        assert!((lat - 24.0123).abs() < 1e-9);
        assert!((lon - 120.9876).abs() < 1e-9);
    }

    #[test]
    fn test_unset_origin_degrades_to_zero() {
        let projector = GeoProjector::new();
        assert!(!projector.is_origin_set());
        assert_eq!(projector.to_local(24.0, 121.0), (0.0, 0.0));
        assert_eq!(projector.to_geodetic(100.0, 100.0), (0.0, 0.0));
        assert_eq!(projector.conversion_factors().1, None);
        assert_eq!(projector.to_string(), "origin: not set");
    }

    #[test]
    fn test_haversine_known_distance() {
        // ~111km between these points (1 degree latitude)
        let dist = great_circle_distance(0.0, 0.0, 1.0, 0.0);
        assert!((dist - 111_194.0).abs() < 100.0);
    }

    #[test]
    fn test_haversine_same_point() {
        let dist = great_circle_distance(24.0, 121.0, 24.0, 121.0);
        assert!(dist < 0.001);
    }

    #[test]
    fn test_bearing_cardinal_directions() {
        assert!(bearing(0.0, 0.0, 1.0, 0.0).abs() < 1e-9);
        assert!((bearing(0.0, 0.0, 0.0, 1.0) - 90.0).abs() < 1e-9);
        assert!((bearing(0.0, 0.0, -1.0, 0.0) - 180.0).abs() < 1e-9);
        assert!((bearing(0.0, 0.0, 0.0, -1.0) - 270.0).abs() < 1e-9);
    }

    #[test]
    fn test_destination_inverts_distance_and_bearing() {
        let (lat, lon) = destination(24.0, 121.0, 1_500.0, 37.0);
        let dist = great_circle_distance(24.0, 121.0, lat, lon);
        let brg = bearing(24.0, 121.0, lat, lon);

        assert!((dist - 1_500.0).abs() < 0.01, "dist = {dist}");
        assert!((brg - 37.0).abs() < 1e-6, "bearing = {brg}");
    }

    #[test]
    fn test_destination_zero_distance_is_identity() {
        assert_eq!(destination(24.0, 121.0, 0.0, 123.0), (24.0, 121.0));
    }

    #[test]
    fn test_validate_ranges() {
        assert!(validate(90.0, -180.0));
        assert!(validate(-90.0, 180.0));
        assert!(!validate(90.0001, 0.0));
        assert!(!validate(0.0, -180.5));
        assert!(!validate(f64::NAN, 0.0));
    }
}
