//! Spatial math for distances, projection and ring sampling.

use crate::models::Coordinate;

/// Mean Earth radius used for great-circle distances.
pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// Equatorial radius used when projecting sampling points outward.
pub const PROJECTION_RADIUS_M: f64 = 6_378_137.0;

/// Calculate distance between two points in meters using Haversine formula.
///
/// # Arguments
/// * `lat1`, `lon1` - First point coordinates in decimal degrees
/// * `lat2`, `lon2` - Second point coordinates in decimal degrees
///
/// # Returns
/// Distance in meters
pub fn haversine_distance(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let phi1 = lat1.to_radians();
    let phi2 = lat2.to_radians();
    let dphi = (lat2 - lat1).to_radians();
    let dlambda = (lon2 - lon1).to_radians();
    let a = (dphi / 2.0).sin().powi(2) + phi1.cos() * phi2.cos() * (dlambda / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_M * a.sqrt().atan2((1.0 - a).sqrt())
}

/// Great-circle distance between two coordinates in meters.
pub fn distance_m(a: Coordinate, b: Coordinate) -> f64 {
    haversine_distance(a.lat, a.lon, b.lat, b.lon)
}

/// Distance that treats unusable coordinates as infinitely far away.
pub fn distance_or_inf(a: Coordinate, b: Coordinate) -> f64 {
    if !a.is_valid() || !b.is_valid() {
        return f64::INFINITY;
    }
    let d = distance_m(a, b);
    if d.is_finite() {
        d
    } else {
        f64::INFINITY
    }
}

/// Project a point `distance_m` away from `origin` along `bearing_deg`.
///
/// Uses a sphere of radius [`PROJECTION_RADIUS_M`]. The resulting longitude is
/// normalized to [-180, 180).
pub fn destination_point(origin: Coordinate, distance_m: f64, bearing_deg: f64) -> Coordinate {
    if distance_m.abs() <= f64::EPSILON {
        return origin;
    }

    let lat1 = origin.lat.to_radians();
    let lon1 = origin.lon.to_radians();
    let bearing_rad = bearing_deg.to_radians();
    let angular_distance = distance_m / PROJECTION_RADIUS_M;

    let sin_lat1 = lat1.sin();
    let cos_lat1 = lat1.cos();
    let sin_ad = angular_distance.sin();
    let cos_ad = angular_distance.cos();

    let sin_lat2 = sin_lat1 * cos_ad + cos_lat1 * sin_ad * bearing_rad.cos();
    let lat2 = sin_lat2.clamp(-1.0, 1.0).asin();

    let y = bearing_rad.sin() * sin_ad * cos_lat1;
    let x = cos_ad - sin_lat1 * sin_lat2;
    let mut lon2 = lon1 + y.atan2(x);
    lon2 =
        (lon2 + std::f64::consts::PI).rem_euclid(2.0 * std::f64::consts::PI) - std::f64::consts::PI;

    Coordinate::new(lat2.to_degrees(), lon2.to_degrees())
}

/// A sampling point on a ring around a center.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RingPoint {
    pub coord: Coordinate,
    pub radius_m: f64,
    pub bearing_deg: f64,
}

/// Evenly spaced bearings `360 * i / count` for `i` in `0..count`.
pub fn ring_bearings(count: usize) -> Vec<f64> {
    (0..count)
        .map(|i| 360.0 * i as f64 / count as f64)
        .collect()
}

/// Points at `radius_m` around `center`, one per bearing, in bearing order.
pub fn ring_points(center: Coordinate, radius_m: f64, count: usize) -> Vec<RingPoint> {
    ring_bearings(count)
        .into_iter()
        .map(|bearing_deg| RingPoint {
            coord: destination_point(center, radius_m, bearing_deg),
            radius_m,
            bearing_deg,
        })
        .collect()
}
