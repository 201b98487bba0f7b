//! Geo primitives: distance math and coordinate bucketing.
//!
//! Everything downstream (radius control, clustering, proximity counts)
//! goes through these functions, so coordinate validation lives here too.

use serde::{Deserialize, Serialize};

/// Bucket resolution for clustering: 3 decimal places, ~110m at the equator.
pub const BUCKET_DECIMALS: f64 = 1000.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lng: f64,
}

impl GeoPoint {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    /// Both components finite and within geographic bounds.
    /// Anything else is excluded from the pipeline rather than fed to the
    /// distance math (NaN poisons every comparison downstream).
    pub fn is_valid(&self) -> bool {
        self.lat.is_finite()
            && self.lng.is_finite()
            && (-90.0..=90.0).contains(&self.lat)
            && (-180.0..=180.0).contains(&self.lng)
    }
}

/// Haversine great-circle distance between two lat/lng points in kilometers.
pub fn haversine_km(lat1: f64, lng1: f64, lat2: f64, lng2: f64) -> f64 {
    const EARTH_RADIUS_KM: f64 = 6371.0;
    let d_lat = (lat2 - lat1).to_radians();
    let d_lng = (lng2 - lng1).to_radians();
    let lat1_r = lat1.to_radians();
    let lat2_r = lat2.to_radians();

    let a = (d_lat / 2.0).sin().powi(2) + lat1_r.cos() * lat2_r.cos() * (d_lng / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().asin();
    EARTH_RADIUS_KM * c
}

/// Haversine distance in meters.
pub fn haversine_m(a: GeoPoint, b: GeoPoint) -> f64 {
    haversine_km(a.lat, a.lng, b.lat, b.lng) * 1000.0
}

/// Distance between two points in kilometers.
pub fn distance_km(a: GeoPoint, b: GeoPoint) -> f64 {
    haversine_km(a.lat, a.lng, b.lat, b.lng)
}

/// Coordinate bucket key at 3-decimal resolution.
///
/// Returns `None` for invalid coordinates so malformed items fall out of
/// clustering instead of crashing it.
pub fn bucket_key(point: GeoPoint) -> Option<(i64, i64)> {
    if !point.is_valid() {
        return None;
    }
    Some((
        (point.lat * BUCKET_DECIMALS).round() as i64,
        (point.lng * BUCKET_DECIMALS).round() as i64,
    ))
}

/// The centroid a bucket key represents, for rendering the cluster marker.
pub fn bucket_center(key: (i64, i64)) -> GeoPoint {
    GeoPoint {
        lat: key.0 as f64 / BUCKET_DECIMALS,
        lng: key.1 as f64 / BUCKET_DECIMALS,
    }
}
