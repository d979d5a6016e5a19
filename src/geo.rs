//! Great-circle distance helpers.

use crate::constants::EARTH_RADIUS_KM;
use crate::domain::Location;

/// Haversine distance between two points in kilometers.
///
/// All inputs in degrees.
pub fn haversine_km(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let dlat = (lat2 - lat1).to_radians();
    let dlon = (lon2 - lon1).to_radians();
    let lat1r = lat1.to_radians();
    let lat2r = lat2.to_radians();

    // Rounding can push `a` just past 1 for near-antipodal points
    let a = ((dlat / 2.0).sin().powi(2) + lat1r.cos() * lat2r.cos() * (dlon / 2.0).sin().powi(2))
        .clamp(0.0, 1.0);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());
    EARTH_RADIUS_KM * c
}

pub fn distance_between(a: &Location, b: &Location) -> f64 {
    haversine_km(a.lat, a.lon, b.lat, b.lon)
}
