//! Geographic proximity via haversine distance.

use sentra_core::config::defaults::EARTH_RADIUS_METERS;
use sentra_core::models::EntityRef;

/// Great-circle distance between two coordinates, in meters.
pub fn haversine_meters(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let phi1 = lat1.to_radians();
    let phi2 = lat2.to_radians();
    let d_phi = (lat2 - lat1).to_radians();
    let d_lambda = (lon2 - lon1).to_radians();

    let a = (d_phi / 2.0).sin().powi(2)
        + phi1.cos() * phi2.cos() * (d_lambda / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());
    EARTH_RADIUS_METERS * c
}

/// Score = 1 − d / radius within the radius; `None` outside it or when
/// either entity lacks coordinates.
pub fn geographic_score(a: &EntityRef, b: &EntityRef, radius_meters: f64) -> Option<f64> {
    if radius_meters <= 0.0 {
        return None;
    }
    let (lat1, lon1) = (a.latitude?, a.longitude?);
    let (lat2, lon2) = (b.latitude?, b.longitude?);
    let distance = haversine_meters(lat1, lon1, lat2, lon2);
    if distance > radius_meters {
        return None;
    }
    Some(1.0 - distance / radius_meters)
}
