use crate::record::GeoPoint;

/// Mean earth radius used by the spherical approximation.
pub const EARTH_RADIUS_KM: f64 = 6371.0;

pub struct GeoHelper;

impl GeoHelper {
    /// Great-circle distance in kilometres (haversine).
    pub fn haversine_km(a: GeoPoint, b: GeoPoint) -> f64 {
        let d_lat = (b.lat - a.lat).to_radians();
        let d_lon = (b.lon - a.lon).to_radians();
        let h = (d_lat / 2.0).sin().powi(2)
            + a.lat.to_radians().cos() * b.lat.to_radians().cos() * (d_lon / 2.0).sin().powi(2);
        EARTH_RADIUS_KM * 2.0 * h.sqrt().atan2((1.0 - h).sqrt())
    }

    /// Distance between two optional positions; an unset side is infinitely far.
    pub fn distance_km(a: Option<GeoPoint>, b: Option<GeoPoint>) -> f64 {
        match (a, b) {
            (Some(a), Some(b)) => Self::haversine_km(a, b),
            _ => f64::INFINITY,
        }
    }
}
