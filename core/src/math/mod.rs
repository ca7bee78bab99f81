pub mod geo;

pub use geo::{GeoHelper, EARTH_RADIUS_KM};
