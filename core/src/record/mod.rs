pub mod draft;
pub mod lenient;
pub mod signal;

pub use draft::{clamp_radius, SignalDraft, DEFAULT_RADIUS_KM, MAX_RADIUS_KM, MIN_RADIUS_KM};
pub use signal::{GeoPoint, NewSignal, Signal, SignalId, Votes};
