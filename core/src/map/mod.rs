pub mod classify;
pub mod marker;
pub mod proximity;
pub mod view;

pub use classify::{classify, SignalColor};
pub use marker::{CoverageCircle, MapMarker};
pub use proximity::{group, group_within, Group, Positioned, GROUPING_THRESHOLD_KM};
pub use view::{MapView, ViewRow};
