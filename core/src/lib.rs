//! Core of the community radio-signal map.
//!
//! Records live in an external realtime store; this crate classifies them by
//! modulation, filters and sorts the table view, groups near-coincident
//! records into shared map markers, and casts rate-limited votes through the
//! store's atomic transaction.

pub mod catalog;
pub mod map;
pub mod math;
pub mod prelude;
pub mod record;
pub mod store;
pub mod telemetry;
pub mod votes;

pub use prelude::{Clock, ManualClock, SignalError, SignalResult, SystemClock};
