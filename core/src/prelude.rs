use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;

pub use crate::record::{GeoPoint, NewSignal, Signal, SignalDraft, SignalId, Votes};
pub use crate::store::{SignalStore, Snapshot, StoreError, StoreResult};
pub use crate::votes::{VoteCounter, VoteDirection, VoteError, VoteOutcome};

/// Errors raised while turning user input into a record.
#[derive(thiserror::Error, Debug)]
pub enum SignalError {
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("store failure: {0}")]
    Store(#[from] StoreError),
}

pub type SignalResult<T> = Result<T, SignalError>;

/// Source of wall-clock time in milliseconds since the Unix epoch.
pub trait Clock: Send + Sync {
    fn now_millis(&self) -> i64;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_millis(&self) -> i64 {
        chrono::Utc::now().timestamp_millis()
    }
}

/// Clock that only moves when told to. Clones share the same time.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    millis: Arc<AtomicI64>,
}

impl ManualClock {
    pub fn new(millis: i64) -> Self {
        Self {
            millis: Arc::new(AtomicI64::new(millis)),
        }
    }

    pub fn set(&self, millis: i64) {
        self.millis.store(millis, Ordering::SeqCst);
    }

    pub fn advance(&self, delta_millis: i64) {
        self.millis.fetch_add(delta_millis, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now_millis(&self) -> i64 {
        self.millis.load(Ordering::SeqCst)
    }
}
