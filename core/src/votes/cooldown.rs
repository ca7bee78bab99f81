use std::sync::Arc;
use std::time::Duration;

use super::storage::LocalStorage;
use crate::prelude::Clock;
use crate::record::SignalId;
use crate::store::StoreResult;

pub const DEFAULT_COOLDOWN: Duration = Duration::from_secs(30);

/// Per-device minimum spacing between votes on the same record.
///
/// Anti-spam only: the state lives on the voter's device and is trivially
/// reset, so nothing may rely on it for integrity.
pub struct CooldownTracker {
    storage: Arc<dyn LocalStorage>,
    clock: Arc<dyn Clock>,
    window: Duration,
}

impl CooldownTracker {
    pub fn new(storage: Arc<dyn LocalStorage>, clock: Arc<dyn Clock>, window: Duration) -> Self {
        Self {
            storage,
            clock,
            window,
        }
    }

    fn key(id: &SignalId) -> String {
        format!("lastVote_{}", id)
    }

    /// Time left before `id` may be voted on again, if any.
    pub fn remaining(&self, id: &SignalId) -> Option<Duration> {
        let last: i64 = self.storage.get(&Self::key(id))?.parse().ok()?;
        // the stamp comes from device state and may hold any i64
        let elapsed = self.clock.now_millis().saturating_sub(last).max(0) as u128;
        let window = self.window.as_millis();
        (elapsed < window).then(|| Duration::from_millis((window - elapsed) as u64))
    }

    pub fn record(&self, id: &SignalId) -> StoreResult<()> {
        self.storage
            .set(&Self::key(id), self.clock.now_millis().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prelude::ManualClock;
    use crate::votes::storage::MemoryStorage;

    #[test]
    fn window_opens_after_expiry() {
        let clock = ManualClock::new(10_000);
        let tracker = CooldownTracker::new(
            Arc::new(MemoryStorage::new()),
            Arc::new(clock.clone()),
            DEFAULT_COOLDOWN,
        );
        let id = SignalId::new("a");
        assert_eq!(tracker.remaining(&id), None);

        tracker.record(&id).unwrap();
        clock.advance(12_000);
        assert_eq!(tracker.remaining(&id), Some(Duration::from_secs(18)));

        clock.advance(18_000);
        assert_eq!(tracker.remaining(&id), None);
    }

    #[test]
    fn records_are_tracked_independently() {
        let clock = ManualClock::new(0);
        let tracker = CooldownTracker::new(
            Arc::new(MemoryStorage::new()),
            Arc::new(clock),
            DEFAULT_COOLDOWN,
        );
        tracker.record(&SignalId::new("a")).unwrap();
        assert!(tracker.remaining(&SignalId::new("a")).is_some());
        assert!(tracker.remaining(&SignalId::new("b")).is_none());
    }

    #[test]
    fn garbage_state_does_not_block() {
        let storage = Arc::new(MemoryStorage::new());
        storage.set("lastVote_a", "yesterday".into()).unwrap();
        let tracker =
            CooldownTracker::new(storage, Arc::new(ManualClock::new(0)), DEFAULT_COOLDOWN);
        assert!(tracker.remaining(&SignalId::new("a")).is_none());
    }

    #[test]
    fn extreme_stamps_do_not_overflow() {
        let storage = Arc::new(MemoryStorage::new());
        storage.set("lastVote_old", i64::MIN.to_string()).unwrap();
        storage.set("lastVote_future", i64::MAX.to_string()).unwrap();
        let tracker = CooldownTracker::new(
            storage,
            Arc::new(ManualClock::new(1_700_000_000_000)),
            DEFAULT_COOLDOWN,
        );
        assert_eq!(tracker.remaining(&SignalId::new("old")), None);
        assert_eq!(
            tracker.remaining(&SignalId::new("future")),
            Some(DEFAULT_COOLDOWN)
        );
    }
}
