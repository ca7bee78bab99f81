use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use super::cooldown::CooldownTracker;
use crate::record::{SignalId, Votes};
use crate::store::{SignalStore, StoreError};
use crate::telemetry::MetricsRecorder;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VoteDirection {
    Up,
    Down,
}

impl FromStr for VoteDirection {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_lowercase().as_str() {
            "up" => Ok(Self::Up),
            "down" => Ok(Self::Down),
            other => Err(format!("vote direction must be up or down, got {other:?}")),
        }
    }
}

impl fmt::Display for VoteDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            VoteDirection::Up => "up",
            VoteDirection::Down => "down",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VoteOutcome {
    Accepted { votes: Votes },
    /// Refused by the cooldown before reaching the store.
    Rejected { remaining: Duration },
}

impl VoteOutcome {
    pub fn notice(&self) -> String {
        match self {
            VoteOutcome::Accepted { votes } => {
                format!("Vote recorded: {} up / {} down", votes.up, votes.down)
            }
            VoteOutcome::Rejected { remaining } => format!(
                "You already voted on this signal. Try again in {} s.",
                remaining.as_secs().max(1)
            ),
        }
    }
}

#[derive(thiserror::Error, Debug)]
pub enum VoteError {
    #[error("vote not stored: {0}")]
    Store(#[from] StoreError),
}

/// Casts rate-limited votes through the store's atomic transaction.
pub struct VoteCounter {
    store: Arc<dyn SignalStore>,
    cooldown: CooldownTracker,
    metrics: Arc<MetricsRecorder>,
}

impl VoteCounter {
    pub fn new(
        store: Arc<dyn SignalStore>,
        cooldown: CooldownTracker,
        metrics: Arc<MetricsRecorder>,
    ) -> Self {
        Self {
            store,
            cooldown,
            metrics,
        }
    }

    pub fn vote(&self, id: &SignalId, direction: VoteDirection) -> Result<VoteOutcome, VoteError> {
        if let Some(remaining) = self.cooldown.remaining(id) {
            self.metrics.record_vote_rejected();
            info!(
                "vote {} on {} refused, cooldown has {:?} left",
                direction, id, remaining
            );
            return Ok(VoteOutcome::Rejected { remaining });
        }

        let tx = self
            .store
            .transact(id, &mut |current: Option<Votes>| {
                current.unwrap_or_default().incremented(direction)
            })
            .map_err(|err| {
                self.metrics.record_store_error();
                warn!("vote {} on {} failed: {}", direction, id, err);
                err
            })?;

        // The vote is committed; losing the cooldown entry only weakens spam protection.
        if let Err(err) = self.cooldown.record(id) {
            warn!("cooldown for {} not saved: {}", id, err);
        }
        self.metrics.record_vote_accepted(tx.attempts.saturating_sub(1));
        info!(
            "vote {} on {} -> {} up / {} down",
            direction, id, tx.votes.up, tx.votes.down
        );
        Ok(VoteOutcome::Accepted { votes: tx.votes })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prelude::{Clock, ManualClock};
    use crate::record::NewSignal;
    use crate::store::MemoryStore;
    use crate::votes::cooldown::DEFAULT_COOLDOWN;
    use crate::votes::storage::MemoryStorage;

    struct Fixture {
        clock: ManualClock,
        store: Arc<MemoryStore>,
        metrics: Arc<MetricsRecorder>,
        counter: VoteCounter,
        id: SignalId,
    }

    fn fixture() -> Fixture {
        let clock = ManualClock::new(1_700_000_000_000);
        let store = Arc::new(MemoryStore::new(Arc::new(clock.clone())));
        let id = store
            .insert(NewSignal {
                frequency: 439.1,
                city: "Praha".into(),
                description: String::new(),
                kind: "DMR".into(),
                color: None,
                lat: 50.0,
                lon: 14.0,
                radius_km: None,
                timestamp: clock.now_millis(),
            })
            .unwrap();
        let metrics = Arc::new(MetricsRecorder::new());
        let cooldown = CooldownTracker::new(
            Arc::new(MemoryStorage::new()),
            Arc::new(clock.clone()),
            DEFAULT_COOLDOWN,
        );
        let counter = VoteCounter::new(store.clone(), cooldown, metrics.clone());
        Fixture {
            clock,
            store,
            metrics,
            counter,
            id,
        }
    }

    #[test]
    fn first_vote_initializes_counts() {
        let f = fixture();
        let outcome = f.counter.vote(&f.id, VoteDirection::Up).unwrap();
        assert_eq!(
            outcome,
            VoteOutcome::Accepted {
                votes: Votes { up: 1, down: 0 }
            }
        );
        assert_eq!(f.store.get(&f.id).unwrap().votes, Some(Votes { up: 1, down: 0 }));
    }

    #[test]
    fn vote_inside_cooldown_is_rejected_without_store_change() {
        let f = fixture();
        f.counter.vote(&f.id, VoteDirection::Up).unwrap();
        f.clock.advance(5_000);

        let outcome = f.counter.vote(&f.id, VoteDirection::Down).unwrap();
        assert_eq!(
            outcome,
            VoteOutcome::Rejected {
                remaining: Duration::from_secs(25)
            }
        );
        assert!(outcome.notice().contains("25 s"));
        assert_eq!(f.store.get(&f.id).unwrap().votes(), Votes { up: 1, down: 0 });
        assert_eq!(f.metrics.snapshot().votes_rejected, 1);
    }

    #[test]
    fn vote_after_cooldown_increments_again() {
        let f = fixture();
        f.counter.vote(&f.id, VoteDirection::Up).unwrap();
        f.clock.advance(30_000);
        let outcome = f.counter.vote(&f.id, VoteDirection::Up).unwrap();
        assert_eq!(
            outcome,
            VoteOutcome::Accepted {
                votes: Votes { up: 2, down: 0 }
            }
        );
        assert_eq!(f.metrics.snapshot().votes_accepted, 2);
    }

    #[test]
    fn store_failure_does_not_start_cooldown() {
        let f = fixture();
        let missing = SignalId::new("missing");
        assert!(matches!(
            f.counter.vote(&missing, VoteDirection::Up),
            Err(VoteError::Store(StoreError::UnknownId(_)))
        ));
        assert_eq!(f.metrics.snapshot().store_errors, 1);
        // still not rate-limited for that id
        assert!(matches!(
            f.counter.vote(&missing, VoteDirection::Up),
            Err(VoteError::Store(_))
        ));
    }

    #[test]
    fn direction_parses() {
        assert_eq!("UP".parse::<VoteDirection>(), Ok(VoteDirection::Up));
        assert!("sideways".parse::<VoteDirection>().is_err());
    }
}
