use anyhow::Context;
use log::warn;
use sigmapcore::catalog::{FilterCriteria, SortState};
use sigmapcore::map::{CoverageCircle, MapView};
use sigmapcore::record::{NewSignal, SignalDraft, SignalId};
use sigmapcore::store::{MemoryStore, SignalStore, StoreResult};
use sigmapcore::telemetry::MetricsRecorder;
use sigmapcore::votes::{CooldownTracker, LocalStorage, VoteCounter};
use sigmapcore::{Clock, SignalResult, SystemClock};
use std::sync::Arc;
use std::time::Duration;

use crate::workflow::config::AppConfig;

/// Wires the store, clock and counters behind the operations the CLI and
/// the HTTP bridge expose.
#[derive(Clone)]
pub struct Runner {
    config: AppConfig,
    store: Arc<dyn SignalStore>,
    clock: Arc<dyn Clock>,
    metrics: Arc<MetricsRecorder>,
}

impl Runner {
    pub fn new(config: AppConfig, store: Arc<dyn SignalStore>, clock: Arc<dyn Clock>) -> Self {
        Self {
            config,
            store,
            clock,
            metrics: Arc::new(MetricsRecorder::new()),
        }
    }

    /// Runner over the file-backed store named in the config.
    pub fn open(config: AppConfig) -> anyhow::Result<Self> {
        let clock: Arc<dyn Clock> = Arc::new(SystemClock);
        let store = MemoryStore::open(&config.store_path, clock.clone())
            .with_context(|| format!("opening store {}", config.store_path.display()))?;
        Ok(Self::new(config, Arc::new(store), clock))
    }

    #[cfg(test)]
    pub fn in_memory(config: AppConfig, clock: Arc<dyn Clock>) -> Self {
        let store = MemoryStore::new(clock.clone());
        Self::new(config, Arc::new(store), clock)
    }

    #[cfg(test)]
    pub fn store(&self) -> &Arc<dyn SignalStore> {
        &self.store
    }

    pub fn clock(&self) -> &Arc<dyn Clock> {
        &self.clock
    }

    pub fn cooldown(&self) -> Duration {
        self.config.cooldown()
    }

    pub fn metrics(&self) -> &Arc<MetricsRecorder> {
        &self.metrics
    }

    pub fn insert(&self, signal: NewSignal) -> StoreResult<SignalId> {
        match self.store.insert(signal) {
            Ok(id) => {
                self.metrics.record_insert();
                Ok(id)
            }
            Err(err) => {
                self.metrics.record_store_error();
                warn!("insert failed: {}", err);
                Err(err)
            }
        }
    }

    pub fn submit(&self, draft: SignalDraft) -> SignalResult<SignalId> {
        let signal = draft.into_new_signal(self.clock.as_ref())?;
        Ok(self.insert(signal)?)
    }

    pub fn view(&self, criteria: &FilterCriteria, sort: SortState) -> MapView {
        let snapshot = self.store.subscribe().borrow().clone();
        MapView::derive(&snapshot, criteria, sort)
    }

    pub fn coverage(&self, id: &SignalId) -> StoreResult<Option<CoverageCircle>> {
        Ok(CoverageCircle::for_signal(&self.store.get(id)?))
    }

    /// Vote counter for one device, whose cooldown state lives in `storage`.
    pub fn vote_counter(&self, storage: Arc<dyn LocalStorage>) -> VoteCounter {
        let cooldown = CooldownTracker::new(storage, self.clock.clone(), self.config.cooldown());
        VoteCounter::new(self.store.clone(), cooldown, self.metrics.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sigmapcore::catalog::SortColumn;
    use sigmapcore::votes::{MemoryStorage, VoteDirection, VoteOutcome};
    use sigmapcore::ManualClock;
    use sigmapcore::SignalError;

    fn runner() -> (Runner, ManualClock) {
        let clock = ManualClock::new(1_700_000_000_000);
        (
            Runner::in_memory(AppConfig::default(), Arc::new(clock.clone())),
            clock,
        )
    }

    fn draft(frequency: &str, city: &str, kind: &str, lat: f64) -> SignalDraft {
        SignalDraft {
            frequency: frequency.into(),
            city: city.into(),
            kind: kind.into(),
            ..SignalDraft::at(lat, 14.4378)
        }
    }

    #[test]
    fn runner_submits_and_views() {
        let (runner, _) = runner();
        runner.submit(draft("439.1", "Prague", "DMR", 50.0755)).unwrap();
        runner.submit(draft("145.5", "Prague", "NFM", 50.0756)).unwrap();
        runner.submit(draft("14.074", "Brno", "FT8", 49.19)).unwrap();

        let view = runner.view(
            &FilterCriteria {
                city: "PRAGUE".into(),
                ..Default::default()
            },
            SortState::by(SortColumn::Frequency, false),
        );
        assert_eq!(view.rows.len(), 2);
        assert_eq!(view.rows[0].signal.kind, "DMR");
        assert_eq!(view.markers.len(), 1);
        assert_eq!(runner.metrics().snapshot().inserts, 3);
    }

    #[test]
    fn invalid_draft_is_not_stored() {
        let (runner, _) = runner();
        let err = runner.submit(draft("abc", "Prague", "DMR", 50.0)).unwrap_err();
        assert!(matches!(err, SignalError::InvalidInput(_)));
        assert!(runner.store().subscribe().borrow().is_empty());
    }

    #[test]
    fn device_counters_share_the_store_but_not_cooldowns() {
        let (runner, _) = runner();
        let id = runner.submit(draft("439.1", "Prague", "DMR", 50.0)).unwrap();
        let phone = runner.vote_counter(Arc::new(MemoryStorage::new()));
        let laptop = runner.vote_counter(Arc::new(MemoryStorage::new()));

        phone.vote(&id, VoteDirection::Up).unwrap();
        assert!(matches!(
            phone.vote(&id, VoteDirection::Up).unwrap(),
            VoteOutcome::Rejected { .. }
        ));
        let outcome = laptop.vote(&id, VoteDirection::Up).unwrap();
        assert_eq!(outcome.notice(), "Vote recorded: 2 up / 0 down");
    }

    #[test]
    fn coverage_reflects_clamped_radius() {
        let (runner, _) = runner();
        let mut d = draft("439.1", "Prague", "tetra", 50.0);
        d.radius_km = "120".into();
        let id = runner.submit(d).unwrap();
        let circle = runner.coverage(&id).unwrap().unwrap();
        assert_eq!(circle.radius_m, 80_000.0);
        assert_eq!(circle.color, "red");
    }
}
