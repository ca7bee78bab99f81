use log::{debug, info, warn};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::watch;

use super::file::{load_snapshot, lock_document, save_snapshot, DocumentLock};
use super::{Commit, SignalStore, Snapshot, StoreError, StoreResult, Versioned};
use crate::prelude::Clock;
use crate::record::{NewSignal, Signal, SignalId, Votes};

struct Entry {
    signal: Signal,
    votes_revision: u64,
}

#[derive(Default)]
struct Inner {
    entries: BTreeMap<SignalId, Entry>,
    sequence: u64,
    revision: u64,
}

/// Signal store with per-node revisions, optionally backed by a JSON file.
///
/// With a file, every mutation runs under an exclusive lock on it: the
/// document is reloaded first, so records and votes written by other
/// processes are merged in and a stale vote revision still conflicts.
pub struct MemoryStore {
    inner: Mutex<Inner>,
    clock: Arc<dyn Clock>,
    sender: watch::Sender<Snapshot>,
    path: Option<PathBuf>,
}

impl MemoryStore {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        let (sender, _) = watch::channel(Snapshot::default());
        Self {
            inner: Mutex::new(Inner::default()),
            clock,
            sender,
            path: None,
        }
    }

    /// Loads the collection from `path` and writes back to it on change.
    pub fn open(path: impl AsRef<Path>, clock: Arc<dyn Clock>) -> StoreResult<Self> {
        let path = path.as_ref().to_path_buf();
        let entries: BTreeMap<SignalId, Entry> = load_snapshot(&path)?
            .into_iter()
            .map(|(id, signal)| {
                (
                    id,
                    Entry {
                        signal,
                        votes_revision: 0,
                    },
                )
            })
            .collect();
        info!("opened {} with {} signals", path.display(), entries.len());

        let store = Self {
            inner: Mutex::new(Inner {
                sequence: entries.len() as u64,
                entries,
                revision: 0,
            }),
            path: Some(path),
            ..Self::new(clock)
        };
        store.publish(&store.lock());
        Ok(store)
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn lock_file(&self) -> StoreResult<Option<DocumentLock>> {
        self.path.as_deref().map(lock_document).transpose()
    }

    /// Folds in whatever other writers left in the file. A record whose
    /// votes moved gets a new votes revision.
    fn reload(&self, inner: &mut Inner) -> StoreResult<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        let mut changed = false;
        for (id, signal) in load_snapshot(path)? {
            match inner.entries.get_mut(&id) {
                Some(entry) if entry.signal == signal => {}
                Some(entry) => {
                    if entry.signal.votes != signal.votes {
                        entry.votes_revision += 1;
                    }
                    entry.signal = signal;
                    changed = true;
                }
                None => {
                    inner.entries.insert(
                        id,
                        Entry {
                            signal,
                            votes_revision: 0,
                        },
                    );
                    changed = true;
                }
            }
        }
        if changed {
            debug!("merged external changes from {}", path.display());
            inner.revision += 1;
            self.publish(inner);
        }
        Ok(())
    }

    fn persist(&self, inner: &Inner) -> StoreResult<()> {
        match &self.path {
            Some(path) => save_snapshot(path, inner.entries.values().map(|e| &e.signal)),
            None => Ok(()),
        }
    }

    fn publish(&self, inner: &Inner) {
        let signals = inner.entries.values().map(|e| e.signal.clone()).collect();
        self.sender.send_replace(Snapshot {
            revision: inner.revision,
            signals: Arc::new(signals),
        });
    }
}

impl SignalStore for MemoryStore {
    fn subscribe(&self) -> watch::Receiver<Snapshot> {
        self.sender.subscribe()
    }

    fn insert(&self, signal: NewSignal) -> StoreResult<SignalId> {
        let _file = self.lock_file()?;
        let mut inner = self.lock();
        self.reload(&mut inner)?;
        let now = self.clock.now_millis();
        let mut id = SignalId::generate(now, inner.sequence);
        while inner.entries.contains_key(&id) {
            inner.sequence += 1;
            id = SignalId::generate(now, inner.sequence);
        }
        let summary = format!("{} MHz {}", signal.frequency, signal.city);
        inner.entries.insert(
            id.clone(),
            Entry {
                signal: Signal::from_new(id.clone(), signal),
                votes_revision: 0,
            },
        );

        if let Err(err) = self.persist(&inner) {
            inner.entries.remove(&id);
            warn!("insert of {} not persisted: {}", summary, err);
            return Err(err);
        }

        inner.sequence += 1;
        inner.revision += 1;
        self.publish(&inner);
        info!("inserted signal {} ({})", id, summary);
        Ok(id)
    }

    fn get(&self, id: &SignalId) -> StoreResult<Signal> {
        self.lock()
            .entries
            .get(id)
            .map(|e| e.signal.clone())
            .ok_or_else(|| StoreError::UnknownId(id.clone()))
    }

    fn read_votes(&self, id: &SignalId) -> StoreResult<Versioned<Option<Votes>>> {
        let inner = self.lock();
        let entry = inner
            .entries
            .get(id)
            .ok_or_else(|| StoreError::UnknownId(id.clone()))?;
        Ok(Versioned {
            value: entry.signal.votes,
            revision: entry.votes_revision,
        })
    }

    fn commit_votes(
        &self,
        id: &SignalId,
        expected_revision: u64,
        votes: Votes,
    ) -> StoreResult<Commit> {
        let _file = self.lock_file()?;
        let mut inner = self.lock();
        self.reload(&mut inner)?;
        let entry = inner
            .entries
            .get_mut(id)
            .ok_or_else(|| StoreError::UnknownId(id.clone()))?;
        if entry.votes_revision != expected_revision {
            return Ok(Commit::Conflict);
        }
        let previous = entry.signal.votes.replace(votes);
        entry.votes_revision += 1;

        if let Err(err) = self.persist(&inner) {
            if let Some(entry) = inner.entries.get_mut(id) {
                entry.signal.votes = previous;
                entry.votes_revision -= 1;
            }
            warn!("votes on {} not persisted: {}", id, err);
            return Err(err);
        }

        inner.revision += 1;
        self.publish(&inner);
        Ok(Commit::Applied)
    }
}
