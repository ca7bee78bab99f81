//! Boundary to the realtime document store.
//!
//! The store is a key-value collection of signal documents with full-snapshot
//! change notification and one atomic primitive: compare-and-commit on a
//! record's `votes` node. [`SignalStore::transact`] builds the optimistic
//! read-modify-write loop on top of it; callers must never increment a
//! counter through a plain read followed by a plain write.

pub mod file;
pub mod memory;

use log::debug;
use std::sync::Arc;
use tokio::sync::watch;

use crate::record::{NewSignal, Signal, SignalId, Votes};

pub use memory::MemoryStore;

/// Attempts made by [`SignalStore::transact`] before giving up.
pub const MAX_TRANSACTION_ATTEMPTS: usize = 25;

#[derive(thiserror::Error, Debug)]
pub enum StoreError {
    #[error("unknown signal id {0}")]
    UnknownId(SignalId),
    #[error("transaction still conflicting after {attempts} attempts")]
    RetryExhausted { attempts: usize },
    #[error("io: {0}")]
    Io(#[from] std::io::Error),
    #[error("serialization: {0}")]
    Serde(#[from] serde_json::Error),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Full copy of the collection at one point in time, in key order.
#[derive(Debug, Clone, Default)]
pub struct Snapshot {
    pub revision: u64,
    pub signals: Arc<Vec<Signal>>,
}

impl Snapshot {
    pub fn signals(&self) -> &[Signal] {
        &self.signals
    }

    pub fn get(&self, id: &SignalId) -> Option<&Signal> {
        self.signals.iter().find(|s| &s.id == id)
    }

    pub fn len(&self) -> usize {
        self.signals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.signals.is_empty()
    }
}

/// A value together with the node revision it was read at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Versioned<T> {
    pub value: T,
    pub revision: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Commit {
    Applied,
    /// Another writer moved the node since it was read.
    Conflict,
}

/// Result of a committed transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transaction {
    pub votes: Votes,
    pub attempts: usize,
}

pub trait SignalStore: Send + Sync {
    /// Receiver holding the current snapshot; it is marked changed on every
    /// mutation by any writer.
    fn subscribe(&self) -> watch::Receiver<Snapshot>;

    fn insert(&self, signal: NewSignal) -> StoreResult<SignalId>;

    fn get(&self, id: &SignalId) -> StoreResult<Signal>;

    fn read_votes(&self, id: &SignalId) -> StoreResult<Versioned<Option<Votes>>>;

    /// Writes `votes` only if the node is still at `expected_revision`.
    fn commit_votes(
        &self,
        id: &SignalId,
        expected_revision: u64,
        votes: Votes,
    ) -> StoreResult<Commit>;

    /// Applies `update` against the latest votes, retrying on conflict.
    fn transact(
        &self,
        id: &SignalId,
        update: &mut dyn FnMut(Option<Votes>) -> Votes,
    ) -> StoreResult<Transaction> {
        for attempt in 1..=MAX_TRANSACTION_ATTEMPTS {
            let current = self.read_votes(id)?;
            let next = update(current.value);
            match self.commit_votes(id, current.revision, next)? {
                Commit::Applied => {
                    return Ok(Transaction {
                        votes: next,
                        attempts: attempt,
                    })
                }
                Commit::Conflict => {
                    debug!("votes transaction on {} conflicted (attempt {})", id, attempt)
                }
            }
        }
        Err(StoreError::RetryExhausted {
            attempts: MAX_TRANSACTION_ATTEMPTS,
        })
    }
}
