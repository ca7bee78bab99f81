pub mod cooldown;
pub mod counter;
pub mod storage;

pub use cooldown::{CooldownTracker, DEFAULT_COOLDOWN};
pub use counter::{VoteCounter, VoteDirection, VoteError, VoteOutcome};
pub use storage::{FileStorage, LocalStorage, MemoryStorage};
