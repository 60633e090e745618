// choredice - Household chore list with dice-roll selection and persistent state

pub mod config;
pub mod error;
pub mod models;
pub mod selection;
pub mod session;
pub mod storage;
pub mod store;

// Re-export main types for convenience
pub use config::Config;
pub use error::{ChoreError, SessionError};
pub use models::{Chore, Snapshot, now_ms};
pub use selection::{Die, die_size, select_index};
pub use session::{RollOutcome, RollPhase, RollSession, RollTiming};
pub use storage::{BackendKind, FileBackend, MemoryBackend, SqliteBackend, StorageBackend, open_backend};
pub use store::{ChoreStore, STORAGE_KEY, Stats};
