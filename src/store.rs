// Chore store: pending and completed collections with snapshot persistence

use eyre::{Context, Result};
use tracing::{debug, error, info, warn};

use crate::error::ChoreError;
use crate::models::{Chore, MAX_CHORE_ID, Snapshot, now_ms};
use crate::storage::StorageBackend;

/// Key the snapshot is persisted under
pub const STORAGE_KEY: &str = "choreManager";

/// Key a rejected snapshot is copied to before it gets overwritten
pub const BACKUP_KEY: &str = "choreManager-rejected";

/// Owns the pending and completed chore lists
///
/// Every mutation is written through to the backend. Persistence is best
/// effort: a failed write is logged and the in-memory lists stay
/// authoritative for the rest of the session.
pub struct ChoreStore {
    backend: Box<dyn StorageBackend>,
    pending: Vec<Chore>,
    completed: Vec<Chore>,
    last_id: i64,
}

/// Counts for both collections
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Stats {
    pub pending: usize,
    pub completed: usize,
}

impl ChoreStore {
    /// Open a store and rehydrate it from whatever the backend holds
    pub fn open(backend: Box<dyn StorageBackend>) -> Self {
        let mut store = Self::empty(backend);
        store.restore();
        store
    }

    /// A store with empty collections that ignores any persisted snapshot
    /// until `restore` is called
    pub fn empty(backend: Box<dyn StorageBackend>) -> Self {
        Self {
            backend,
            pending: Vec::new(),
            completed: Vec::new(),
            last_id: 0,
        }
    }

    pub fn pending(&self) -> &[Chore] {
        &self.pending
    }

    pub fn completed(&self) -> &[Chore] {
        &self.completed
    }

    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty() && self.completed.is_empty()
    }

    pub fn stats(&self) -> Stats {
        Stats {
            pending: self.pending.len(),
            completed: self.completed.len(),
        }
    }

    /// Look a chore up by id in either collection
    pub fn get(&self, id: i64) -> Option<&Chore> {
        self.pending.iter().chain(self.completed.iter()).find(|c| c.id == id)
    }

    pub fn backend(&self) -> &dyn StorageBackend {
        self.backend.as_ref()
    }

    pub fn into_backend(self) -> Box<dyn StorageBackend> {
        self.backend
    }

    // ========================================================================
    // Mutations
    // ========================================================================

    /// Add a pending chore
    ///
    /// Text is trimmed first; blank input is ignored and returns `None`.
    /// `None` is also returned once ids are exhausted.
    pub fn add(&mut self, text: &str) -> Option<Chore> {
        let text = text.trim();
        if text.is_empty() {
            debug!("Ignoring blank chore text");
            return None;
        }

        let Some(id) = self.next_id() else {
            warn!(last_id = self.last_id, "Chore ids exhausted, not adding");
            return None;
        };

        let chore = Chore::new(id, text.to_string());
        debug!(id = chore.id, text = %chore.text, "Adding chore");
        self.pending.push(chore.clone());
        self.persist();

        Some(chore)
    }

    /// Remove the chore with `id` from whichever collection holds it
    ///
    /// Returns whether anything was removed; an unknown id is a no-op.
    pub fn remove(&mut self, id: i64) -> bool {
        let before = self.pending.len() + self.completed.len();
        self.pending.retain(|c| c.id != id);
        self.completed.retain(|c| c.id != id);
        let removed = self.pending.len() + self.completed.len() != before;

        debug!(id, removed, "Removing chore");
        self.persist();
        removed
    }

    /// Move the pending chore at `index` to the end of the completed list
    pub fn move_to_completed(&mut self, index: usize) -> Result<Chore, ChoreError> {
        let len = self.pending.len();
        if index >= len {
            error!(index, len, "move_to_completed called with out-of-range index");
            return Err(ChoreError::OutOfRange { index, len });
        }

        let mut chore = self.pending.remove(index);
        chore.completed = true;
        self.completed.push(chore.clone());

        info!(id = chore.id, text = %chore.text, "Chore completed");
        self.persist();
        Ok(chore)
    }

    /// Empty both collections
    ///
    /// Irreversible. Callers are expected to confirm with the user first.
    /// Any backup of a rejected snapshot is dropped as well.
    pub fn clear_all(&mut self) {
        info!(
            pending = self.pending.len(),
            completed = self.completed.len(),
            "Clearing all chores"
        );
        self.pending.clear();
        self.completed.clear();
        self.persist();

        if let Err(e) = self.backend.remove(BACKUP_KEY) {
            warn!(error = ?e, "Failed to remove rejected snapshot backup");
        }
    }

    /// Replace both collections with a validated snapshot
    pub fn replace(&mut self, snapshot: Snapshot) -> Result<()> {
        snapshot.validate().context("Refusing to load invalid snapshot")?;

        self.last_id = self.last_id.max(snapshot.max_id().unwrap_or(0));
        self.pending = snapshot.chores;
        self.completed = snapshot.completed_chores;

        info!(
            pending = self.pending.len(),
            completed = self.completed.len(),
            "Replaced store contents"
        );
        self.persist();
        Ok(())
    }

    // ========================================================================
    // Persistence
    // ========================================================================

    /// Current state as a snapshot
    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            chores: self.pending.clone(),
            completed_chores: self.completed.clone(),
        }
    }

    /// Write the snapshot, logging and swallowing any failure
    pub fn persist(&mut self) {
        if let Err(e) = self.try_persist() {
            warn!(error = ?e, "Failed to persist chores, keeping in-memory state");
        }
    }

    /// Write the snapshot, surfacing failures to the caller
    pub fn try_persist(&mut self) -> Result<()> {
        let json = self.snapshot().to_json().context("Failed to serialize snapshot")?;
        self.backend
            .write(STORAGE_KEY, &json)
            .context("Failed to write snapshot")?;
        debug!(bytes = json.len(), "Persisted snapshot");
        Ok(())
    }

    /// Reload both collections from the backend
    ///
    /// A missing, unreadable or malformed snapshot leaves both collections
    /// empty. A malformed one is copied to `BACKUP_KEY` first, since the next
    /// write replaces it.
    pub fn restore(&mut self) {
        let snapshot = match self.backend.read(STORAGE_KEY) {
            Ok(Some(json)) => match Snapshot::from_json(&json) {
                Ok(snapshot) => snapshot,
                Err(e) => {
                    warn!(
                        error = ?e,
                        backup_key = BACKUP_KEY,
                        "Malformed snapshot, starting empty; the stored snapshot will be replaced on the next change"
                    );
                    if let Err(e) = self.backend.write(BACKUP_KEY, &json) {
                        warn!(error = ?e, "Failed to back up malformed snapshot");
                    }
                    Snapshot::default()
                }
            },
            Ok(None) => {
                debug!("No persisted snapshot, starting empty");
                Snapshot::default()
            }
            Err(e) => {
                warn!(
                    error = ?e,
                    "Unreadable snapshot, starting empty; the stored snapshot will be replaced on the next change"
                );
                Snapshot::default()
            }
        };

        self.last_id = self.last_id.max(snapshot.max_id().unwrap_or(0));
        self.pending = snapshot.chores;
        self.completed = snapshot.completed_chores;

        info!(
            pending = self.pending.len(),
            completed = self.completed.len(),
            "Restored chores"
        );
    }

    /// Millisecond timestamp, bumped past the last issued id when the clock
    /// has not moved on. `None` once the id space is used up.
    fn next_id(&mut self) -> Option<i64> {
        let id = now_ms().max(self.last_id.checked_add(1)?);
        if id > MAX_CHORE_ID {
            return None;
        }
        self.last_id = id;
        Some(id)
    }
}
