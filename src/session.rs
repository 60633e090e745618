// Roll session: Idle -> Rolling -> Revealing -> Resolved -> Idle

use rand::Rng;
use tracing::{debug, info};

use crate::error::SessionError;
use crate::models::Chore;
use crate::selection::{Die, select_index};
use crate::store::ChoreStore;

/// Upper bound on tumbling faces, whatever the configured timing
pub const MAX_FRAMES: usize = 1000;

/// Pacing for the cosmetic part of a roll
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RollTiming {
    pub interval_ms: u64,
    pub duration_ms: u64,
    pub reveal_delay_ms: u64,
}

impl Default for RollTiming {
    fn default() -> Self {
        Self {
            interval_ms: 80,
            duration_ms: 1200,
            reveal_delay_ms: 400,
        }
    }
}

impl RollTiming {
    /// Number of intermediate faces shown while the die tumbles, in `1..=MAX_FRAMES`
    pub fn frames(&self) -> usize {
        (self.duration_ms / self.interval_ms.max(1)).clamp(1, MAX_FRAMES as u64) as usize
    }
}

/// Where a roll currently is
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum RollPhase {
    #[default]
    Idle,
    /// Die is tumbling; `frames` are for display only, `roll` is the real result
    Rolling { die: Die, frames: Vec<u32>, roll: u32 },
    /// Result is known and mapped to a chore that is still pending
    Revealing { die: Die, roll: u32, index: usize, chore: Chore },
    /// Chore has been moved to completed
    Resolved { die: Die, roll: u32, chore: Chore },
}

impl RollPhase {
    pub fn name(&self) -> &'static str {
        match self {
            RollPhase::Idle => "idle",
            RollPhase::Rolling { .. } => "rolling",
            RollPhase::Revealing { .. } => "revealing",
            RollPhase::Resolved { .. } => "resolved",
        }
    }
}

/// Final result of a roll
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RollOutcome {
    pub die: Die,
    pub roll: u32,
    pub chore: Chore,
}

/// Serializes roll requests against a store
///
/// Only one roll can be in flight; `start` refuses while the session is
/// anywhere but `Idle`.
#[derive(Debug, Default)]
pub struct RollSession {
    phase: RollPhase,
    timing: RollTiming,
}

impl RollSession {
    pub fn new(timing: RollTiming) -> Self {
        Self {
            phase: RollPhase::Idle,
            timing,
        }
    }

    pub fn phase(&self) -> &RollPhase {
        &self.phase
    }

    pub fn timing(&self) -> RollTiming {
        self.timing
    }

    pub fn is_idle(&self) -> bool {
        matches!(self.phase, RollPhase::Idle)
    }

    /// Idle -> Rolling: pick the die and draw the final roll
    pub fn start<R: Rng>(&mut self, store: &ChoreStore, rng: &mut R) -> Result<&RollPhase, SessionError> {
        if !self.is_idle() {
            return Err(SessionError::Busy(self.phase.name()));
        }

        let pending = store.pending_count();
        if pending == 0 {
            return Err(SessionError::NoPendingChores);
        }

        let die = Die::for_count(pending);
        let sides = die.sides();
        let frames = (0..self.timing.frames()).map(|_| rng.random_range(1..=sides)).collect();
        let roll = rng.random_range(1..=sides);

        debug!(%die, roll, pending, "Roll started");
        self.phase = RollPhase::Rolling { die, frames, roll };
        Ok(&self.phase)
    }

    /// Rolling -> Revealing: map the roll to a pending chore
    pub fn reveal(&mut self, store: &ChoreStore) -> Result<&Chore, SessionError> {
        let RollPhase::Rolling { die, roll, .. } = self.phase else {
            return Err(self.unexpected("reveal"));
        };

        let pending = store.pending();
        if pending.is_empty() {
            self.phase = RollPhase::Idle;
            return Err(SessionError::NoPendingChores);
        }

        let index = select_index(roll, pending.len());
        let chore = pending[index].clone();
        debug!(roll, index, id = chore.id, "Roll revealed");

        self.phase = RollPhase::Revealing { die, roll, index, chore };
        match &self.phase {
            RollPhase::Revealing { chore, .. } => Ok(chore),
            _ => unreachable!(),
        }
    }

    /// Revealing -> Resolved: move the revealed chore to completed
    ///
    /// If the store changed since the reveal, the chore is found again by id.
    /// A chore that vanished aborts the roll back to `Idle`.
    pub fn resolve(&mut self, store: &mut ChoreStore) -> Result<&Chore, SessionError> {
        let RollPhase::Revealing { die, roll, index, ref chore } = self.phase else {
            return Err(self.unexpected("resolve"));
        };
        let id = chore.id;

        let index = if store.pending().get(index).is_some_and(|c| c.id == id) {
            index
        } else {
            match store.pending().iter().position(|c| c.id == id) {
                Some(i) => i,
                None => {
                    self.phase = RollPhase::Idle;
                    return Err(SessionError::ChoreGone(id));
                }
            }
        };

        let chore = match store.move_to_completed(index) {
            Ok(chore) => chore,
            Err(e) => {
                self.phase = RollPhase::Idle;
                return Err(e.into());
            }
        };

        info!(%die, roll, id = chore.id, text = %chore.text, "Roll resolved");
        self.phase = RollPhase::Resolved { die, roll, chore };
        match &self.phase {
            RollPhase::Resolved { chore, .. } => Ok(chore),
            _ => unreachable!(),
        }
    }

    /// Resolved -> Idle
    pub fn finish(&mut self) -> Result<RollOutcome, SessionError> {
        if !matches!(self.phase, RollPhase::Resolved { .. }) {
            return Err(self.unexpected("finish"));
        }

        match std::mem::take(&mut self.phase) {
            RollPhase::Resolved { die, roll, chore } => Ok(RollOutcome { die, roll, chore }),
            _ => unreachable!(),
        }
    }

    /// Abandon a roll that has not resolved yet
    pub fn cancel(&mut self) -> Result<(), SessionError> {
        match self.phase {
            RollPhase::Resolved { .. } => Err(self.unexpected("cancel")),
            _ => {
                self.phase = RollPhase::Idle;
                Ok(())
            }
        }
    }

    /// Drive a full roll with no pauses between phases
    pub fn roll<R: Rng>(&mut self, store: &mut ChoreStore, rng: &mut R) -> Result<RollOutcome, SessionError> {
        self.start(store, rng)?;
        self.reveal(store)?;
        self.resolve(store)?;
        self.finish()
    }

    fn unexpected(&self, action: &'static str) -> SessionError {
        SessionError::UnexpectedPhase {
            action,
            phase: self.phase.name(),
        }
    }
}
