// Typed errors for store and roll-session misuse

/// Errors raised by `ChoreStore` operations
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ChoreError {
    /// `move_to_completed` was given an index outside the pending list
    #[error("index {index} out of range for {len} pending chores")]
    OutOfRange { index: usize, len: usize },
}

/// Errors raised when the roll state machine is driven out of order
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum SessionError {
    /// A roll is already in flight
    #[error("a roll is already in progress ({0})")]
    Busy(&'static str),

    /// Rolling is disabled while nothing is pending
    #[error("no pending chores to roll for")]
    NoPendingChores,

    /// A transition was requested from the wrong phase
    #[error("cannot {action} while {phase}")]
    UnexpectedPhase { action: &'static str, phase: &'static str },

    /// The revealed chore was removed before the roll resolved
    #[error("chore {0} is no longer pending")]
    ChoreGone(i64),

    #[error(transparent)]
    Store(#[from] ChoreError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = ChoreError::OutOfRange { index: 3, len: 2 };
        assert_eq!(err.to_string(), "index 3 out of range for 2 pending chores");

        let err = SessionError::UnexpectedPhase {
            action: "reveal",
            phase: "idle",
        };
        assert_eq!(err.to_string(), "cannot reveal while idle");

        let err: SessionError = ChoreError::OutOfRange { index: 0, len: 0 }.into();
        assert_eq!(err.to_string(), "index 0 out of range for 0 pending chores");
    }
}
