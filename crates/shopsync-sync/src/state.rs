//! Lifecycle of a single sync run.
//!
//! ```text
//! Idle -> Fetching -> Normalizing -> Reconciling -> Done
//!            |                            |
//!            +---------> Failed <---------+
//! ```
//!
//! `Reconciling -> Failed` is taken only when the store becomes unreachable.
//! Per-record failures never leave `Normalizing` or `Reconciling`.

use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncState {
    Idle,
    Fetching,
    Normalizing,
    Reconciling,
    Done,
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("illegal sync state transition {from:?} -> {to:?}")]
pub struct IllegalTransition {
    pub from: SyncState,
    pub to: SyncState,
}

impl SyncState {
    #[must_use]
    pub fn can_transition_to(self, next: SyncState) -> bool {
        matches!(
            (self, next),
            (SyncState::Idle, SyncState::Fetching)
                | (SyncState::Fetching, SyncState::Normalizing | SyncState::Failed)
                | (SyncState::Normalizing, SyncState::Reconciling)
                | (SyncState::Reconciling, SyncState::Done | SyncState::Failed)
        )
    }

    /// Returns the next state if the move is legal.
    ///
    /// # Errors
    ///
    /// Returns [`IllegalTransition`] for any move not drawn in the module diagram.
    pub fn transition_to(self, next: SyncState) -> Result<SyncState, IllegalTransition> {
        if self.can_transition_to(next) {
            Ok(next)
        } else {
            Err(IllegalTransition {
                from: self,
                to: next,
            })
        }
    }

    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, SyncState::Done | SyncState::Failed)
    }
}
