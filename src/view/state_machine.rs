//! Lifecycle of a single refresh cycle.
//!
//! ```text
//! Idle --start_resolving()--> Resolving --start_fetching()--> Fetching --complete()--> Reconciled
//! Resolving --fail()--> Failed
//! Fetching  --fail()--> Failed
//! Reconciled | Failed --reset()--> Idle
//! ```
//!
//! The published snapshot only changes on the `Fetching -> Reconciled` edge.

use std::fmt::Display;

use crate::error::LogViewError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshState {
    /// No refresh in progress.
    Idle,
    /// Reading the message counter.
    Resolving,
    /// Dispatching key batches.
    Fetching,
    /// A new snapshot was published.
    Reconciled,
    /// The cycle aborted; the previous snapshot is still current.
    Failed,
}

impl Display for RefreshState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = match self {
            RefreshState::Idle => "Idle",
            RefreshState::Resolving => "Resolving",
            RefreshState::Fetching => "Fetching",
            RefreshState::Reconciled => "Reconciled",
            RefreshState::Failed => "Failed",
        };
        write!(f, "{state}")
    }
}

#[derive(Debug, Clone)]
pub struct RefreshStateMachine {
    state: RefreshState,
}

impl Default for RefreshStateMachine {
    fn default() -> Self {
        Self::new()
    }
}

impl RefreshStateMachine {
    pub fn new() -> Self {
        Self {
            state: RefreshState::Idle,
        }
    }

    pub fn current_state(&self) -> RefreshState {
        self.state
    }

    /// Idle → Resolving
    pub fn start_resolving(&mut self) -> Result<(), LogViewError> {
        self.transition(&[RefreshState::Idle], RefreshState::Resolving)
    }

    /// Resolving → Fetching
    pub fn start_fetching(&mut self) -> Result<(), LogViewError> {
        self.transition(&[RefreshState::Resolving], RefreshState::Fetching)
    }

    /// Fetching → Reconciled
    pub fn complete(&mut self) -> Result<(), LogViewError> {
        self.transition(&[RefreshState::Fetching], RefreshState::Reconciled)
    }

    /// Resolving | Fetching → Failed
    pub fn fail(&mut self) -> Result<(), LogViewError> {
        self.transition(
            &[RefreshState::Resolving, RefreshState::Fetching],
            RefreshState::Failed,
        )
    }

    /// Reconciled | Failed → Idle
    pub fn reset(&mut self) -> Result<(), LogViewError> {
        self.transition(
            &[RefreshState::Reconciled, RefreshState::Failed],
            RefreshState::Idle,
        )
    }

    fn transition(&mut self, from: &[RefreshState], to: RefreshState) -> Result<(), LogViewError> {
        if !from.contains(&self.state) {
            return Err(LogViewError::InvalidStateTransition {
                from: self.state.to_string(),
                to: to.to_string(),
            });
        }
        self.state = to;
        Ok(())
    }
}
