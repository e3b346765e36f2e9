//! State machine for workflow runs
//!
//! A run is created while its thread is being summarized, parks in
//! `AwaitingDecision` until someone clicks Approve or Review, and ends in one
//! of three terminal states:
//!
//! ```text
//! Summarizing ──SummaryReady──▶ AwaitingDecision ──Approve──▶ Approved ──TaskCreated──▶ TaskCreated
//!      │                               │                         │
//!      └──SummaryFailed──▶ Failed      └──RequestReview──▶ NeedsReview   └──TaskFailed──▶ Failed
//! ```

use serde::{Deserialize, Serialize};

pub use thread2task_common::StateError;

/// Workflow run states
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunState {
    Summarizing,
    AwaitingDecision,
    Approved,
    TaskCreated,
    NeedsReview,
    Failed,
}

impl RunState {
    /// Check if this is a terminal state
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::TaskCreated | Self::NeedsReview | Self::Failed)
    }

    /// Get all valid next states from current state
    pub fn valid_transitions(&self) -> &'static [RunState] {
        match self {
            Self::Summarizing => &[Self::AwaitingDecision, Self::Failed],
            Self::AwaitingDecision => &[Self::Approved, Self::NeedsReview],
            Self::Approved => &[Self::TaskCreated, Self::Failed],
            Self::TaskCreated => &[],
            Self::NeedsReview => &[],
            Self::Failed => &[],
        }
    }
}

impl std::fmt::Display for RunState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Summarizing => write!(f, "summarizing"),
            Self::AwaitingDecision => write!(f, "awaiting_decision"),
            Self::Approved => write!(f, "approved"),
            Self::TaskCreated => write!(f, "task_created"),
            Self::NeedsReview => write!(f, "needs_review"),
            Self::Failed => write!(f, "failed"),
        }
    }
}

/// Events that trigger run state transitions
#[derive(Debug, Clone, PartialEq)]
pub enum RunEvent {
    /// Summary produced and approval message presented
    SummaryReady,
    /// Completion call failed or came back empty
    SummaryFailed,
    /// Approve button clicked
    Approve,
    /// Review button clicked
    RequestReview,
    /// CRM accepted the task
    TaskCreated,
    /// CRM rejected the task or was unreachable
    TaskFailed,
}

impl std::fmt::Display for RunEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::SummaryReady => write!(f, "summary_ready"),
            Self::SummaryFailed => write!(f, "summary_failed"),
            Self::Approve => write!(f, "approve"),
            Self::RequestReview => write!(f, "request_review"),
            Self::TaskCreated => write!(f, "task_created"),
            Self::TaskFailed => write!(f, "task_failed"),
        }
    }
}

/// Run state machine
pub struct RunStateMachine;

impl RunStateMachine {
    /// Attempt a state transition
    ///
    /// Returns the new state if the transition is valid, or an error otherwise.
    pub fn transition(current: RunState, event: RunEvent) -> Result<RunState, StateError> {
        if current.is_terminal() {
            return Err(StateError::TerminalState(current.to_string()));
        }

        let next = match (&current, &event) {
            (RunState::Summarizing, RunEvent::SummaryReady) => RunState::AwaitingDecision,
            (RunState::Summarizing, RunEvent::SummaryFailed) => RunState::Failed,

            (RunState::AwaitingDecision, RunEvent::Approve) => RunState::Approved,
            (RunState::AwaitingDecision, RunEvent::RequestReview) => RunState::NeedsReview,

            (RunState::Approved, RunEvent::TaskCreated) => RunState::TaskCreated,
            (RunState::Approved, RunEvent::TaskFailed) => RunState::Failed,

            _ => {
                return Err(StateError::InvalidTransition {
                    from: current.to_string(),
                    event: event.to_string(),
                });
            }
        };

        Ok(next)
    }

    /// Check if a transition is valid without performing it
    pub fn can_transition(current: RunState, event: &RunEvent) -> bool {
        Self::transition(current, event.clone()).is_ok()
    }
}
