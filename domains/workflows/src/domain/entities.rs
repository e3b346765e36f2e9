//! Workflow domain entities
//!
//! A `WorkflowRun` is the per-invocation record that carries a thread's
//! summary from phase one (summarize and present) to phase two (the human's
//! decision). Runs are keyed by their `ExecutionId`, which travels in the
//! approval buttons' `value`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use thread2task_common::{Error, Result};

use crate::domain::state::{RunEvent, RunState, RunStateMachine, StateError};

/// `action_id` of the Approve button
pub const APPROVE_ACTION_ID: &str = "approve_button";

/// `action_id` of the Review button
pub const REVIEW_ACTION_ID: &str = "review_button";

/// Identifier a run is parked under between the two workflow phases
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ExecutionId(String);

impl ExecutionId {
    /// Fresh id for a self-hosted (reaction) run
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for ExecutionId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for ExecutionId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl std::fmt::Display for ExecutionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// How a run was started
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunOrigin {
    /// `reaction_added` delivered to this service
    Reaction,
    /// Slack custom workflow step (`function_executed`)
    FunctionStep,
}

/// A conversation thread: channel plus the root message timestamp
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ThreadReference {
    pub channel_id: String,
    pub thread_ts: String,
}

impl ThreadReference {
    /// Create a thread reference; both parts must be non-empty
    pub fn new(channel_id: impl Into<String>, thread_ts: impl Into<String>) -> Result<Self> {
        let channel_id = channel_id.into();
        let thread_ts = thread_ts.into();

        if channel_id.trim().is_empty() {
            return Err(Error::Validation("channel_id must not be empty".to_string()));
        }
        if thread_ts.trim().is_empty() {
            return Err(Error::Validation("thread_ts must not be empty".to_string()));
        }

        Ok(Self {
            channel_id,
            thread_ts,
        })
    }
}

/// A thread message reduced to what the summarizer needs
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationMessage {
    pub author_is_bot: bool,
    pub text: String,
}

/// Summary text produced once per run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SummaryResult {
    pub text: String,
}

impl SummaryResult {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }
}

/// The human's choice on the approval message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApprovalDecision {
    Approved,
    NeedsReview,
}

impl ApprovalDecision {
    /// Map a button `action_id` to a decision
    pub fn from_action_id(action_id: &str) -> Result<Self> {
        match action_id {
            APPROVE_ACTION_ID => Ok(Self::Approved),
            REVIEW_ACTION_ID => Ok(Self::NeedsReview),
            other => Err(Error::Validation(format!("Unknown action_id '{}'", other))),
        }
    }

    pub fn action_id(&self) -> &'static str {
        match self {
            Self::Approved => APPROVE_ACTION_ID,
            Self::NeedsReview => REVIEW_ACTION_ID,
        }
    }

    /// State machine event for this decision
    pub fn event(&self) -> RunEvent {
        match self {
            Self::Approved => RunEvent::Approve,
            Self::NeedsReview => RunEvent::RequestReview,
        }
    }
}

/// Per-invocation workflow record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowRun {
    pub execution_id: ExecutionId,
    pub origin: RunOrigin,
    pub thread: ThreadReference,
    /// `ts` of the placeholder message that every later update targets
    pub placeholder_ts: Option<String>,
    pub summary: Option<SummaryResult>,
    pub state: RunState,
    pub failure: Option<String>,
    pub task_id: Option<String>,
    pub decided_by: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl WorkflowRun {
    /// Create a run in `Summarizing`
    pub fn new(execution_id: ExecutionId, origin: RunOrigin, thread: ThreadReference) -> Self {
        let now = Utc::now();
        Self {
            execution_id,
            origin,
            thread,
            placeholder_ts: None,
            summary: None,
            state: RunState::Summarizing,
            failure: None,
            task_id: None,
            decided_by: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[mutants::skip] // Delegates to RunState::is_terminal()
    pub fn is_terminal(&self) -> bool {
        self.state.is_terminal()
    }

    pub fn is_function_step(&self) -> bool {
        self.origin == RunOrigin::FunctionStep
    }

    pub fn set_placeholder(&mut self, ts: impl Into<String>) {
        self.placeholder_ts = Some(ts.into());
        self.updated_at = Utc::now();
    }

    /// Park the run with its summary, ready for a decision
    pub fn summary_ready(&mut self, summary: SummaryResult) -> Result<()> {
        self.state = self.apply_transition(RunEvent::SummaryReady)?;
        self.summary = Some(summary);
        self.updated_at = Utc::now();
        Ok(())
    }

    pub fn summary_failed(&mut self, reason: impl Into<String>) -> Result<()> {
        self.state = self.apply_transition(RunEvent::SummaryFailed)?;
        self.failure = Some(reason.into());
        self.updated_at = Utc::now();
        Ok(())
    }

    /// Record the human's decision
    pub fn decide(&mut self, decision: ApprovalDecision, user: Option<String>) -> Result<()> {
        self.state = self.apply_transition(decision.event())?;
        self.decided_by = user;
        self.updated_at = Utc::now();
        Ok(())
    }

    pub fn task_created(&mut self, task_id: impl Into<String>) -> Result<()> {
        self.state = self.apply_transition(RunEvent::TaskCreated)?;
        self.task_id = Some(task_id.into());
        self.updated_at = Utc::now();
        Ok(())
    }

    pub fn task_failed(&mut self, reason: impl Into<String>) -> Result<()> {
        self.state = self.apply_transition(RunEvent::TaskFailed)?;
        self.failure = Some(reason.into());
        self.updated_at = Utc::now();
        Ok(())
    }

    /// Check if a transition is valid without applying it
    pub fn can_transition(&self, event: &RunEvent) -> bool {
        RunStateMachine::can_transition(self.state, event)
    }

    fn apply_transition(&self, event: RunEvent) -> Result<RunState> {
        RunStateMachine::transition(self.state, event).map_err(|e| match e {
            StateError::InvalidTransition { from, event, .. } => Error::Conflict(format!(
                "Run {}: cannot apply '{}' event from '{}' state",
                self.execution_id, event, from
            )),
            StateError::TerminalState(state) => Error::Conflict(format!(
                "Run {} is in terminal state '{}'",
                self.execution_id, state
            )),
        })
    }
}
