//! Workflows domain: thread summary, approval, and CRM task creation
//!
//! A reaction (or a Slack custom step) starts a run that summarizes a thread,
//! parks the summary under the run's execution id, and waits for a human to
//! approve or send it back for review. Approval creates a CRM task.

pub mod api;
pub mod domain;
pub mod repository;
pub mod workflow;

// Re-export domain types at the crate root for convenience
pub use domain::entities::{
    ApprovalDecision, ConversationMessage, ExecutionId, RunOrigin, SummaryResult,
    ThreadReference, WorkflowRun, APPROVE_ACTION_ID, REVIEW_ACTION_ID,
};
pub use domain::state::{RunEvent, RunState, RunStateMachine};

// Re-export repository types
pub use repository::{InMemoryRunStore, RunStore, WorkflowsRepositories};

// Re-export workflow types
pub use workflow::{
    ClickedMessage, DecisionOutcome, DecisionRequest, Workflow, WorkflowConfig, WorkflowTrigger,
};

// Re-export API types
pub use api::routes;
pub use api::{Dispatch, WorkflowsState};
