//! The thread-to-task workflow
//!
//! Phase one (`Workflow::start`) fetches and summarizes a thread and posts the
//! approval message; phase two (`Workflow::decide`) resumes from the button
//! click and, on approval, creates the CRM task.

pub mod actions;
pub mod fetcher;
pub mod orchestrator;
pub mod presenter;
pub mod summarizer;
pub mod task_creator;
pub mod trigger;

use std::env;

use serde::{Deserialize, Serialize};

use thread2task_common::config::{parse_flag, parse_list};
use thread2task_common::{Error, Result};

pub use actions::{ClickedMessage, DecisionOutcome, DecisionRequest};
pub use orchestrator::Workflow;
pub use trigger::{trigger_from_event, WorkflowTrigger};

/// Reaction that starts a run when `TRIGGER_REACTION` is unset
pub const DEFAULT_TRIGGER_REACTION: &str = "conversation-over";

/// Callback id of the custom workflow step
pub const FUNCTION_CALLBACK_ID: &str = "summarize_thread_function";

/// Workflow behavior settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowConfig {
    /// Reaction name (without colons) that triggers a run
    pub trigger_reaction: String,

    /// Channels allowed to trigger runs; empty means any channel
    pub trigger_channel_ids: Vec<String>,

    /// Send the thread's root message to the summarizer as well
    pub include_root_message: bool,

    /// Salesforce `WhoId` for created tasks
    pub task_who_id: Option<String>,
}

impl Default for WorkflowConfig {
    fn default() -> Self {
        Self {
            trigger_reaction: DEFAULT_TRIGGER_REACTION.to_string(),
            trigger_channel_ids: Vec::new(),
            include_root_message: false,
            task_who_id: None,
        }
    }
}

impl WorkflowConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let include_root_message = match lookup("SUMMARY_INCLUDE_ROOT") {
            Some(raw) => parse_flag(&raw).ok_or_else(|| {
                Error::Validation(format!(
                    "SUMMARY_INCLUDE_ROOT must be a boolean, got '{}'",
                    raw
                ))
            })?,
            None => false,
        };

        let trigger_reaction = lookup("TRIGGER_REACTION")
            .map(|r| r.trim().trim_matches(':').to_string())
            .filter(|r| !r.is_empty())
            .unwrap_or_else(|| DEFAULT_TRIGGER_REACTION.to_string());

        Ok(Self {
            trigger_reaction,
            trigger_channel_ids: lookup("TRIGGER_CHANNEL_IDS")
                .map(|raw| parse_list(&raw))
                .unwrap_or_default(),
            include_root_message,
            task_who_id: lookup("SFDC_WHO_ID").filter(|id| !id.trim().is_empty()),
        })
    }

    /// Whether runs may be triggered from `channel_id`
    pub fn channel_allowed(&self, channel_id: &str) -> bool {
        self.trigger_channel_ids.is_empty()
            || self.trigger_channel_ids.iter().any(|c| c == channel_id)
    }
}
