//! Trigger matching
//!
//! Decides whether an inbound Slack event starts a workflow run.

use thread2task_common::{Error, Result};
use thread2task_slack::events::Event;

use crate::domain::entities::{ExecutionId, RunOrigin, ThreadReference};
use crate::workflow::{WorkflowConfig, FUNCTION_CALLBACK_ID};

/// Everything phase one needs to start a run
#[derive(Debug, Clone, PartialEq)]
pub struct WorkflowTrigger {
    pub execution_id: ExecutionId,
    pub origin: RunOrigin,
    pub thread: ThreadReference,
    /// User who reacted, when known
    pub user: Option<String>,
}

impl WorkflowTrigger {
    /// A self-hosted run with a freshly generated execution id
    pub fn reaction(thread: ThreadReference, user: Option<String>) -> Self {
        Self {
            execution_id: ExecutionId::generate(),
            origin: RunOrigin::Reaction,
            thread,
            user,
        }
    }

    /// A custom-step run keyed by Slack's `function_execution_id`
    pub fn function_step(function_execution_id: &str, thread: ThreadReference) -> Self {
        Self {
            execution_id: ExecutionId::from(function_execution_id),
            origin: RunOrigin::FunctionStep,
            thread,
            user: None,
        }
    }
}

/// Match an event against the configured triggers
///
/// `Ok(None)` means the event is not for this workflow; an error means it is,
/// but carries unusable inputs.
pub fn trigger_from_event(event: &Event, config: &WorkflowConfig) -> Result<Option<WorkflowTrigger>> {
    match event {
        Event::ReactionAdded {
            user,
            reaction,
            item,
            ..
        } => {
            if reaction != &config.trigger_reaction || item.item_type != "message" {
                return Ok(None);
            }

            let channel = item.channel.clone().unwrap_or_default();
            if !config.channel_allowed(&channel) {
                tracing::debug!(channel_id = %channel, "Reaction in channel outside allow-list");
                return Ok(None);
            }

            let thread = ThreadReference::new(channel, item.ts.clone().unwrap_or_default())?;
            Ok(Some(WorkflowTrigger::reaction(thread, user.clone())))
        }
        Event::FunctionExecuted {
            function,
            inputs,
            function_execution_id,
        } => {
            if function.callback_id != FUNCTION_CALLBACK_ID {
                return Ok(None);
            }

            let input = |name: &str| -> Result<String> {
                inputs
                    .get(name)
                    .and_then(|v| v.as_str())
                    .map(str::to_string)
                    .ok_or_else(|| Error::Validation(format!("Missing function input '{}'", name)))
            };

            let thread = ThreadReference::new(input("channel_id")?, input("thread_ts")?)?;
            Ok(Some(WorkflowTrigger::function_step(
                function_execution_id,
                thread,
            )))
        }
        Event::Unsupported => Ok(None),
    }
}
