//! Approval presenter
//!
//! Owns every message the workflow shows in the thread: the placeholder, the
//! approval message that replaces it, and the terminal notice that replaces
//! the approval message. All updates target the placeholder's `ts`, so the
//! thread only ever holds one message per run. A click on a run that is no
//! longer known replaces the clicked message with [`EXPIRED_TEXT`]. Slack
//! failures here are logged and never abort the run.

use thread2task_slack::blocks::{chunk_text, SECTION_TEXT_LIMIT};
use thread2task_slack::{Block, ButtonStyle, Element, MessageUpdate, SlackService};

use crate::domain::entities::{ExecutionId, ThreadReference, APPROVE_ACTION_ID, REVIEW_ACTION_ID};

pub const PLACEHOLDER_TEXT: &str = "One sec! Summarizing content :hourglass_flowing_sand:";

pub const APPROVAL_BLOCK_ID: &str = "approve-deny-buttons";

pub const TASK_CREATED_TEXT: &str = "Task created within Salesforce";

pub const REVIEW_TEXT: &str = "Which part should I review?";

/// Shown on an approval message whose run is no longer known
pub const EXPIRED_TEXT: &str =
    ":hourglass: This approval request has expired. React to the thread again to summarize it.";

/// Step that failed, for the failure notice
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailedStep {
    Summarize,
    CreateTask,
}

impl std::fmt::Display for FailedStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Summarize => write!(f, "summarize this thread"),
            Self::CreateTask => write!(f, "create the task in Salesforce"),
        }
    }
}

pub fn failure_text(step: FailedStep) -> String {
    format!(":warning: Sorry, I couldn't {}.", step)
}

/// Summary sections followed by the Approve / Review buttons
pub fn approval_blocks(summary: &str, execution_id: &ExecutionId) -> Vec<Block> {
    let mut blocks: Vec<Block> = chunk_text(summary, SECTION_TEXT_LIMIT)
        .into_iter()
        .map(Block::section)
        .collect();

    blocks.push(Block::actions(
        APPROVAL_BLOCK_ID,
        vec![
            Element::button(
                "Approve",
                APPROVE_ACTION_ID,
                execution_id.as_str(),
                Some(ButtonStyle::Primary),
            ),
            Element::button(
                "Review",
                REVIEW_ACTION_ID,
                execution_id.as_str(),
                Some(ButtonStyle::Danger),
            ),
        ],
    ));
    blocks
}

/// A single context line replacing the approval message
pub fn notice_blocks(text: &str) -> Vec<Block> {
    vec![Block::context(text)]
}

/// Post the placeholder reply; returns its `ts` if Slack accepted it
pub async fn post_placeholder(slack: &dyn SlackService, thread: &ThreadReference) -> Option<String> {
    match slack
        .post_message(&thread.channel_id, Some(&thread.thread_ts), PLACEHOLDER_TEXT)
        .await
    {
        Ok(posted) => Some(posted.ts),
        Err(e) => {
            tracing::error!(
                channel_id = %thread.channel_id,
                thread_ts = %thread.thread_ts,
                error = %e,
                "Failed to post placeholder message"
            );
            None
        }
    }
}

/// Replace the placeholder message's content
pub async fn show(
    slack: &dyn SlackService,
    thread: &ThreadReference,
    placeholder_ts: Option<&str>,
    text: &str,
    blocks: Vec<Block>,
) {
    let Some(ts) = placeholder_ts else {
        tracing::warn!(
            channel_id = %thread.channel_id,
            thread_ts = %thread.thread_ts,
            "No placeholder message to update"
        );
        return;
    };

    replace(slack, &thread.channel_id, ts, text, blocks).await;
}

/// Replace any message's content, logging failures
pub async fn replace(
    slack: &dyn SlackService,
    channel_id: &str,
    ts: &str,
    text: &str,
    blocks: Vec<Block>,
) {
    let update = MessageUpdate {
        channel: channel_id.to_string(),
        ts: ts.to_string(),
        text: text.to_string(),
        blocks,
    };

    if let Err(e) = slack.update_message(update).await {
        tracing::error!(
            channel_id,
            ts,
            error = %e,
            "Failed to update message"
        );
    }
}
