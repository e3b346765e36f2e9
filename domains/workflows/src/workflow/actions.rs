//! Action router
//!
//! Phase two of the workflow. A button click is resolved to its run by
//! execution id, claimed atomically through the run store, and dispatched to
//! task creation (Approve) or the review notice (Review). Only the caller that
//! wins the claim produces side effects. A click whose run is unknown, for
//! example after a restart, expires the clicked message so its buttons go away.

use serde::{Deserialize, Serialize};

use thread2task_common::{Error, Result};

use crate::domain::entities::{ApprovalDecision, ExecutionId, WorkflowRun};
use crate::domain::state::RunState;
use crate::workflow::presenter::{self, FailedStep, EXPIRED_TEXT, REVIEW_TEXT, TASK_CREATED_TEXT};
use crate::workflow::{task_creator, Workflow};

/// A button click on the approval message
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionRequest {
    pub execution_id: ExecutionId,
    pub action_id: String,
    /// Slack user who clicked
    pub user: Option<String>,
    /// Message holding the clicked button, when Slack reports it
    #[serde(default)]
    pub message: Option<ClickedMessage>,
}

/// Location of the message a button was clicked on
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClickedMessage {
    pub channel_id: String,
    pub message_ts: String,
}

/// What a decision resulted in
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum DecisionOutcome {
    TaskCreated { task_id: String },
    TaskFailed { reason: String },
    NeedsReview,
    /// The run had already left `AwaitingDecision`; nothing was done
    AlreadyDecided { state: RunState },
    /// No run is recorded under the id; the clicked message was expired
    Expired,
}

impl Workflow {
    /// Phase two: apply a human decision to a parked run
    pub async fn decide(&self, request: DecisionRequest) -> Result<DecisionOutcome> {
        let decision = ApprovalDecision::from_action_id(&request.action_id)?;

        let run = match self
            .runs()
            .decide(&request.execution_id, decision, request.user.clone())
            .await
        {
            Ok(run) => run,
            Err(Error::Conflict(reason)) => {
                let state = self
                    .run(&request.execution_id)
                    .await?
                    .map(|r| r.state)
                    .ok_or_else(|| {
                        Error::NotFound(format!("Run {} not found", request.execution_id))
                    })?;
                tracing::warn!(
                    execution_id = %request.execution_id,
                    action_id = %request.action_id,
                    state = %state,
                    reason = %reason,
                    "Ignoring decision for run that is not awaiting one"
                );
                return Ok(DecisionOutcome::AlreadyDecided { state });
            }
            Err(Error::NotFound(reason)) => {
                let Some(message) = &request.message else {
                    return Err(Error::NotFound(reason));
                };
                tracing::warn!(
                    execution_id = %request.execution_id,
                    channel_id = %message.channel_id,
                    message_ts = %message.message_ts,
                    "Decision for unknown run; expiring approval message"
                );
                presenter::replace(
                    self.slack.as_ref(),
                    &message.channel_id,
                    &message.message_ts,
                    EXPIRED_TEXT,
                    presenter::notice_blocks(EXPIRED_TEXT),
                )
                .await;
                return Ok(DecisionOutcome::Expired);
            }
            Err(e) => return Err(e),
        };

        tracing::info!(
            execution_id = %run.execution_id,
            decision = ?decision,
            user = ?request.user,
            "Decision recorded"
        );

        match decision {
            ApprovalDecision::Approved => self.approve(run).await,
            ApprovalDecision::NeedsReview => {
                self.show_notice(&run, REVIEW_TEXT).await;
                self.complete_step(&run, Ok(())).await;
                Ok(DecisionOutcome::NeedsReview)
            }
        }
    }

    async fn approve(&self, mut run: WorkflowRun) -> Result<DecisionOutcome> {
        let Some(summary) = run.summary.clone() else {
            return Err(Error::Internal(format!(
                "Run {} was approved without a summary",
                run.execution_id
            )));
        };

        let outcome = match task_creator::create_task(
            self.crm.as_ref(),
            &summary,
            self.config.task_who_id.as_deref(),
        )
        .await
        {
            Ok(receipt) => {
                run.task_created(receipt.id.clone())?;
                DecisionOutcome::TaskCreated {
                    task_id: receipt.id,
                }
            }
            Err(e) => {
                run.task_failed(e.to_string())?;
                DecisionOutcome::TaskFailed {
                    reason: e.to_string(),
                }
            }
        };
        self.runs().update(&run).await?;

        match &outcome {
            DecisionOutcome::TaskFailed { reason } => {
                self.show_notice(&run, &presenter::failure_text(FailedStep::CreateTask))
                    .await;
                self.complete_step(&run, Err(reason.as_str())).await;
            }
            _ => {
                self.show_notice(&run, TASK_CREATED_TEXT).await;
                self.complete_step(&run, Ok(())).await;
            }
        }

        Ok(outcome)
    }

    async fn show_notice(&self, run: &WorkflowRun, text: &str) {
        presenter::show(
            self.slack.as_ref(),
            &run.thread,
            run.placeholder_ts.as_deref(),
            text,
            presenter::notice_blocks(text),
        )
        .await;
    }
}
