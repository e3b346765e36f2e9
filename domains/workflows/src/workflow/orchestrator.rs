//! Workflow orchestrator
//!
//! Sequences phase one: record the run, post the placeholder, fetch and
//! summarize the thread, then park the run and present the approval message.
//! Phase two lives in `actions`.

use std::sync::Arc;

use thread2task_common::Result;
use thread2task_crm::CrmService;
use thread2task_llm::LlmService;
use thread2task_slack::SlackService;

use crate::domain::entities::{ExecutionId, WorkflowRun};
use crate::repository::{RunStore, WorkflowsRepositories};
use crate::workflow::presenter::{self, FailedStep};
use crate::workflow::{fetcher, summarizer, WorkflowConfig, WorkflowTrigger};

/// The thread-to-task workflow and its collaborators
#[derive(Clone)]
pub struct Workflow {
    pub(crate) slack: Arc<dyn SlackService>,
    pub(crate) llm: Arc<dyn LlmService>,
    pub(crate) crm: Arc<dyn CrmService>,
    pub(crate) repos: WorkflowsRepositories,
    pub(crate) config: WorkflowConfig,
}

impl Workflow {
    pub fn new(
        slack: Arc<dyn SlackService>,
        llm: Arc<dyn LlmService>,
        crm: Arc<dyn CrmService>,
        repos: WorkflowsRepositories,
        config: WorkflowConfig,
    ) -> Self {
        Self {
            slack,
            llm,
            crm,
            repos,
            config,
        }
    }

    pub fn config(&self) -> &WorkflowConfig {
        &self.config
    }

    pub fn runs(&self) -> &dyn RunStore {
        self.repos.runs.as_ref()
    }

    /// Look up a run by execution id
    pub async fn run(&self, execution_id: &ExecutionId) -> Result<Option<WorkflowRun>> {
        self.runs().get(execution_id).await
    }

    /// Phase one: summarize the thread and present it for approval
    ///
    /// Returns the run as parked (`AwaitingDecision`) or failed. A duplicate
    /// execution id is rejected with `Conflict` before any side effect.
    pub async fn start(&self, trigger: WorkflowTrigger) -> Result<WorkflowRun> {
        let mut run = WorkflowRun::new(trigger.execution_id, trigger.origin, trigger.thread);
        self.runs().insert(run.clone()).await?;

        tracing::info!(
            execution_id = %run.execution_id,
            origin = ?run.origin,
            channel_id = %run.thread.channel_id,
            thread_ts = %run.thread.thread_ts,
            user = ?trigger.user,
            "Workflow run started"
        );

        let bot_user_id = match self.slack.auth_test().await {
            Ok(identity) => Some(identity.user_id),
            Err(e) => {
                tracing::warn!(
                    execution_id = %run.execution_id,
                    error = %e,
                    "Could not resolve bot identity; treating every message as a user message"
                );
                None
            }
        };

        if let Some(ts) = presenter::post_placeholder(self.slack.as_ref(), &run.thread).await {
            run.set_placeholder(ts);
            self.runs().update(&run).await?;
        }

        // The placeholder is already part of the thread; it is not conversation
        let messages: Vec<_> = fetcher::fetch_thread(self.slack.as_ref(), &run.thread)
            .await
            .into_iter()
            .filter(|m| Some(m.ts.as_str()) != run.placeholder_ts.as_deref())
            .collect();
        let conversation = summarizer::to_conversation(&messages, bot_user_id.as_deref());

        let summary = match summarizer::summarize(
            self.llm.as_ref(),
            &conversation,
            self.config.include_root_message,
        )
        .await
        {
            Ok(summary) => summary,
            Err(e) => {
                tracing::error!(
                    execution_id = %run.execution_id,
                    error = %e,
                    "Summarization failed"
                );
                run.summary_failed(e.to_string())?;
                self.runs().update(&run).await?;

                let text = presenter::failure_text(FailedStep::Summarize);
                presenter::show(
                    self.slack.as_ref(),
                    &run.thread,
                    run.placeholder_ts.as_deref(),
                    &text,
                    presenter::notice_blocks(&text),
                )
                .await;
                self.complete_step(&run, Err(&e.to_string())).await;
                return Ok(run);
            }
        };

        // Parked before the buttons exist so a fast click always finds it
        run.summary_ready(summary.clone())?;
        self.runs().update(&run).await?;

        presenter::show(
            self.slack.as_ref(),
            &run.thread,
            run.placeholder_ts.as_deref(),
            &summary.text,
            presenter::approval_blocks(&summary.text, &run.execution_id),
        )
        .await;

        tracing::info!(execution_id = %run.execution_id, "Awaiting approval decision");
        Ok(run)
    }

    /// Report the end of a custom step back to Slack
    pub(crate) async fn complete_step(&self, run: &WorkflowRun, outcome: std::result::Result<(), &str>) {
        if !run.is_function_step() {
            tracing::info!(
                execution_id = %run.execution_id,
                state = %run.state,
                "Workflow run finished"
            );
            return;
        }

        let result = match outcome {
            Ok(()) => {
                self.slack
                    .complete_function_success(run.execution_id.as_str(), serde_json::json!({}))
                    .await
            }
            Err(reason) => {
                self.slack
                    .complete_function_error(run.execution_id.as_str(), reason)
                    .await
            }
        };

        if let Err(e) = result {
            tracing::error!(
                execution_id = %run.execution_id,
                error = %e,
                "Failed to complete function execution"
            );
        }
    }
}
