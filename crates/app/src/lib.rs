//! thread2task application composition root
//!
//! Builds the external services from the environment and composes the
//! workflow routes with the shared infrastructure routes.

use std::sync::Arc;

use axum::{routing::get, Router};
use thread2task_crm::{CrmConfig, CrmServiceFactory};
use thread2task_llm::{LlmConfig, LlmServiceFactory};
use thread2task_slack::{SlackConfig, SlackServiceFactory};
use thread2task_workflows::{
    Dispatch, Workflow, WorkflowConfig, WorkflowsRepositories, WorkflowsState,
};

/// Create the main application router with all routes
///
/// `dispatch` decides whether workflow phases finish before Slack is
/// answered; Lambda needs [`Dispatch::Inline`].
pub async fn create_app(dispatch: Dispatch) -> Result<Router, anyhow::Error> {
    // External services from environment
    let slack_config = SlackConfig::from_env()?;
    let signing_secret = slack_config.signing_secret.clone();
    let slack = SlackServiceFactory::create(slack_config)?;
    let llm = LlmServiceFactory::create(LlmConfig::from_env()?)?;
    let crm = CrmServiceFactory::create(CrmConfig::from_env()?)?;

    let workflow_config = WorkflowConfig::from_env()?;
    tracing::info!(
        trigger_reaction = %workflow_config.trigger_reaction,
        channels = workflow_config.trigger_channel_ids.len(),
        include_root_message = workflow_config.include_root_message,
        dispatch = ?dispatch,
        "Workflow configured"
    );

    let workflow = Workflow::new(
        Arc::from(slack),
        Arc::from(llm),
        Arc::from(crm),
        WorkflowsRepositories::in_memory(),
        workflow_config,
    );

    Ok(build_router(
        WorkflowsState::new(Arc::new(workflow), signing_secret).with_dispatch(dispatch),
    ))
}

/// Compose the workflow routes with the infrastructure routes
pub fn build_router(state: WorkflowsState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/", get(|| async { "thread2task v0.0.1-SNAPSHOT" }))
        .merge(thread2task_workflows::routes(state))
}

/// Health check endpoint
async fn health_check() -> &'static str {
    "OK"
}
