//! Slack Events API handler

use axum::{
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use thread2task_common::Result;
use thread2task_slack::events::EventEnvelope;

use crate::api::middleware::{Dispatch, WorkflowsState};
use crate::workflow::trigger_from_event;

pub const SLACK_RETRY_HEADER: &str = "x-slack-retry-num";

/// Receive an Events API request
///
/// Slack expects an answer within three seconds. With [`Dispatch::Background`]
/// the run starts on a spawned task and the request is acknowledged at once.
/// With [`Dispatch::Inline`] phase one finishes first; a late answer makes
/// Slack redeliver, and redeliveries are ignored.
pub async fn slack_events(
    State(state): State<WorkflowsState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response> {
    let envelope: EventEnvelope = serde_json::from_slice(&body)?;

    match envelope {
        EventEnvelope::UrlVerification { challenge } => {
            tracing::info!("Answering Slack URL verification");
            Ok(Json(json!({ "challenge": challenge })).into_response())
        }
        EventEnvelope::EventCallback {
            event_id, event, ..
        } => {
            if let Some(retry) = headers.get(SLACK_RETRY_HEADER) {
                tracing::info!(event_id = ?event_id, retry = ?retry, "Ignoring Slack event retry");
                return Ok(StatusCode::OK.into_response());
            }

            match trigger_from_event(&event, state.workflow.config()) {
                Ok(Some(trigger)) => {
                    tracing::info!(
                        event_id = ?event_id,
                        execution_id = %trigger.execution_id,
                        "Event matched workflow trigger"
                    );
                    let workflow = state.workflow.clone();
                    let run = async move {
                        if let Err(e) = workflow.start(trigger).await {
                            tracing::error!(error = %e, "Workflow run aborted");
                        }
                    };
                    match state.dispatch {
                        Dispatch::Background => {
                            tokio::spawn(run);
                        }
                        Dispatch::Inline => run.await,
                    }
                }
                Ok(None) => {
                    tracing::debug!(event_id = ?event_id, "Event does not match any trigger");
                }
                Err(e) => {
                    tracing::warn!(event_id = ?event_id, error = %e, "Ignoring malformed trigger event");
                }
            }

            Ok(StatusCode::OK.into_response())
        }
        EventEnvelope::Unsupported => Ok(StatusCode::OK.into_response()),
    }
}
