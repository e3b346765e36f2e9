//! Slack interactivity handler (button clicks)

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Form, Json,
};
use serde::Deserialize;

use thread2task_common::{Error, Result};
use thread2task_slack::events::{BlockActionsPayload, InteractionPayload};

use crate::api::middleware::{Dispatch, WorkflowsState};
use crate::domain::entities::{ApprovalDecision, ExecutionId};
use crate::workflow::{ClickedMessage, DecisionRequest};

/// Form body Slack posts to the interactivity URL
#[derive(Debug, Deserialize)]
pub struct InteractionForm {
    pub payload: String,
}

/// Receive a `block_actions` payload and apply the decision
///
/// Unknown actions are rejected before anything runs. With
/// [`Dispatch::Background`] the click is acknowledged at once and the decision
/// is applied on a spawned task, keeping a slow CRM call inside Slack's
/// three-second window. With [`Dispatch::Inline`] the decision outcome is the
/// response body.
pub async fn slack_interactions(
    State(state): State<WorkflowsState>,
    Form(form): Form<InteractionForm>,
) -> Result<Response> {
    let payload: InteractionPayload = serde_json::from_str(&form.payload)?;

    let InteractionPayload::BlockActions(actions) = payload else {
        tracing::debug!("Ignoring unsupported interaction payload");
        return Ok(StatusCode::OK.into_response());
    };

    let request = decision_request(&actions)?;
    ApprovalDecision::from_action_id(&request.action_id)?;

    match state.dispatch {
        Dispatch::Inline => {
            let outcome = state.workflow.decide(request).await?;
            Ok(Json(outcome).into_response())
        }
        Dispatch::Background => {
            let workflow = state.workflow.clone();
            tokio::spawn(async move {
                let execution_id = request.execution_id.clone();
                if let Err(e) = workflow.decide(request).await {
                    tracing::error!(
                        execution_id = %execution_id,
                        error = %e,
                        "Decision failed"
                    );
                }
            });
            Ok(StatusCode::OK.into_response())
        }
    }
}

/// Extract the decision from a `block_actions` payload
///
/// The execution id comes from the button value, falling back to the
/// payload's `function_data`.
pub fn decision_request(payload: &BlockActionsPayload) -> Result<DecisionRequest> {
    let action = payload
        .actions
        .first()
        .ok_or_else(|| Error::Validation("block_actions payload has no actions".to_string()))?;

    let execution_id = action
        .value
        .clone()
        .filter(|v| !v.is_empty())
        .or_else(|| payload.function_data.as_ref().map(|f| f.execution_id.clone()))
        .ok_or_else(|| Error::Validation("Action carries no execution id".to_string()))?;

    let message = match (&payload.container.channel_id, &payload.container.message_ts) {
        (Some(channel_id), Some(message_ts)) => Some(ClickedMessage {
            channel_id: channel_id.clone(),
            message_ts: message_ts.clone(),
        }),
        _ => None,
    };

    Ok(DecisionRequest {
        execution_id: ExecutionId::from(execution_id),
        action_id: action.action_id.clone(),
        user: payload.user.as_ref().map(|u| u.id.clone()),
        message,
    })
}
