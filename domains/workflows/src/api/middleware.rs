//! Workflows domain state and Slack request verification

use std::sync::Arc;

use axum::{
    body::{to_bytes, Body},
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use chrono::Utc;

use thread2task_common::{verify_slack_signature, Error, Result};

use crate::workflow::Workflow;

pub const SLACK_TIMESTAMP_HEADER: &str = "x-slack-request-timestamp";
pub const SLACK_SIGNATURE_HEADER: &str = "x-slack-signature";

/// Largest request body accepted from Slack
pub const MAX_BODY_BYTES: usize = 1024 * 1024;

/// When a workflow phase runs relative to the Slack acknowledgement
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Dispatch {
    /// Acknowledge at once and finish the phase on a spawned task.
    /// Needs a process that outlives the response.
    #[default]
    Background,
    /// Finish the phase before answering. Used on Lambda, where the
    /// environment is frozen once the response is sent.
    Inline,
}

/// Application state for the Workflows domain
#[derive(Clone)]
pub struct WorkflowsState {
    pub workflow: Arc<Workflow>,
    pub signing_secret: String,
    pub dispatch: Dispatch,
}

impl WorkflowsState {
    pub fn new(workflow: Arc<Workflow>, signing_secret: impl Into<String>) -> Self {
        Self {
            workflow,
            signing_secret: signing_secret.into(),
            dispatch: Dispatch::default(),
        }
    }

    pub fn with_dispatch(mut self, dispatch: Dispatch) -> Self {
        self.dispatch = dispatch;
        self
    }
}

/// Reject requests that are not signed with the Slack signing secret
///
/// The body is buffered to compute the signature and handed on unchanged.
pub async fn verify_slack_request(
    State(state): State<WorkflowsState>,
    request: Request,
    next: Next,
) -> Result<Response> {
    let (parts, body) = request.into_parts();
    let bytes = to_bytes(body, MAX_BODY_BYTES)
        .await
        .map_err(|e| Error::Validation(format!("Unreadable request body: {}", e)))?;

    let header = |name: &str| {
        parts
            .headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
    };

    let timestamp = header(SLACK_TIMESTAMP_HEADER)
        .ok_or_else(|| Error::Authentication("Missing Slack request timestamp".to_string()))?;
    let signature = header(SLACK_SIGNATURE_HEADER)
        .ok_or_else(|| Error::Authentication("Missing Slack signature".to_string()))?;

    if !verify_slack_signature(
        &state.signing_secret,
        &timestamp,
        &bytes,
        &signature,
        Utc::now().timestamp(),
    ) {
        tracing::warn!(path = %parts.uri.path(), "Rejected request with invalid Slack signature");
        return Err(Error::Authentication(
            "Invalid Slack request signature".to_string(),
        ));
    }

    Ok(next.run(Request::from_parts(parts, Body::from(bytes))).await)
}
