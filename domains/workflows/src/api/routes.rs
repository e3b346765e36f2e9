//! Route definitions for Workflows domain API

use axum::{middleware, routing::post, Router};

use super::handlers::{events, interactions};
use super::middleware::{verify_slack_request, WorkflowsState};

/// Create the Slack inbound routes, signature-verified
pub fn routes(state: WorkflowsState) -> Router {
    Router::new()
        .route("/slack/events", post(events::slack_events))
        .route("/slack/interactions", post(interactions::slack_interactions))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            verify_slack_request,
        ))
        .with_state(state)
}
