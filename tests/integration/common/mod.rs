//! Common test utilities and fixtures for integration tests
//!
//! Builds the composed router over mock Slack, LLM and CRM services and
//! provides signed-request helpers for the Slack endpoints.

use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::Body,
    http::{header::CONTENT_TYPE, Method, Request, Response},
    Router,
};
use chrono::Utc;
use serde_json::{json, Value};

use thread2task_common::compute_slack_signature;
use thread2task_crm::mock::MockCrmService;
use thread2task_llm::mock::MockLlmService;
use thread2task_slack::mock::MockSlackService;
use thread2task_slack::{Block, Element, MessageUpdate, SlackMessage};
use thread2task_workflows::{
    Dispatch, Workflow, WorkflowConfig, WorkflowsRepositories, WorkflowsState,
};

pub const SIGNING_SECRET: &str = "integration-signing-secret"; // pragma: allowlist secret
pub const CHANNEL: &str = "C0TEST";
pub const HUMAN: &str = "UHUMAN01";

/// Composed application over recording mocks
pub struct TestApp {
    pub slack: MockSlackService,
    pub llm: MockLlmService,
    pub crm: MockCrmService,
    pub workflow: Arc<Workflow>,
}

impl TestApp {
    /// App whose summarizer always answers with `summary`
    pub fn new(summary: &str) -> Self {
        Self::with_config(summary, WorkflowConfig::default())
    }

    pub fn with_config(summary: &str, config: WorkflowConfig) -> Self {
        let slack = MockSlackService::new();
        let llm = MockLlmService::with_response(summary);
        let crm = MockCrmService::new();

        let workflow = Workflow::new(
            Arc::new(slack.clone()),
            Arc::new(llm.clone()),
            Arc::new(crm.clone()),
            WorkflowsRepositories::in_memory(),
            config,
        );

        Self {
            slack,
            llm,
            crm,
            workflow: Arc::new(workflow),
        }
    }

    /// Router that finishes each phase before answering, as on Lambda
    pub fn router(&self) -> Router {
        self.router_with(Dispatch::Inline)
    }

    /// Router that answers first and runs phases on spawned tasks
    pub fn background_router(&self) -> Router {
        self.router_with(Dispatch::Background)
    }

    fn router_with(&self, dispatch: Dispatch) -> Router {
        thread2task_app::build_router(
            WorkflowsState::new(self.workflow.clone(), SIGNING_SECRET).with_dispatch(dispatch),
        )
    }

    /// Script a thread: first message is the root
    pub fn thread(&self, thread_ts: &str, messages: &[(&str, &str)]) {
        let messages = messages
            .iter()
            .enumerate()
            .map(|(i, (user, text))| SlackMessage {
                ts: if i == 0 {
                    thread_ts.to_string()
                } else {
                    format!("{}{}", thread_ts, i)
                },
                user: Some(user.to_string()),
                text: text.to_string(),
                thread_ts: Some(thread_ts.to_string()),
                ..Default::default()
            })
            .collect();
        self.slack.set_thread(CHANNEL, thread_ts, messages);
    }
}

/// Build a request signed with [`SIGNING_SECRET`]
pub fn signed_request(uri: &str, content_type: &str, body: String) -> Request<Body> {
    signed_request_with(uri, content_type, body, SIGNING_SECRET, Utc::now().timestamp())
}

pub fn signed_request_with(
    uri: &str,
    content_type: &str,
    body: String,
    secret: &str,
    timestamp: i64,
) -> Request<Body> {
    let timestamp = timestamp.to_string();
    let signature = compute_slack_signature(secret, &timestamp, body.as_bytes());

    Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header(CONTENT_TYPE, content_type)
        .header("x-slack-request-timestamp", timestamp)
        .header("x-slack-signature", signature)
        .body(Body::from(body))
        .unwrap()
}

pub fn event_request(envelope: &Value) -> Request<Body> {
    signed_request("/slack/events", "application/json", envelope.to_string())
}

pub fn interaction_request(payload: &Value) -> Request<Body> {
    let body = format!("payload={}", urlencoding::encode(&payload.to_string()));
    signed_request(
        "/slack/interactions",
        "application/x-www-form-urlencoded",
        body,
    )
}

pub fn reaction_event(reaction: &str, channel: &str, ts: &str) -> Value {
    json!({
        "type": "event_callback",
        "team_id": "T0TEST",
        "event_id": "Ev0001",
        "event": {
            "type": "reaction_added",
            "user": HUMAN,
            "reaction": reaction,
            "item": {"type": "message", "channel": channel, "ts": ts},
            "item_user": HUMAN
        }
    })
}

pub fn function_event(execution_id: &str, channel: &str, thread_ts: &str) -> Value {
    json!({
        "type": "event_callback",
        "team_id": "T0TEST",
        "event_id": "Ev0002",
        "event": {
            "type": "function_executed",
            "function": {"callback_id": "summarize_thread_function"},
            "inputs": {"channel_id": channel, "thread_ts": thread_ts},
            "function_execution_id": execution_id
        }
    })
}

pub fn block_actions(action_id: &str, execution_id: &str) -> Value {
    json!({
        "type": "block_actions",
        "user": {"id": HUMAN, "username": "human"},
        "container": {"type": "message", "channel_id": CHANNEL, "message_ts": "1700000000.000001"},
        "actions": [{
            "type": "button",
            "block_id": "approve-deny-buttons",
            "action_id": action_id,
            "value": execution_id
        }]
    })
}

/// Execution id carried by the Approve button of an approval message
pub fn approval_execution_id(update: &MessageUpdate) -> Option<String> {
    update.blocks.iter().find_map(|block| match block {
        Block::Actions { elements, .. } => elements.iter().find_map(|element| match element {
            Element::Button { value, .. } => value.clone(),
        }),
        _ => None,
    })
}

/// Wait until `count` approval messages have been presented
///
/// Runs may be started on background tasks, so the test yields until they
/// park. Returns each approval update with its execution id.
pub async fn wait_for_approvals(slack: &MockSlackService, count: usize) -> Vec<(MessageUpdate, String)> {
    for _ in 0..200 {
        let approvals: Vec<(MessageUpdate, String)> = slack
            .recorded_updates()
            .into_iter()
            .filter_map(|u| approval_execution_id(&u).map(|id| (u, id)))
            .collect();
        if approvals.len() >= count {
            return approvals;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("timed out waiting for {} approval message(s)", count);
}

pub async fn wait_for_approval(slack: &MockSlackService) -> (MessageUpdate, String) {
    wait_for_approvals(slack, 1).await.remove(0)
}

/// Wait until the CRM has received `count` tasks
pub async fn wait_for_tasks(crm: &MockCrmService, count: usize) {
    for _ in 0..200 {
        if crm.created_tasks().len() >= count {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("timed out waiting for {} CRM task(s)", count);
}

pub async fn read_json(response: Response<Body>) -> Value {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&body).unwrap()
}

pub async fn read_text(response: Response<Body>) -> String {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    String::from_utf8(body.to_vec()).unwrap()
}
