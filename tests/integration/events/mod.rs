//! Slack Events API endpoint integration tests
//!
//! - POST /slack/events - URL verification, trigger matching, signature checks
//! - GET /health

use std::time::Duration;

use axum::{
    body::Body,
    http::{Method, Request, StatusCode},
};
use chrono::Utc;
use serde_json::json;
use tower::ServiceExt;

use thread2task_slack::mock::SlackCall;
use thread2task_workflows::ExecutionId;

use crate::common::*;

mod test_verification {
    use super::*;

    #[tokio::test]
    async fn test_url_verification_echoes_challenge() {
        let app = TestApp::new("- x");
        let request = event_request(&json!({
            "type": "url_verification",
            "token": "legacy",
            "challenge": "3eZbrw1aBm2rZgRNFdxV2595E9CY3gmdALWMmHkvFXO7tYXAYM8P"
        }));

        let response = app.router().oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = read_json(response).await;
        assert_eq!(
            body["challenge"],
            "3eZbrw1aBm2rZgRNFdxV2595E9CY3gmdALWMmHkvFXO7tYXAYM8P"
        );
    }

    #[tokio::test]
    async fn test_missing_signature_is_unauthorized() {
        let app = TestApp::new("- x");
        let request = Request::builder()
            .method(Method::POST)
            .uri("/slack/events")
            .header("content-type", "application/json")
            .body(Body::from(json!({"type": "url_verification", "challenge": "c"}).to_string()))
            .unwrap();

        let response = app.router().oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        let body = read_json(response).await;
        assert_eq!(body["error"]["code"], "AUTHENTICATION_ERROR");
    }

    #[tokio::test]
    async fn test_wrong_secret_is_unauthorized() {
        let app = TestApp::new("- x");
        let request = signed_request_with(
            "/slack/events",
            "application/json",
            json!({"type": "url_verification", "challenge": "c"}).to_string(),
            "not-the-secret",
            Utc::now().timestamp(),
        );

        let response = app.router().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_stale_timestamp_is_unauthorized() {
        let app = TestApp::new("- x");
        let request = signed_request_with(
            "/slack/events",
            "application/json",
            json!({"type": "url_verification", "challenge": "c"}).to_string(),
            SIGNING_SECRET,
            Utc::now().timestamp() - 60 * 10,
        );

        let response = app.router().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_malformed_body_is_bad_request() {
        let app = TestApp::new("- x");
        let request = signed_request("/slack/events", "application/json", "{not json".to_string());

        let response = app.router().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}

mod test_triggers {
    use super::*;

    #[tokio::test]
    async fn test_matching_reaction_starts_run() {
        let app = TestApp::new("- decided to ship");
        app.thread("1700000100.000100", &[(HUMAN, "root"), (HUMAN, "let's ship")]);

        let request = event_request(&reaction_event("conversation-over", CHANNEL, "1700000100.000100"));
        let response = app.router().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let (update, execution_id) = wait_for_approval(&app.slack).await;
        assert_eq!(update.channel, CHANNEL);

        let calls = app.slack.recorded_calls();
        assert!(calls.iter().any(|c| matches!(
            c,
            SlackCall::PostMessage { thread_ts: Some(ts), ts: placeholder, .. }
                if ts == "1700000100.000100" && placeholder == &update.ts
        )));

        let run = app
            .workflow
            .run(&ExecutionId::from(execution_id.as_str()))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(run.summary.unwrap().text, "- decided to ship");
    }

    #[tokio::test]
    async fn test_inline_dispatch_parks_run_before_answering() {
        let app = TestApp::new("- parked");
        app.thread("1700000100.000200", &[(HUMAN, "root"), (HUMAN, "reply")]);

        let request = event_request(&reaction_event("conversation-over", CHANNEL, "1700000100.000200"));
        let response = app.router().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let approvals: Vec<_> = app
            .slack
            .recorded_updates()
            .iter()
            .filter_map(approval_execution_id)
            .collect();
        assert_eq!(approvals.len(), 1);
        let run = app
            .workflow
            .run(&ExecutionId::from(approvals[0].as_str()))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(run.state, thread2task_workflows::RunState::AwaitingDecision);
    }

    #[tokio::test]
    async fn test_background_dispatch_starts_run_after_ack() {
        let app = TestApp::new("- later");
        app.thread("1700000100.000300", &[(HUMAN, "root"), (HUMAN, "reply")]);

        let request = event_request(&reaction_event("conversation-over", CHANNEL, "1700000100.000300"));
        let response = app.background_router().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let (_, execution_id) = wait_for_approval(&app.slack).await;
        let run = app
            .workflow
            .run(&ExecutionId::from(execution_id.as_str()))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(run.summary.unwrap().text, "- later");
    }

    #[tokio::test]
    async fn test_other_reaction_starts_nothing() {
        let app = TestApp::new("- x");
        app.thread("1700000100.000100", &[(HUMAN, "root")]);

        let request = event_request(&reaction_event("thumbsup", CHANNEL, "1700000100.000100"));
        let response = app.router().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(app.slack.recorded_calls().is_empty());
        assert!(app.llm.recorded_requests().is_empty());
    }

    #[tokio::test]
    async fn test_channel_outside_allow_list_starts_nothing() {
        let app = TestApp::with_config(
            "- x",
            thread2task_workflows::WorkflowConfig {
                trigger_channel_ids: vec!["CALLOWED".to_string()],
                ..Default::default()
            },
        );

        let request = event_request(&reaction_event("conversation-over", CHANNEL, "1.0"));
        let response = app.router().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(app.llm.recorded_requests().is_empty());
    }

    #[tokio::test]
    async fn test_retried_delivery_is_ignored() {
        let app = TestApp::new("- x");
        app.thread("1700000100.000100", &[(HUMAN, "root")]);

        let mut request = event_request(&reaction_event("conversation-over", CHANNEL, "1700000100.000100"));
        request
            .headers_mut()
            .insert("x-slack-retry-num", "1".parse().unwrap());

        let response = app.router().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(app.llm.recorded_requests().is_empty());
    }

    #[tokio::test]
    async fn test_function_step_uses_slack_execution_id() {
        let app = TestApp::new("- x");
        app.thread("1700000200.000100", &[(HUMAN, "root"), (HUMAN, "reply")]);

        let request = event_request(&function_event("Fx0TEST", CHANNEL, "1700000200.000100"));
        let response = app.router().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let (_, execution_id) = wait_for_approval(&app.slack).await;
        assert_eq!(execution_id, "Fx0TEST");
    }

    #[tokio::test]
    async fn test_unsupported_event_is_acknowledged() {
        let app = TestApp::new("- x");
        let request = event_request(&json!({
            "type": "event_callback",
            "event": {"type": "message", "text": "hello", "channel": CHANNEL}
        }));

        let response = app.router().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }
}

mod test_health {
    use super::*;

    #[tokio::test]
    async fn test_health_is_unsigned() {
        let app = TestApp::new("- x");
        let request = Request::builder()
            .method(Method::GET)
            .uri("/health")
            .body(Body::empty())
            .unwrap();

        let response = app.router().oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(read_text(response).await, "OK");
    }
}
