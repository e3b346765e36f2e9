//! Slack interactivity endpoint integration tests
//!
//! - POST /slack/interactions - Approve / Review button clicks

use axum::http::StatusCode;
use chrono::Utc;
use serde_json::json;
use tower::ServiceExt;

use thread2task_slack::mock::SlackCall;
use thread2task_slack::Block;
use thread2task_workflows::workflow::presenter::EXPIRED_TEXT;
use thread2task_workflows::{ExecutionId, RunState};

use crate::common::*;

const THREAD_TS: &str = "1700000300.000100";

/// Start a run through the events endpoint and wait until it is parked
async fn parked_run(app: &TestApp) -> (String, String) {
    app.thread(THREAD_TS, &[(HUMAN, "root"), (HUMAN, "we agreed to fix the bug")]);
    let response = app
        .router()
        .oneshot(event_request(&reaction_event("conversation-over", CHANNEL, THREAD_TS)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let (update, execution_id) = wait_for_approval(&app.slack).await;
    (execution_id, update.ts)
}

async fn click(app: &TestApp, action_id: &str, execution_id: &str) -> axum::response::Response {
    app.router()
        .oneshot(interaction_request(&block_actions(action_id, execution_id)))
        .await
        .unwrap()
}

async fn state_of(app: &TestApp, execution_id: &str) -> RunState {
    app.workflow
        .run(&ExecutionId::from(execution_id))
        .await
        .unwrap()
        .unwrap()
        .state
}

mod test_approve {
    use super::*;

    #[tokio::test]
    async fn test_approve_creates_task_and_updates_message() {
        let app = TestApp::new("- fix bug\n- ship release");
        let (execution_id, placeholder_ts) = parked_run(&app).await;

        let response = click(&app, "approve_button", &execution_id).await;
        assert_eq!(response.status(), StatusCode::OK);
        let body = read_json(response).await;
        assert_eq!(body["outcome"], "task_created");
        assert_eq!(body["task_id"], "00TMOCK00000001");

        let tasks = app.crm.created_tasks();
        assert_eq!(tasks.len(), 1);
        assert_eq!(tasks[0].description, "- fix bug\n- ship release");
        assert_eq!(
            tasks[0].subject,
            format!("Meeting notes from {}", Utc::now().date_naive().format("%Y-%m-%d"))
        );
        assert_eq!(tasks[0].activity_date, Utc::now().date_naive());

        let last = app.slack.recorded_updates().pop().unwrap();
        assert_eq!(last.ts, placeholder_ts);
        assert_eq!(last.blocks, vec![Block::context("Task created within Salesforce")]);

        assert_eq!(state_of(&app, &execution_id).await, RunState::TaskCreated);
    }

    #[tokio::test]
    async fn test_double_click_submits_once() {
        let app = TestApp::new("- x");
        let (execution_id, _) = parked_run(&app).await;

        let first = click(&app, "approve_button", &execution_id).await;
        assert_eq!(first.status(), StatusCode::OK);
        let updates_after_first = app.slack.recorded_updates().len();

        let second = click(&app, "approve_button", &execution_id).await;
        assert_eq!(second.status(), StatusCode::OK);
        let body = read_json(second).await;
        assert_eq!(body["outcome"], "already_decided");
        assert_eq!(body["state"], "task_created");

        assert_eq!(app.crm.created_tasks().len(), 1);
        assert_eq!(app.slack.recorded_updates().len(), updates_after_first);
    }

    #[tokio::test]
    async fn test_crm_failure_shows_warning() {
        let app = TestApp::new("- x");
        app.crm.fail_with("INVALID_SESSION_ID: Session expired or invalid");
        let (execution_id, _) = parked_run(&app).await;

        let response = click(&app, "approve_button", &execution_id).await;
        assert_eq!(response.status(), StatusCode::OK);
        let body = read_json(response).await;
        assert_eq!(body["outcome"], "task_failed");

        let last = app.slack.recorded_updates().pop().unwrap();
        assert!(last.text.starts_with(":warning:"));
        assert_eq!(state_of(&app, &execution_id).await, RunState::Failed);
    }
}

mod test_review {
    use super::*;

    #[tokio::test]
    async fn test_review_makes_no_crm_call() {
        let app = TestApp::new("- x");
        let (execution_id, placeholder_ts) = parked_run(&app).await;

        let response = click(&app, "review_button", &execution_id).await;
        assert_eq!(response.status(), StatusCode::OK);
        let body = read_json(response).await;
        assert_eq!(body["outcome"], "needs_review");

        assert!(app.crm.created_tasks().is_empty());

        let last = app.slack.recorded_updates().pop().unwrap();
        assert_eq!(last.ts, placeholder_ts);
        assert_eq!(last.blocks, vec![Block::context("Which part should I review?")]);
        assert_eq!(state_of(&app, &execution_id).await, RunState::NeedsReview);
    }

    #[tokio::test]
    async fn test_approve_after_review_is_ignored() {
        let app = TestApp::new("- x");
        let (execution_id, _) = parked_run(&app).await;

        click(&app, "review_button", &execution_id).await;
        let response = click(&app, "approve_button", &execution_id).await;

        assert_eq!(response.status(), StatusCode::OK);
        assert!(app.crm.created_tasks().is_empty());
        assert_eq!(state_of(&app, &execution_id).await, RunState::NeedsReview);
    }
}

mod test_rejections {
    use super::*;

    #[tokio::test]
    async fn test_unknown_action_is_bad_request() {
        let app = TestApp::new("- x");
        let (execution_id, _) = parked_run(&app).await;
        let updates_before = app.slack.recorded_updates().len();

        let response = click(&app, "deny_button", &execution_id).await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = read_json(response).await;
        assert_eq!(body["error"]["code"], "VALIDATION_ERROR");

        assert!(app.crm.created_tasks().is_empty());
        assert_eq!(app.slack.recorded_updates().len(), updates_before);
        assert_eq!(
            state_of(&app, &execution_id).await,
            RunState::AwaitingDecision
        );
    }

    #[tokio::test]
    async fn test_unknown_execution_id_expires_clicked_message() {
        let app = TestApp::new("- x");
        let response = click(&app, "approve_button", "no-such-run").await;
        assert_eq!(response.status(), StatusCode::OK);
        let body = read_json(response).await;
        assert_eq!(body["outcome"], "expired");

        assert!(app.crm.created_tasks().is_empty());
        let updates = app.slack.recorded_updates();
        assert_eq!(updates.len(), 1);
        assert_eq!(updates[0].channel, CHANNEL);
        assert_eq!(updates[0].ts, "1700000000.000001");
        assert_eq!(updates[0].blocks, vec![Block::context(EXPIRED_TEXT)]);
    }

    #[tokio::test]
    async fn test_unknown_execution_id_without_message_is_not_found() {
        let app = TestApp::new("- x");
        let payload = json!({
            "type": "block_actions",
            "user": {"id": HUMAN},
            "container": {},
            "actions": [{"action_id": "approve_button", "value": "no-such-run"}]
        });
        let response = app
            .router()
            .oneshot(interaction_request(&payload))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_click_after_restart_expires_approval_message() {
        let before = TestApp::new("- fix bug");
        let (execution_id, placeholder_ts) = parked_run(&before).await;

        // Fresh process: same Slack workspace, empty run store
        let after = TestApp::new("- fix bug");
        let mut payload = block_actions("approve_button", &execution_id);
        payload["container"]["message_ts"] = json!(placeholder_ts.as_str());

        let response = after
            .router()
            .oneshot(interaction_request(&payload))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(read_json(response).await["outcome"], "expired");

        assert!(after.crm.created_tasks().is_empty());
        let updates = after.slack.recorded_updates();
        assert_eq!(updates.len(), 1);
        assert_eq!(updates[0].ts, placeholder_ts);
        assert_eq!(updates[0].text, EXPIRED_TEXT);
    }

    #[tokio::test]
    async fn test_invalid_signature_is_unauthorized() {
        let app = TestApp::new("- x");
        let (execution_id, _) = parked_run(&app).await;

        let body = format!(
            "payload={}",
            urlencoding::encode(&block_actions("approve_button", &execution_id).to_string())
        );
        let request = signed_request_with(
            "/slack/interactions",
            "application/x-www-form-urlencoded",
            body,
            "forged-secret",
            Utc::now().timestamp(),
        );

        let response = app.router().oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert!(app.crm.created_tasks().is_empty());
    }

    #[tokio::test]
    async fn test_other_interaction_types_are_acknowledged() {
        let app = TestApp::new("- x");
        let response = app
            .router()
            .oneshot(interaction_request(&json!({
                "type": "view_submission",
                "view": {"id": "V1"}
            })))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }
}

mod test_function_steps {
    use super::*;

    #[tokio::test]
    async fn test_decision_completes_function_execution() {
        let app = TestApp::new("- x");
        app.thread(THREAD_TS, &[(HUMAN, "root"), (HUMAN, "reply")]);
        app.router()
            .oneshot(event_request(&function_event("Fx0STEP", CHANNEL, THREAD_TS)))
            .await
            .unwrap();
        let (_, execution_id) = wait_for_approval(&app.slack).await;

        let payload = json!({
            "type": "block_actions",
            "user": {"id": HUMAN},
            "container": {"type": "message", "channel_id": CHANNEL},
            "actions": [{"action_id": "approve_button", "value": execution_id}],
            "function_data": {"execution_id": "Fx0STEP"}
        });
        let response = app
            .router()
            .oneshot(interaction_request(&payload))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        assert!(app.slack.recorded_calls().iter().any(|c| matches!(
            c,
            SlackCall::CompleteFunctionSuccess { function_execution_id, outputs }
                if function_execution_id == "Fx0STEP" && outputs == &json!({})
        )));
    }
}

mod test_background_dispatch {
    use super::*;

    #[tokio::test]
    async fn test_click_is_acknowledged_before_task_creation() {
        let app = TestApp::new("- fix bug");
        let (execution_id, _) = parked_run(&app).await;

        let response = app
            .background_router()
            .oneshot(interaction_request(&block_actions("approve_button", &execution_id)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert!(read_text(response).await.is_empty());

        wait_for_tasks(&app.crm, 1).await;
        assert_eq!(app.crm.created_tasks()[0].description, "- fix bug");
    }

    #[tokio::test]
    async fn test_unknown_action_is_rejected_before_acknowledging() {
        let app = TestApp::new("- x");
        let (execution_id, _) = parked_run(&app).await;

        let response = app
            .background_router()
            .oneshot(interaction_request(&block_actions("deny_button", &execution_id)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        tokio::time::sleep(std::time::Duration::from_millis(50)).await;
        assert!(app.crm.created_tasks().is_empty());
        assert_eq!(
            state_of(&app, &execution_id).await,
            RunState::AwaitingDecision
        );
    }
}
