//! Slack Web API Client Implementation
//!
//! Calls `{api_base_url}/{method}` with the bot token. The Web API reports
//! failures in the body (`{"ok": false, "error": "..."}`) even on HTTP 200;
//! those surface as [`SlackError::Api`].

use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::json;

use crate::{
    AuthIdentity, MessageUpdate, PostedMessage, RepliesPage, SlackConfig, SlackError,
    SlackMessage, SlackService,
};

/// Page size requested from `conversations.replies`
const REPLIES_PAGE_LIMIT: u32 = 200;

#[derive(Debug, Deserialize)]
struct PostMessageResponse {
    channel: String,
    ts: String,
}

#[derive(Debug, Deserialize)]
struct RepliesResponse {
    #[serde(default)]
    messages: Vec<SlackMessage>,
    #[serde(default)]
    response_metadata: Option<ResponseMetadata>,
}

#[derive(Debug, Deserialize)]
struct ResponseMetadata {
    #[serde(default)]
    next_cursor: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Ignored {}

/// Real Slack Web API client.
pub struct SlackClient {
    http: reqwest::Client,
    bot_token: String,
    base_url: String,
}

impl SlackClient {
    /// Create a new Slack client from configuration.
    pub fn new(config: SlackConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            bot_token: config.bot_token,
            base_url: config.api_base_url.trim_end_matches('/').to_string(),
        }
    }

    fn url(&self, method: &str) -> String {
        format!("{}/{}", self.base_url, method)
    }

    /// Unwrap the `{ok, error}` envelope shared by every Web API method.
    async fn read_envelope<T: DeserializeOwned>(
        method: &str,
        response: reqwest::Response,
    ) -> Result<T, SlackError> {
        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Failed to read response body".to_string());
            return Err(SlackError::Response(format!(
                "Slack API {} returned {}: {}",
                method, status, body
            )));
        }

        let body: serde_json::Value = response
            .json()
            .await
            .map_err(|e| SlackError::Response(format!("Failed to parse {}: {}", method, e)))?;

        if !body.get("ok").and_then(|v| v.as_bool()).unwrap_or(false) {
            let error = body
                .get("error")
                .and_then(|v| v.as_str())
                .unwrap_or("unknown_error")
                .to_string();
            return Err(SlackError::Api {
                method: method.to_string(),
                error,
            });
        }

        serde_json::from_value(body)
            .map_err(|e| SlackError::Response(format!("Unexpected {} body: {}", method, e)))
    }

    async fn post_json<T: DeserializeOwned>(
        &self,
        method: &str,
        body: serde_json::Value,
    ) -> Result<T, SlackError> {
        let response = self
            .http
            .post(self.url(method))
            .bearer_auth(&self.bot_token)
            .json(&body)
            .send()
            .await
            .map_err(|e| SlackError::Request(format!("{}: {}", method, e)))?;

        Self::read_envelope(method, response).await
    }
}

#[async_trait::async_trait]
impl SlackService for SlackClient {
    async fn auth_test(&self) -> Result<AuthIdentity, SlackError> {
        self.post_json("auth.test", json!({})).await
    }

    async fn post_message(
        &self,
        channel: &str,
        thread_ts: Option<&str>,
        text: &str,
    ) -> Result<PostedMessage, SlackError> {
        let mut body = json!({ "channel": channel, "text": text });
        if let Some(thread_ts) = thread_ts {
            body["thread_ts"] = json!(thread_ts);
        }

        let posted: PostMessageResponse = self.post_json("chat.postMessage", body).await?;
        tracing::debug!(channel = %posted.channel, ts = %posted.ts, "Slack message posted");

        Ok(PostedMessage {
            channel: posted.channel,
            ts: posted.ts,
        })
    }

    async fn update_message(&self, update: MessageUpdate) -> Result<(), SlackError> {
        let body = serde_json::to_value(&update)
            .map_err(|e| SlackError::Request(format!("chat.update: {}", e)))?;
        let _: Ignored = self.post_json("chat.update", body).await?;
        tracing::debug!(channel = %update.channel, ts = %update.ts, "Slack message updated");
        Ok(())
    }

    async fn conversation_replies(
        &self,
        channel: &str,
        ts: &str,
        cursor: Option<&str>,
    ) -> Result<RepliesPage, SlackError> {
        let limit = REPLIES_PAGE_LIMIT.to_string();
        let mut query = vec![("channel", channel), ("ts", ts), ("limit", limit.as_str())];
        if let Some(cursor) = cursor {
            query.push(("cursor", cursor));
        }

        let response = self
            .http
            .get(self.url("conversations.replies"))
            .bearer_auth(&self.bot_token)
            .query(&query)
            .send()
            .await
            .map_err(|e| SlackError::Request(format!("conversations.replies: {}", e)))?;

        let replies: RepliesResponse =
            Self::read_envelope("conversations.replies", response).await?;

        let next_cursor = replies
            .response_metadata
            .and_then(|m| m.next_cursor)
            .filter(|c| !c.is_empty());

        Ok(RepliesPage {
            messages: replies.messages,
            next_cursor,
        })
    }

    async fn complete_function_success(
        &self,
        function_execution_id: &str,
        outputs: serde_json::Value,
    ) -> Result<(), SlackError> {
        let _: Ignored = self
            .post_json(
                "functions.completeSuccess",
                json!({ "function_execution_id": function_execution_id, "outputs": outputs }),
            )
            .await?;
        Ok(())
    }

    async fn complete_function_error(
        &self,
        function_execution_id: &str,
        error: &str,
    ) -> Result<(), SlackError> {
        let _: Ignored = self
            .post_json(
                "functions.completeError",
                json!({ "function_execution_id": function_execution_id, "error": error }),
            )
            .await?;
        Ok(())
    }
}
