//! thread2task Chat Service
//!
//! Provides Slack functionality for the thread summary workflow:
//! - Slack Web API client for production (`chat.*`, `conversations.replies`,
//!   `auth.test`, `functions.complete*`)
//! - Block Kit message builders
//! - Inbound Events API and interactivity payload types
//! - Mock Slack service for testing and development

pub mod blocks;
pub mod client;
pub mod events;
pub mod mock;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use blocks::{Block, ButtonStyle, Element, TextObject};

pub const DEFAULT_SLACK_API_BASE_URL: &str = "https://slack.com/api";

#[derive(Error, Debug, Clone, PartialEq)]
pub enum SlackError {
    #[error("Slack configuration error: {0}")]
    Configuration(String),

    #[error("Slack request error: {0}")]
    Request(String),

    #[error("Slack response error: {0}")]
    Response(String),

    /// The Web API answered `{"ok": false, "error": ...}`
    #[error("Slack API error in {method}: {error}")]
    Api { method: String, error: String },
}

/// A raw message as returned by `conversations.replies`
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SlackMessage {
    #[serde(default)]
    pub ts: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bot_id: Option<String>,
    #[serde(default)]
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thread_ts: Option<String>,
}

/// One page of thread replies
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RepliesPage {
    pub messages: Vec<SlackMessage>,
    /// Cursor for the next page; `None` when exhausted
    pub next_cursor: Option<String>,
}

/// Identity of the token's bot user (`auth.test`)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthIdentity {
    pub user_id: String,
    #[serde(default)]
    pub bot_id: Option<String>,
    #[serde(default)]
    pub team_id: Option<String>,
}

/// A posted message handle
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PostedMessage {
    pub channel: String,
    pub ts: String,
}

/// Replacement content for an existing message (`chat.update`)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessageUpdate {
    pub channel: String,
    pub ts: String,
    /// Fallback text for notifications
    pub text: String,
    pub blocks: Vec<Block>,
}

/// Slack service configuration
#[derive(Clone)]
pub struct SlackConfig {
    /// Slack provider (slack, mock)
    pub provider: String,
    /// Bot token (`xoxb-...`)
    pub bot_token: String,
    /// Signing secret for inbound request verification
    pub signing_secret: String,
    pub api_base_url: String,
}

impl std::fmt::Debug for SlackConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SlackConfig")
            .field("provider", &self.provider)
            .field("bot_token", &"[REDACTED]")
            .field("signing_secret", &"[REDACTED]")
            .field("api_base_url", &self.api_base_url)
            .finish()
    }
}

impl SlackConfig {
    /// Create Slack config from environment variables
    pub fn from_env() -> Result<Self, SlackError> {
        dotenvy::dotenv().ok();

        let provider = std::env::var("SLACK_PROVIDER").unwrap_or_else(|_| "mock".to_string());
        let bot_token = std::env::var("SLACK_BOT_TOKEN").unwrap_or_default();
        let signing_secret = std::env::var("SLACK_SIGNING_SECRET").unwrap_or_else(|_| {
            if provider == "mock" {
                "mock-signing-secret".to_string()
            } else {
                String::new()
            }
        });
        let api_base_url = std::env::var("SLACK_API_BASE_URL")
            .unwrap_or_else(|_| DEFAULT_SLACK_API_BASE_URL.to_string());

        let config = Self {
            provider,
            bot_token,
            signing_secret,
            api_base_url,
        };
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), SlackError> {
        if self.provider != "slack" {
            return Ok(());
        }
        if self.bot_token.is_empty() {
            return Err(SlackError::Configuration(
                "SLACK_BOT_TOKEN is required for Slack provider".to_string(),
            ));
        }
        if self.signing_secret.is_empty() {
            return Err(SlackError::Configuration(
                "SLACK_SIGNING_SECRET is required for Slack provider".to_string(),
            ));
        }
        Ok(())
    }
}

/// Slack service trait for different implementations
#[async_trait::async_trait]
pub trait SlackService: Send + Sync {
    /// Identify the bot user behind the token.
    async fn auth_test(&self) -> Result<AuthIdentity, SlackError>;

    /// Post a plain-text message, optionally as a thread reply.
    async fn post_message(
        &self,
        channel: &str,
        thread_ts: Option<&str>,
        text: &str,
    ) -> Result<PostedMessage, SlackError>;

    /// Replace the content of an existing message in place.
    async fn update_message(&self, update: MessageUpdate) -> Result<(), SlackError>;

    /// Fetch one page of a thread (root message first).
    async fn conversation_replies(
        &self,
        channel: &str,
        ts: &str,
        cursor: Option<&str>,
    ) -> Result<RepliesPage, SlackError>;

    /// Report a custom workflow step as completed.
    async fn complete_function_success(
        &self,
        function_execution_id: &str,
        outputs: serde_json::Value,
    ) -> Result<(), SlackError>;

    /// Report a custom workflow step as failed.
    async fn complete_function_error(
        &self,
        function_execution_id: &str,
        error: &str,
    ) -> Result<(), SlackError>;
}

/// Factory for creating SlackService implementations
pub struct SlackServiceFactory;

impl SlackServiceFactory {
    pub fn create(config: SlackConfig) -> Result<Box<dyn SlackService>, SlackError> {
        match config.provider.as_str() {
            "slack" => {
                tracing::info!("Creating Slack Web API service");
                config.validate()?;
                Ok(Box::new(client::SlackClient::new(config)))
            }
            "mock" => {
                tracing::info!("Creating mock Slack service");
                Ok(Box::new(mock::MockSlackService::new()))
            }
            provider => Err(SlackError::Configuration(format!(
                "Unknown Slack provider: {}. Supported providers: slack, mock",
                provider
            ))),
        }
    }
}
