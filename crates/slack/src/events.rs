//! Inbound Slack payloads
//!
//! Events API envelopes (`POST /slack/events`) and interactivity payloads
//! (`POST /slack/interactions`, form field `payload`).

use serde::{Deserialize, Serialize};

/// Events API request body
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EventEnvelope {
    /// Sent once when the request URL is configured
    UrlVerification { challenge: String },
    EventCallback {
        #[serde(default)]
        team_id: Option<String>,
        #[serde(default)]
        event_id: Option<String>,
        event: Event,
    },
    #[serde(other)]
    Unsupported,
}

/// Inner event of an `event_callback`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    ReactionAdded {
        #[serde(default)]
        user: Option<String>,
        reaction: String,
        item: ReactionItem,
        #[serde(default)]
        item_user: Option<String>,
    },
    /// A custom workflow step implemented by this app was invoked
    FunctionExecuted {
        function: FunctionRef,
        #[serde(default)]
        inputs: serde_json::Value,
        function_execution_id: String,
    },
    #[serde(other)]
    Unsupported,
}

/// The item a reaction was added to
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReactionItem {
    #[serde(rename = "type")]
    pub item_type: String,
    #[serde(default)]
    pub channel: Option<String>,
    #[serde(default)]
    pub ts: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionRef {
    pub callback_id: String,
}

/// Interactivity payload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum InteractionPayload {
    BlockActions(BlockActionsPayload),
    #[serde(other)]
    Unsupported,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlockActionsPayload {
    #[serde(default)]
    pub user: Option<InteractionUser>,
    pub container: Container,
    #[serde(default)]
    pub actions: Vec<BlockAction>,
    /// Present when the message belongs to a custom workflow step
    #[serde(default)]
    pub function_data: Option<FunctionData>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InteractionUser {
    pub id: String,
    #[serde(default)]
    pub username: Option<String>,
}

/// The message that carried the clicked element
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Container {
    #[serde(default)]
    pub channel_id: Option<String>,
    #[serde(default)]
    pub message_ts: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlockAction {
    pub action_id: String,
    #[serde(default)]
    pub block_id: Option<String>,
    #[serde(default)]
    pub value: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionData {
    pub execution_id: String,
}
