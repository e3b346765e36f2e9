//! Mock Slack Service Implementation
//!
//! Programmable mock for testing the workflow:
//! - serves scripted threads from `conversation_replies` (paginated)
//! - hands out increasing message timestamps from `post_message`
//! - records every call for test assertions
//! - can be told to fail individual Web API methods
//!
//! Thread-safe via `Arc<Mutex<>>`.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

use crate::{
    AuthIdentity, MessageUpdate, PostedMessage, RepliesPage, SlackError, SlackMessage,
    SlackService,
};

/// Bot user id reported by `auth_test` unless overridden
pub const MOCK_BOT_USER_ID: &str = "UBOT000001";

/// A recorded Web API call
#[derive(Debug, Clone, PartialEq)]
pub enum SlackCall {
    AuthTest,
    PostMessage {
        channel: String,
        thread_ts: Option<String>,
        text: String,
        ts: String,
    },
    UpdateMessage(MessageUpdate),
    ConversationReplies {
        channel: String,
        ts: String,
        cursor: Option<String>,
    },
    CompleteFunctionSuccess {
        function_execution_id: String,
        outputs: serde_json::Value,
    },
    CompleteFunctionError {
        function_execution_id: String,
        error: String,
    },
}

#[derive(Debug, Default)]
struct MockState {
    bot_user_id: Option<String>,
    threads: HashMap<(String, String), Vec<SlackMessage>>,
    page_size: Option<usize>,
    failing: HashSet<String>,
    calls: Vec<SlackCall>,
    next_ts: u64,
}

/// Mock Slack service with scripted threads and call recording
#[derive(Debug, Clone, Default)]
pub struct MockSlackService {
    state: Arc<Mutex<MockState>>,
}

impl MockSlackService {
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve `messages` for the thread rooted at `(channel, thread_ts)`
    pub fn set_thread(&self, channel: &str, thread_ts: &str, messages: Vec<SlackMessage>) {
        self.lock()
            .threads
            .insert((channel.to_string(), thread_ts.to_string()), messages);
    }

    /// Override the bot user id returned from `auth_test`
    pub fn set_bot_user_id(&self, user_id: &str) {
        self.lock().bot_user_id = Some(user_id.to_string());
    }

    /// Split `conversation_replies` results into pages of `size`
    pub fn set_page_size(&self, size: usize) {
        self.lock().page_size = Some(size.max(1));
    }

    /// Make a Web API method (e.g. `"chat.update"`) answer `ok: false`
    pub fn fail_method(&self, method: &str) {
        self.lock().failing.insert(method.to_string());
    }

    /// Return all recorded calls
    pub fn recorded_calls(&self) -> Vec<SlackCall> {
        self.lock().calls.clone()
    }

    /// Return recorded `chat.update` calls
    pub fn recorded_updates(&self) -> Vec<MessageUpdate> {
        self.lock()
            .calls
            .iter()
            .filter_map(|call| match call {
                SlackCall::UpdateMessage(update) => Some(update.clone()),
                _ => None,
            })
            .collect()
    }

    /// Clear recorded calls, threads and failures.
    pub fn reset(&self) {
        *self.lock() = MockState::default();
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, MockState> {
        self.state
            .lock()
            .expect("slack mock lock poisoned — prior test panicked")
    }

    fn check(state: &MockState, method: &str) -> Result<(), SlackError> {
        if state.failing.contains(method) {
            return Err(SlackError::Api {
                method: method.to_string(),
                error: "mock_failure".to_string(),
            });
        }
        Ok(())
    }
}

#[async_trait::async_trait]
impl SlackService for MockSlackService {
    async fn auth_test(&self) -> Result<AuthIdentity, SlackError> {
        let mut state = self.lock();
        state.calls.push(SlackCall::AuthTest);
        Self::check(&state, "auth.test")?;

        Ok(AuthIdentity {
            user_id: state
                .bot_user_id
                .clone()
                .unwrap_or_else(|| MOCK_BOT_USER_ID.to_string()),
            bot_id: Some("BMOCK".to_string()),
            team_id: Some("TMOCK".to_string()),
        })
    }

    async fn post_message(
        &self,
        channel: &str,
        thread_ts: Option<&str>,
        text: &str,
    ) -> Result<PostedMessage, SlackError> {
        let mut state = self.lock();
        state.next_ts += 1;
        let ts = format!("1700000000.{:06}", state.next_ts);
        tracing::debug!(channel, ts = %ts, "Mock Slack: recording postMessage");
        state.calls.push(SlackCall::PostMessage {
            channel: channel.to_string(),
            thread_ts: thread_ts.map(str::to_string),
            text: text.to_string(),
            ts: ts.clone(),
        });
        Self::check(&state, "chat.postMessage")?;

        Ok(PostedMessage {
            channel: channel.to_string(),
            ts,
        })
    }

    async fn update_message(&self, update: MessageUpdate) -> Result<(), SlackError> {
        let mut state = self.lock();
        tracing::debug!(channel = %update.channel, ts = %update.ts, "Mock Slack: recording update");
        state.calls.push(SlackCall::UpdateMessage(update));
        Self::check(&state, "chat.update")
    }

    async fn conversation_replies(
        &self,
        channel: &str,
        ts: &str,
        cursor: Option<&str>,
    ) -> Result<RepliesPage, SlackError> {
        let mut state = self.lock();
        state.calls.push(SlackCall::ConversationReplies {
            channel: channel.to_string(),
            ts: ts.to_string(),
            cursor: cursor.map(str::to_string),
        });
        Self::check(&state, "conversations.replies")?;

        let Some(messages) = state.threads.get(&(channel.to_string(), ts.to_string())) else {
            return Err(SlackError::Api {
                method: "conversations.replies".to_string(),
                error: "thread_not_found".to_string(),
            });
        };

        let offset = cursor.and_then(|c| c.parse::<usize>().ok()).unwrap_or(0);
        let page_size = state.page_size.unwrap_or(messages.len().max(1));
        let end = (offset + page_size).min(messages.len());
        let page = messages.get(offset..end).unwrap_or_default().to_vec();
        let next_cursor = (end < messages.len()).then(|| end.to_string());

        Ok(RepliesPage {
            messages: page,
            next_cursor,
        })
    }

    async fn complete_function_success(
        &self,
        function_execution_id: &str,
        outputs: serde_json::Value,
    ) -> Result<(), SlackError> {
        let mut state = self.lock();
        state.calls.push(SlackCall::CompleteFunctionSuccess {
            function_execution_id: function_execution_id.to_string(),
            outputs,
        });
        Self::check(&state, "functions.completeSuccess")
    }

    async fn complete_function_error(
        &self,
        function_execution_id: &str,
        error: &str,
    ) -> Result<(), SlackError> {
        let mut state = self.lock();
        state.calls.push(SlackCall::CompleteFunctionError {
            function_execution_id: function_execution_id.to_string(),
            error: error.to_string(),
        });
        Self::check(&state, "functions.completeError")
    }
}
