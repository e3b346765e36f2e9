//! Summarizer
//!
//! Turns a thread into a single chat-completion request and returns the first
//! choice's text. Bot-authored messages are replayed as `assistant` turns,
//! everything else as `user` turns.

use thiserror::Error;

use thread2task_llm::{CompletionRequest, LlmError, LlmMessage, LlmService};
use thread2task_slack::SlackMessage;

use crate::domain::entities::{ConversationMessage, SummaryResult};

pub const SYSTEM_PROMPT: &str = "You are a helpful assistant.";

pub const SUMMARY_INSTRUCTION: &str = "Please provide a bullet-point summary of the conclusions drawn from the conversation, followed by a list of actionable tasks derived from those conclusions.";

#[derive(Error, Debug)]
pub enum SummarizeError {
    #[error("completion request failed: {0}")]
    Completion(#[from] LlmError),

    #[error("completion returned no summary text")]
    EmptySummary,
}

/// Reduce raw thread messages to conversation turns, preserving order
pub fn to_conversation(
    messages: &[SlackMessage],
    bot_user_id: Option<&str>,
) -> Vec<ConversationMessage> {
    messages
        .iter()
        .map(|m| ConversationMessage {
            author_is_bot: bot_user_id.is_some() && m.user.as_deref() == bot_user_id,
            text: m.text.clone(),
        })
        .collect()
}

/// Build the completion request for a conversation
///
/// The thread's root message is left out unless `include_root` is set.
pub fn build_request(
    conversation: &[ConversationMessage],
    include_root: bool,
    model: &str,
) -> CompletionRequest {
    let skip = if include_root { 0 } else { 1 };

    let mut messages = Vec::with_capacity(conversation.len() + 1);
    messages.push(LlmMessage::user(SUMMARY_INSTRUCTION));
    messages.extend(conversation.iter().skip(skip).map(|m| {
        if m.author_is_bot {
            LlmMessage::assistant(m.text.clone())
        } else {
            LlmMessage::user(m.text.clone())
        }
    }));

    CompletionRequest {
        model: model.to_string(),
        system_prompt: Some(SYSTEM_PROMPT.to_string()),
        messages,
        max_tokens: None,
    }
}

/// Summarize a conversation with one completion call
pub async fn summarize(
    llm: &dyn LlmService,
    conversation: &[ConversationMessage],
    include_root: bool,
) -> Result<SummaryResult, SummarizeError> {
    let request = build_request(conversation, include_root, llm.default_model());
    tracing::debug!(
        model = %request.model,
        turns = request.messages.len(),
        "Requesting thread summary"
    );

    let response = llm.complete(request).await?;
    if response.content.trim().is_empty() {
        return Err(SummarizeError::EmptySummary);
    }

    tracing::info!(
        model = %response.model,
        input_tokens = response.input_tokens,
        output_tokens = response.output_tokens,
        "Thread summarized"
    );

    Ok(SummaryResult::new(response.content))
}
