//! Mock LLM Service Implementation
//!
//! Used by `LlmServiceFactory` when provider is `"mock"`.
//! Returns deterministic responses, records requests, and can be scripted
//! to return a fixed completion or an error.

use std::sync::{Arc, Mutex};

use crate::{CompletionRequest, CompletionResponse, LlmError, LlmService};

/// What the mock should answer with
#[derive(Debug, Clone, Default, PartialEq)]
pub enum MockCompletion {
    /// Echo the last message ("Mock response to: ...")
    #[default]
    Echo,
    /// Always answer with this content
    Fixed(String),
    /// Answer with no choices
    Empty,
    /// Fail at the transport level
    Fail(String),
}

/// Mock LLM service for testing
#[derive(Debug, Clone, Default)]
pub struct MockLlmService {
    behavior: Arc<Mutex<MockCompletion>>,
    requests: Arc<Mutex<Vec<CompletionRequest>>>,
}

impl MockLlmService {
    /// Create a new mock LLM service
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a mock that always answers with `content`
    pub fn with_response(content: impl Into<String>) -> Self {
        let service = Self::new();
        service.set_behavior(MockCompletion::Fixed(content.into()));
        service
    }

    /// Change how the mock answers subsequent requests
    pub fn set_behavior(&self, behavior: MockCompletion) {
        *self
            .behavior
            .lock()
            .expect("behavior lock poisoned — prior test panicked") = behavior;
    }

    /// Return all recorded requests
    pub fn recorded_requests(&self) -> Vec<CompletionRequest> {
        self.requests
            .lock()
            .expect("requests lock poisoned — prior test panicked")
            .clone()
    }
}

#[async_trait::async_trait]
impl LlmService for MockLlmService {
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, LlmError> {
        tracing::info!("Mock LLM service processing completion request");

        self.requests
            .lock()
            .map_err(|e| LlmError::Request(format!("requests lock poisoned: {e}")))?
            .push(request.clone());

        let behavior = self
            .behavior
            .lock()
            .map_err(|e| LlmError::Request(format!("behavior lock poisoned: {e}")))?
            .clone();

        let model = if request.model.is_empty() {
            "mock-model".to_string()
        } else {
            request.model
        };

        let content = match behavior {
            MockCompletion::Echo => {
                let last_message = request
                    .messages
                    .last()
                    .map(|m| m.content.as_str())
                    .unwrap_or("empty");
                format!("Mock response to: {}", last_message)
            }
            MockCompletion::Fixed(content) => content,
            MockCompletion::Empty => return Err(LlmError::EmptyCompletion),
            MockCompletion::Fail(message) => return Err(LlmError::Request(message)),
        };

        let input_tokens = request
            .messages
            .iter()
            .map(|m| m.content.len() as i32 / 4)
            .sum::<i32>();
        let output_tokens = content.len() as i32 / 4;

        Ok(CompletionResponse {
            content,
            model,
            input_tokens,
            output_tokens,
            stop_reason: "stop".to_string(),
        })
    }

    fn default_model(&self) -> &str {
        "mock-model"
    }
}
