//! Mock CRM Service Implementation
//!
//! Stores created tasks in memory for test assertions and can be switched
//! into a failing mode. Thread-safe via `Arc<Mutex<>>`.

use std::sync::{Arc, Mutex};

use crate::{CrmError, CrmService, TaskReceipt, TaskRecord};

#[derive(Debug, Default)]
struct MockState {
    tasks: Vec<TaskRecord>,
    failure: Option<String>,
}

/// Mock CRM service that records created tasks
#[derive(Debug, Clone, Default)]
pub struct MockCrmService {
    state: Arc<Mutex<MockState>>,
}

impl MockCrmService {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent `create_task` fail with `message`
    pub fn fail_with(&self, message: impl Into<String>) {
        self.lock().failure = Some(message.into());
    }

    /// Return all successfully created tasks
    pub fn created_tasks(&self) -> Vec<TaskRecord> {
        self.lock().tasks.clone()
    }

    /// Clear created tasks and any configured failure.
    pub fn reset(&self) {
        *self.lock() = MockState::default();
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, MockState> {
        self.state
            .lock()
            .expect("crm mock lock poisoned — prior test panicked")
    }
}

#[async_trait::async_trait]
impl CrmService for MockCrmService {
    async fn create_task(&self, task: TaskRecord) -> Result<TaskReceipt, CrmError> {
        let mut state = self
            .state
            .lock()
            .map_err(|e| CrmError::Request(format!("crm mock lock poisoned: {e}")))?;

        if let Some(message) = &state.failure {
            return Err(CrmError::Response(message.clone()));
        }

        tracing::debug!(subject = %task.subject, "Mock CRM: recording task");
        state.tasks.push(task);
        Ok(TaskReceipt {
            id: format!("00TMOCK{:08}", state.tasks.len()),
        })
    }
}
