//! Workflow run store
//!
//! Runs are parked here between the two workflow phases. The `decide`
//! operation is the only way out of `AwaitingDecision` and is atomic, so a
//! replayed or double-clicked decision can never be claimed twice.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::RwLock;

use thread2task_common::{Error, Result};

use crate::domain::entities::{ApprovalDecision, ExecutionId, WorkflowRun};

#[async_trait::async_trait]
pub trait RunStore: Send + Sync {
    /// Store a new run; fails with `Conflict` if the id is taken
    async fn insert(&self, run: WorkflowRun) -> Result<()>;

    /// Find a run by execution id
    async fn get(&self, id: &ExecutionId) -> Result<Option<WorkflowRun>>;

    /// Replace an existing run
    async fn update(&self, run: &WorkflowRun) -> Result<()>;

    /// Atomically apply a decision to a run awaiting one
    ///
    /// Returns the updated run. `NotFound` for an unknown id, `Conflict` if
    /// the run is not in `AwaitingDecision`.
    async fn decide(
        &self,
        id: &ExecutionId,
        decision: ApprovalDecision,
        user: Option<String>,
    ) -> Result<WorkflowRun>;
}

/// Run store held in process memory
#[derive(Debug, Clone, Default)]
pub struct InMemoryRunStore {
    runs: Arc<RwLock<HashMap<ExecutionId, WorkflowRun>>>,
}

impl InMemoryRunStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.runs.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.runs.read().await.is_empty()
    }
}

#[async_trait::async_trait]
impl RunStore for InMemoryRunStore {
    async fn insert(&self, run: WorkflowRun) -> Result<()> {
        let mut runs = self.runs.write().await;
        if runs.contains_key(&run.execution_id) {
            return Err(Error::Conflict(format!(
                "Run {} already exists",
                run.execution_id
            )));
        }
        runs.insert(run.execution_id.clone(), run);
        Ok(())
    }

    async fn get(&self, id: &ExecutionId) -> Result<Option<WorkflowRun>> {
        Ok(self.runs.read().await.get(id).cloned())
    }

    async fn update(&self, run: &WorkflowRun) -> Result<()> {
        let mut runs = self.runs.write().await;
        match runs.get_mut(&run.execution_id) {
            Some(existing) => {
                *existing = run.clone();
                Ok(())
            }
            None => Err(Error::NotFound(format!("Run {} not found", run.execution_id))),
        }
    }

    async fn decide(
        &self,
        id: &ExecutionId,
        decision: ApprovalDecision,
        user: Option<String>,
    ) -> Result<WorkflowRun> {
        let mut runs = self.runs.write().await;
        let run = runs
            .get_mut(id)
            .ok_or_else(|| Error::NotFound(format!("Run {} not found", id)))?;

        run.decide(decision, user)?;
        Ok(run.clone())
    }
}
