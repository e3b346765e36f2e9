//! Repository implementations for the Workflows domain

pub mod runs;

use std::sync::Arc;

pub use runs::{InMemoryRunStore, RunStore};

/// Combined repository access for the Workflows domain
#[derive(Clone)]
pub struct WorkflowsRepositories {
    pub runs: Arc<dyn RunStore>,
}

impl WorkflowsRepositories {
    pub fn new(runs: Arc<dyn RunStore>) -> Self {
        Self { runs }
    }

    /// Repositories backed by process memory
    pub fn in_memory() -> Self {
        Self::new(Arc::new(InMemoryRunStore::new()))
    }
}

impl Default for WorkflowsRepositories {
    fn default() -> Self {
        Self::in_memory()
    }
}
