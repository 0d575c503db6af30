//! `FlowRunner` wraps the load → execute → save cycle that every chat turn goes through.
//!
//! Create one at startup and share it across requests; it holds only two `Arc`s.
//! Call `Graph::execute_session` directly when a caller needs to inspect or batch
//! several steps before persisting.

use std::sync::Arc;

use crate::{
    error::{GraphError, Result},
    graph::{ExecutionResult, Graph},
    storage::SessionStorage,
};

/// Orchestrates one graph step per call against a session store
#[derive(Clone)]
pub struct FlowRunner {
    graph: Arc<Graph>,
    storage: Arc<dyn SessionStorage>,
}

impl FlowRunner {
    pub fn new(graph: Arc<Graph>, storage: Arc<dyn SessionStorage>) -> Self {
        Self { graph, storage }
    }

    pub fn graph(&self) -> &Graph {
        &self.graph
    }

    /// Advance the session `session_id` by one step and persist it.
    pub async fn run(&self, session_id: &str) -> Result<ExecutionResult> {
        let mut session = self
            .storage
            .get(session_id)
            .await?
            .ok_or_else(|| GraphError::SessionNotFound(session_id.to_string()))?;

        let result = self.graph.execute_session(&mut session).await?;

        self.storage.save(session).await?;

        Ok(result)
    }
}
