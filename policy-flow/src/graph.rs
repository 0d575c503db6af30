use dashmap::DashMap;
use std::sync::Arc;
use tracing::debug;

use crate::{
    context::Context,
    error::{GraphError, Result},
    storage::Session,
    task::{NextAction, Task, TaskResult},
};

/// Edge between tasks in the graph
#[derive(Debug, Clone)]
pub struct Edge {
    pub from: String,
    pub to: String,
}

/// A graph of tasks that a session walks through, one turn at a time
pub struct Graph {
    pub id: String,
    tasks: DashMap<String, Arc<dyn Task>>,
    edges: Vec<Edge>,
    start_task_id: Option<String>,
}

impl Graph {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            tasks: DashMap::new(),
            edges: Vec::new(),
            start_task_id: None,
        }
    }

    /// Run the session's current task and advance it according to the task's next action.
    ///
    /// `ContinueAndExecute` chains into the next task within this call; `Continue`
    /// returns control to the caller with the session parked on the next task.
    pub async fn execute_session(&self, session: &mut Session) -> Result<ExecutionResult> {
        let result = self
            .execute_single_task(&session.current_task_id, session.context.clone())
            .await?;

        session.status_message = result.status_message.clone();

        match &result.next_action {
            NextAction::Continue => {
                session.current_task_id = self
                    .find_next_task(&result.task_id)
                    .unwrap_or_else(|| result.task_id.clone());
                Ok(ExecutionResult {
                    response: result.response,
                })
            }
            NextAction::ContinueAndExecute => {
                match self.find_next_task(&result.task_id) {
                    Some(next_task_id) => {
                        debug!(from = %result.task_id, to = %next_task_id, "chaining task");
                        session.current_task_id = next_task_id;
                        Box::pin(self.execute_session(session)).await
                    }
                    None => {
                        session.current_task_id = result.task_id.clone();
                        Ok(ExecutionResult {
                            response: result.response,
                        })
                    }
                }
            }
        }
    }

    async fn execute_single_task(&self, task_id: &str, context: Context) -> Result<TaskResult> {
        let task = self
            .get_task(task_id)
            .ok_or_else(|| GraphError::TaskNotFound(task_id.to_string()))?;

        let mut result = task.run(context).await?;
        result.task_id = task_id.to_string();

        Ok(result)
    }

    /// Find the task that follows `current_task_id`; the first matching edge wins
    pub fn find_next_task(&self, current_task_id: &str) -> Option<String> {
        self.edges
            .iter()
            .find(|edge| edge.from == current_task_id)
            .map(|edge| edge.to.clone())
    }

    pub fn start_task_id(&self) -> Option<&str> {
        self.start_task_id.as_deref()
    }

    pub fn get_task(&self, task_id: &str) -> Option<Arc<dyn Task>> {
        self.tasks.get(task_id).map(|entry| entry.clone())
    }
}

/// Builder for creating graphs
pub struct GraphBuilder {
    graph: Graph,
}

impl GraphBuilder {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            graph: Graph::new(id),
        }
    }

    /// Add a task; the first task added becomes the start task
    pub fn add_task(mut self, task: Arc<dyn Task>) -> Self {
        let task_id = task.id().to_string();
        if self.graph.start_task_id.is_none() {
            self.graph.start_task_id = Some(task_id.clone());
        }
        self.graph.tasks.insert(task_id, task);
        self
    }

    pub fn add_edge(mut self, from: impl Into<String>, to: impl Into<String>) -> Self {
        self.graph.edges.push(Edge {
            from: from.into(),
            to: to.into(),
        });
        self
    }

    pub fn build(self) -> Graph {
        self.graph
    }
}

/// Outcome of one `execute_session` call; the session is always left waiting for input
#[derive(Debug, Clone)]
pub struct ExecutionResult {
    pub response: Option<String>,
}
