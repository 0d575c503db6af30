use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::{context::Context, error::Result};

/// Result of a task execution
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskResult {
    /// Response to send to the user
    pub response: Option<String>,
    /// Next action to take
    pub next_action: NextAction,
    /// Id of the task that produced this result, filled in by the graph
    #[serde(default)]
    pub task_id: String,
    /// Short operator-facing note on what the task did
    pub status_message: Option<String>,
}

impl TaskResult {
    pub fn new(response: Option<String>, next_action: NextAction) -> Self {
        Self {
            response,
            next_action,
            task_id: String::new(),
            status_message: None,
        }
    }

    pub fn new_with_status(
        response: Option<String>,
        next_action: NextAction,
        status_message: Option<String>,
    ) -> Self {
        Self {
            status_message,
            ..Self::new(response, next_action)
        }
    }
}

/// Defines what should happen after a task completes
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum NextAction {
    /// Move to the next task and hand control back to the caller
    Continue,
    /// Move to the next task and run it within the same call
    ContinueAndExecute,
}

/// Core trait that all tasks must implement
#[async_trait]
pub trait Task: Send + Sync {
    /// Unique identifier for this task
    fn id(&self) -> &str;

    /// Execute the task with the given context
    async fn run(&self, context: Context) -> Result<TaskResult>;
}
