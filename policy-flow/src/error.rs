use thiserror::Error;

/// Errors raised while wiring or running a task graph
#[derive(Debug, Error)]
pub enum GraphError {
    #[error("task not found: {0}")]
    TaskNotFound(String),

    #[error("context error: {0}")]
    ContextError(String),

    #[error("session not found: {0}")]
    SessionNotFound(String),
}

pub type Result<T> = std::result::Result<T, GraphError>;
