use async_trait::async_trait;
use policy_flow::{Context, GraphError, NextAction, Result, Task, TaskResult};
use std::sync::Arc;
use tracing::{debug, info};

use crate::{
    retriever::retrieve,
    store::{PolicyRecord, PolicyStore},
};

use super::session_keys;

/// Records the user's message and finds the policies it mentions
pub struct RetrievePoliciesTask {
    store: Arc<PolicyStore>,
}

impl RetrievePoliciesTask {
    pub fn new(store: Arc<PolicyStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl Task for RetrievePoliciesTask {
    fn id(&self) -> &str {
        std::any::type_name::<Self>()
    }

    async fn run(&self, context: Context) -> Result<TaskResult> {
        let session_id = context
            .get::<String>(session_keys::SESSION_ID)
            .await
            .unwrap_or_else(|| "unknown".to_string());

        info!(session_id = %session_id, task_id = %self.id(), "running task");

        let user_input: String = context
            .get(session_keys::USER_INPUT)
            .await
            .ok_or_else(|| GraphError::ContextError("user_input not found".to_string()))?;

        context.add_user_message(user_input.clone()).await;

        let matches: Vec<PolicyRecord> = retrieve(&user_input, &self.store)
            .into_iter()
            .cloned()
            .collect();

        debug!(
            session_id = %session_id,
            matches = matches.len(),
            ids = ?matches.iter().map(|r| r.id.as_str()).collect::<Vec<_>>(),
            "policy retrieval finished"
        );

        let status_message = format!("Matched {} policies - composing response", matches.len());
        context.set(session_keys::MATCHED_POLICIES, matches).await?;

        Ok(TaskResult::new_with_status(
            None,
            NextAction::ContinueAndExecute,
            Some(status_message),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn stores_matches_and_records_user_turn() {
        let task = RetrievePoliciesTask::new(Arc::new(PolicyStore::embedded().unwrap()));
        let context = Context::new();
        context
            .set(session_keys::USER_INPUT, "coverage for Jane Doe")
            .await
            .unwrap();

        let result = task.run(context.clone()).await.unwrap();

        assert_eq!(result.next_action, NextAction::ContinueAndExecute);
        assert!(result.response.is_none());

        let matches: Vec<PolicyRecord> = context.get(session_keys::MATCHED_POLICIES).await.unwrap();
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].id, "policy_1001");

        let transcript = context.transcript().await;
        assert_eq!(transcript.len(), 1);
        assert_eq!(transcript.turns()[0].content, "coverage for Jane Doe");
    }

    #[tokio::test]
    async fn missing_input_is_a_context_error() {
        let task = RetrievePoliciesTask::new(Arc::new(PolicyStore::embedded().unwrap()));

        let err = task.run(Context::new()).await.unwrap_err();
        assert!(matches!(err, GraphError::ContextError(_)));
    }
}
