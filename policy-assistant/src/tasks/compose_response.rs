use async_trait::async_trait;
use policy_flow::{Context, GraphError, NextAction, Result, Task, TaskResult};
use tracing::info;

use crate::{
    responder::{ResponseRule, respond},
    store::PolicyRecord,
};

use super::session_keys;

/// Renders the reply for the current turn and hands control back to the user
pub struct ComposeResponseTask;

#[async_trait]
impl Task for ComposeResponseTask {
    fn id(&self) -> &str {
        std::any::type_name::<Self>()
    }

    async fn run(&self, context: Context) -> Result<TaskResult> {
        info!("running task: {}", self.id());

        let user_input: String = context
            .get(session_keys::USER_INPUT)
            .await
            .ok_or_else(|| GraphError::ContextError("user_input not found".to_string()))?;

        let matches: Vec<PolicyRecord> = context
            .get(session_keys::MATCHED_POLICIES)
            .await
            .ok_or_else(|| GraphError::ContextError("matched_policies not found".to_string()))?;

        let matched: Vec<&PolicyRecord> = matches.iter().collect();
        let response = respond(&user_input, &matched);

        let status_message = match matched.first() {
            Some(policy) => format!(
                "Answered with {:?} template for {}",
                ResponseRule::select(&user_input),
                policy.id
            ),
            None => "No matching policy - asked user to check identifier".to_string(),
        };

        context.add_assistant_message(response.clone()).await;

        Ok(TaskResult::new_with_status(
            Some(response),
            NextAction::Continue,
            Some(status_message),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{responder::NO_MATCH_RESPONSE, store::PolicyStore};

    #[tokio::test]
    async fn replies_from_first_match() {
        let store = PolicyStore::embedded().unwrap();
        let context = Context::new();
        context
            .set(session_keys::USER_INPUT, "premium for policy_1002")
            .await
            .unwrap();
        context
            .set(
                session_keys::MATCHED_POLICIES,
                vec![store.get("policy_1002").unwrap().clone()],
            )
            .await
            .unwrap();

        let result = ComposeResponseTask.run(context.clone()).await.unwrap();

        let response = result.response.unwrap();
        assert!(response.contains("$85/month"));
        assert_eq!(result.next_action, NextAction::Continue);
        assert_eq!(
            result.status_message.as_deref(),
            Some("Answered with Premium template for policy_1002")
        );
        assert_eq!(context.transcript().await.turns()[0].content, response);
    }

    #[tokio::test]
    async fn empty_matches_apologise() {
        let context = Context::new();
        context.set(session_keys::USER_INPUT, "hello").await.unwrap();
        context
            .set(session_keys::MATCHED_POLICIES, Vec::<PolicyRecord>::new())
            .await
            .unwrap();

        let result = ComposeResponseTask.run(context).await.unwrap();
        assert_eq!(result.response.as_deref(), Some(NO_MATCH_RESPONSE));
    }
}
