use dashmap::DashMap;
use serde_json::Value;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::{
    error::{GraphError, Result},
    transcript::{Transcript, Turn},
};

/// Data shared between the tasks of one session, plus the session transcript
#[derive(Clone, Debug, Default)]
pub struct Context {
    data: Arc<DashMap<String, Value>>,
    transcript: Arc<RwLock<Transcript>>,
}

impl Context {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn set(&self, key: impl Into<String>, value: impl serde::Serialize) -> Result<()> {
        let key = key.into();
        let value = serde_json::to_value(value)
            .map_err(|e| GraphError::ContextError(format!("failed to serialize {key}: {e}")))?;
        self.data.insert(key, value);
        Ok(())
    }

    pub async fn get<T: serde::de::DeserializeOwned>(&self, key: &str) -> Option<T> {
        self.data
            .get(key)
            .and_then(|v| serde_json::from_value(v.clone()).ok())
    }

    pub async fn add_user_message(&self, content: impl Into<String>) {
        self.transcript.write().await.push(Turn::user(content));
    }

    pub async fn add_assistant_message(&self, content: impl Into<String>) {
        self.transcript.write().await.push(Turn::assistant(content));
    }

    /// Snapshot of the transcript as it stands now
    pub async fn transcript(&self) -> Transcript {
        self.transcript.read().await.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transcript::MessageRole;

    #[tokio::test]
    async fn values_round_trip_through_json() {
        let context = Context::new();
        context.set("matches", vec!["a", "b"]).await.unwrap();

        let matches: Vec<String> = context.get("matches").await.unwrap();
        assert_eq!(matches, vec!["a".to_string(), "b".to_string()]);

        // wrong shape reads as absent
        assert!(context.get::<u32>("matches").await.is_none());
        assert!(context.get::<Vec<String>>("missing").await.is_none());
    }

    #[tokio::test]
    async fn clones_share_the_transcript() {
        let context = Context::new();
        let other = context.clone();

        context.add_user_message("What is the premium?").await;
        other.add_assistant_message("$85/month").await;

        let transcript = context.transcript().await;
        assert_eq!(transcript.len(), 2);
        assert_eq!(transcript.turns()[1].role, MessageRole::Assistant);
        assert_eq!(transcript.turns()[1].content, "$85/month");
    }
}
