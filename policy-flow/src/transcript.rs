use serde::{Deserialize, Serialize};

/// Who produced a turn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    User,
    Assistant,
}

/// A single entry of the session history
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Turn {
    pub role: MessageRole,
    pub content: String,
}

impl Turn {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::Assistant,
            content: content.into(),
        }
    }
}

/// Append-only history of user and assistant turns for one session.
///
/// There is no way to edit or drop a turn once it has been recorded.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Transcript {
    turns: Vec<Turn>,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, turn: Turn) {
        self.turns.push(turn);
    }

    /// Returns a copy of this transcript with `turns` appended, leaving `self` untouched
    pub fn extended(&self, turns: impl IntoIterator<Item = Turn>) -> Self {
        let mut next = self.clone();
        next.turns.extend(turns);
        next
    }

    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extended_leaves_original_untouched() {
        let mut prior = Transcript::new();
        prior.push(Turn::user("hi"));

        let next = prior.extended([Turn::assistant("hello"), Turn::user("bye")]);

        assert_eq!(prior.len(), 1);
        assert_eq!(next.len(), 3);
        assert_eq!(next.turns()[0], Turn::user("hi"));
        assert_eq!(next.turns()[2].role, MessageRole::User);
    }

    #[test]
    fn serializes_as_plain_list() {
        let transcript = Transcript::new().extended([Turn::user("q"), Turn::assistant("a")]);
        let value = serde_json::to_value(&transcript).unwrap();

        assert_eq!(
            value,
            serde_json::json!([
                {"role": "user", "content": "q"},
                {"role": "assistant", "content": "a"}
            ])
        );
    }
}
