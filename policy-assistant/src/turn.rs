use policy_flow::{Transcript, Turn};

use crate::{responder::respond, retriever::retrieve, store::PolicyStore};

/// Everything one chat turn produces
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TurnOutcome {
    /// Prior transcript with the user input and the reply appended
    pub transcript: Transcript,
    pub response: String,
    /// Ids of every matched policy, in store order; only the first one was answered
    pub matched_ids: Vec<String>,
}

/// Run one turn without touching any shared state: retrieve, respond, and return
/// the extended transcript alongside the reply.
pub fn handle_turn(store: &PolicyStore, prior: &Transcript, input: &str) -> TurnOutcome {
    let matches = retrieve(input, store);
    let response = respond(input, &matches);
    let transcript = prior.extended([Turn::user(input), Turn::assistant(response.clone())]);

    TurnOutcome {
        transcript,
        response,
        matched_ids: matches.iter().map(|record| record.id.clone()).collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::responder::NO_MATCH_RESPONSE;
    use policy_flow::MessageRole;

    #[test]
    fn turn_appends_user_then_assistant() {
        let store = PolicyStore::embedded().unwrap();
        let prior = Transcript::new();

        let outcome = handle_turn(&store, &prior, "premium for policy_1002");

        assert!(prior.is_empty());
        assert_eq!(outcome.matched_ids, vec!["policy_1002"]);
        let turns = outcome.transcript.turns();
        assert_eq!(turns.len(), 2);
        assert_eq!(turns[0], Turn::user("premium for policy_1002"));
        assert_eq!(turns[1].role, MessageRole::Assistant);
        assert_eq!(turns[1].content, outcome.response);
    }

    #[test]
    fn turns_accumulate_across_calls() {
        let store = PolicyStore::embedded().unwrap();

        let first = handle_turn(&store, &Transcript::new(), "coverage for Jane Doe");
        let second = handle_turn(&store, &first.transcript, "who is bob?");

        assert_eq!(second.transcript.len(), 4);
        assert_eq!(second.response, NO_MATCH_RESPONSE);
        assert!(second.matched_ids.is_empty());
        assert_eq!(&second.transcript.turns()[..2], first.transcript.turns());
    }

    #[test]
    fn same_input_same_outcome() {
        let store = PolicyStore::embedded().unwrap();
        let prior = Transcript::new();

        let a = handle_turn(&store, &prior, "deductible for John Smith");
        let b = handle_turn(&store, &prior, "deductible for John Smith");
        assert_eq!(a, b);
    }
}
