use crate::store::PolicyRecord;

pub const NO_MATCH_RESPONSE: &str = "I'm sorry, I couldn't find any relevant policy information for that query. Please check the policy number or customer name.";

/// Which template answers a query.
///
/// Rules are tried in [`ResponseRule::PRIORITY`] order and the first whose
/// keyword appears in the lowercased query wins; `Fallback` always applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseRule {
    Coverage,
    Premium,
    Deductible,
    Fallback,
}

impl ResponseRule {
    pub const PRIORITY: [ResponseRule; 4] = [
        ResponseRule::Coverage,
        ResponseRule::Premium,
        ResponseRule::Deductible,
        ResponseRule::Fallback,
    ];

    /// Keyword that triggers this rule, `None` for the catch-all
    pub fn keyword(self) -> Option<&'static str> {
        match self {
            ResponseRule::Coverage => Some("coverage"),
            ResponseRule::Premium => Some("premium"),
            ResponseRule::Deductible => Some("deductible"),
            ResponseRule::Fallback => None,
        }
    }

    pub fn applies_to(self, lowered_query: &str) -> bool {
        self.keyword()
            .is_none_or(|keyword| lowered_query.contains(keyword))
    }

    /// First rule in priority order that applies to `query`
    pub fn select(query: &str) -> ResponseRule {
        let lowered = query.to_lowercase();
        Self::PRIORITY
            .into_iter()
            .find(|rule| rule.applies_to(&lowered))
            .unwrap_or(ResponseRule::Fallback)
    }

    pub fn render(self, policy: &PolicyRecord) -> String {
        let name = &policy.customer_name;
        let id = &policy.id;
        match self {
            ResponseRule::Coverage => {
                let lines = policy
                    .coverage
                    .iter()
                    .map(|item| format!("- {}: {}", title_case(&item.category), item.description))
                    .collect::<Vec<_>>()
                    .join("\n");
                format!(
                    "Hello, the policy details for {name} (Policy ID: {id}) indicate the following coverage:\n\n{lines}"
                )
            }
            ResponseRule::Premium => format!(
                "The monthly premium for {name}'s policy (Policy ID: {id}) is {}.",
                policy.premium
            ),
            ResponseRule::Deductible => format!(
                "The deductible for {name}'s policy (Policy ID: {id}) is {}.",
                policy.deductible
            ),
            ResponseRule::Fallback => format!(
                "Based on the information for {name} (Policy ID: {id}), I can confirm that the policy type is '{}'. How can I assist further?",
                policy.policy_type
            ),
        }
    }
}

/// Answer `query` from the first of `matches`; any further matches are ignored.
pub fn respond(query: &str, matches: &[&PolicyRecord]) -> String {
    match matches.first() {
        Some(policy) => ResponseRule::select(query).render(policy),
        None => NO_MATCH_RESPONSE.to_string(),
    }
}

/// `roadside_assistance` -> `Roadside Assistance`
fn title_case(key: &str) -> String {
    let mut out = String::with_capacity(key.len());
    let mut at_word_start = true;
    for ch in key.chars() {
        let ch = if ch == '_' { ' ' } else { ch };
        if ch.is_alphabetic() {
            if at_word_start {
                out.extend(ch.to_uppercase());
            } else {
                out.extend(ch.to_lowercase());
            }
            at_word_start = false;
        } else {
            out.push(ch);
            at_word_start = true;
        }
    }
    out
}
