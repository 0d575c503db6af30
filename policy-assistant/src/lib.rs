//! Customer-service assistant for insurance policy questions.
//!
//! A query is matched against a fixed [`PolicyStore`] by policy id or customer
//! name ([`retrieve`]) and answered from a keyword-selected template
//! ([`respond`]). [`handle_turn`] runs both against an explicitly passed
//! transcript; the HTTP shell in [`server`] runs the same steps as a task graph
//! per session.

pub mod config;
pub mod responder;
pub mod retriever;
pub mod server;
pub mod store;
pub mod tasks;
pub mod telemetry;
pub mod turn;

pub use responder::{NO_MATCH_RESPONSE, ResponseRule, respond};
pub use retriever::retrieve;
pub use store::{CoverageItem, PolicyRecord, PolicyStore, StoreError};
pub use turn::{TurnOutcome, handle_turn};

pub const APP_TITLE: &str = "🤖 Gen AI-Powered CSR Assistant";
pub const APP_DESCRIPTION: &str =
    "Enter a customer's policy number or name and their query to get a quick response.";
pub const INPUT_PLACEHOLDER: &str =
    "Enter customer's query (e.g., 'What is the coverage for Jane Doe?'):";
