// Chat turn tasks: retrieval first, then the templated reply
pub mod compose_response;
pub mod retrieve_policies;
pub mod types;

pub use compose_response::ComposeResponseTask;
pub use retrieve_policies::RetrievePoliciesTask;
pub use types::session_keys;
