// Keys for values the tasks exchange through the session context
pub mod session_keys {
    pub const USER_INPUT: &str = "user_input";
    pub const SESSION_ID: &str = "session_id";
    /// `Vec<PolicyRecord>` written by retrieval, read by the responder
    pub const MATCHED_POLICIES: &str = "matched_policies";
}
