//! Wire-level constants shared by the listener and the normalizer.

/// State shown when a payload carries neither `activity_state` nor `activity_name`.
pub const DEFAULT_STATE: &str = "Playing Roblox";

/// Maximum number of clickable links a presence can carry.
pub const MAX_LINKS: usize = 2;

/// The only route the listener serves.
pub const UPDATE_ROUTE: &str = "/update_rpc";

/// Body returned with a 200 response.
pub const SUCCESS_BODY: &str = r#"{"message":"RPC updated successfully"}"#;

/// Payload field names.
pub mod fields {
    /// Preferred source for the presence state.
    pub const ACTIVITY_STATE: &str = "activity_state";
    /// Fallback source for the presence state.
    pub const ACTIVITY_NAME: &str = "activity_name";
    /// Source for the details line.
    pub const ACTIVITY_DETAILS: &str = "activity_details";
    /// Array of `{label, url}` objects.
    pub const BUTTONS: &str = "buttons";
    /// Integer epoch seconds.
    pub const START_TIMESTAMP: &str = "start_timestamp";
    /// Integer epoch seconds.
    pub const END_TIMESTAMP: &str = "end_timestamp";
    /// Button label key.
    pub const LABEL: &str = "label";
    /// Button url key.
    pub const URL: &str = "url";
}
