use schemars::JsonSchema;
use serde::Deserialize;

/// Request for an encouragement reply grounded in the caller's history.
#[derive(Debug, Deserialize, JsonSchema)]
pub struct CoachRequest {
    /// What's on the user's mind right now
    pub message: String,
}
