use schemars::JsonSchema;
use serde::Deserialize;

/// Request to log a success event.
#[derive(Debug, Deserialize, JsonSchema)]
pub struct LogWinRequest {
    /// What was achieved (non-empty after trimming)
    pub content: String,
    /// Category tag, e.g. "学习成长" (optional)
    pub category: Option<String>,
}

/// Request to list success events.
#[derive(Debug, Deserialize, JsonSchema)]
pub struct WinsRequest {
    /// Maximum number of events to return, newest first (default: all)
    pub limit: Option<usize>,
}

/// Request to edit a success event the caller owns.
#[derive(Debug, Deserialize, JsonSchema)]
pub struct EditWinRequest {
    /// Id of the event to edit
    pub id: String,
    /// Replacement text (omit to leave unchanged)
    pub content: Option<String>,
    /// Replacement category tag (omit to leave unchanged)
    pub category: Option<String>,
    /// Set true to remove the category tag
    pub clear_category: Option<bool>,
}

/// Request to delete a success event the caller owns.
#[derive(Debug, Deserialize, JsonSchema)]
pub struct DeleteWinRequest {
    /// Id of the event to delete
    pub id: String,
}
