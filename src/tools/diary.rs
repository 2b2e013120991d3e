use schemars::JsonSchema;
use serde::Deserialize;

/// Request to record a diary entry.
#[derive(Debug, Deserialize, JsonSchema)]
pub struct RecordEntryRequest {
    /// Entry text (non-empty after trimming)
    pub content: String,
    /// Calendar date the entry belongs to, "YYYY-MM-DD" (default: today)
    pub date: Option<String>,
}

/// Request to list diary entries for a date or date range.
#[derive(Debug, Deserialize, JsonSchema)]
pub struct EntriesRequest {
    /// Single date to list, "YYYY-MM-DD" (default: today when no range given)
    pub date: Option<String>,
    /// Range start, "YYYY-MM-DD" inclusive (use together with `end`)
    pub start: Option<String>,
    /// Range end, "YYYY-MM-DD" inclusive (use together with `start`)
    pub end: Option<String>,
}

/// Request to edit a diary entry the caller owns.
#[derive(Debug, Deserialize, JsonSchema)]
pub struct EditEntryRequest {
    /// Id of the entry to edit
    pub id: String,
    /// Replacement text (omit to leave unchanged)
    pub content: Option<String>,
    /// Set true to detach the entry's image
    pub clear_image: Option<bool>,
}

/// Request to delete a diary entry the caller owns.
#[derive(Debug, Deserialize, JsonSchema)]
pub struct DeleteEntryRequest {
    /// Id of the entry to delete
    pub id: String,
}

/// Request to attach a local image file to a diary entry.
#[derive(Debug, Deserialize, JsonSchema)]
pub struct AttachImageRequest {
    /// Id of the entry to attach the image to
    pub entry_id: String,
    /// Path to a local image file (jpg, jpeg, png or gif, max 5 MiB)
    pub file_path: String,
}
