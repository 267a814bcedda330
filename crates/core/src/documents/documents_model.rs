use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Opaque handle to a rendered document.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct DocumentRef {
    pub document_id: String,
    pub template_id: String,
    /// Where the document can be fetched from; meaning depends on the store.
    pub location: String,
    pub rendered_at: NaiveDateTime,
}
