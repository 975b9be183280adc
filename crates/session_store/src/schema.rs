use chat_provider::ChatMessage;
use serde::{Deserialize, Serialize};

/// Whole-session document persisted as one JSON file.
///
/// `messages` never contains system-role entries; the live prompt is
/// re-injected from configuration when a session is resumed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionDocument {
    pub id: String,
    pub title: String,
    pub created_at: String,
    pub updated_at: String,
    pub model: String,
    pub messages: Vec<ChatMessage>,
}

/// Metadata-only projection used by session listings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSummary {
    pub id: String,
    pub title: String,
    pub created_at: String,
    pub updated_at: String,
    pub model: String,
    pub message_count: usize,
}

impl From<&SessionDocument> for SessionSummary {
    fn from(document: &SessionDocument) -> Self {
        Self {
            id: document.id.clone(),
            title: document.title.clone(),
            created_at: document.created_at.clone(),
            updated_at: document.updated_at.clone(),
            model: document.model.clone(),
            message_count: document.messages.len(),
        }
    }
}
