//! Conversation entry domain types.
//!
//! A `ConversationEntry` is one user or assistant turn as shown to the user.
//! Entries are append-only within a session; an in-flight assistant entry is
//! mutated in place (by id) until its status becomes `Final`, after which it
//! is never touched again.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for a conversation entry.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EntryId(pub String);

impl EntryId {
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }
}

impl Default for EntryId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for EntryId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Who produced an entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// The end user
    User,
    /// The assistant
    Assistant,
}

/// Whether an entry is still receiving content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryStatus {
    /// Content is still arriving; the entry is mutated in place.
    Streaming,
    /// Complete and immutable.
    Final,
}

/// One turn in the conversation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationEntry {
    /// Unique entry ID
    pub id: EntryId,

    /// Who produced this entry
    pub role: Role,

    /// The placeholder-substituted document. For a streaming entry this is
    /// the committed text only — never a torn marker.
    pub content: String,

    /// Catalog ids referenced by this entry, in emission order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub referenced_ids: Vec<String>,

    /// Streaming or final
    pub status: EntryStatus,

    /// Timestamp
    pub created_at: DateTime<Utc>,
}

impl ConversationEntry {
    /// Create a final user entry.
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            id: EntryId::new(),
            role: Role::User,
            content: content.into(),
            referenced_ids: Vec::new(),
            status: EntryStatus::Final,
            created_at: Utc::now(),
        }
    }

    /// Create a final assistant entry with no product references
    /// (rejections, error notices, fallback messages).
    pub fn assistant_final(content: impl Into<String>) -> Self {
        Self {
            id: EntryId::new(),
            role: Role::Assistant,
            content: content.into(),
            referenced_ids: Vec::new(),
            status: EntryStatus::Final,
            created_at: Utc::now(),
        }
    }

    /// Create an in-flight assistant entry.
    pub fn assistant_streaming(content: impl Into<String>) -> Self {
        Self {
            id: EntryId::new(),
            role: Role::Assistant,
            content: content.into(),
            referenced_ids: Vec::new(),
            status: EntryStatus::Streaming,
            created_at: Utc::now(),
        }
    }

    /// Seal a streaming entry with its final document and reference list.
    pub fn finalize(&mut self, content: String, referenced_ids: Vec<String>) {
        self.content = content;
        self.referenced_ids = referenced_ids;
        self.status = EntryStatus::Final;
    }

    pub fn is_streaming(&self) -> bool {
        self.status == EntryStatus::Streaming
    }
}
