//! Message model.

use serde::{Deserialize, Serialize};

use lutspace_core::types::{EntityId, Timestamp};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    User,
    Assistant,
}

/// A row from the `messages` table. Append-only, ordered by `created_at`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub id: EntityId,
    pub chat_id: EntityId,
    pub role: MessageRole,
    pub content: String,
    pub created_at: Timestamp,
}
