//! User-memory model.

use serde::{Deserialize, Serialize};

use lutspace_core::types::{EntityId, Timestamp};

/// A row from the `user_memory` table: free-form per-user key/value
/// facts, unique on `(user_id, key)`, outside the chat/space model.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserMemory {
    pub id: EntityId,
    pub user_id: EntityId,
    pub key: String,
    pub value: String,
    pub updated_at: Option<Timestamp>,
    pub created_at: Timestamp,
}
