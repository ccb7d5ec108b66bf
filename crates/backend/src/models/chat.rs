//! Chat model.

use serde::{Deserialize, Serialize};

use lutspace_core::types::{EntityId, Timestamp};

/// A row from the `chats` table.
///
/// Either a personal chat (`user_id` set, `space_id` empty) or a space
/// chat (`space_id` set, `created_by` set). By convention a space has at
/// most one chat — creators look one up before inserting.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Chat {
    pub id: EntityId,
    pub user_id: Option<EntityId>,
    pub space_id: Option<EntityId>,
    pub created_by: Option<EntityId>,
    pub title: Option<String>,
    pub created_at: Timestamp,
}
