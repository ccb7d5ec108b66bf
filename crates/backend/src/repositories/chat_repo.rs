//! Repository for the `chats` table.

use serde_json::json;

use lutspace_core::types::EntityId;

use crate::client::{BackendClient, BackendError};
use crate::models::chat::Chat;

/// Provides CRUD operations for chats.
pub struct ChatRepo;

impl ChatRepo {
    /// Create a personal chat owned by a user.
    pub async fn create_personal(
        client: &BackendClient,
        user_id: EntityId,
    ) -> Result<Chat, BackendError> {
        client
            .insert_one("chats", &json!({ "user_id": user_id }))
            .await
    }

    /// Create a space chat.
    ///
    /// Callers must look up an existing chat first ([`Self::find_for_space`]):
    /// the at-most-one-chat-per-space rule is a lookup-before-create
    /// convention, not a database constraint.
    pub async fn create_for_space(
        client: &BackendClient,
        space_id: EntityId,
        created_by: EntityId,
    ) -> Result<Chat, BackendError> {
        client
            .insert_one(
                "chats",
                &json!({ "space_id": space_id, "created_by": created_by }),
            )
            .await
    }

    /// Find the chat for a space, if one exists.
    pub async fn find_for_space(
        client: &BackendClient,
        space_id: EntityId,
    ) -> Result<Option<Chat>, BackendError> {
        client
            .select_one(
                "chats",
                &[
                    ("space_id", format!("eq.{space_id}")),
                    ("order", "created_at.asc".into()),
                    ("limit", "1".into()),
                ],
            )
            .await
    }

    /// List a user's personal chats, newest first.
    pub async fn list_personal(
        client: &BackendClient,
        user_id: EntityId,
    ) -> Result<Vec<Chat>, BackendError> {
        client
            .select(
                "chats",
                &[
                    ("user_id", format!("eq.{user_id}")),
                    ("order", "created_at.desc".into()),
                ],
            )
            .await
    }

    /// Delete a chat by id.
    pub async fn delete(client: &BackendClient, id: EntityId) -> Result<(), BackendError> {
        client.delete("chats", &[("id", format!("eq.{id}"))]).await
    }
}
