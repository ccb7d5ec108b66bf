//! Repository for the `messages` table.

use serde_json::json;

use lutspace_core::types::EntityId;

use crate::client::{BackendClient, BackendError};
use crate::models::message::{Message, MessageRole};

/// Provides append/list operations for messages.
///
/// Message writes are auxiliary: orchestrators route them through
/// [`crate::client::best_effort`] so a persistence failure never stalls
/// the in-memory conversation.
pub struct MessageRepo;

impl MessageRepo {
    /// Append one message to a chat.
    pub async fn append(
        client: &BackendClient,
        chat_id: EntityId,
        role: MessageRole,
        content: &str,
    ) -> Result<Message, BackendError> {
        client
            .insert_one(
                "messages",
                &json!({ "chat_id": chat_id, "role": role, "content": content }),
            )
            .await
    }

    /// List a chat's messages in creation order.
    pub async fn list_for_chat(
        client: &BackendClient,
        chat_id: EntityId,
    ) -> Result<Vec<Message>, BackendError> {
        client
            .select(
                "messages",
                &[
                    ("chat_id", format!("eq.{chat_id}")),
                    ("order", "created_at.asc".into()),
                ],
            )
            .await
    }
}
