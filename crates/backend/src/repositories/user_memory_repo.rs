//! Repository for the `user_memory` table.

use chrono::Utc;
use serde_json::json;

use lutspace_core::types::EntityId;

use crate::client::{BackendClient, BackendError};
use crate::models::user_memory::UserMemory;

/// Provides upsert/read operations for per-user memory entries.
pub struct UserMemoryRepo;

impl UserMemoryRepo {
    /// Insert or overwrite the entry for `(user_id, key)`.
    pub async fn upsert(
        client: &BackendClient,
        user_id: EntityId,
        key: &str,
        value: &str,
    ) -> Result<UserMemory, BackendError> {
        client
            .upsert_one(
                "user_memory",
                "user_id,key",
                &json!({
                    "user_id": user_id,
                    "key": key,
                    "value": value,
                    "updated_at": Utc::now(),
                }),
            )
            .await
    }

    /// Fetch one entry, `None` when the key has never been written.
    pub async fn get(
        client: &BackendClient,
        user_id: EntityId,
        key: &str,
    ) -> Result<Option<UserMemory>, BackendError> {
        client
            .select_one(
                "user_memory",
                &[
                    ("user_id", format!("eq.{user_id}")),
                    ("key", format!("eq.{key}")),
                ],
            )
            .await
    }

    /// List every entry for a user.
    pub async fn list(
        client: &BackendClient,
        user_id: EntityId,
    ) -> Result<Vec<UserMemory>, BackendError> {
        client
            .select(
                "user_memory",
                &[
                    ("user_id", format!("eq.{user_id}")),
                    ("order", "key.asc".into()),
                ],
            )
            .await
    }

    /// Delete one entry. A missing key is a no-op.
    pub async fn delete(
        client: &BackendClient,
        user_id: EntityId,
        key: &str,
    ) -> Result<(), BackendError> {
        client
            .delete(
                "user_memory",
                &[
                    ("user_id", format!("eq.{user_id}")),
                    ("key", format!("eq.{key}")),
                ],
            )
            .await
    }
}
