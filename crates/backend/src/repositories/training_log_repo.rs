//! Repository for the `space_training_logs` table.

use chrono::Utc;
use serde_json::json;

use lutspace_core::types::{EntityId, QaPair};

use crate::client::{BackendClient, BackendError};
use crate::models::training_log::{CreateTrainingLog, SpaceTrainingLog};

/// Provides operations for training logs.
pub struct TrainingLogRepo;

impl TrainingLogRepo {
    /// Insert a training log, returning the created row.
    pub async fn create(
        client: &BackendClient,
        input: &CreateTrainingLog,
    ) -> Result<SpaceTrainingLog, BackendError> {
        client.insert_one("space_training_logs", input).await
    }

    /// Find a log by id.
    pub async fn find_by_id(
        client: &BackendClient,
        id: EntityId,
    ) -> Result<Option<SpaceTrainingLog>, BackendError> {
        client
            .select_one("space_training_logs", &[("id", format!("eq.{id}"))])
            .await
    }

    /// List a space's logs, newest first.
    pub async fn list_for_space(
        client: &BackendClient,
        space_id: EntityId,
    ) -> Result<Vec<SpaceTrainingLog>, BackendError> {
        client
            .select(
                "space_training_logs",
                &[
                    ("space_id", format!("eq.{space_id}")),
                    ("order", "created_at.desc".into()),
                ],
            )
            .await
    }

    /// Replace a log's Q&A pairs wholesale and stamp the editor.
    ///
    /// The only mutation logs support. Returns `Ok(None)` when the row no
    /// longer exists.
    pub async fn replace_qas(
        client: &BackendClient,
        id: EntityId,
        qas: &[QaPair],
        editor_id: EntityId,
    ) -> Result<Option<SpaceTrainingLog>, BackendError> {
        let updated: Vec<SpaceTrainingLog> = client
            .update(
                "space_training_logs",
                &[("id", format!("eq.{id}"))],
                &json!({
                    "qas": qas,
                    "updated_by": editor_id,
                    "updated_at": Utc::now(),
                }),
            )
            .await?;
        Ok(updated.into_iter().next())
    }
}
