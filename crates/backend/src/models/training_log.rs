//! Training-log model and DTOs.

use serde::{Deserialize, Serialize};

use lutspace_core::types::{EntityId, QaPair, Timestamp};

/// A row from the `space_training_logs` table: one teach submission.
///
/// `qas` is a denormalized JSON array stored verbatim. Rows are immutable
/// after creation except for the single replace-all-pairs retrain update.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpaceTrainingLog {
    pub id: EntityId,
    pub space_id: EntityId,
    pub source_text: String,
    pub qas: Vec<QaPair>,
    pub created_by: EntityId,
    pub updated_by: Option<EntityId>,
    pub updated_at: Option<Timestamp>,
    pub created_at: Timestamp,
}

/// DTO for creating a training log.
#[derive(Debug, Clone, Serialize)]
pub struct CreateTrainingLog {
    pub space_id: EntityId,
    pub source_text: String,
    pub qas: Vec<QaPair>,
    pub created_by: EntityId,
}
