//! Space model and DTOs.

use serde::{Deserialize, Serialize};

use lutspace_core::types::{EntityId, Timestamp};

/// Whether a space is shared or single-user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SpaceType {
    Team,
    Personal,
}

/// A row from the `spaces` table.
///
/// `lut_name` is the external inference service's tenant key: generated
/// once at creation, never changed, and the join point between backend
/// rows and the service's per-tenant memory.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Space {
    pub id: EntityId,
    pub name: String,
    #[serde(rename = "type")]
    pub space_type: SpaceType,
    pub lut_name: String,
    pub creator_id: EntityId,
    pub created_at: Timestamp,
}

/// DTO for creating a space.
#[derive(Debug, Clone, Serialize)]
pub struct CreateSpace {
    pub name: String,
    #[serde(rename = "type")]
    pub space_type: SpaceType,
    pub lut_name: String,
    pub creator_id: EntityId,
}
