//! Space membership model.

use serde::{Deserialize, Serialize};

use lutspace_core::types::{EntityId, Timestamp};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MemberRole {
    Owner,
    Admin,
    Member,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MemberStatus {
    Pending,
    Accepted,
    Declined,
}

/// A row from the `space_members` table.
///
/// A pending member has `user_id = None` and a populated `email`;
/// acceptance binds `user_id` and stamps `accepted_at`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpaceMember {
    pub id: EntityId,
    pub space_id: EntityId,
    pub user_id: Option<EntityId>,
    pub email: String,
    pub role: MemberRole,
    pub status: MemberStatus,
    pub invited_by: Option<EntityId>,
    pub accepted_at: Option<Timestamp>,
    pub created_at: Timestamp,
}
