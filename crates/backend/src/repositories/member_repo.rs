//! Repository for the `space_members` table.

use chrono::Utc;
use serde::Deserialize;
use serde_json::json;

use lutspace_core::types::EntityId;

use crate::client::{BackendClient, BackendError};
use crate::models::member::{MemberRole, SpaceMember};
use crate::models::space::Space;

/// A pending invitation with the space row joined in.
#[derive(Debug, Clone, Deserialize)]
pub struct PendingInvitation {
    #[serde(flatten)]
    pub member: SpaceMember,
    /// Embedded join; absent when the space row is not visible.
    pub space: Option<Space>,
}

/// Provides membership and invitation operations.
pub struct MemberRepo;

impl MemberRepo {
    /// Insert a pending invitation.
    ///
    /// Idempotent: a duplicate (space, email) insert hits the uniqueness
    /// constraint, in which case the existing row is fetched and returned
    /// instead of failing.
    pub async fn invite(
        client: &BackendClient,
        space_id: EntityId,
        email: &str,
        role: MemberRole,
        invited_by: EntityId,
    ) -> Result<SpaceMember, BackendError> {
        let email = email.trim().to_lowercase();
        let body = json!({
            "space_id": space_id,
            "email": email,
            "role": role,
            "status": "pending",
            "invited_by": invited_by,
        });
        match client.insert_one("space_members", &body).await {
            Ok(member) => Ok(member),
            Err(error) if error.is_unique_violation() => {
                match Self::find_by_space_and_email(client, space_id, &email).await? {
                    Some(existing) => Ok(existing),
                    None => Err(error),
                }
            }
            Err(error) => Err(error),
        }
    }

    /// Insert the creator's own membership row for a freshly created
    /// space: owner role, already accepted.
    pub async fn add_owner(
        client: &BackendClient,
        space_id: EntityId,
        user_id: EntityId,
        email: &str,
    ) -> Result<SpaceMember, BackendError> {
        client
            .insert_one(
                "space_members",
                &json!({
                    "space_id": space_id,
                    "user_id": user_id,
                    "email": email.trim().to_lowercase(),
                    "role": MemberRole::Owner,
                    "status": "accepted",
                    "accepted_at": Utc::now(),
                }),
            )
            .await
    }

    /// Find a member row by (space, email).
    pub async fn find_by_space_and_email(
        client: &BackendClient,
        space_id: EntityId,
        email: &str,
    ) -> Result<Option<SpaceMember>, BackendError> {
        client
            .select_one(
                "space_members",
                &[
                    ("space_id", format!("eq.{space_id}")),
                    ("email", format!("eq.{}", email.to_lowercase())),
                    ("limit", "1".into()),
                ],
            )
            .await
    }

    /// List all members of a space, owners and pending invites included.
    pub async fn list_for_space(
        client: &BackendClient,
        space_id: EntityId,
    ) -> Result<Vec<SpaceMember>, BackendError> {
        client
            .select(
                "space_members",
                &[
                    ("space_id", format!("eq.{space_id}")),
                    ("order", "created_at.asc".into()),
                ],
            )
            .await
    }

    /// Accept a pending invitation: bind the user id and stamp
    /// `accepted_at` on the pending row matching the user's email.
    ///
    /// Returns `Ok(None)` when no pending row matched — a no-op, not an
    /// error.
    pub async fn accept(
        client: &BackendClient,
        space_id: EntityId,
        user_id: EntityId,
        email: &str,
    ) -> Result<Option<SpaceMember>, BackendError> {
        let updated: Vec<SpaceMember> = client
            .update(
                "space_members",
                &[
                    ("space_id", format!("eq.{space_id}")),
                    ("email", format!("eq.{}", email.to_lowercase())),
                    ("status", "eq.pending".into()),
                ],
                &json!({
                    "status": "accepted",
                    "user_id": user_id,
                    "accepted_at": Utc::now(),
                }),
            )
            .await?;
        Ok(updated.into_iter().next())
    }

    /// Decline a pending invitation by deleting the pending row. A
    /// missing row is a no-op.
    pub async fn decline(
        client: &BackendClient,
        space_id: EntityId,
        email: &str,
    ) -> Result<(), BackendError> {
        client
            .delete(
                "space_members",
                &[
                    ("space_id", format!("eq.{space_id}")),
                    ("email", format!("eq.{}", email.to_lowercase())),
                    ("status", "eq.pending".into()),
                ],
            )
            .await
    }

    /// Remove a member row outright (owner revoking access).
    pub async fn remove(client: &BackendClient, member_id: EntityId) -> Result<(), BackendError> {
        client
            .delete("space_members", &[("id", format!("eq.{member_id}"))])
            .await
    }

    /// Pending invitations for an email address, space row joined.
    ///
    /// Best-effort: the known policy-recursion misconfiguration on the
    /// membership table is treated as "no invitations" rather than
    /// propagated, since this feeds a non-critical notification surface.
    pub async fn pending_for_email(
        client: &BackendClient,
        email: &str,
    ) -> Result<Vec<PendingInvitation>, BackendError> {
        let result = client
            .select(
                "space_members",
                &[
                    ("select", "*,space:spaces(*)".into()),
                    ("email", format!("eq.{}", email.to_lowercase())),
                    ("status", "eq.pending".into()),
                    ("order", "created_at.desc".into()),
                ],
            )
            .await;
        match result {
            Err(error) if error.is_policy_recursion() => {
                tracing::warn!(error = %error, "Invitation lookup hit policy recursion; returning empty");
                Ok(Vec::new())
            }
            other => other,
        }
    }
}
