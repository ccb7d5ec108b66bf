//! Space lifecycle, membership, and license tokens.

use std::sync::Arc;

use lutspace_backend::models::lut_token::LutToken;
use lutspace_backend::models::member::{MemberRole, SpaceMember};
use lutspace_backend::models::space::{CreateSpace, Space, SpaceType};
use lutspace_backend::repositories::{LutTokenRepo, MemberRepo, PendingInvitation, SpaceRepo};
use lutspace_backend::{BackendClient, BackendError, SessionUser};
use lutspace_core::naming::lut_name_for_space;
use lutspace_core::types::EntityId;

/// Errors from the space flows.
#[derive(Debug, thiserror::Error)]
pub enum SpaceError {
    #[error(transparent)]
    Backend(#[from] BackendError),

    /// Token consumption matched no live row: unknown, already used, or
    /// expired. Deliberately does not say which.
    #[error("Token is invalid or has expired")]
    TokenInvalid,
}

/// Space, membership, and token operations for one signed-in user.
pub struct SpaceService {
    backend: Arc<BackendClient>,
    user: SessionUser,
}

impl SpaceService {
    pub fn new(backend: Arc<BackendClient>, user: SessionUser) -> Self {
        Self { backend, user }
    }

    /// Create a space with a freshly derived `lut_name`, then insert the
    /// creator's owner membership.
    ///
    /// Two round-trips with no rollback: a space whose owner-membership
    /// insert failed still exists, visible to its creator through the
    /// created-spaces query.
    pub async fn create_space(
        &self,
        name: &str,
        space_type: SpaceType,
    ) -> Result<Space, SpaceError> {
        let space = SpaceRepo::create(
            &self.backend,
            &CreateSpace {
                name: name.trim().to_string(),
                space_type,
                lut_name: lut_name_for_space(name),
                creator_id: self.user.id,
            },
        )
        .await?;
        tracing::info!(space_id = %space.id, lut_name = %space.lut_name, "Space created");

        MemberRepo::add_owner(&self.backend, space.id, self.user.id, &self.user.email).await?;
        Ok(space)
    }

    /// All spaces visible to the user, newest first.
    pub async fn list_spaces(&self) -> Result<Vec<Space>, SpaceError> {
        Ok(SpaceRepo::get_user_spaces(&self.backend, self.user.id, &self.user.email).await?)
    }

    pub async fn find_space(&self, id: EntityId) -> Result<Option<Space>, SpaceError> {
        Ok(SpaceRepo::find_by_id(&self.backend, id).await?)
    }

    pub async fn delete_space(&self, id: EntityId) -> Result<(), SpaceError> {
        Ok(SpaceRepo::delete(&self.backend, id).await?)
    }

    /// Invite an email address into a space. Re-inviting the same address
    /// returns the existing member row unchanged.
    pub async fn invite(
        &self,
        space_id: EntityId,
        email: &str,
        role: MemberRole,
    ) -> Result<SpaceMember, SpaceError> {
        Ok(MemberRepo::invite(&self.backend, space_id, email, role, self.user.id).await?)
    }

    /// Accept a pending invitation addressed to the user's email. A
    /// missing pending row is a no-op (`Ok(None)`).
    pub async fn accept_invitation(
        &self,
        space_id: EntityId,
    ) -> Result<Option<SpaceMember>, SpaceError> {
        Ok(MemberRepo::accept(&self.backend, space_id, self.user.id, &self.user.email).await?)
    }

    /// Decline a pending invitation addressed to the user's email.
    pub async fn decline_invitation(&self, space_id: EntityId) -> Result<(), SpaceError> {
        Ok(MemberRepo::decline(&self.backend, space_id, &self.user.email).await?)
    }

    pub async fn members(&self, space_id: EntityId) -> Result<Vec<SpaceMember>, SpaceError> {
        Ok(MemberRepo::list_for_space(&self.backend, space_id).await?)
    }

    pub async fn remove_member(&self, member_id: EntityId) -> Result<(), SpaceError> {
        Ok(MemberRepo::remove(&self.backend, member_id).await?)
    }

    /// Pending invitations addressed to the user's email.
    pub async fn pending_invitations(&self) -> Result<Vec<PendingInvitation>, SpaceError> {
        Ok(MemberRepo::pending_for_email(&self.backend, &self.user.email).await?)
    }

    /// Issue a short-lived single-use license token for a space.
    pub async fn issue_token(
        &self,
        space_id: EntityId,
        lut_name: &str,
        ttl_secs: Option<i64>,
    ) -> Result<LutToken, SpaceError> {
        Ok(LutTokenRepo::issue(&self.backend, space_id, lut_name, self.user.id, ttl_secs).await?)
    }

    /// Redeem a license token against a lookup table.
    ///
    /// Single-use: the second redemption of the same token fails with
    /// [`SpaceError::TokenInvalid`], as does an expired or unknown one.
    pub async fn consume_token(
        &self,
        token: &str,
        lut_name: &str,
    ) -> Result<LutToken, SpaceError> {
        LutTokenRepo::consume(&self.backend, token, lut_name, self.user.id)
            .await?
            .ok_or(SpaceError::TokenInvalid)
    }
}
