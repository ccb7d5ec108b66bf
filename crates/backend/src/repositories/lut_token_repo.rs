//! Repository for the `lut_tokens` table.

use chrono::{Duration, Utc};
use serde_json::json;

use lutspace_core::naming::license_token;
use lutspace_core::types::EntityId;

use crate::client::{BackendClient, BackendError};
use crate::models::lut_token::LutToken;

/// Default token time-to-live.
pub const DEFAULT_TTL_SECS: i64 = 60;

/// Provides issuance and consumption of license tokens.
pub struct LutTokenRepo;

impl LutTokenRepo {
    /// Issue a fresh single-use token for a space.
    pub async fn issue(
        client: &BackendClient,
        space_id: EntityId,
        lut_name: &str,
        created_by: EntityId,
        ttl_secs: Option<i64>,
    ) -> Result<LutToken, BackendError> {
        let ttl = ttl_secs.unwrap_or(DEFAULT_TTL_SECS);
        client
            .insert_one(
                "lut_tokens",
                &json!({
                    "space_id": space_id,
                    "lut_name": lut_name,
                    "token": license_token(),
                    "created_by": created_by,
                    "expires_at": Utc::now() + Duration::seconds(ttl),
                }),
            )
            .await
    }

    /// Consume a token: one conditional update stamping `used_at`/`used_by`
    /// on the row matching (token, lut_name) that is still unused and
    /// unexpired.
    ///
    /// The unused/unexpired check rides in the update's filter, so two
    /// concurrent redemptions cannot both succeed. `Ok(None)` means the
    /// token was unknown, already used, or expired.
    pub async fn consume(
        client: &BackendClient,
        token: &str,
        lut_name: &str,
        used_by: EntityId,
    ) -> Result<Option<LutToken>, BackendError> {
        let now = Utc::now();
        let updated: Vec<LutToken> = client
            .update(
                "lut_tokens",
                &[
                    ("token", format!("eq.{token}")),
                    ("lut_name", format!("eq.{lut_name}")),
                    ("used_at", "is.null".into()),
                    ("expires_at", format!("gt.{}", now.to_rfc3339())),
                ],
                &json!({ "used_at": now, "used_by": used_by }),
            )
            .await?;
        Ok(updated.into_iter().next())
    }
}
