//! License-token model.

use serde::{Deserialize, Serialize};

use lutspace_core::types::{EntityId, Timestamp};

/// A row from the `lut_tokens` table: a short-lived, single-use credential
/// authorizing one external license exchange for a space.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LutToken {
    pub id: EntityId,
    pub space_id: EntityId,
    pub lut_name: String,
    pub token: String,
    pub created_by: EntityId,
    pub expires_at: Timestamp,
    pub used_at: Option<Timestamp>,
    pub used_by: Option<EntityId>,
    pub created_at: Timestamp,
}

impl LutToken {
    /// A token is consumable iff it is unused and unexpired.
    pub fn is_valid(&self, now: Timestamp) -> bool {
        self.used_at.is_none() && now < self.expires_at
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};

    fn token(used_at: Option<Timestamp>, expires_in_secs: i64) -> LutToken {
        let now = Utc::now();
        LutToken {
            id: uuid::Uuid::new_v4(),
            space_id: uuid::Uuid::new_v4(),
            lut_name: "acme-a1b2c3".into(),
            token: "K7QM-2XWP".into(),
            created_by: uuid::Uuid::new_v4(),
            expires_at: now + Duration::seconds(expires_in_secs),
            used_at,
            used_by: None,
            created_at: now,
        }
    }

    #[test]
    fn fresh_token_is_valid() {
        assert!(token(None, 60).is_valid(Utc::now()));
    }

    #[test]
    fn used_token_is_invalid() {
        assert!(!token(Some(Utc::now()), 60).is_valid(Utc::now()));
    }

    #[test]
    fn expired_token_is_invalid() {
        assert!(!token(None, -1).is_valid(Utc::now()));
    }
}
