//! Repository for the `spaces` table.

use serde::Deserialize;

use lutspace_core::types::EntityId;

use crate::client::{BackendClient, BackendError};
use crate::models::space::{CreateSpace, Space};

/// Shape of an embedded-join row from `space_members?select=space:spaces(*)`.
#[derive(Debug, Deserialize)]
struct MembershipSpaceRow {
    space: Option<Space>,
}

/// Provides CRUD operations for spaces.
pub struct SpaceRepo;

impl SpaceRepo {
    /// Insert a new space, returning the created row. Propagates failure —
    /// space creation is a primary-path write.
    pub async fn create(client: &BackendClient, input: &CreateSpace) -> Result<Space, BackendError> {
        client.insert_one("spaces", input).await
    }

    /// Find a space by id. `Ok(None)` when no row exists.
    pub async fn find_by_id(
        client: &BackendClient,
        id: EntityId,
    ) -> Result<Option<Space>, BackendError> {
        client
            .select_one("spaces", &[("id", format!("eq.{id}"))])
            .await
    }

    /// Find a space by its inference tenant key.
    pub async fn find_by_lut_name(
        client: &BackendClient,
        lut_name: &str,
    ) -> Result<Option<Space>, BackendError> {
        client
            .select_one("spaces", &[("lut_name", format!("eq.{lut_name}"))])
            .await
    }

    /// All spaces visible to a user: those they created, unioned with
    /// those where they hold an accepted membership (matched by user id
    /// OR invitation email), deduplicated with precedence to the created
    /// set and sorted by creation time descending.
    pub async fn get_user_spaces(
        client: &BackendClient,
        user_id: EntityId,
        email: &str,
    ) -> Result<Vec<Space>, BackendError> {
        let created: Vec<Space> = client
            .select(
                "spaces",
                &[
                    ("creator_id", format!("eq.{user_id}")),
                    ("order", "created_at.desc".into()),
                ],
            )
            .await?;

        let memberships: Vec<MembershipSpaceRow> = client
            .select(
                "space_members",
                &[
                    ("select", "space:spaces(*)".into()),
                    (
                        "or",
                        format!("(user_id.eq.{user_id},email.eq.{})", email.to_lowercase()),
                    ),
                    ("status", "eq.accepted".into()),
                ],
            )
            .await?;
        let member_spaces = memberships.into_iter().filter_map(|row| row.space).collect();

        Ok(merge_spaces(created, member_spaces))
    }

    /// Delete a space by id. Cascades are the database's responsibility.
    pub async fn delete(client: &BackendClient, id: EntityId) -> Result<(), BackendError> {
        client.delete("spaces", &[("id", format!("eq.{id}"))]).await
    }
}

/// Union the created and membership space sets: dedupe by id with
/// precedence to `created`, then sort by `created_at` descending.
fn merge_spaces(created: Vec<Space>, member: Vec<Space>) -> Vec<Space> {
    let mut merged = created;
    for space in member {
        if !merged.iter().any(|existing| existing.id == space.id) {
            merged.push(space);
        }
    }
    merged.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    merged
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::space::SpaceType;
    use chrono::{Duration, Utc};

    fn space(name: &str, age_secs: i64) -> Space {
        Space {
            id: uuid::Uuid::new_v4(),
            name: name.into(),
            space_type: SpaceType::Team,
            lut_name: format!("{name}-a1b2c3"),
            creator_id: uuid::Uuid::new_v4(),
            created_at: Utc::now() - Duration::seconds(age_secs),
        }
    }

    #[test]
    fn merge_dedupes_by_id_with_created_precedence() {
        let mine = space("mine", 10);
        let mut duplicate = mine.clone();
        duplicate.name = "stale copy from membership join".into();

        let merged = merge_spaces(vec![mine.clone()], vec![duplicate, space("other", 5)]);
        assert_eq!(merged.len(), 2);
        let kept = merged.iter().find(|s| s.id == mine.id).unwrap();
        assert_eq!(kept.name, "mine");
    }

    #[test]
    fn merge_sorts_newest_first() {
        let merged = merge_spaces(vec![space("old", 300), space("new", 1)], vec![space("mid", 60)]);
        let names: Vec<&str> = merged.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, ["new", "mid", "old"]);
    }

    #[test]
    fn merge_of_empty_sets_is_empty() {
        assert!(merge_spaces(vec![], vec![]).is_empty());
    }
}
