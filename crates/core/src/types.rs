use serde::{Deserialize, Serialize};

/// All backend rows are keyed by UUID.
pub type EntityId = uuid::Uuid;

/// All timestamps are UTC.
pub type Timestamp = chrono::DateTime<chrono::Utc>;

/// One question/answer pair.
///
/// Produced by knowledge extraction, edited during teach review, trained
/// into a lookup table, and persisted verbatim on training-log rows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QaPair {
    pub question: String,
    pub answer: String,
}
