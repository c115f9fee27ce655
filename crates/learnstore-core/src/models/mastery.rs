use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::ids::{TopicMasteryId, UserId};

/// A user's estimated mastery of one topic.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct TopicMastery {
    /// Record ID.
    pub id: TopicMasteryId,
    /// User the estimate belongs to.
    pub user_id: UserId,
    /// Topic key.
    pub topic: String,
    /// Mastery estimate in `0.0..=1.0`.
    pub mastery: f64,
    /// When the estimate last changed.
    pub last_update: DateTime<Utc>,
    /// Opaque JSON metadata.
    pub metadata: Value,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last update timestamp.
    pub updated_at: DateTime<Utc>,
    /// Soft-delete marker.
    pub deleted_at: Option<DateTime<Utc>>,
}
