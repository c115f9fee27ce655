use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ids::{MaterialSetId, UserId};

/// A set of uploaded source materials a course can be generated from.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct MaterialSet {
    /// Material set ID.
    pub id: MaterialSetId,
    /// Owning user.
    pub user_id: UserId,
    /// Display title.
    pub title: String,
    /// Processing status (free-form, e.g. `"pending"`, `"ready"`).
    pub status: String,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last update timestamp.
    pub updated_at: DateTime<Utc>,
    /// Soft-delete marker.
    pub deleted_at: Option<DateTime<Utc>>,
}
