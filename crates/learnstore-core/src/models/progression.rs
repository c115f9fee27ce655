use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::ids::{PathId, PathNodeId, UserId, UserProgressionEventId};

/// A step a user took along a learning path (started, completed, skipped, ...).
///
/// Append-only: progression events are never soft-deleted.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct UserProgressionEvent {
    /// Event ID.
    pub id: UserProgressionEventId,
    /// User who progressed.
    pub user_id: UserId,
    /// Learning path.
    pub path_id: PathId,
    /// Node within the path, when the event is node-scoped.
    pub path_node_id: Option<PathNodeId>,
    /// Event category.
    pub event_type: String,
    /// Event-specific JSON payload.
    pub payload: Value,
    /// When the event happened.
    pub occurred_at: DateTime<Utc>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last update timestamp.
    pub updated_at: DateTime<Utc>,
}
