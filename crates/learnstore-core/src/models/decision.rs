use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::ids::{DecisionTraceId, UserId};

/// A recorded decision made on behalf of a user (what was chosen and why).
///
/// Append-only: decision traces are never soft-deleted.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct DecisionTrace {
    /// Trace ID.
    pub id: DecisionTraceId,
    /// User the decision was made for.
    pub user_id: UserId,
    /// Decision category.
    pub decision_type: String,
    /// Inputs, candidates and the chosen option as JSON.
    pub payload: Value,
    /// When the decision happened.
    pub occurred_at: DateTime<Utc>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last update timestamp.
    pub updated_at: DateTime<Utc>,
}
