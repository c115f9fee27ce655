//! Document-variant experiments: which variant of a path node's document a
//! user was shown (exposure) and how it went (outcome).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::ids::{DocVariantExposureId, DocVariantOutcomeId, PathId, PathNodeId, UserId};

/// Fallback for an empty `policy_version`, `variant_kind` or `exposure_kind`.
pub const DEFAULT_DOC_VARIANT_KIND: &str = "base";

/// Fallback for an empty exposure `source`.
pub const DEFAULT_DOC_VARIANT_SOURCE: &str = "api";

/// One showing of a document variant to a user at a path node.
///
/// Append-only: exposures are never soft-deleted.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct DocVariantExposure {
    /// Exposure ID.
    pub id: DocVariantExposureId,
    /// User who saw the variant.
    pub user_id: UserId,
    /// Learning path.
    pub path_id: PathId,
    /// Node within the path.
    pub path_node_id: PathNodeId,
    /// Version of the selection policy that picked the variant.
    pub policy_version: String,
    /// Which variant was shown.
    pub variant_kind: String,
    /// How it was shown (inline, preview, ...).
    pub exposure_kind: String,
    /// Which surface recorded the exposure.
    pub source: String,
    /// Opaque JSON metadata.
    pub metadata: Value,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last update timestamp.
    pub updated_at: DateTime<Utc>,
}

/// The evaluated result of an exposure.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct DocVariantOutcome {
    /// Outcome ID.
    pub id: DocVariantOutcomeId,
    /// Exposure being evaluated.
    pub exposure_id: DocVariantExposureId,
    /// User the exposure belongs to.
    pub user_id: UserId,
    /// Outcome category (completed, abandoned, ...).
    pub outcome_kind: String,
    /// Outcome score.
    pub score: f64,
    /// Opaque JSON metadata.
    pub metadata: Value,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last update timestamp.
    pub updated_at: DateTime<Utc>,
}
