//! One repository per aggregate.
//!
//! Every repository is a cheap clonable handle (pool + tagged logger) that
//! holds no per-request state; the [`DbContext`](crate::DbContext) passed to
//! each method decides whether statements run in the caller's transaction or
//! on a pooled connection.
//!
//! The method shape is uniform:
//!
//! | Method | Returns | Empty / unset input |
//! |---|---|---|
//! | `create(ctx, &mut rows)` | rows written; IDs and timestamps filled in place | `Ok(0)` |
//! | `get_by_ids` / `get_by_<parent>_ids` | live rows | `Ok(vec![])` |
//! | `soft_delete_by_*` | rows tombstoned | `Ok(0)` |
//! | `full_delete_by_*` | rows removed, tombstoned ones included | `Ok(0)` |
//!
//! Unset (nil) identifiers are dropped from key sets before any statement is
//! built, and a key set that ends up empty returns without touching storage.

use chrono::{DateTime, Utc};

pub mod course;
pub mod course_module;
pub mod decision_trace;
pub mod doc_variant_exposure;
pub mod doc_variant_outcome;
pub mod lesson;
pub mod lesson_asset;
pub mod material_set;
pub mod topic_mastery;
pub mod user;
pub mod user_progression_event;

#[cfg(test)]
pub(crate) mod test_support;

pub use course::CourseRepo;
pub use course_module::CourseModuleRepo;
pub use decision_trace::DecisionTraceRepo;
pub use doc_variant_exposure::DocVariantExposureRepo;
pub use doc_variant_outcome::DocVariantOutcomeRepo;
pub use lesson::LessonRepo;
pub use lesson_asset::LessonAssetRepo;
pub use material_set::MaterialSetRepo;
pub use topic_mastery::TopicMasteryRepo;
pub use user::UserRepo;
pub use user_progression_event::UserProgressionEventRepo;

/// Fill unset creation/update timestamps of a new row with `now` and bring
/// both to stored precision.
fn stamp_new(created_at: &mut DateTime<Utc>, updated_at: &mut DateTime<Utc>, now: DateTime<Utc>) {
    stamp_at(created_at, now);
    stamp_at(updated_at, now);
}

/// Fill an unset timestamp with `now`; keep a caller-set one at stored
/// precision so the row in the caller's batch equals the stored row.
fn stamp_at(ts: &mut DateTime<Utc>, now: DateTime<Utc>) {
    learnstore_core::time::default_to(ts, now);
    learnstore_core::time::truncate_to_stored(ts);
}

/// Bring a caller-set tombstone to stored precision.
fn settle_tombstone(deleted_at: &mut Option<DateTime<Utc>>) {
    if let Some(ts) = deleted_at {
        learnstore_core::time::truncate_to_stored(ts);
    }
}
