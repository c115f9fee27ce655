//! Aggregate entity definitions.
//!
//! Plain data only: persistence rules (ID/timestamp defaulting, soft-delete
//! visibility, normalisation) live in the repositories. Unset identifiers are
//! nil, unset timestamps are the epoch, and tombstoned rows carry
//! `deleted_at = Some(..)`.

mod course;
mod decision;
mod doc_variant;
mod mastery;
mod material;
mod progression;
mod user;

pub use course::{Course, CourseModule, Lesson, LessonAsset};
pub use decision::DecisionTrace;
pub use doc_variant::{
    DEFAULT_DOC_VARIANT_KIND, DEFAULT_DOC_VARIANT_SOURCE, DocVariantExposure, DocVariantOutcome,
};
pub use mastery::TopicMastery;
pub use material::MaterialSet;
pub use progression::UserProgressionEvent;
pub use user::User;
