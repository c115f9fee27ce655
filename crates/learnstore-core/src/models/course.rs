//! Course content hierarchy: course → module → lesson → asset.
//!
//! Modules and lessons carry an `ordinal` that orders them within their
//! parent. Uniqueness of the ordinal per parent is the caller's job.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::ids::{CourseId, CourseModuleId, LessonAssetId, LessonId, MaterialSetId, UserId};

/// A course owned by a user, optionally generated from a material set.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Course {
    /// Course ID.
    pub id: CourseId,
    /// Owning user.
    pub user_id: UserId,
    /// Source material set, if any.
    pub material_set_id: Option<MaterialSetId>,
    /// Course title.
    pub title: String,
    /// Longer description.
    pub description: String,
    /// Lifecycle status (free-form, e.g. `"draft"`).
    pub status: String,
    /// Opaque JSON metadata.
    pub metadata: Value,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last update timestamp.
    pub updated_at: DateTime<Utc>,
    /// Soft-delete marker.
    pub deleted_at: Option<DateTime<Utc>>,
}

/// An ordered module within a course.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct CourseModule {
    /// Module ID.
    pub id: CourseModuleId,
    /// Parent course.
    pub course_id: CourseId,
    /// Position within the course.
    pub ordinal: i32,
    /// Module title.
    pub title: String,
    /// Longer description.
    pub description: String,
    /// Opaque JSON metadata.
    pub metadata: Value,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last update timestamp.
    pub updated_at: DateTime<Utc>,
    /// Soft-delete marker.
    pub deleted_at: Option<DateTime<Utc>>,
}

/// An ordered lesson within a module.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Lesson {
    /// Lesson ID.
    pub id: LessonId,
    /// Parent module.
    pub module_id: CourseModuleId,
    /// Position within the module.
    pub ordinal: i32,
    /// Lesson title.
    pub title: String,
    /// Estimated time to complete, in minutes.
    pub estimated_minutes: i32,
    /// Opaque JSON metadata.
    pub metadata: Value,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last update timestamp.
    pub updated_at: DateTime<Utc>,
    /// Soft-delete marker.
    pub deleted_at: Option<DateTime<Utc>>,
}

/// A media or document asset attached to a lesson.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct LessonAsset {
    /// Asset ID.
    pub id: LessonAssetId,
    /// Parent lesson.
    pub lesson_id: LessonId,
    /// Asset kind (`"image"`, `"video"`, `"audio"`, `"pdf"`, ...).
    pub kind: String,
    /// Object-storage key of the asset bytes.
    pub storage_key: String,
    /// Opaque JSON metadata.
    pub metadata: Value,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last update timestamp.
    pub updated_at: DateTime<Utc>,
    /// Soft-delete marker.
    pub deleted_at: Option<DateTime<Utc>>,
}
