//! # learnstore-store
//!
//! `SQLite` persistence for the learning-platform aggregates.
//!
//! - **Repositories**: one per aggregate (users, material sets, courses,
//!   modules, lessons, lesson assets, topic mastery, decision traces,
//!   document-variant exposures and outcomes, user-progression events), each
//!   a clonable handle over the shared pool.
//! - **[`DbContext`]**: passed into every call; carries an optional
//!   cancellation token, deadline and borrowed transaction, so callers compose
//!   multi-repository writes into one atomic unit.
//! - **Soft delete**: course-tree, material, mastery and user rows are
//!   tombstoned and hidden from reads; event-like rows are append-only and
//!   only ever hard-deleted.
//! - **[`Store`]**: opens the database from settings, runs migrations and
//!   bundles every repository.

#![deny(unsafe_code)]

pub mod errors;
pub mod repositories;
pub mod sqlite;
pub mod store;

pub use errors::{Result, StoreError};
pub use repositories::{
    CourseModuleRepo, CourseRepo, DecisionTraceRepo, DocVariantExposureRepo, DocVariantOutcomeRepo,
    LessonAssetRepo, LessonRepo, MaterialSetRepo, TopicMasteryRepo, UserProgressionEventRepo,
    UserRepo,
};
pub use sqlite::{ConnectionConfig, ConnectionPool, DbContext, PooledConnection, transact};
pub use store::Store;
