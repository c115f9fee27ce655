//! # learnstore-core
//!
//! Shared vocabulary for the learning-platform persistence layer.
//!
//! - **Branded IDs**: `CourseId`, `LessonId`, `UserId`, ... as `Uuid` newtypes.
//!   The nil UUID means "unset" everywhere.
//! - **Models**: one plain struct per aggregate (courses, modules, lessons,
//!   lesson assets, topic mastery, decision traces, document-variant exposures
//!   and outcomes, user-progression events).
//! - **Time**: UTC helpers with the "epoch means unset" convention.
//! - **Logging**: `tracing` subscriber bootstrap and the component-tagged
//!   [`Logger`](logging::Logger) handed to every repository.

#![deny(unsafe_code)]

pub mod ids;
pub mod logging;
pub mod models;
pub mod time;

pub use ids::*;
pub use logging::Logger;
pub use models::*;
