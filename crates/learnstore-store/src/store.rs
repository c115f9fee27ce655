//! The [`Store`] facade: one pool, every repository.

use learnstore_core::Logger;
use learnstore_settings::DatabaseSettings;
use tracing::info;

use crate::errors::Result;
use crate::repositories::{
    CourseModuleRepo, CourseRepo, DecisionTraceRepo, DocVariantExposureRepo, DocVariantOutcomeRepo,
    LessonAssetRepo, LessonRepo, MaterialSetRepo, TopicMasteryRepo, UserProgressionEventRepo,
    UserRepo,
};
use crate::sqlite::connection::{ConnectionConfig, ConnectionPool, new_file, new_in_memory};
use crate::sqlite::context::{DbContext, transact};
use crate::sqlite::migrations::run_migrations;

/// Every repository over one shared connection pool.
///
/// Cloning is cheap: the pool and the repositories are reference-counted
/// handles.
#[derive(Clone)]
pub struct Store {
    pool: ConnectionPool,
    /// Users (the parents of user-owned rows).
    pub users: UserRepo,
    /// Material sets.
    pub material_sets: MaterialSetRepo,
    /// Courses.
    pub courses: CourseRepo,
    /// Course modules.
    pub modules: CourseModuleRepo,
    /// Lessons.
    pub lessons: LessonRepo,
    /// Lesson assets.
    pub lesson_assets: LessonAssetRepo,
    /// Topic mastery estimates.
    pub topic_mastery: TopicMasteryRepo,
    /// Decision traces.
    pub decision_traces: DecisionTraceRepo,
    /// Document-variant exposures.
    pub exposures: DocVariantExposureRepo,
    /// Document-variant outcomes.
    pub outcomes: DocVariantOutcomeRepo,
    /// User progression events.
    pub progression_events: UserProgressionEventRepo,
}

impl Store {
    /// Open the database described by `settings` and bring its schema up to
    /// date.
    ///
    /// The `:memory:` path yields a private shared-cache
    /// database that lives as long as the returned store's pool.
    pub fn open(settings: &DatabaseSettings, log: &Logger) -> Result<Self> {
        let config = ConnectionConfig::from(settings);
        let pool = if settings.is_in_memory() {
            new_in_memory(&config)?
        } else {
            new_file(&settings.path, &config)?
        };
        let conn = pool.get()?;
        let applied = run_migrations(&conn)?;
        drop(conn);
        info!(
            service = log.service(),
            path = %settings.path,
            pool_size = config.pool_size,
            migrations = applied,
            "store opened"
        );
        Ok(Self::from_pool(pool, log))
    }

    /// Build the repositories over an existing, already migrated pool.
    pub fn from_pool(pool: ConnectionPool, log: &Logger) -> Self {
        Self {
            users: UserRepo::new(pool.clone(), log),
            material_sets: MaterialSetRepo::new(pool.clone(), log),
            courses: CourseRepo::new(pool.clone(), log),
            modules: CourseModuleRepo::new(pool.clone(), log),
            lessons: LessonRepo::new(pool.clone(), log),
            lesson_assets: LessonAssetRepo::new(pool.clone(), log),
            topic_mastery: TopicMasteryRepo::new(pool.clone(), log),
            decision_traces: DecisionTraceRepo::new(pool.clone(), log),
            exposures: DocVariantExposureRepo::new(pool.clone(), log),
            outcomes: DocVariantOutcomeRepo::new(pool.clone(), log),
            progression_events: UserProgressionEventRepo::new(pool.clone(), log),
            pool,
        }
    }

    /// The shared pool, for callers that open their own transactions.
    pub fn pool(&self) -> &ConnectionPool {
        &self.pool
    }

    /// Run `f` in a transaction on this store's pool. See [`transact`].
    pub fn transact<T, F>(&self, ctx: &DbContext<'_>, f: F) -> Result<T>
    where
        F: FnOnce(&DbContext<'_>) -> Result<T>,
    {
        transact(&self.pool, ctx, f)
    }
}
