//! Fixtures for repository unit tests: a migrated file database per test and
//! parent-row seeding.

use learnstore_core::{
    Course, CourseId, CourseModule, CourseModuleId, Lesson, LessonId, Logger, User, UserId,
};
use tempfile::TempDir;

use super::{CourseModuleRepo, CourseRepo, LessonRepo, UserRepo};
use crate::sqlite::connection::{ConnectionConfig, ConnectionPool, new_file};
use crate::sqlite::context::DbContext;
use crate::sqlite::migrations::run_migrations;

pub(crate) struct TestDb {
    _dir: TempDir,
    pub(crate) pool: ConnectionPool,
    pub(crate) log: Logger,
}

impl TestDb {
    pub(crate) fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("repo.db");
        let pool = new_file(path.to_str().unwrap(), &ConnectionConfig::default()).unwrap();
        let _ = run_migrations(&pool.get().unwrap()).unwrap();
        Self {
            _dir: dir,
            pool,
            log: Logger::default(),
        }
    }

    /// Rows physically present with `id`, tombstoned or not.
    pub(crate) fn physical_count(&self, table: &str, id: impl ToString) -> i64 {
        self.pool
            .get()
            .unwrap()
            .query_row(
                &format!("SELECT COUNT(*) FROM {table} WHERE id = ?1"),
                [id.to_string()],
                |row| row.get(0),
            )
            .unwrap()
    }

    pub(crate) fn seed_user(&self) -> UserId {
        let mut users = [User {
            email: "learner@example.com".into(),
            display_name: "Learner".into(),
            ..Default::default()
        }];
        let _ = UserRepo::new(self.pool.clone(), &self.log)
            .create(&DbContext::background(), &mut users)
            .unwrap();
        users[0].id
    }

    pub(crate) fn seed_course(&self, user_id: UserId) -> CourseId {
        let mut courses = [Course {
            user_id,
            title: "course".into(),
            status: "draft".into(),
            ..Default::default()
        }];
        let _ = CourseRepo::new(self.pool.clone(), &self.log)
            .create(&DbContext::background(), &mut courses)
            .unwrap();
        courses[0].id
    }

    pub(crate) fn seed_module(&self, course_id: CourseId) -> CourseModuleId {
        let mut modules = [CourseModule {
            course_id,
            title: "module".into(),
            ..Default::default()
        }];
        let _ = CourseModuleRepo::new(self.pool.clone(), &self.log)
            .create(&DbContext::background(), &mut modules)
            .unwrap();
        modules[0].id
    }

    pub(crate) fn seed_lesson(&self, module_id: CourseModuleId) -> LessonId {
        let mut lessons = [Lesson {
            module_id,
            title: "lesson".into(),
            ..Default::default()
        }];
        let _ = LessonRepo::new(self.pool.clone(), &self.log)
            .create(&DbContext::background(), &mut lessons)
            .unwrap();
        lessons[0].id
    }
}
