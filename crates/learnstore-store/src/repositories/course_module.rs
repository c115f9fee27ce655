//! Course module repository: the `course_module` table.

use learnstore_core::{CourseId, CourseModule, CourseModuleId, Logger};
use rusqlite::Row;
use rusqlite::types::Value;

use super::{settle_tombstone, stamp_new};
use crate::errors::Result;
use crate::sqlite::codec::{id_value, json_value, opt_ts, opt_ts_value, text_value, ts, ts_value};
use crate::sqlite::connection::ConnectionPool;
use crate::sqlite::context::DbContext;
use crate::sqlite::query::{Order, Record, Table, live_keys};

impl Record for CourseModule {
    const TABLE: &'static str = "course_module";
    const COLUMNS: &'static [&'static str] = &[
        "id",
        "course_id",
        "ordinal",
        "title",
        "description",
        "metadata",
        "created_at",
        "updated_at",
        "deleted_at",
    ];
    const SOFT_DELETE: bool = true;

    fn values(&self) -> Result<Vec<Value>> {
        Ok(vec![
            id_value(self.id),
            id_value(self.course_id),
            Value::Integer(self.ordinal.into()),
            text_value(&self.title),
            text_value(&self.description),
            json_value(&self.metadata)?,
            ts_value(&self.created_at),
            ts_value(&self.updated_at),
            opt_ts_value(self.deleted_at.as_ref()),
        ])
    }

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get("id")?,
            course_id: row.get("course_id")?,
            ordinal: row.get("ordinal")?,
            title: row.get("title")?,
            description: row.get("description")?,
            metadata: row.get("metadata")?,
            created_at: ts(row, "created_at")?,
            updated_at: ts(row, "updated_at")?,
            deleted_at: opt_ts(row, "deleted_at")?,
        })
    }
}

/// Modules within courses, ordered by `ordinal`.
#[derive(Clone)]
pub struct CourseModuleRepo {
    table: Table<CourseModule>,
}

impl CourseModuleRepo {
    /// Create a repository over `pool`, logging as `course_module_repo`.
    pub fn new(pool: ConnectionPool, log: &Logger) -> Self {
        Self {
            table: Table::new(pool, log.with_component("course_module_repo")),
        }
    }

    /// Insert modules, assigning IDs and timestamps left unset. Ordinals are
    /// stored as given.
    pub fn create(&self, ctx: &DbContext<'_>, rows: &mut [CourseModule]) -> Result<usize> {
        let now = learnstore_core::time::now();
        for row in rows.iter_mut() {
            if row.id.is_unset() {
                row.id = CourseModuleId::new();
            }
            stamp_new(&mut row.created_at, &mut row.updated_at, now);
            settle_tombstone(&mut row.deleted_at);
        }
        self.table.insert(ctx, &*rows)
    }

    /// Live modules by ID.
    pub fn get_by_ids(&self, ctx: &DbContext<'_>, ids: &[CourseModuleId]) -> Result<Vec<CourseModule>> {
        self.table.get_by(ctx, "get_by_ids", "id", live_keys(ids), &[])
    }

    /// Live modules of `course_ids`, grouped by course and ordered by ordinal.
    pub fn get_by_course_ids(&self, ctx: &DbContext<'_>, course_ids: &[CourseId]) -> Result<Vec<CourseModule>> {
        self.table.get_by(
            ctx,
            "get_by_course_ids",
            "course_id",
            live_keys(course_ids),
            &[("course_id", Order::Asc), ("ordinal", Order::Asc)],
        )
    }

    /// Tombstone modules by ID.
    pub fn soft_delete_by_ids(&self, ctx: &DbContext<'_>, ids: &[CourseModuleId]) -> Result<usize> {
        self.table
            .soft_delete_by(ctx, "soft_delete_by_ids", "id", live_keys(ids))
    }

    /// Tombstone every live module of `course_ids`.
    pub fn soft_delete_by_course_ids(&self, ctx: &DbContext<'_>, course_ids: &[CourseId]) -> Result<usize> {
        self.table.soft_delete_by(
            ctx,
            "soft_delete_by_course_ids",
            "course_id",
            live_keys(course_ids),
        )
    }

    /// Remove modules by ID, tombstoned ones included.
    pub fn full_delete_by_ids(&self, ctx: &DbContext<'_>, ids: &[CourseModuleId]) -> Result<usize> {
        self.table
            .full_delete_by(ctx, "full_delete_by_ids", "id", live_keys(ids))
    }

    /// Remove every module of `course_ids`, tombstoned ones included.
    pub fn full_delete_by_course_ids(&self, ctx: &DbContext<'_>, course_ids: &[CourseId]) -> Result<usize> {
        self.table.full_delete_by(
            ctx,
            "full_delete_by_course_ids",
            "course_id",
            live_keys(course_ids),
        )
    }
}

#[cfg(test)]
#[allow(unused_results)]
mod tests {
    use super::*;
    use crate::repositories::test_support::TestDb;

    fn repo(db: &TestDb) -> CourseModuleRepo {
        CourseModuleRepo::new(db.pool.clone(), &db.log)
    }

    fn module(course_id: CourseId, ordinal: i32) -> CourseModule {
        CourseModule {
            course_id,
            ordinal,
            title: format!("module {ordinal}"),
            ..Default::default()
        }
    }

    #[test]
    fn get_by_course_ids_orders_by_ordinal() {
        let db = TestDb::new();
        let ctx = DbContext::background();
        let course = db.seed_course(db.seed_user());
        let mut rows = [module(course, 3), module(course, 1), module(course, 2)];
        repo(&db).create(&ctx, &mut rows).unwrap();

        let ordinals: Vec<i32> = repo(&db)
            .get_by_course_ids(&ctx, &[course])
            .unwrap()
            .iter()
            .map(|m| m.ordinal)
            .collect();
        assert_eq!(ordinals, vec![1, 2, 3]);
    }

    #[test]
    fn soft_delete_by_course_skips_other_courses() {
        let db = TestDb::new();
        let ctx = DbContext::background();
        let user = db.seed_user();
        let a = db.seed_course(user);
        let b = db.seed_course(user);
        let mut rows = [module(a, 1), module(a, 2), module(b, 1)];
        repo(&db).create(&ctx, &mut rows).unwrap();

        assert_eq!(repo(&db).soft_delete_by_course_ids(&ctx, &[a]).unwrap(), 2);
        assert!(repo(&db).get_by_course_ids(&ctx, &[a]).unwrap().is_empty());
        assert_eq!(repo(&db).get_by_course_ids(&ctx, &[b]).unwrap().len(), 1);
        assert_eq!(db.physical_count("course_module", rows[0].id), 1);
    }

    #[test]
    fn full_delete_by_course_removes_tombstones() {
        let db = TestDb::new();
        let ctx = DbContext::background();
        let course = db.seed_course(db.seed_user());
        let mut rows = [module(course, 1), module(course, 2)];
        repo(&db).create(&ctx, &mut rows).unwrap();
        repo(&db).soft_delete_by_ids(&ctx, &[rows[0].id]).unwrap();

        assert_eq!(repo(&db).full_delete_by_course_ids(&ctx, &[course]).unwrap(), 2);
        assert_eq!(db.physical_count("course_module", rows[0].id), 0);
    }

    #[test]
    fn full_delete_by_ids_and_lookup() {
        let db = TestDb::new();
        let ctx = DbContext::background();
        let course = db.seed_course(db.seed_user());
        let mut rows = [module(course, 1)];
        repo(&db).create(&ctx, &mut rows).unwrap();
        assert_eq!(repo(&db).get_by_ids(&ctx, &[rows[0].id]).unwrap().len(), 1);
        assert_eq!(repo(&db).full_delete_by_ids(&ctx, &[rows[0].id]).unwrap(), 1);
        assert!(repo(&db).get_by_ids(&ctx, &[rows[0].id]).unwrap().is_empty());
    }
}
