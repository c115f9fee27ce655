//! Material set repository: the `material_set` table.

use learnstore_core::{Logger, MaterialSet, MaterialSetId, UserId};
use rusqlite::Row;
use rusqlite::types::Value;

use super::{settle_tombstone, stamp_new};
use crate::errors::Result;
use crate::sqlite::codec::{id_value, opt_ts, opt_ts_value, text_value, ts, ts_value};
use crate::sqlite::connection::ConnectionPool;
use crate::sqlite::context::DbContext;
use crate::sqlite::query::{Record, Table, live_keys};

impl Record for MaterialSet {
    const TABLE: &'static str = "material_set";
    const COLUMNS: &'static [&'static str] = &[
        "id",
        "user_id",
        "title",
        "status",
        "created_at",
        "updated_at",
        "deleted_at",
    ];
    const SOFT_DELETE: bool = true;

    fn values(&self) -> Result<Vec<Value>> {
        Ok(vec![
            id_value(self.id),
            id_value(self.user_id),
            text_value(&self.title),
            text_value(&self.status),
            ts_value(&self.created_at),
            ts_value(&self.updated_at),
            opt_ts_value(self.deleted_at.as_ref()),
        ])
    }

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get("id")?,
            user_id: row.get("user_id")?,
            title: row.get("title")?,
            status: row.get("status")?,
            created_at: ts(row, "created_at")?,
            updated_at: ts(row, "updated_at")?,
            deleted_at: opt_ts(row, "deleted_at")?,
        })
    }
}

/// Uploaded material sets that courses are generated from.
#[derive(Clone)]
pub struct MaterialSetRepo {
    table: Table<MaterialSet>,
}

impl MaterialSetRepo {
    /// Create a repository over `pool`, logging as `material_set_repo`.
    pub fn new(pool: ConnectionPool, log: &Logger) -> Self {
        Self {
            table: Table::new(pool, log.with_component("material_set_repo")),
        }
    }

    /// Insert material sets, assigning IDs and timestamps left unset.
    pub fn create(&self, ctx: &DbContext<'_>, rows: &mut [MaterialSet]) -> Result<usize> {
        let now = learnstore_core::time::now();
        for row in rows.iter_mut() {
            if row.id.is_unset() {
                row.id = MaterialSetId::new();
            }
            stamp_new(&mut row.created_at, &mut row.updated_at, now);
            settle_tombstone(&mut row.deleted_at);
        }
        self.table.insert(ctx, &*rows)
    }

    /// Live material sets by ID.
    pub fn get_by_ids(&self, ctx: &DbContext<'_>, ids: &[MaterialSetId]) -> Result<Vec<MaterialSet>> {
        self.table.get_by(ctx, "get_by_ids", "id", live_keys(ids), &[])
    }

    /// Live material sets owned by any of `user_ids`.
    pub fn get_by_user_ids(&self, ctx: &DbContext<'_>, user_ids: &[UserId]) -> Result<Vec<MaterialSet>> {
        self.table
            .get_by(ctx, "get_by_user_ids", "user_id", live_keys(user_ids), &[])
    }

    /// Tombstone material sets by ID.
    pub fn soft_delete_by_ids(&self, ctx: &DbContext<'_>, ids: &[MaterialSetId]) -> Result<usize> {
        self.table
            .soft_delete_by(ctx, "soft_delete_by_ids", "id", live_keys(ids))
    }

    /// Remove material sets by ID. Courses built from them keep existing with
    /// the reference cleared.
    pub fn full_delete_by_ids(&self, ctx: &DbContext<'_>, ids: &[MaterialSetId]) -> Result<usize> {
        self.table
            .full_delete_by(ctx, "full_delete_by_ids", "id", live_keys(ids))
    }
}

#[cfg(test)]
#[allow(unused_results)]
mod tests {
    use super::*;
    use crate::repositories::CourseRepo;
    use crate::repositories::test_support::TestDb;
    use learnstore_core::Course;

    fn repo(db: &TestDb) -> MaterialSetRepo {
        MaterialSetRepo::new(db.pool.clone(), &db.log)
    }

    fn seed(db: &TestDb, user_id: UserId, title: &str) -> MaterialSet {
        let mut rows = [MaterialSet {
            user_id,
            title: title.into(),
            status: "ready".into(),
            ..Default::default()
        }];
        repo(db).create(&DbContext::background(), &mut rows).unwrap();
        rows[0].clone()
    }

    #[test]
    fn get_by_user_ids_returns_live_sets() {
        let db = TestDb::new();
        let ctx = DbContext::background();
        let user = db.seed_user();
        let other = db.seed_user();
        let a = seed(&db, user, "a");
        let b = seed(&db, user, "b");
        seed(&db, other, "c");

        let mut found = repo(&db).get_by_user_ids(&ctx, &[user]).unwrap();
        found.sort_by(|x, y| x.title.cmp(&y.title));
        assert_eq!(found, vec![a.clone(), b]);

        repo(&db).soft_delete_by_ids(&ctx, &[a.id]).unwrap();
        assert_eq!(repo(&db).get_by_user_ids(&ctx, &[user]).unwrap().len(), 1);
    }

    #[test]
    fn full_delete_clears_course_reference() {
        let db = TestDb::new();
        let ctx = DbContext::background();
        let user = db.seed_user();
        let set = seed(&db, user, "a");
        let courses = CourseRepo::new(db.pool.clone(), &db.log);
        let mut rows = [Course {
            user_id: user,
            material_set_id: Some(set.id),
            ..Default::default()
        }];
        courses.create(&ctx, &mut rows).unwrap();

        assert_eq!(repo(&db).full_delete_by_ids(&ctx, &[set.id]).unwrap(), 1);
        let course = courses.get_by_ids(&ctx, &[rows[0].id]).unwrap();
        assert_eq!(course.len(), 1);
        assert_eq!(course[0].material_set_id, None);
    }

    #[test]
    fn unset_ids_short_circuit() {
        let db = TestDb::new();
        let ctx = DbContext::background();
        assert!(repo(&db).get_by_ids(&ctx, &[MaterialSetId::nil()]).unwrap().is_empty());
        assert!(repo(&db).get_by_user_ids(&ctx, &[]).unwrap().is_empty());
        assert_eq!(repo(&db).soft_delete_by_ids(&ctx, &[]).unwrap(), 0);
    }
}
