//! User repository: the `app_user` table.

use learnstore_core::{Logger, User, UserId};
use rusqlite::Row;
use rusqlite::types::Value;

use super::{settle_tombstone, stamp_new};
use crate::errors::Result;
use crate::sqlite::codec::{id_value, opt_ts, opt_ts_value, text_value, ts, ts_value};
use crate::sqlite::connection::ConnectionPool;
use crate::sqlite::context::DbContext;
use crate::sqlite::query::{Record, Table, live_keys};

impl Record for User {
    const TABLE: &'static str = "app_user";
    const COLUMNS: &'static [&'static str] = &[
        "id",
        "email",
        "display_name",
        "created_at",
        "updated_at",
        "deleted_at",
    ];
    const SOFT_DELETE: bool = true;

    fn values(&self) -> Result<Vec<Value>> {
        Ok(vec![
            id_value(self.id),
            text_value(&self.email),
            text_value(&self.display_name),
            ts_value(&self.created_at),
            ts_value(&self.updated_at),
            opt_ts_value(self.deleted_at.as_ref()),
        ])
    }

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get("id")?,
            email: row.get("email")?,
            display_name: row.get("display_name")?,
            created_at: ts(row, "created_at")?,
            updated_at: ts(row, "updated_at")?,
            deleted_at: opt_ts(row, "deleted_at")?,
        })
    }
}

/// Users. Parent of most per-user aggregates.
#[derive(Clone)]
pub struct UserRepo {
    table: Table<User>,
}

impl UserRepo {
    /// Create a repository over `pool`, logging as `user_repo`.
    pub fn new(pool: ConnectionPool, log: &Logger) -> Self {
        Self {
            table: Table::new(pool, log.with_component("user_repo")),
        }
    }

    /// Insert users, assigning IDs and timestamps left unset.
    pub fn create(&self, ctx: &DbContext<'_>, rows: &mut [User]) -> Result<usize> {
        let now = learnstore_core::time::now();
        for row in rows.iter_mut() {
            if row.id.is_unset() {
                row.id = UserId::new();
            }
            stamp_new(&mut row.created_at, &mut row.updated_at, now);
            settle_tombstone(&mut row.deleted_at);
        }
        self.table.insert(ctx, &*rows)
    }

    /// Live users by ID.
    pub fn get_by_ids(&self, ctx: &DbContext<'_>, ids: &[UserId]) -> Result<Vec<User>> {
        self.table.get_by(ctx, "get_by_ids", "id", live_keys(ids), &[])
    }

    /// Tombstone users by ID.
    pub fn soft_delete_by_ids(&self, ctx: &DbContext<'_>, ids: &[UserId]) -> Result<usize> {
        self.table
            .soft_delete_by(ctx, "soft_delete_by_ids", "id", live_keys(ids))
    }

    /// Remove users by ID. Their per-user rows go with them.
    pub fn full_delete_by_ids(&self, ctx: &DbContext<'_>, ids: &[UserId]) -> Result<usize> {
        self.table
            .full_delete_by(ctx, "full_delete_by_ids", "id", live_keys(ids))
    }
}

#[cfg(test)]
#[allow(unused_results)]
mod tests {
    use super::*;
    use crate::repositories::test_support::TestDb;
    use learnstore_core::logging::capture_logs;

    fn repo(db: &TestDb) -> UserRepo {
        UserRepo::new(db.pool.clone(), &db.log)
    }

    #[test]
    fn create_assigns_id_and_timestamps() {
        let db = TestDb::new();
        let ctx = DbContext::background();
        let mut rows = [User {
            email: "a@example.com".into(),
            ..Default::default()
        }];
        assert_eq!(repo(&db).create(&ctx, &mut rows).unwrap(), 1);
        assert!(!rows[0].id.is_unset());
        assert!(!learnstore_core::time::is_unset(&rows[0].created_at));
        assert_eq!(rows[0].created_at, rows[0].updated_at);

        let fetched = repo(&db).get_by_ids(&ctx, &[rows[0].id]).unwrap();
        assert_eq!(fetched, rows.to_vec());
    }

    #[test]
    fn create_keeps_caller_id() {
        let db = TestDb::new();
        let id = UserId::new();
        let mut rows = [User {
            id,
            ..Default::default()
        }];
        repo(&db).create(&DbContext::background(), &mut rows).unwrap();
        assert_eq!(rows[0].id, id);
    }

    #[test]
    fn soft_then_full_delete() {
        let db = TestDb::new();
        let ctx = DbContext::background();
        let id = db.seed_user();

        assert_eq!(repo(&db).soft_delete_by_ids(&ctx, &[id]).unwrap(), 1);
        assert!(repo(&db).get_by_ids(&ctx, &[id]).unwrap().is_empty());
        assert_eq!(db.physical_count("app_user", id), 1);

        assert_eq!(repo(&db).full_delete_by_ids(&ctx, &[id]).unwrap(), 1);
        assert_eq!(db.physical_count("app_user", id), 0);
    }

    #[test]
    fn full_delete_cascades_to_courses() {
        let db = TestDb::new();
        let user = db.seed_user();
        let course = db.seed_course(user);
        repo(&db)
            .full_delete_by_ids(&DbContext::background(), &[user])
            .unwrap();
        assert_eq!(db.physical_count("course", course), 0);
    }

    #[test]
    fn events_are_tagged_with_repo() {
        let db = TestDb::new();
        let (logs, _guard) = capture_logs();
        db.seed_user();
        let events = logs.events_with_field("repo", "user_repo");
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].field("op"), Some("create"));
        assert_eq!(events[0].field("rows"), Some("1"));
    }
}
