//! Topic mastery repository: the `topic_mastery` table.
//!
//! One row per (user, topic) estimate. Uniqueness of the pair is not
//! enforced here; callers look rows up with
//! [`TopicMasteryRepo::get_by_user_id_and_topics`] before creating.

use learnstore_core::{Logger, TopicMastery, TopicMasteryId, UserId};
use rusqlite::types::Value;
use rusqlite::{Row, params};
use tracing::debug;

use super::{settle_tombstone, stamp_at, stamp_new};
use crate::errors::Result;
use crate::sqlite::codec::{id_value, json_value, opt_ts, opt_ts_value, text_value, ts, ts_value};
use crate::sqlite::connection::ConnectionPool;
use crate::sqlite::context::DbContext;
use crate::sqlite::query::{Record, Select, Table, live_keys, text_keys};

impl Record for TopicMastery {
    const TABLE: &'static str = "topic_mastery";
    const COLUMNS: &'static [&'static str] = &[
        "id",
        "user_id",
        "topic",
        "mastery",
        "last_update",
        "metadata",
        "created_at",
        "updated_at",
        "deleted_at",
    ];
    const SOFT_DELETE: bool = true;

    fn values(&self) -> Result<Vec<Value>> {
        Ok(vec![
            id_value(self.id),
            id_value(self.user_id),
            text_value(&self.topic),
            Value::Real(self.mastery),
            ts_value(&self.last_update),
            json_value(&self.metadata)?,
            ts_value(&self.created_at),
            ts_value(&self.updated_at),
            opt_ts_value(self.deleted_at.as_ref()),
        ])
    }

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get("id")?,
            user_id: row.get("user_id")?,
            topic: row.get("topic")?,
            mastery: row.get("mastery")?,
            last_update: ts(row, "last_update")?,
            metadata: row.get("metadata")?,
            created_at: ts(row, "created_at")?,
            updated_at: ts(row, "updated_at")?,
            deleted_at: opt_ts(row, "deleted_at")?,
        })
    }
}

/// Per-user topic mastery estimates.
#[derive(Clone)]
pub struct TopicMasteryRepo {
    table: Table<TopicMastery>,
}

impl TopicMasteryRepo {
    /// Create a repository over `pool`, logging as `topic_mastery_repo`.
    pub fn new(pool: ConnectionPool, log: &Logger) -> Self {
        Self {
            table: Table::new(pool, log.with_component("topic_mastery_repo")),
        }
    }

    /// Insert estimates, assigning IDs and timestamps left unset
    /// (`last_update` included). A mastery outside `0.0..=1.0` is rejected by
    /// storage.
    pub fn create(&self, ctx: &DbContext<'_>, rows: &mut [TopicMastery]) -> Result<usize> {
        let now = learnstore_core::time::now();
        for row in rows.iter_mut() {
            if row.id.is_unset() {
                row.id = TopicMasteryId::new();
            }
            stamp_new(&mut row.created_at, &mut row.updated_at, now);
            settle_tombstone(&mut row.deleted_at);
            stamp_at(&mut row.last_update, now);
        }
        self.table.insert(ctx, &*rows)
    }

    /// Live estimates by ID.
    pub fn get_by_ids(&self, ctx: &DbContext<'_>, ids: &[TopicMasteryId]) -> Result<Vec<TopicMastery>> {
        self.table.get_by(ctx, "get_by_ids", "id", live_keys(ids), &[])
    }

    /// Live estimates of `user_ids`.
    pub fn get_by_user_ids(&self, ctx: &DbContext<'_>, user_ids: &[UserId]) -> Result<Vec<TopicMastery>> {
        self.table
            .get_by(ctx, "get_by_user_ids", "user_id", live_keys(user_ids), &[])
    }

    /// Live estimates of one user restricted to `topics`.
    ///
    /// An unset user or an empty topic list yields nothing.
    pub fn get_by_user_id_and_topics<S: AsRef<str>>(
        &self,
        ctx: &DbContext<'_>,
        user_id: UserId,
        topics: &[S],
    ) -> Result<Vec<TopicMastery>> {
        let topics = text_keys(topics);
        if user_id.is_unset() || topics.is_empty() {
            return Ok(Vec::new());
        }
        let select = Select::new()
            .where_eq("user_id", id_value(user_id))
            .where_in("topic", topics);
        self.table.fetch(ctx, "get_by_user_id_and_topics", select)
    }

    /// Replace the stored fields of a live row with `row`'s and refresh
    /// `row.updated_at`. `created_at` is kept and `row.last_update` is brought
    /// to stored precision.
    ///
    /// Every mutable column is written, so fields the caller left at their
    /// defaults overwrite the stored values. Returns whether a live row
    /// matched; an unset ID or a tombstoned row is `false`.
    pub fn update(&self, ctx: &DbContext<'_>, row: &mut TopicMastery) -> Result<bool> {
        if row.id.is_unset() {
            return Ok(false);
        }
        row.updated_at = learnstore_core::time::now();
        learnstore_core::time::truncate_to_stored(&mut row.last_update);
        let metadata = json_value(&row.metadata)?;
        let changed = self.table.run(ctx, |conn| {
            Ok(conn.execute(
                "UPDATE topic_mastery
                 SET user_id = ?1, topic = ?2, mastery = ?3, last_update = ?4,
                     metadata = ?5, updated_at = ?6
                 WHERE id = ?7 AND deleted_at IS NULL",
                params![
                    row.user_id,
                    row.topic,
                    row.mastery,
                    ts_value(&row.last_update),
                    metadata,
                    ts_value(&row.updated_at),
                    row.id,
                ],
            )?)
        })?;
        debug!(
            repo = self.table.log().component(),
            op = "update",
            rows = changed,
            "updated"
        );
        Ok(changed > 0)
    }

    /// Tombstone estimates by ID.
    pub fn soft_delete_by_ids(&self, ctx: &DbContext<'_>, ids: &[TopicMasteryId]) -> Result<usize> {
        self.table
            .soft_delete_by(ctx, "soft_delete_by_ids", "id", live_keys(ids))
    }

    /// Tombstone every live estimate of `user_ids`.
    pub fn soft_delete_by_user_ids(&self, ctx: &DbContext<'_>, user_ids: &[UserId]) -> Result<usize> {
        self.table
            .soft_delete_by(ctx, "soft_delete_by_user_ids", "user_id", live_keys(user_ids))
    }

    /// Remove estimates by ID, tombstoned ones included.
    pub fn full_delete_by_ids(&self, ctx: &DbContext<'_>, ids: &[TopicMasteryId]) -> Result<usize> {
        self.table
            .full_delete_by(ctx, "full_delete_by_ids", "id", live_keys(ids))
    }

    /// Remove every estimate of `user_ids`, tombstoned ones included.
    pub fn full_delete_by_user_ids(&self, ctx: &DbContext<'_>, user_ids: &[UserId]) -> Result<usize> {
        self.table
            .full_delete_by(ctx, "full_delete_by_user_ids", "user_id", live_keys(user_ids))
    }
}

#[cfg(test)]
#[allow(unused_results)]
mod tests {
    use super::*;
    use crate::errors::StoreError;
    use crate::repositories::test_support::TestDb;
    use assert_matches::assert_matches;

    fn repo(db: &TestDb) -> TopicMasteryRepo {
        TopicMasteryRepo::new(db.pool.clone(), &db.log)
    }

    fn mastery(user_id: UserId, topic: &str, mastery: f64) -> TopicMastery {
        TopicMastery {
            user_id,
            topic: topic.into(),
            mastery,
            ..Default::default()
        }
    }

    #[test]
    fn create_defaults_last_update() {
        let db = TestDb::new();
        let user = db.seed_user();
        let mut rows = [mastery(user, "math", 0.5)];
        repo(&db).create(&DbContext::background(), &mut rows).unwrap();
        assert_eq!(rows[0].last_update, rows[0].created_at);
    }

    #[test]
    fn lookup_by_user_and_topics() {
        let db = TestDb::new();
        let ctx = DbContext::background();
        let user = db.seed_user();
        let other = db.seed_user();
        let mut rows = [
            mastery(user, "math", 0.5),
            mastery(user, "art", 0.2),
            mastery(other, "math", 0.9),
        ];
        repo(&db).create(&ctx, &mut rows).unwrap();

        let found = repo(&db)
            .get_by_user_id_and_topics(&ctx, user, &["math", "history"])
            .unwrap();
        assert_eq!(found, vec![rows[0].clone()]);

        assert_eq!(repo(&db).get_by_user_ids(&ctx, &[user]).unwrap().len(), 2);
    }

    #[test]
    fn lookup_short_circuits_on_trivial_input() {
        let db = TestDb::new();
        let ctx = DbContext::background();
        let user = db.seed_user();
        let none: [&str; 0] = [];
        assert!(repo(&db).get_by_user_id_and_topics(&ctx, user, &none).unwrap().is_empty());
        assert!(
            repo(&db)
                .get_by_user_id_and_topics(&ctx, UserId::nil(), &["math"])
                .unwrap()
                .is_empty()
        );
    }

    #[test]
    fn update_replaces_fields_and_refreshes_updated_at() {
        let db = TestDb::new();
        let ctx = DbContext::background();
        let user = db.seed_user();
        let mut rows = [mastery(user, "math", 0.5)];
        repo(&db).create(&ctx, &mut rows).unwrap();
        let created = rows[0].clone();

        let mut row = created.clone();
        row.mastery = 0.7;
        std::thread::sleep(std::time::Duration::from_millis(2));
        assert!(repo(&db).update(&ctx, &mut row).unwrap());
        assert!(row.updated_at > created.updated_at);

        let stored = repo(&db).get_by_ids(&ctx, &[row.id]).unwrap();
        assert_eq!(stored.len(), 1);
        assert!((stored[0].mastery - 0.7).abs() < f64::EPSILON);
        assert_eq!(stored[0].updated_at, row.updated_at);
        assert_eq!(stored[0].created_at, created.created_at);
    }

    #[test]
    fn update_stores_caller_last_update_as_returned() {
        let db = TestDb::new();
        let ctx = DbContext::background();
        let user = db.seed_user();
        let mut rows = [mastery(user, "math", 0.5)];
        repo(&db).create(&ctx, &mut rows).unwrap();

        let mut row = rows[0].clone();
        row.last_update = chrono::Utc::now() + chrono::Duration::nanoseconds(7);
        assert!(repo(&db).update(&ctx, &mut row).unwrap());
        assert_eq!(repo(&db).get_by_ids(&ctx, &[row.id]).unwrap(), vec![row]);
    }

    #[test]
    fn update_skips_tombstoned_and_unset() {
        let db = TestDb::new();
        let ctx = DbContext::background();
        let user = db.seed_user();
        let mut rows = [mastery(user, "math", 0.5)];
        repo(&db).create(&ctx, &mut rows).unwrap();
        repo(&db).soft_delete_by_ids(&ctx, &[rows[0].id]).unwrap();

        let mut row = rows[0].clone();
        assert!(!repo(&db).update(&ctx, &mut row).unwrap());
        assert!(!repo(&db).update(&ctx, &mut TopicMastery::default()).unwrap());
    }

    #[test]
    fn out_of_range_mastery_is_a_storage_error() {
        let db = TestDb::new();
        let user = db.seed_user();
        let mut rows = [mastery(user, "math", 1.5)];
        let result = repo(&db).create(&DbContext::background(), &mut rows);
        assert_matches!(result, Err(StoreError::Sqlite(_)));
    }

    #[test]
    fn user_scoped_deletes() {
        let db = TestDb::new();
        let ctx = DbContext::background();
        let user = db.seed_user();
        let mut rows = [mastery(user, "math", 0.1), mastery(user, "art", 0.3)];
        repo(&db).create(&ctx, &mut rows).unwrap();

        assert_eq!(repo(&db).soft_delete_by_user_ids(&ctx, &[user]).unwrap(), 2);
        assert!(repo(&db).get_by_user_ids(&ctx, &[user]).unwrap().is_empty());
        assert_eq!(repo(&db).full_delete_by_user_ids(&ctx, &[user]).unwrap(), 2);
        assert_eq!(db.physical_count("topic_mastery", rows[0].id), 0);
        assert_eq!(repo(&db).full_delete_by_ids(&ctx, &[rows[1].id]).unwrap(), 0);
    }
}
