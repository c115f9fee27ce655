//! Lesson asset repository: the `lesson_asset` table.

use learnstore_core::{LessonAsset, LessonAssetId, LessonId, Logger};
use rusqlite::Row;
use rusqlite::types::Value;

use super::{settle_tombstone, stamp_new};
use crate::errors::Result;
use crate::sqlite::codec::{id_value, json_value, opt_ts, opt_ts_value, text_value, ts, ts_value};
use crate::sqlite::connection::ConnectionPool;
use crate::sqlite::context::DbContext;
use crate::sqlite::query::{Record, Table, live_keys};

impl Record for LessonAsset {
    const TABLE: &'static str = "lesson_asset";
    const COLUMNS: &'static [&'static str] = &[
        "id",
        "lesson_id",
        "kind",
        "storage_key",
        "metadata",
        "created_at",
        "updated_at",
        "deleted_at",
    ];
    const SOFT_DELETE: bool = true;

    fn values(&self) -> Result<Vec<Value>> {
        Ok(vec![
            id_value(self.id),
            id_value(self.lesson_id),
            text_value(&self.kind),
            text_value(&self.storage_key),
            json_value(&self.metadata)?,
            ts_value(&self.created_at),
            ts_value(&self.updated_at),
            opt_ts_value(self.deleted_at.as_ref()),
        ])
    }

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get("id")?,
            lesson_id: row.get("lesson_id")?,
            kind: row.get("kind")?,
            storage_key: row.get("storage_key")?,
            metadata: row.get("metadata")?,
            created_at: ts(row, "created_at")?,
            updated_at: ts(row, "updated_at")?,
            deleted_at: opt_ts(row, "deleted_at")?,
        })
    }
}

/// Media and document assets attached to lessons.
#[derive(Clone)]
pub struct LessonAssetRepo {
    table: Table<LessonAsset>,
}

impl LessonAssetRepo {
    /// Create a repository over `pool`, logging as `lesson_asset_repo`.
    pub fn new(pool: ConnectionPool, log: &Logger) -> Self {
        Self {
            table: Table::new(pool, log.with_component("lesson_asset_repo")),
        }
    }

    /// Insert assets, assigning IDs and timestamps left unset.
    pub fn create(&self, ctx: &DbContext<'_>, rows: &mut [LessonAsset]) -> Result<usize> {
        let now = learnstore_core::time::now();
        for row in rows.iter_mut() {
            if row.id.is_unset() {
                row.id = LessonAssetId::new();
            }
            stamp_new(&mut row.created_at, &mut row.updated_at, now);
            settle_tombstone(&mut row.deleted_at);
        }
        self.table.insert(ctx, &*rows)
    }

    /// Live assets by ID.
    pub fn get_by_ids(&self, ctx: &DbContext<'_>, ids: &[LessonAssetId]) -> Result<Vec<LessonAsset>> {
        self.table.get_by(ctx, "get_by_ids", "id", live_keys(ids), &[])
    }

    /// Live assets of `lesson_ids`.
    pub fn get_by_lesson_ids(&self, ctx: &DbContext<'_>, lesson_ids: &[LessonId]) -> Result<Vec<LessonAsset>> {
        self.table
            .get_by(ctx, "get_by_lesson_ids", "lesson_id", live_keys(lesson_ids), &[])
    }

    /// Tombstone assets by ID.
    pub fn soft_delete_by_ids(&self, ctx: &DbContext<'_>, ids: &[LessonAssetId]) -> Result<usize> {
        self.table
            .soft_delete_by(ctx, "soft_delete_by_ids", "id", live_keys(ids))
    }

    /// Tombstone every live asset of `lesson_ids`.
    pub fn soft_delete_by_lesson_ids(&self, ctx: &DbContext<'_>, lesson_ids: &[LessonId]) -> Result<usize> {
        self.table.soft_delete_by(
            ctx,
            "soft_delete_by_lesson_ids",
            "lesson_id",
            live_keys(lesson_ids),
        )
    }

    /// Remove assets by ID, tombstoned ones included.
    pub fn full_delete_by_ids(&self, ctx: &DbContext<'_>, ids: &[LessonAssetId]) -> Result<usize> {
        self.table
            .full_delete_by(ctx, "full_delete_by_ids", "id", live_keys(ids))
    }

    /// Remove every asset of `lesson_ids`, tombstoned ones included.
    pub fn full_delete_by_lesson_ids(&self, ctx: &DbContext<'_>, lesson_ids: &[LessonId]) -> Result<usize> {
        self.table.full_delete_by(
            ctx,
            "full_delete_by_lesson_ids",
            "lesson_id",
            live_keys(lesson_ids),
        )
    }
}
