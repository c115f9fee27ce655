//! Lesson repository: the `lesson` table.

use learnstore_core::{CourseModuleId, Lesson, LessonId, Logger};
use rusqlite::Row;
use rusqlite::types::Value;

use super::{settle_tombstone, stamp_new};
use crate::errors::Result;
use crate::sqlite::codec::{id_value, json_value, opt_ts, opt_ts_value, text_value, ts, ts_value};
use crate::sqlite::connection::ConnectionPool;
use crate::sqlite::context::DbContext;
use crate::sqlite::query::{Order, Record, Table, live_keys};

impl Record for Lesson {
    const TABLE: &'static str = "lesson";
    const COLUMNS: &'static [&'static str] = &[
        "id",
        "module_id",
        "ordinal",
        "title",
        "estimated_minutes",
        "metadata",
        "created_at",
        "updated_at",
        "deleted_at",
    ];
    const SOFT_DELETE: bool = true;

    fn values(&self) -> Result<Vec<Value>> {
        Ok(vec![
            id_value(self.id),
            id_value(self.module_id),
            Value::Integer(self.ordinal.into()),
            text_value(&self.title),
            Value::Integer(self.estimated_minutes.into()),
            json_value(&self.metadata)?,
            ts_value(&self.created_at),
            ts_value(&self.updated_at),
            opt_ts_value(self.deleted_at.as_ref()),
        ])
    }

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get("id")?,
            module_id: row.get("module_id")?,
            ordinal: row.get("ordinal")?,
            title: row.get("title")?,
            estimated_minutes: row.get("estimated_minutes")?,
            metadata: row.get("metadata")?,
            created_at: ts(row, "created_at")?,
            updated_at: ts(row, "updated_at")?,
            deleted_at: opt_ts(row, "deleted_at")?,
        })
    }
}

/// Lessons within modules, ordered by `ordinal`.
#[derive(Clone)]
pub struct LessonRepo {
    table: Table<Lesson>,
}

impl LessonRepo {
    /// Create a repository over `pool`, logging as `lesson_repo`.
    pub fn new(pool: ConnectionPool, log: &Logger) -> Self {
        Self {
            table: Table::new(pool, log.with_component("lesson_repo")),
        }
    }

    /// Insert lessons, assigning IDs and timestamps left unset.
    pub fn create(&self, ctx: &DbContext<'_>, rows: &mut [Lesson]) -> Result<usize> {
        let now = learnstore_core::time::now();
        for row in rows.iter_mut() {
            if row.id.is_unset() {
                row.id = LessonId::new();
            }
            stamp_new(&mut row.created_at, &mut row.updated_at, now);
            settle_tombstone(&mut row.deleted_at);
        }
        self.table.insert(ctx, &*rows)
    }

    /// Live lessons by ID.
    pub fn get_by_ids(&self, ctx: &DbContext<'_>, ids: &[LessonId]) -> Result<Vec<Lesson>> {
        self.table.get_by(ctx, "get_by_ids", "id", live_keys(ids), &[])
    }

    /// Live lessons of `module_ids`, grouped by module and ordered by ordinal.
    pub fn get_by_module_ids(&self, ctx: &DbContext<'_>, module_ids: &[CourseModuleId]) -> Result<Vec<Lesson>> {
        self.table.get_by(
            ctx,
            "get_by_module_ids",
            "module_id",
            live_keys(module_ids),
            &[("module_id", Order::Asc), ("ordinal", Order::Asc)],
        )
    }

    /// Tombstone lessons by ID.
    pub fn soft_delete_by_ids(&self, ctx: &DbContext<'_>, ids: &[LessonId]) -> Result<usize> {
        self.table
            .soft_delete_by(ctx, "soft_delete_by_ids", "id", live_keys(ids))
    }

    /// Tombstone every live lesson of `module_ids`.
    pub fn soft_delete_by_module_ids(&self, ctx: &DbContext<'_>, module_ids: &[CourseModuleId]) -> Result<usize> {
        self.table.soft_delete_by(
            ctx,
            "soft_delete_by_module_ids",
            "module_id",
            live_keys(module_ids),
        )
    }

    /// Remove lessons by ID, tombstoned ones included.
    pub fn full_delete_by_ids(&self, ctx: &DbContext<'_>, ids: &[LessonId]) -> Result<usize> {
        self.table
            .full_delete_by(ctx, "full_delete_by_ids", "id", live_keys(ids))
    }

    /// Remove every lesson of `module_ids`, tombstoned ones included.
    pub fn full_delete_by_module_ids(&self, ctx: &DbContext<'_>, module_ids: &[CourseModuleId]) -> Result<usize> {
        self.table.full_delete_by(
            ctx,
            "full_delete_by_module_ids",
            "module_id",
            live_keys(module_ids),
        )
    }
}
