//! Course repository: the `course` table.
//!
//! A course belongs to a user and optionally points at the material set it
//! was generated from.

use learnstore_core::{Course, CourseId, Logger, MaterialSetId, UserId};
use rusqlite::Row;
use rusqlite::types::Value;

use super::{settle_tombstone, stamp_new};
use crate::errors::Result;
use crate::sqlite::codec::{
    id_value, json_value, opt_id_value, opt_ts, opt_ts_value, text_value, ts, ts_value,
};
use crate::sqlite::connection::ConnectionPool;
use crate::sqlite::context::DbContext;
use crate::sqlite::query::{Record, Table, live_keys};

impl Record for Course {
    const TABLE: &'static str = "course";
    const COLUMNS: &'static [&'static str] = &[
        "id",
        "user_id",
        "material_set_id",
        "title",
        "description",
        "status",
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
            opt_id_value(self.material_set_id),
            text_value(&self.title),
            text_value(&self.description),
            text_value(&self.status),
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
            material_set_id: row.get("material_set_id")?,
            title: row.get("title")?,
            description: row.get("description")?,
            status: row.get("status")?,
            metadata: row.get("metadata")?,
            created_at: ts(row, "created_at")?,
            updated_at: ts(row, "updated_at")?,
            deleted_at: opt_ts(row, "deleted_at")?,
        })
    }
}

/// Courses.
#[derive(Clone)]
pub struct CourseRepo {
    table: Table<Course>,
}

impl CourseRepo {
    /// Create a repository over `pool`, logging as `course_repo`.
    pub fn new(pool: ConnectionPool, log: &Logger) -> Self {
        Self {
            table: Table::new(pool, log.with_component("course_repo")),
        }
    }

    /// Insert courses, assigning IDs and timestamps left unset.
    ///
    /// A `Some` material set holding the unset ID is stored as no reference.
    pub fn create(&self, ctx: &DbContext<'_>, rows: &mut [Course]) -> Result<usize> {
        let now = learnstore_core::time::now();
        for row in rows.iter_mut() {
            if row.id.is_unset() {
                row.id = CourseId::new();
            }
            if row.material_set_id.is_some_and(|id| id.is_unset()) {
                row.material_set_id = None;
            }
            stamp_new(&mut row.created_at, &mut row.updated_at, now);
            settle_tombstone(&mut row.deleted_at);
        }
        self.table.insert(ctx, &*rows)
    }

    /// Live courses by ID.
    pub fn get_by_ids(&self, ctx: &DbContext<'_>, ids: &[CourseId]) -> Result<Vec<Course>> {
        self.table.get_by(ctx, "get_by_ids", "id", live_keys(ids), &[])
    }

    /// Live courses owned by any of `user_ids`.
    pub fn get_by_user_ids(&self, ctx: &DbContext<'_>, user_ids: &[UserId]) -> Result<Vec<Course>> {
        self.table
            .get_by(ctx, "get_by_user_ids", "user_id", live_keys(user_ids), &[])
    }

    /// Live courses generated from any of `material_set_ids`.
    pub fn get_by_material_set_ids(
        &self,
        ctx: &DbContext<'_>,
        material_set_ids: &[MaterialSetId],
    ) -> Result<Vec<Course>> {
        self.table.get_by(
            ctx,
            "get_by_material_set_ids",
            "material_set_id",
            live_keys(material_set_ids),
            &[],
        )
    }

    /// Tombstone courses by ID.
    pub fn soft_delete_by_ids(&self, ctx: &DbContext<'_>, ids: &[CourseId]) -> Result<usize> {
        self.table
            .soft_delete_by(ctx, "soft_delete_by_ids", "id", live_keys(ids))
    }

    /// Tombstone every live course of `user_ids`.
    pub fn soft_delete_by_user_ids(&self, ctx: &DbContext<'_>, user_ids: &[UserId]) -> Result<usize> {
        self.table
            .soft_delete_by(ctx, "soft_delete_by_user_ids", "user_id", live_keys(user_ids))
    }

    /// Tombstone every live course generated from `material_set_ids`.
    pub fn soft_delete_by_material_set_ids(
        &self,
        ctx: &DbContext<'_>,
        material_set_ids: &[MaterialSetId],
    ) -> Result<usize> {
        self.table.soft_delete_by(
            ctx,
            "soft_delete_by_material_set_ids",
            "material_set_id",
            live_keys(material_set_ids),
        )
    }

    /// Remove courses by ID, tombstoned ones included.
    pub fn full_delete_by_ids(&self, ctx: &DbContext<'_>, ids: &[CourseId]) -> Result<usize> {
        self.table
            .full_delete_by(ctx, "full_delete_by_ids", "id", live_keys(ids))
    }

    /// Remove every course of `user_ids`, tombstoned ones included.
    pub fn full_delete_by_user_ids(&self, ctx: &DbContext<'_>, user_ids: &[UserId]) -> Result<usize> {
        self.table
            .full_delete_by(ctx, "full_delete_by_user_ids", "user_id", live_keys(user_ids))
    }

    /// Remove every course generated from `material_set_ids`, tombstoned ones
    /// included.
    pub fn full_delete_by_material_set_ids(
        &self,
        ctx: &DbContext<'_>,
        material_set_ids: &[MaterialSetId],
    ) -> Result<usize> {
        self.table.full_delete_by(
            ctx,
            "full_delete_by_material_set_ids",
            "material_set_id",
            live_keys(material_set_ids),
        )
    }
}
