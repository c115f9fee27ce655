//! Decision trace repository: the append-only `decision_trace` table.

use learnstore_core::{DecisionTrace, DecisionTraceId, Logger, UserId};
use rusqlite::Row;
use rusqlite::types::Value;

use super::{stamp_at, stamp_new};
use crate::errors::Result;
use crate::sqlite::codec::{id_value, json_value, text_value, ts, ts_value};
use crate::sqlite::connection::ConnectionPool;
use crate::sqlite::context::DbContext;
use crate::sqlite::query::{Order, Record, Select, Table, clamp_limit, live_keys};

/// Rows returned by [`DecisionTraceRepo::list_by_user`] for a non-positive limit.
pub const LIST_BY_USER_DEFAULT_LIMIT: i64 = 200;

/// Most rows [`DecisionTraceRepo::list_by_user`] returns.
pub const LIST_BY_USER_MAX_LIMIT: i64 = 2000;

impl Record for DecisionTrace {
    const TABLE: &'static str = "decision_trace";
    const COLUMNS: &'static [&'static str] = &[
        "id",
        "user_id",
        "decision_type",
        "payload",
        "occurred_at",
        "created_at",
        "updated_at",
    ];
    const SOFT_DELETE: bool = false;

    fn values(&self) -> Result<Vec<Value>> {
        Ok(vec![
            id_value(self.id),
            id_value(self.user_id),
            text_value(&self.decision_type),
            json_value(&self.payload)?,
            ts_value(&self.occurred_at),
            ts_value(&self.created_at),
            ts_value(&self.updated_at),
        ])
    }

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get("id")?,
            user_id: row.get("user_id")?,
            decision_type: row.get("decision_type")?,
            payload: row.get("payload")?,
            occurred_at: ts(row, "occurred_at")?,
            created_at: ts(row, "created_at")?,
            updated_at: ts(row, "updated_at")?,
        })
    }
}

/// Decision traces. Never soft-deleted.
#[derive(Clone)]
pub struct DecisionTraceRepo {
    table: Table<DecisionTrace>,
}

impl DecisionTraceRepo {
    /// Create a repository over `pool`, logging as `decision_trace_repo`.
    pub fn new(pool: ConnectionPool, log: &Logger) -> Self {
        Self {
            table: Table::new(pool, log.with_component("decision_trace_repo")),
        }
    }

    /// Insert traces, assigning IDs and timestamps left unset
    /// (`occurred_at` included).
    pub fn create(&self, ctx: &DbContext<'_>, rows: &mut [DecisionTrace]) -> Result<usize> {
        let now = learnstore_core::time::now();
        for row in rows.iter_mut() {
            if row.id.is_unset() {
                row.id = DecisionTraceId::new();
            }
            stamp_new(&mut row.created_at, &mut row.updated_at, now);
            stamp_at(&mut row.occurred_at, now);
        }
        self.table.insert(ctx, &*rows)
    }

    /// Traces by ID.
    pub fn get_by_ids(&self, ctx: &DbContext<'_>, ids: &[DecisionTraceId]) -> Result<Vec<DecisionTrace>> {
        self.table.get_by(ctx, "get_by_ids", "id", live_keys(ids), &[])
    }

    /// Traces of `user_ids`.
    pub fn get_by_user_ids(&self, ctx: &DbContext<'_>, user_ids: &[UserId]) -> Result<Vec<DecisionTrace>> {
        self.table
            .get_by(ctx, "get_by_user_ids", "user_id", live_keys(user_ids), &[])
    }

    /// Most recent traces of one user, newest `occurred_at` first, ties broken
    /// by newest `created_at`.
    ///
    /// `limit <= 0` means [`LIST_BY_USER_DEFAULT_LIMIT`]; larger requests are
    /// capped at [`LIST_BY_USER_MAX_LIMIT`].
    pub fn list_by_user(&self, ctx: &DbContext<'_>, user_id: UserId, limit: i64) -> Result<Vec<DecisionTrace>> {
        if user_id.is_unset() {
            return Ok(Vec::new());
        }
        let select = Select::new()
            .where_eq("user_id", id_value(user_id))
            .order_by("occurred_at", Order::Desc)
            .order_by("created_at", Order::Desc)
            .limit(clamp_limit(
                limit,
                LIST_BY_USER_DEFAULT_LIMIT,
                Some(LIST_BY_USER_MAX_LIMIT),
            ));
        self.table.fetch(ctx, "list_by_user", select)
    }

    /// Remove traces by ID.
    pub fn full_delete_by_ids(&self, ctx: &DbContext<'_>, ids: &[DecisionTraceId]) -> Result<usize> {
        self.table
            .full_delete_by(ctx, "full_delete_by_ids", "id", live_keys(ids))
    }

    /// Remove every trace of `user_ids`.
    pub fn full_delete_by_user_ids(&self, ctx: &DbContext<'_>, user_ids: &[UserId]) -> Result<usize> {
        self.table
            .full_delete_by(ctx, "full_delete_by_user_ids", "user_id", live_keys(user_ids))
    }
}
