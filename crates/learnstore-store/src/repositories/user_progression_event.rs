//! User progression event repository: the append-only
//! `user_progression_event` table.
//!
//! All list and per-parent queries return the newest `occurred_at` first,
//! ties broken by the newest ID (IDs are time-ordered).

use learnstore_core::{Logger, PathId, UserId, UserProgressionEvent, UserProgressionEventId};
use rusqlite::Row;
use rusqlite::types::Value;

use super::{stamp_at, stamp_new};
use crate::errors::Result;
use crate::sqlite::codec::{id_value, json_value, opt_id_value, text_value, ts, ts_value};
use crate::sqlite::connection::ConnectionPool;
use crate::sqlite::context::DbContext;
use crate::sqlite::query::{Order, Record, Select, Table, clamp_limit, live_keys};

/// Rows returned by [`UserProgressionEventRepo::list_recent_by_user`] for a
/// non-positive limit.
pub const LIST_RECENT_BY_USER_DEFAULT_LIMIT: i64 = 500;

/// Rows returned by [`UserProgressionEventRepo::list_recent_all`] for a
/// non-positive limit.
pub const LIST_RECENT_ALL_DEFAULT_LIMIT: i64 = 50_000;

/// Rows returned by [`UserProgressionEventRepo::list_by_user_and_path_id`]
/// for a non-positive limit.
pub const LIST_BY_USER_AND_PATH_DEFAULT_LIMIT: i64 = 5_000;

/// Most rows [`UserProgressionEventRepo::list_by_user_and_path_id`] returns.
pub const LIST_BY_USER_AND_PATH_MAX_LIMIT: i64 = 50_000;

impl Record for UserProgressionEvent {
    const TABLE: &'static str = "user_progression_event";
    const COLUMNS: &'static [&'static str] = &[
        "id",
        "user_id",
        "path_id",
        "path_node_id",
        "event_type",
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
            id_value(self.path_id),
            opt_id_value(self.path_node_id),
            text_value(&self.event_type),
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
            path_id: row.get("path_id")?,
            path_node_id: row.get("path_node_id")?,
            event_type: row.get("event_type")?,
            payload: row.get("payload")?,
            occurred_at: ts(row, "occurred_at")?,
            created_at: ts(row, "created_at")?,
            updated_at: ts(row, "updated_at")?,
        })
    }
}

const NEWEST_FIRST: &[(&str, Order)] = &[("occurred_at", Order::Desc), ("id", Order::Desc)];

fn newest_first(select: Select<UserProgressionEvent>, limit: i64) -> Select<UserProgressionEvent> {
    select
        .order_by("occurred_at", Order::Desc)
        .order_by("id", Order::Desc)
        .limit(limit)
}

/// User progression events. Never soft-deleted.
#[derive(Clone)]
pub struct UserProgressionEventRepo {
    table: Table<UserProgressionEvent>,
}

impl UserProgressionEventRepo {
    /// Create a repository over `pool`, logging as `user_progression_event_repo`.
    pub fn new(pool: ConnectionPool, log: &Logger) -> Self {
        Self {
            table: Table::new(pool, log.with_component("user_progression_event_repo")),
        }
    }

    /// Insert events, assigning IDs and timestamps left unset
    /// (`occurred_at` included).
    pub fn create(&self, ctx: &DbContext<'_>, rows: &mut [UserProgressionEvent]) -> Result<usize> {
        let now = learnstore_core::time::now();
        for row in rows.iter_mut() {
            if row.id.is_unset() {
                row.id = UserProgressionEventId::new();
            }
            stamp_new(&mut row.created_at, &mut row.updated_at, now);
            stamp_at(&mut row.occurred_at, now);
        }
        self.table.insert(ctx, &*rows)
    }

    /// Events by ID.
    pub fn get_by_ids(
        &self,
        ctx: &DbContext<'_>,
        ids: &[UserProgressionEventId],
    ) -> Result<Vec<UserProgressionEvent>> {
        self.table.get_by(ctx, "get_by_ids", "id", live_keys(ids), &[])
    }

    /// Every event of `user_ids`.
    pub fn get_by_user_ids(&self, ctx: &DbContext<'_>, user_ids: &[UserId]) -> Result<Vec<UserProgressionEvent>> {
        self.table
            .get_by(ctx, "get_by_user_ids", "user_id", live_keys(user_ids), NEWEST_FIRST)
    }

    /// Every event on learning paths `path_ids`, across users.
    pub fn get_by_path_ids(&self, ctx: &DbContext<'_>, path_ids: &[PathId]) -> Result<Vec<UserProgressionEvent>> {
        self.table
            .get_by(ctx, "get_by_path_ids", "path_id", live_keys(path_ids), NEWEST_FIRST)
    }

    /// Most recent events of one user.
    ///
    /// `limit <= 0` means [`LIST_RECENT_BY_USER_DEFAULT_LIMIT`]. An unset user
    /// yields nothing.
    pub fn list_recent_by_user(
        &self,
        ctx: &DbContext<'_>,
        user_id: UserId,
        limit: i64,
    ) -> Result<Vec<UserProgressionEvent>> {
        if user_id.is_unset() {
            return Ok(Vec::new());
        }
        let select = Select::new().where_eq("user_id", id_value(user_id));
        let limit = clamp_limit(limit, LIST_RECENT_BY_USER_DEFAULT_LIMIT, None);
        self.table
            .fetch(ctx, "list_recent_by_user", newest_first(select, limit))
    }

    /// Most recent events across all users.
    ///
    /// `limit <= 0` means [`LIST_RECENT_ALL_DEFAULT_LIMIT`]; there is no cap.
    pub fn list_recent_all(&self, ctx: &DbContext<'_>, limit: i64) -> Result<Vec<UserProgressionEvent>> {
        let limit = clamp_limit(limit, LIST_RECENT_ALL_DEFAULT_LIMIT, None);
        self.table
            .fetch(ctx, "list_recent_all", newest_first(Select::new(), limit))
    }

    /// Most recent events of one user on one learning path.
    ///
    /// Both IDs must be set, otherwise nothing is returned. `limit <= 0` means
    /// [`LIST_BY_USER_AND_PATH_DEFAULT_LIMIT`]; larger requests are capped at
    /// [`LIST_BY_USER_AND_PATH_MAX_LIMIT`].
    pub fn list_by_user_and_path_id(
        &self,
        ctx: &DbContext<'_>,
        user_id: UserId,
        path_id: PathId,
        limit: i64,
    ) -> Result<Vec<UserProgressionEvent>> {
        if user_id.is_unset() || path_id.is_unset() {
            return Ok(Vec::new());
        }
        let select = Select::new()
            .where_eq("user_id", id_value(user_id))
            .where_eq("path_id", id_value(path_id));
        let limit = clamp_limit(
            limit,
            LIST_BY_USER_AND_PATH_DEFAULT_LIMIT,
            Some(LIST_BY_USER_AND_PATH_MAX_LIMIT),
        );
        self.table
            .fetch(ctx, "list_by_user_and_path_id", newest_first(select, limit))
    }

    /// Remove events by ID.
    pub fn full_delete_by_ids(&self, ctx: &DbContext<'_>, ids: &[UserProgressionEventId]) -> Result<usize> {
        self.table
            .full_delete_by(ctx, "full_delete_by_ids", "id", live_keys(ids))
    }

    /// Remove every event of `user_ids`.
    pub fn full_delete_by_user_ids(&self, ctx: &DbContext<'_>, user_ids: &[UserId]) -> Result<usize> {
        self.table
            .full_delete_by(ctx, "full_delete_by_user_ids", "user_id", live_keys(user_ids))
    }

    /// Remove every event on learning paths `path_ids`.
    pub fn full_delete_by_path_ids(&self, ctx: &DbContext<'_>, path_ids: &[PathId]) -> Result<usize> {
        self.table
            .full_delete_by(ctx, "full_delete_by_path_ids", "path_id", live_keys(path_ids))
    }
}
