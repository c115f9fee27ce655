//! CRUD scaffolding shared by every repository.
//!
//! A table is described once through [`Record`]; the functions here build the
//! parameterised SQL for bulk insert, keyed/filtered selects, soft delete and
//! hard delete. For soft-deletable records every select adds
//! `deleted_at IS NULL` on its own, so tombstones stay invisible to reads
//! without each repository repeating the predicate.

use std::borrow::Borrow;
use std::collections::BTreeSet;
use std::fmt::Write as _;
use std::marker::PhantomData;

use chrono::{DateTime, Utc};
use learnstore_core::Logger;
use rusqlite::types::Value;
use rusqlite::{Connection, Row, params_from_iter};
use tracing::{debug, trace};
use uuid::Uuid;

use super::codec::ts_value;
use super::connection::ConnectionPool;
use super::context::DbContext;
use crate::errors::Result;

/// `SQLite`'s default cap on bound parameters per statement.
pub(crate) const MAX_BOUND_PARAMS: usize = 32_766;

/// Row mapping for one table.
pub(crate) trait Record: Sized {
    /// Table name.
    const TABLE: &'static str;
    /// Insert column order; [`Record::values`] yields values in this order.
    const COLUMNS: &'static [&'static str];
    /// Whether the table carries a `deleted_at` tombstone column.
    const SOFT_DELETE: bool;

    /// Column values in [`Record::COLUMNS`] order.
    fn values(&self) -> Result<Vec<Value>>;

    /// Build a record from a row selected by [`Select`] (columns by name).
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self>;
}

/// Lookup keys with unset (nil) IDs dropped and duplicates removed.
pub(crate) fn live_keys<I: Copy + Into<Uuid>>(ids: &[I]) -> Vec<Value> {
    ids.iter()
        .map(|&id| id.into())
        .filter(|uuid: &Uuid| !uuid.is_nil())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .map(|uuid| Value::Text(uuid.to_string()))
        .collect()
}

/// Text keys with empty strings dropped and duplicates removed.
pub(crate) fn text_keys<S: AsRef<str>>(keys: &[S]) -> Vec<Value> {
    keys.iter()
        .map(AsRef::as_ref)
        .filter(|k| !k.is_empty())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .map(|k| Value::Text(k.to_owned()))
        .collect()
}

/// Effective list limit: non-positive falls back to `default`, anything
/// above `cap` is lowered to it.
pub(crate) fn clamp_limit(requested: i64, default: i64, cap: Option<i64>) -> i64 {
    if requested <= 0 {
        return default;
    }
    cap.map_or(requested, |cap| requested.min(cap))
}

fn placeholders(n: usize) -> String {
    let mut out = String::with_capacity(n * 3);
    for i in 0..n {
        if i > 0 {
            out.push_str(", ");
        }
        out.push('?');
    }
    out
}

fn insert_sql<R: Record>(rows: usize) -> String {
    let tuple = format!("({})", placeholders(R::COLUMNS.len()));
    let mut sql = format!("INSERT INTO {} ({}) VALUES ", R::TABLE, R::COLUMNS.join(", "));
    for i in 0..rows {
        if i > 0 {
            sql.push_str(", ");
        }
        sql.push_str(&tuple);
    }
    sql
}

/// Insert `rows` as one multi-row statement, split only where the bound
/// parameter cap forces it. Returns rows written.
pub(crate) fn insert<R: Record, T: Borrow<R>>(conn: &Connection, rows: &[T]) -> Result<usize> {
    let per_statement = (MAX_BOUND_PARAMS / R::COLUMNS.len()).max(1);
    let mut written = 0;
    for chunk in rows.chunks(per_statement) {
        let mut params = Vec::with_capacity(chunk.len() * R::COLUMNS.len());
        for row in chunk {
            params.extend(row.borrow().values()?);
        }
        written += conn.execute(&insert_sql::<R>(chunk.len()), params_from_iter(params))?;
    }
    Ok(written)
}

/// Tombstone live rows whose `column` is in `keys`.
pub(crate) fn soft_delete<R: Record>(
    conn: &Connection,
    column: &str,
    keys: Vec<Value>,
    at: &DateTime<Utc>,
) -> Result<usize> {
    let sql = format!(
        "UPDATE {table} SET deleted_at = ? WHERE {column} IN ({}) AND deleted_at IS NULL",
        placeholders(keys.len()),
        table = R::TABLE,
    );
    let params = std::iter::once(ts_value(at)).chain(keys);
    Ok(conn.execute(&sql, params_from_iter(params))?)
}

/// Physically remove rows whose `column` is in `keys`, tombstoned or not.
pub(crate) fn hard_delete<R: Record>(conn: &Connection, column: &str, keys: Vec<Value>) -> Result<usize> {
    let sql = format!(
        "DELETE FROM {} WHERE {column} IN ({})",
        R::TABLE,
        placeholders(keys.len())
    );
    Ok(conn.execute(&sql, params_from_iter(keys))?)
}

/// Sort direction for [`Select::order_by`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Order {
    Asc,
    Desc,
}

impl Order {
    fn keyword(self) -> &'static str {
        match self {
            Self::Asc => "ASC",
            Self::Desc => "DESC",
        }
    }
}

/// `SELECT` over one record's table, with optional joins.
///
/// Unqualified column names refer to the record's own table.
pub(crate) struct Select<R> {
    joins: Vec<String>,
    filters: Vec<String>,
    params: Vec<Value>,
    order: Vec<String>,
    limit: Option<i64>,
    record: PhantomData<fn() -> R>,
}

impl<R: Record> Select<R> {
    pub(crate) fn new() -> Self {
        let mut filters = Vec::new();
        if R::SOFT_DELETE {
            filters.push(format!("{}.deleted_at IS NULL", R::TABLE));
        }
        Self {
            joins: Vec::new(),
            filters,
            params: Vec::new(),
            order: Vec::new(),
            limit: None,
            record: PhantomData,
        }
    }

    fn qualify(column: &str) -> String {
        if column.contains('.') {
            column.to_owned()
        } else {
            format!("{}.{column}", R::TABLE)
        }
    }

    /// Append a raw join clause (`LEFT JOIN other ON ...`).
    pub(crate) fn join(mut self, clause: &str) -> Self {
        self.joins.push(clause.to_owned());
        self
    }

    pub(crate) fn where_in(mut self, column: &str, keys: Vec<Value>) -> Self {
        self.filters.push(format!(
            "{} IN ({})",
            Self::qualify(column),
            placeholders(keys.len())
        ));
        self.params.extend(keys);
        self
    }

    pub(crate) fn where_eq(mut self, column: &str, value: Value) -> Self {
        self.filters.push(format!("{} = ?", Self::qualify(column)));
        self.params.push(value);
        self
    }

    /// Append a raw predicate with its own `?` parameters.
    pub(crate) fn where_raw(mut self, predicate: &str, params: impl IntoIterator<Item = Value>) -> Self {
        self.filters.push(predicate.to_owned());
        self.params.extend(params);
        self
    }

    pub(crate) fn order_by(mut self, column: &str, order: Order) -> Self {
        self.order
            .push(format!("{} {}", Self::qualify(column), order.keyword()));
        self
    }

    pub(crate) fn limit(mut self, limit: i64) -> Self {
        self.limit = Some(limit);
        self
    }

    pub(crate) fn sql(&self) -> String {
        let columns = R::COLUMNS
            .iter()
            .map(|c| format!("{table}.{c} AS {c}", table = R::TABLE))
            .collect::<Vec<_>>()
            .join(", ");
        let mut sql = format!("SELECT {columns} FROM {}", R::TABLE);
        for join in &self.joins {
            let _ = write!(sql, " {join}");
        }
        if !self.filters.is_empty() {
            let _ = write!(sql, " WHERE {}", self.filters.join(" AND "));
        }
        if !self.order.is_empty() {
            let _ = write!(sql, " ORDER BY {}", self.order.join(", "));
        }
        if let Some(limit) = self.limit {
            let _ = write!(sql, " LIMIT {limit}");
        }
        sql
    }

    pub(crate) fn fetch(self, conn: &Connection) -> Result<Vec<R>> {
        let mut stmt = conn.prepare(&self.sql())?;
        let rows = stmt
            .query_map(params_from_iter(self.params), R::from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    }
}

/// A record's table bound to the pool and the owning repository's logger.
///
/// Repositories wrap one of these and add their entity-specific defaulting
/// and list queries. Empty key sets return before any connection is taken.
pub(crate) struct Table<R> {
    pool: ConnectionPool,
    log: Logger,
    record: PhantomData<fn() -> R>,
}

impl<R> Clone for Table<R> {
    fn clone(&self) -> Self {
        Self {
            pool: self.pool.clone(),
            log: self.log.clone(),
            record: PhantomData,
        }
    }
}

impl<R: Record> Table<R> {
    pub(crate) fn new(pool: ConnectionPool, log: Logger) -> Self {
        Self {
            pool,
            log,
            record: PhantomData,
        }
    }

    pub(crate) fn log(&self) -> &Logger {
        &self.log
    }

    /// Run `f` in the context's scope.
    pub(crate) fn run<T>(
        &self,
        ctx: &DbContext<'_>,
        f: impl FnOnce(&Connection) -> Result<T>,
    ) -> Result<T> {
        ctx.run(&self.pool, f)
    }

    pub(crate) fn insert<T: Borrow<R>>(&self, ctx: &DbContext<'_>, rows: &[T]) -> Result<usize> {
        if rows.is_empty() {
            trace!(repo = self.log.component(), op = "create", "empty batch");
            return Ok(0);
        }
        let written = self.run(ctx, |conn| insert::<R, T>(conn, rows))?;
        debug!(
            repo = self.log.component(),
            op = "create",
            rows = written,
            in_tx = ctx.in_transaction(),
            "inserted"
        );
        Ok(written)
    }

    /// Live rows whose `column` is in `keys`, in `order` when given.
    pub(crate) fn get_by(
        &self,
        ctx: &DbContext<'_>,
        op: &'static str,
        column: &str,
        keys: Vec<Value>,
        order: &[(&str, Order)],
    ) -> Result<Vec<R>> {
        if keys.is_empty() {
            trace!(repo = self.log.component(), op, "no live keys");
            return Ok(Vec::new());
        }
        let select = order
            .iter()
            .fold(Select::new().where_in(column, keys), |s, &(c, o)| s.order_by(c, o));
        self.fetch(ctx, op, select)
    }

    pub(crate) fn fetch(&self, ctx: &DbContext<'_>, op: &'static str, select: Select<R>) -> Result<Vec<R>> {
        let rows = self.run(ctx, |conn| select.fetch(conn))?;
        debug!(repo = self.log.component(), op, rows = rows.len(), "fetched");
        Ok(rows)
    }

    pub(crate) fn soft_delete_by(
        &self,
        ctx: &DbContext<'_>,
        op: &'static str,
        column: &str,
        keys: Vec<Value>,
    ) -> Result<usize> {
        if keys.is_empty() {
            trace!(repo = self.log.component(), op, "no live keys");
            return Ok(0);
        }
        let at = learnstore_core::time::now();
        let affected = self.run(ctx, |conn| soft_delete::<R>(conn, column, keys, &at))?;
        debug!(repo = self.log.component(), op, rows = affected, "soft-deleted");
        Ok(affected)
    }

    pub(crate) fn full_delete_by(
        &self,
        ctx: &DbContext<'_>,
        op: &'static str,
        column: &str,
        keys: Vec<Value>,
    ) -> Result<usize> {
        if keys.is_empty() {
            trace!(repo = self.log.component(), op, "no live keys");
            return Ok(0);
        }
        let affected = self.run(ctx, |conn| hard_delete::<R>(conn, column, keys))?;
        debug!(repo = self.log.component(), op, rows = affected, "deleted");
        Ok(affected)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
