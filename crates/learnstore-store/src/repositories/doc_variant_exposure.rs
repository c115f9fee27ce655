//! Document-variant exposure repository: the append-only
//! `doc_variant_exposure` table.
//!
//! Exposures are evaluated FIFO: [`DocVariantExposureRepo::list_unevaluated_by_user`]
//! returns the oldest exposures that have no row in `doc_variant_outcome` yet.

use chrono::{DateTime, Utc};
use learnstore_core::{
    DEFAULT_DOC_VARIANT_KIND, DEFAULT_DOC_VARIANT_SOURCE, DocVariantExposure,
    DocVariantExposureId, Logger, PathId, PathNodeId, UserId,
};
use rusqlite::Row;
use rusqlite::types::Value;
use tracing::trace;

use super::stamp_new;
use crate::errors::Result;
use crate::sqlite::codec::{id_value, json_value, text_value, ts, ts_value};
use crate::sqlite::connection::ConnectionPool;
use crate::sqlite::context::DbContext;
use crate::sqlite::query::{Order, Record, Select, Table, clamp_limit, live_keys};

/// Rows returned by [`DocVariantExposureRepo::list_unevaluated_by_user`] for a
/// non-positive limit.
pub const LIST_UNEVALUATED_DEFAULT_LIMIT: i64 = 200;

impl Record for DocVariantExposure {
    const TABLE: &'static str = "doc_variant_exposure";
    const COLUMNS: &'static [&'static str] = &[
        "id",
        "user_id",
        "path_id",
        "path_node_id",
        "policy_version",
        "variant_kind",
        "exposure_kind",
        "source",
        "metadata",
        "created_at",
        "updated_at",
    ];
    const SOFT_DELETE: bool = false;

    fn values(&self) -> Result<Vec<Value>> {
        Ok(vec![
            id_value(self.id),
            id_value(self.user_id),
            id_value(self.path_id),
            id_value(self.path_node_id),
            text_value(&self.policy_version),
            text_value(&self.variant_kind),
            text_value(&self.exposure_kind),
            text_value(&self.source),
            json_value(&self.metadata)?,
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
            policy_version: row.get("policy_version")?,
            variant_kind: row.get("variant_kind")?,
            exposure_kind: row.get("exposure_kind")?,
            source: row.get("source")?,
            metadata: row.get("metadata")?,
            created_at: ts(row, "created_at")?,
            updated_at: ts(row, "updated_at")?,
        })
    }
}

/// Trim `value`; fall back to `default` when nothing is left.
fn normalize(value: &mut String, default: &str) {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        default.clone_into(value);
    } else if trimmed.len() != value.len() {
        *value = trimmed.to_owned();
    }
}

/// Apply the discriminator defaults of a new exposure.
fn normalize_exposure(row: &mut DocVariantExposure) {
    normalize(&mut row.policy_version, DEFAULT_DOC_VARIANT_KIND);
    normalize(&mut row.variant_kind, DEFAULT_DOC_VARIANT_KIND);
    normalize(&mut row.exposure_kind, DEFAULT_DOC_VARIANT_KIND);
    normalize(&mut row.source, DEFAULT_DOC_VARIANT_SOURCE);
}

fn has_parents(row: &DocVariantExposure) -> bool {
    !(row.user_id.is_unset() || row.path_id.is_unset() || row.path_node_id.is_unset())
}

/// Document-variant exposures. Never soft-deleted.
#[derive(Clone)]
pub struct DocVariantExposureRepo {
    table: Table<DocVariantExposure>,
}

impl DocVariantExposureRepo {
    /// Create a repository over `pool`, logging as `doc_variant_exposure_repo`.
    pub fn new(pool: ConnectionPool, log: &Logger) -> Self {
        Self {
            table: Table::new(pool, log.with_component("doc_variant_exposure_repo")),
        }
    }

    /// Insert exposures.
    ///
    /// Rows missing a user, path or path node are skipped and left untouched.
    /// The rest get IDs and timestamps where unset and trimmed discriminators,
    /// with empty ones replaced by [`DEFAULT_DOC_VARIANT_KIND`] (or
    /// [`DEFAULT_DOC_VARIANT_SOURCE`] for `source`). Returns rows written.
    pub fn create(&self, ctx: &DbContext<'_>, rows: &mut [DocVariantExposure]) -> Result<usize> {
        let now = learnstore_core::time::now();
        let total = rows.len();
        let mut kept = Vec::with_capacity(total);
        for row in rows.iter_mut() {
            if !has_parents(row) {
                continue;
            }
            if row.id.is_unset() {
                row.id = DocVariantExposureId::new();
            }
            stamp_new(&mut row.created_at, &mut row.updated_at, now);
            normalize_exposure(row);
            kept.push(&*row);
        }
        let skipped = total - kept.len();
        if skipped > 0 {
            trace!(
                repo = self.table.log().component(),
                op = "create",
                skipped,
                "dropped rows without user, path or node"
            );
        }
        self.table.insert(ctx, &kept)
    }

    /// Exposures by ID.
    pub fn get_by_ids(&self, ctx: &DbContext<'_>, ids: &[DocVariantExposureId]) -> Result<Vec<DocVariantExposure>> {
        self.table.get_by(ctx, "get_by_ids", "id", live_keys(ids), &[])
    }

    /// Exposures of `user_ids`.
    pub fn get_by_user_ids(&self, ctx: &DbContext<'_>, user_ids: &[UserId]) -> Result<Vec<DocVariantExposure>> {
        self.table
            .get_by(ctx, "get_by_user_ids", "user_id", live_keys(user_ids), &[])
    }

    /// Exposures on learning paths `path_ids`.
    pub fn get_by_path_ids(&self, ctx: &DbContext<'_>, path_ids: &[PathId]) -> Result<Vec<DocVariantExposure>> {
        self.table
            .get_by(ctx, "get_by_path_ids", "path_id", live_keys(path_ids), &[])
    }

    /// Exposures at path nodes `path_node_ids`.
    pub fn get_by_path_node_ids(
        &self,
        ctx: &DbContext<'_>,
        path_node_ids: &[PathNodeId],
    ) -> Result<Vec<DocVariantExposure>> {
        self.table.get_by(
            ctx,
            "get_by_path_node_ids",
            "path_node_id",
            live_keys(path_node_ids),
            &[],
        )
    }

    /// Exposures of one user that have no outcome yet, oldest first.
    ///
    /// `path_id` restricts to one learning path and `cutoff` to exposures
    /// created at or before it; an unset value of either means no restriction.
    /// `limit <= 0` means [`LIST_UNEVALUATED_DEFAULT_LIMIT`].
    pub fn list_unevaluated_by_user(
        &self,
        ctx: &DbContext<'_>,
        user_id: UserId,
        path_id: Option<PathId>,
        cutoff: Option<DateTime<Utc>>,
        limit: i64,
    ) -> Result<Vec<DocVariantExposure>> {
        if user_id.is_unset() {
            return Ok(Vec::new());
        }
        let mut select = Select::new()
            .join(
                "LEFT JOIN doc_variant_outcome \
                 ON doc_variant_outcome.exposure_id = doc_variant_exposure.id",
            )
            .where_eq("user_id", id_value(user_id))
            .where_raw("doc_variant_outcome.id IS NULL", []);
        if let Some(path_id) = path_id.filter(|p| !p.is_unset()) {
            select = select.where_eq("path_id", id_value(path_id));
        }
        if let Some(cutoff) = cutoff.filter(|c| !learnstore_core::time::is_unset(c)) {
            select = select.where_raw("doc_variant_exposure.created_at <= ?", [ts_value(&cutoff)]);
        }
        let select = select
            .order_by("created_at", Order::Asc)
            .order_by("id", Order::Asc)
            .limit(clamp_limit(limit, LIST_UNEVALUATED_DEFAULT_LIMIT, None));
        self.table.fetch(ctx, "list_unevaluated_by_user", select)
    }

    /// Remove exposures by ID. Their outcomes go with them.
    pub fn full_delete_by_ids(&self, ctx: &DbContext<'_>, ids: &[DocVariantExposureId]) -> Result<usize> {
        self.table
            .full_delete_by(ctx, "full_delete_by_ids", "id", live_keys(ids))
    }

    /// Remove every exposure of `user_ids`.
    pub fn full_delete_by_user_ids(&self, ctx: &DbContext<'_>, user_ids: &[UserId]) -> Result<usize> {
        self.table
            .full_delete_by(ctx, "full_delete_by_user_ids", "user_id", live_keys(user_ids))
    }

    /// Remove every exposure on learning paths `path_ids`.
    pub fn full_delete_by_path_ids(&self, ctx: &DbContext<'_>, path_ids: &[PathId]) -> Result<usize> {
        self.table
            .full_delete_by(ctx, "full_delete_by_path_ids", "path_id", live_keys(path_ids))
    }

    /// Remove every exposure at path nodes `path_node_ids`.
    pub fn full_delete_by_path_node_ids(
        &self,
        ctx: &DbContext<'_>,
        path_node_ids: &[PathNodeId],
    ) -> Result<usize> {
        self.table.full_delete_by(
            ctx,
            "full_delete_by_path_node_ids",
            "path_node_id",
            live_keys(path_node_ids),
        )
    }
}
