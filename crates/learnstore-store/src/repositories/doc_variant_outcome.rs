//! Document-variant outcome repository: the append-only
//! `doc_variant_outcome` table.

use learnstore_core::{DocVariantExposureId, DocVariantOutcome, DocVariantOutcomeId, Logger};
use rusqlite::Row;
use rusqlite::types::Value;
use tracing::trace;

use super::stamp_new;
use crate::errors::Result;
use crate::sqlite::codec::{id_value, json_value, text_value, ts, ts_value};
use crate::sqlite::connection::ConnectionPool;
use crate::sqlite::context::DbContext;
use crate::sqlite::query::{Record, Table, live_keys};

impl Record for DocVariantOutcome {
    const TABLE: &'static str = "doc_variant_outcome";
    const COLUMNS: &'static [&'static str] = &[
        "id",
        "exposure_id",
        "user_id",
        "outcome_kind",
        "score",
        "metadata",
        "created_at",
        "updated_at",
    ];
    const SOFT_DELETE: bool = false;

    fn values(&self) -> Result<Vec<Value>> {
        Ok(vec![
            id_value(self.id),
            id_value(self.exposure_id),
            id_value(self.user_id),
            text_value(&self.outcome_kind),
            Value::Real(self.score),
            json_value(&self.metadata)?,
            ts_value(&self.created_at),
            ts_value(&self.updated_at),
        ])
    }

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get("id")?,
            exposure_id: row.get("exposure_id")?,
            user_id: row.get("user_id")?,
            outcome_kind: row.get("outcome_kind")?,
            score: row.get("score")?,
            metadata: row.get("metadata")?,
            created_at: ts(row, "created_at")?,
            updated_at: ts(row, "updated_at")?,
        })
    }
}

/// Evaluated outcomes of document-variant exposures. Never soft-deleted.
#[derive(Clone)]
pub struct DocVariantOutcomeRepo {
    table: Table<DocVariantOutcome>,
}

impl DocVariantOutcomeRepo {
    /// Create a repository over `pool`, logging as `doc_variant_outcome_repo`.
    pub fn new(pool: ConnectionPool, log: &Logger) -> Self {
        Self {
            table: Table::new(pool, log.with_component("doc_variant_outcome_repo")),
        }
    }

    /// Insert outcomes, assigning IDs and timestamps left unset.
    ///
    /// Rows without an exposure are skipped and left untouched.
    pub fn create(&self, ctx: &DbContext<'_>, rows: &mut [DocVariantOutcome]) -> Result<usize> {
        let now = learnstore_core::time::now();
        let total = rows.len();
        let mut kept = Vec::with_capacity(total);
        for row in rows.iter_mut() {
            if row.exposure_id.is_unset() {
                continue;
            }
            if row.id.is_unset() {
                row.id = DocVariantOutcomeId::new();
            }
            stamp_new(&mut row.created_at, &mut row.updated_at, now);
            kept.push(&*row);
        }
        if kept.len() < total {
            trace!(
                repo = self.table.log().component(),
                op = "create",
                skipped = total - kept.len(),
                "dropped rows without exposure"
            );
        }
        self.table.insert(ctx, &kept)
    }

    /// Outcomes by ID.
    pub fn get_by_ids(&self, ctx: &DbContext<'_>, ids: &[DocVariantOutcomeId]) -> Result<Vec<DocVariantOutcome>> {
        self.table.get_by(ctx, "get_by_ids", "id", live_keys(ids), &[])
    }

    /// Outcomes of `exposure_ids`.
    pub fn get_by_exposure_ids(
        &self,
        ctx: &DbContext<'_>,
        exposure_ids: &[DocVariantExposureId],
    ) -> Result<Vec<DocVariantOutcome>> {
        self.table.get_by(
            ctx,
            "get_by_exposure_ids",
            "exposure_id",
            live_keys(exposure_ids),
            &[],
        )
    }

    /// Remove outcomes by ID.
    pub fn full_delete_by_ids(&self, ctx: &DbContext<'_>, ids: &[DocVariantOutcomeId]) -> Result<usize> {
        self.table
            .full_delete_by(ctx, "full_delete_by_ids", "id", live_keys(ids))
    }

    /// Remove every outcome of `exposure_ids`.
    pub fn full_delete_by_exposure_ids(
        &self,
        ctx: &DbContext<'_>,
        exposure_ids: &[DocVariantExposureId],
    ) -> Result<usize> {
        self.table.full_delete_by(
            ctx,
            "full_delete_by_exposure_ids",
            "exposure_id",
            live_keys(exposure_ids),
        )
    }
}

#[cfg(test)]
#[allow(unused_results)]
mod tests {
    use super::*;
    use crate::errors::StoreError;
    use crate::repositories::DocVariantExposureRepo;
    use crate::repositories::test_support::TestDb;
    use assert_matches::assert_matches;
    use learnstore_core::{DocVariantExposure, PathId, PathNodeId, UserId};
    use serde_json::json;

    fn repo(db: &TestDb) -> DocVariantOutcomeRepo {
        DocVariantOutcomeRepo::new(db.pool.clone(), &db.log)
    }

    fn seed_exposure(db: &TestDb, user_id: UserId) -> DocVariantExposureId {
        let mut rows = [DocVariantExposure {
            user_id,
            path_id: PathId::new(),
            path_node_id: PathNodeId::new(),
            ..Default::default()
        }];
        DocVariantExposureRepo::new(db.pool.clone(), &db.log)
            .create(&DbContext::background(), &mut rows)
            .unwrap();
        rows[0].id
    }

    fn outcome(exposure_id: DocVariantExposureId, user_id: UserId, score: f64) -> DocVariantOutcome {
        DocVariantOutcome {
            exposure_id,
            user_id,
            outcome_kind: "quiz".into(),
            score,
            metadata: json!({"attempts": 2}),
            ..Default::default()
        }
    }

    #[test]
    fn create_skips_rows_without_exposure() {
        let db = TestDb::new();
        let ctx = DbContext::background();
        let user = db.seed_user();
        let exposure = seed_exposure(&db, user);
        let mut rows = [
            outcome(DocVariantExposureId::nil(), user, 0.1),
            outcome(exposure, user, 0.8),
        ];
        assert_eq!(repo(&db).create(&ctx, &mut rows).unwrap(), 1);
        assert!(rows[0].id.is_unset());

        let stored = repo(&db).get_by_exposure_ids(&ctx, &[exposure]).unwrap();
        assert_eq!(stored, vec![rows[1].clone()]);
    }

    #[test]
    fn unknown_exposure_is_a_storage_error() {
        let db = TestDb::new();
        let user = db.seed_user();
        let mut rows = [outcome(DocVariantExposureId::new(), user, 0.5)];
        let result = repo(&db).create(&DbContext::background(), &mut rows);
        assert_matches!(result, Err(StoreError::Sqlite(_)));
    }

    #[test]
    fn full_deletes() {
        let db = TestDb::new();
        let ctx = DbContext::background();
        let user = db.seed_user();
        let first = seed_exposure(&db, user);
        let second = seed_exposure(&db, user);
        let mut rows = [
            outcome(first, user, 0.2),
            outcome(first, user, 0.4),
            outcome(second, user, 0.6),
        ];
        repo(&db).create(&ctx, &mut rows).unwrap();

        assert_eq!(repo(&db).full_delete_by_ids(&ctx, &[rows[2].id]).unwrap(), 1);
        assert!(repo(&db).get_by_ids(&ctx, &[rows[2].id]).unwrap().is_empty());
        assert_eq!(repo(&db).full_delete_by_exposure_ids(&ctx, &[first]).unwrap(), 2);
        assert!(repo(&db).get_by_exposure_ids(&ctx, &[first, second]).unwrap().is_empty());
        assert_eq!(repo(&db).full_delete_by_exposure_ids(&ctx, &[]).unwrap(), 0);
    }
}
