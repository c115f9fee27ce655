//! Schema bootstrap for the learning-platform database.
//!
//! Schema files are embedded with [`include_str!`] and applied in version
//! order, each inside its own transaction so a failure leaves no partial
//! schema behind. Applied versions are recorded in `schema_version`, which
//! makes [`run_migrations`] safe to call on every start.

use rusqlite::Connection;
use tracing::{debug, info};

use crate::errors::{Result, StoreError};

/// An embedded schema step.
struct Migration {
    version: u32,
    description: &'static str,
    sql: &'static str,
}

/// All migrations in version order.
const MIGRATIONS: &[Migration] = &[Migration {
    version: 1,
    description: "Learning-platform tables and filter indexes",
    sql: include_str!("v001_schema.sql"),
}];

/// Apply every migration newer than the recorded version.
///
/// Returns how many were applied.
///
/// # Errors
///
/// Returns [`StoreError::Migration`] if any step fails.
pub fn run_migrations(conn: &Connection) -> Result<u32> {
    ensure_version_table(conn)?;
    let current = current_version(conn)?;
    let mut applied = 0;

    for migration in MIGRATIONS.iter().filter(|m| m.version > current) {
        info!(
            version = migration.version,
            description = migration.description,
            "applying migration"
        );
        apply_migration(conn, migration)?;
        applied += 1;
    }

    if applied == 0 {
        debug!(version = current, "schema up to date");
    }
    Ok(applied)
}

/// Highest applied migration version, or 0 if none.
pub fn current_version(conn: &Connection) -> Result<u32> {
    conn.query_row(
        "SELECT COALESCE(MAX(version), 0) FROM schema_version",
        [],
        |row| row.get(0),
    )
    .map_err(|e| migration_error(format!("failed to read schema_version: {e}")))
}

/// Latest migration version shipped in this build.
pub fn latest_version() -> u32 {
    MIGRATIONS.last().map_or(0, |m| m.version)
}

fn migration_error(message: String) -> StoreError {
    StoreError::Migration { message }
}

fn ensure_version_table(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS schema_version (
           version     INTEGER PRIMARY KEY,
           applied_at  TEXT    NOT NULL,
           description TEXT
         );",
    )
    .map_err(|e| migration_error(format!("failed to create schema_version table: {e}")))
}

fn apply_migration(conn: &Connection, migration: &Migration) -> Result<()> {
    let tx = conn.unchecked_transaction().map_err(|e| {
        migration_error(format!(
            "failed to begin transaction for v{}: {e}",
            migration.version
        ))
    })?;

    tx.execute_batch(migration.sql).map_err(|e| {
        migration_error(format!(
            "migration v{} ({}) failed: {e}",
            migration.version, migration.description
        ))
    })?;

    let _ = tx
        .execute(
            "INSERT INTO schema_version (version, applied_at, description)
             VALUES (?1, strftime('%Y-%m-%dT%H:%M:%fZ', 'now'), ?2)",
            rusqlite::params![migration.version, migration.description],
        )
        .map_err(|e| {
            migration_error(format!(
                "failed to record v{} in schema_version: {e}",
                migration.version
            ))
        })?;

    tx.commit()
        .map_err(|e| migration_error(format!("failed to commit v{}: {e}", migration.version)))
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
#[allow(unused_results)]
mod tests {
    use super::*;

    fn open_memory() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch("PRAGMA foreign_keys = ON;").unwrap();
        conn
    }

    fn names(conn: &Connection, kind: &str) -> Vec<String> {
        conn.prepare("SELECT name FROM sqlite_master WHERE type = ?1 ORDER BY name")
            .unwrap()
            .query_map([kind], |row| row.get(0))
            .unwrap()
            .collect::<rusqlite::Result<_>>()
            .unwrap()
    }

    #[test]
    fn creates_one_table_per_aggregate() {
        let conn = open_memory();
        assert_eq!(run_migrations(&conn).unwrap(), 1);

        let tables = names(&conn, "table");
        for table in [
            "app_user",
            "course",
            "course_module",
            "decision_trace",
            "doc_variant_exposure",
            "doc_variant_outcome",
            "lesson",
            "lesson_asset",
            "material_set",
            "schema_version",
            "topic_mastery",
            "user_progression_event",
        ] {
            assert!(tables.iter().any(|t| t == table), "missing table: {table}");
        }
    }

    #[test]
    fn creates_filter_indexes() {
        let conn = open_memory();
        run_migrations(&conn).unwrap();

        let indexes = names(&conn, "index");
        for idx in [
            "idx_course_user",
            "idx_course_material_set",
            "idx_course_module_course",
            "idx_lesson_module",
            "idx_lesson_asset_lesson",
            "idx_topic_mastery_user_topic",
            "idx_decision_trace_user_occurred",
            "idx_doc_variant_exposure_user_created",
            "idx_doc_variant_exposure_path_node",
            "idx_doc_variant_outcome_exposure",
            "idx_user_progression_event_user_path_occurred",
            "idx_user_progression_event_path",
        ] {
            assert!(indexes.iter().any(|i| i == idx), "missing index: {idx}");
        }
    }

    #[test]
    fn is_idempotent() {
        let conn = open_memory();
        assert_eq!(run_migrations(&conn).unwrap(), 1);
        assert_eq!(run_migrations(&conn).unwrap(), 0);
        assert_eq!(current_version(&conn).unwrap(), latest_version());
    }

    #[test]
    fn current_version_starts_at_zero() {
        let conn = open_memory();
        ensure_version_table(&conn).unwrap();
        assert_eq!(current_version(&conn).unwrap(), 0);
    }

    #[test]
    fn foreign_keys_enforced() {
        let conn = open_memory();
        run_migrations(&conn).unwrap();

        let result = conn.execute(
            "INSERT INTO course (id, user_id, created_at, updated_at)
             VALUES ('c1', 'missing', '2025-01-01T00:00:00.000000Z', '2025-01-01T00:00:00.000000Z')",
            [],
        );
        assert!(result.is_err());
    }

    #[test]
    fn mastery_range_checked() {
        let conn = open_memory();
        run_migrations(&conn).unwrap();
        conn.execute(
            "INSERT INTO app_user (id, created_at, updated_at) VALUES ('u1', 't', 't')",
            [],
        )
        .unwrap();

        let result = conn.execute(
            "INSERT INTO topic_mastery (id, user_id, topic, mastery, last_update, created_at, updated_at)
             VALUES ('tm1', 'u1', 'math', 1.5, 't', 't', 't')",
            [],
        );
        assert!(result.is_err());
    }

    #[test]
    fn deleting_exposure_cascades_to_outcomes() {
        let conn = open_memory();
        run_migrations(&conn).unwrap();
        conn.execute_batch(
            "INSERT INTO app_user (id, created_at, updated_at) VALUES ('u1', 't', 't');
             INSERT INTO doc_variant_exposure (id, user_id, path_id, path_node_id, created_at, updated_at)
               VALUES ('e1', 'u1', 'p1', 'n1', 't', 't');
             INSERT INTO doc_variant_outcome (id, exposure_id, user_id, created_at, updated_at)
               VALUES ('o1', 'e1', 'u1', 't', 't');
             DELETE FROM doc_variant_exposure WHERE id = 'e1';",
        )
        .unwrap();

        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM doc_variant_outcome", [], |row| row.get(0))
            .unwrap();
        assert_eq!(count, 0);
    }
}
