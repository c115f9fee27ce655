//! Error types for the persistence layer.
//!
//! [`StoreError`] wraps storage failures unchanged. The only kinds this crate
//! adds are the two ways a [`DbContext`](crate::DbContext) can stop an
//! operation: cancellation and an expired deadline. Translating errors into
//! domain terms is the service layer's job.

use thiserror::Error;

/// Errors that can occur during repository operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// `SQLite` database error (constraint violation, I/O, busy, ...).
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// Connection pool error.
    #[error("connection pool error: {0}")]
    Pool(#[from] r2d2::Error),

    /// JSON column encode/decode error.
    #[error("serde error: {0}")]
    Serde(#[from] serde_json::Error),

    /// Schema bootstrap failed.
    #[error("migration error: {message}")]
    Migration {
        /// Describes which migration failed and why.
        message: String,
    },

    /// The context's cancellation token was tripped.
    #[error("operation cancelled")]
    Cancelled,

    /// The context's deadline passed.
    #[error("deadline exceeded")]
    DeadlineExceeded,
}

impl StoreError {
    /// Whether the operation was stopped by its context rather than failing.
    pub fn is_cancellation(&self) -> bool {
        matches!(self, Self::Cancelled | Self::DeadlineExceeded)
    }
}

/// Convenience type alias for store results.
pub type Result<T> = std::result::Result<T, StoreError>;

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
