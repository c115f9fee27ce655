//! `SQLite` backend.
//!
//! - **[`connection`]**: `r2d2` pool with WAL mode, foreign keys and busy
//!   timeout applied to every connection, plus a shared-cache in-memory pool
//!   for tests.
//! - **[`migrations`]**: embedded schema, applied once per version.
//! - **[`context`]**: [`DbContext`] and [`transact`], which decide where a
//!   statement runs and when it must stop.
//! - **[`codec`]**: column encodings for IDs, timestamps and JSON.
//! - `query`: the shared insert/select/delete builders behind every repository.

pub mod codec;
pub mod connection;
pub mod context;
pub mod migrations;
pub(crate) mod query;

pub use connection::{
    ConnectionConfig, ConnectionPool, PooledConnection, PragmaState, new_file, new_in_memory,
    verify_pragmas,
};
pub use context::{DbContext, transact};
pub use migrations::{current_version, latest_version, run_migrations};
