//! Settings type definitions.
//!
//! Each type implements [`Default`] with production default values and is
//! marked `#[serde(default)]`, so partial JSON and partial environment
//! overrides fill the gaps from the defaults.

use serde::{Deserialize, Serialize};

/// Root settings for the persistence layer.
///
/// # JSON Format
///
/// ```json
/// {
///   "database": { "path": "/var/lib/learnstore/app.db", "pool_size": 8 },
///   "logging": { "level": "info" }
/// }
/// ```
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreSettings {
    /// Database connection settings.
    pub database: DatabaseSettings,
    /// Logging configuration.
    pub logging: LoggingSettings,
}

/// `SQLite` connection pool settings.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseSettings {
    /// Database file path. `":memory:"` selects a shared in-memory database.
    pub path: String,
    /// Maximum pool size.
    pub pool_size: u32,
    /// Busy timeout applied to every connection, in milliseconds.
    pub busy_timeout_ms: u32,
    /// Page cache size per connection, in KiB.
    pub cache_size_kib: i64,
    /// How long to wait for a pooled connection, in milliseconds.
    pub connection_timeout_ms: u64,
}

/// Path value that selects an in-memory database.
pub const IN_MEMORY_PATH: &str = ":memory:";

impl DatabaseSettings {
    /// Whether the configured path selects an in-memory database.
    pub fn is_in_memory(&self) -> bool {
        self.path == IN_MEMORY_PATH
    }
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        Self {
            path: "learnstore.db".to_string(),
            pool_size: 16,
            busy_timeout_ms: 30_000,
            cache_size_kib: 8192,
            connection_timeout_ms: 5_000,
        }
    }
}

/// Logging settings.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    /// Minimum level (`EnvFilter` syntax). `RUST_LOG` wins when set.
    pub level: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "warn".to_string(),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_values() {
        let settings = StoreSettings::default();
        assert_eq!(settings.database.path, "learnstore.db");
        assert_eq!(settings.database.pool_size, 16);
        assert_eq!(settings.database.busy_timeout_ms, 30_000);
        assert_eq!(settings.database.cache_size_kib, 8192);
        assert_eq!(settings.database.connection_timeout_ms, 5_000);
        assert_eq!(settings.logging.level, "warn");
    }

    #[test]
    fn in_memory_detection() {
        let mut db = DatabaseSettings::default();
        assert!(!db.is_in_memory());
        db.path = IN_MEMORY_PATH.to_string();
        assert!(db.is_in_memory());
    }
}
