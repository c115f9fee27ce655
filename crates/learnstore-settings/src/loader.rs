//! Settings loading with layered providers.
//!
//! Loading flow (later layers win):
//! 1. Compiled [`StoreSettings::default()`]
//! 2. `settings.json` under the settings home, if it exists
//! 3. `LEARNSTORE_*` environment variables, nested with `__`
//!    (e.g. `LEARNSTORE_DATABASE__POOL_SIZE=4`)
//!
//! The merged result is validated before it is returned.

use std::path::{Path, PathBuf};

use figment::Figment;
use figment::providers::{Env, Format, Json, Serialized};
use tracing::debug;

use crate::errors::{Result, SettingsError};
use crate::types::StoreSettings;

/// Prefix for environment overrides.
pub const ENV_PREFIX: &str = "LEARNSTORE_";

/// Resolve the path to the settings file.
///
/// `$LEARNSTORE_HOME/settings.json` when set, else `~/.learnstore/settings.json`.
pub fn settings_path() -> PathBuf {
    if let Some(home) = std::env::var_os("LEARNSTORE_HOME").filter(|v| !v.is_empty()) {
        return PathBuf::from(home).join("settings.json");
    }
    let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".to_string());
    PathBuf::from(home).join(".learnstore").join("settings.json")
}

/// Build the layered provider stack for `path`.
pub fn figment_for(path: &Path) -> Figment {
    Figment::from(Serialized::defaults(StoreSettings::default()))
        .merge(Json::file(path))
        .merge(Env::prefixed(ENV_PREFIX).split("__"))
}

/// Load settings from the default path with env var overrides.
pub fn load_settings() -> Result<StoreSettings> {
    load_settings_from_path(&settings_path())
}

/// Load settings from a specific path with env var overrides.
///
/// A missing file yields defaults (plus env overrides). Malformed JSON or a
/// value of the wrong type is an error.
pub fn load_settings_from_path(path: &Path) -> Result<StoreSettings> {
    debug!(?path, exists = path.exists(), "loading settings");
    let settings: StoreSettings = figment_for(path).extract()?;
    validate(&settings)?;
    Ok(settings)
}

/// Reject settings the pool cannot be built from.
pub fn validate(settings: &StoreSettings) -> Result<()> {
    if settings.database.path.trim().is_empty() {
        return Err(SettingsError::InvalidValue(
            "database.path must not be empty".to_string(),
        ));
    }
    if settings.database.pool_size == 0 {
        return Err(SettingsError::InvalidValue(
            "database.pool_size must be at least 1".to_string(),
        ));
    }
    Ok(())
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use figment::Jail;

    #[test]
    fn missing_file_yields_defaults() {
        Jail::expect_with(|jail| {
            let path = jail.directory().join("absent.json");
            let settings = load_settings_from_path(&path).unwrap();
            assert_eq!(settings, StoreSettings::default());
            Ok(())
        });
    }

    #[test]
    fn file_values_override_defaults() {
        Jail::expect_with(|jail| {
            jail.create_file(
                "settings.json",
                r#"{ "database": { "path": "/tmp/app.db", "pool_size": 4 } }"#,
            )?;
            let path = jail.directory().join("settings.json");
            let settings = load_settings_from_path(&path).unwrap();
            assert_eq!(settings.database.path, "/tmp/app.db");
            assert_eq!(settings.database.pool_size, 4);
            // untouched fields keep their defaults
            assert_eq!(settings.database.busy_timeout_ms, 30_000);
            assert_eq!(settings.logging.level, "warn");
            Ok(())
        });
    }

    #[test]
    fn env_overrides_file() {
        Jail::expect_with(|jail| {
            jail.create_file("settings.json", r#"{ "database": { "pool_size": 4 } }"#)?;
            jail.set_env("LEARNSTORE_DATABASE__POOL_SIZE", "2");
            jail.set_env("LEARNSTORE_LOGGING__LEVEL", "debug");
            let path = jail.directory().join("settings.json");
            let settings = load_settings_from_path(&path).unwrap();
            assert_eq!(settings.database.pool_size, 2);
            assert_eq!(settings.logging.level, "debug");
            Ok(())
        });
    }

    #[test]
    fn malformed_json_is_an_error() {
        Jail::expect_with(|jail| {
            jail.create_file("settings.json", "{ not json")?;
            let path = jail.directory().join("settings.json");
            let err = load_settings_from_path(&path).unwrap_err();
            assert!(matches!(err, SettingsError::Figment(_)));
            Ok(())
        });
    }

    #[test]
    fn zero_pool_size_is_rejected() {
        Jail::expect_with(|jail| {
            jail.create_file("settings.json", r#"{ "database": { "pool_size": 0 } }"#)?;
            let path = jail.directory().join("settings.json");
            let err = load_settings_from_path(&path).unwrap_err();
            assert!(matches!(err, SettingsError::InvalidValue(_)));
            Ok(())
        });
    }

    #[test]
    fn empty_path_is_rejected() {
        let mut settings = StoreSettings::default();
        settings.database.path = "  ".to_string();
        assert!(matches!(
            validate(&settings),
            Err(SettingsError::InvalidValue(_))
        ));
    }

    #[test]
    fn settings_path_honours_home_override() {
        Jail::expect_with(|jail| {
            jail.set_env("LEARNSTORE_HOME", "/opt/learnstore");
            assert_eq!(
                settings_path(),
                PathBuf::from("/opt/learnstore/settings.json")
            );
            Ok(())
        });
    }
}
