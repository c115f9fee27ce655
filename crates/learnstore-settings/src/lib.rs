//! # learnstore-settings
//!
//! Layered configuration for the persistence layer.
//!
//! Settings are loaded from three layers (in priority order):
//! 1. **Compiled defaults**: [`StoreSettings::default()`]
//! 2. **Settings file**: `settings.json` under `$LEARNSTORE_HOME` or `~/.learnstore`
//! 3. **Environment variables**: `LEARNSTORE_*` overrides (highest priority)

#![deny(unsafe_code)]

pub mod errors;
pub mod loader;
pub mod types;

pub use errors::{Result, SettingsError};
pub use loader::{figment_for, load_settings, load_settings_from_path, settings_path, validate};
pub use types::*;
