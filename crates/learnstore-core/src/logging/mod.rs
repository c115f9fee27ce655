//! Structured logging with `tracing`.
//!
//! This module provides:
//! - [`init_subscriber`] for setting up the process-wide `tracing` subscriber
//! - [`Logger`], the component-tagged handle each repository is built with
//! - [`test_utils::capture_logs`] for asserting on emitted events in tests
//!
//! Logging is a diagnostic channel only. Repositories emit `debug`/`trace`
//! events tagged with `repo = <component>`; they never log at `error` level
//! because reporting failures is the caller's concern.

pub mod test_utils;

pub use test_utils::{CapturedLogs, capture_logs};

/// Service name used when no other is supplied.
pub const DEFAULT_SERVICE: &str = "learnstore";

/// Initialize the global tracing subscriber with stderr output.
///
/// Call once at application startup. Subsequent calls are no-ops.
/// `RUST_LOG` takes precedence over `level` when set.
pub fn init_subscriber(level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .compact();

    // try_init is a no-op if a global default is already set
    let _ = subscriber.try_init();
}

/// A cheap, clonable logging handle annotated with a service and component.
///
/// Carries no state beyond its tags; events are emitted through the global
/// `tracing` dispatcher with the tags attached as fields.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Logger {
    service: &'static str,
    component: &'static str,
}

impl Logger {
    /// Create a root logger for `service`.
    #[must_use]
    pub fn new(service: &'static str) -> Self {
        Self {
            service,
            component: service,
        }
    }

    /// Derive a logger tagged with `component` (e.g. `"course_repo"`).
    #[must_use]
    pub fn with_component(&self, component: &'static str) -> Self {
        Self {
            service: self.service,
            component,
        }
    }

    /// The service tag.
    pub fn service(&self) -> &'static str {
        self.service
    }

    /// The component tag.
    pub fn component(&self) -> &'static str {
        self.component
    }
}

impl Default for Logger {
    fn default() -> Self {
        Self::new(DEFAULT_SERVICE)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
