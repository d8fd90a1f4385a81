//! ## faultmail-telemetry::logging
//! **Process-wide `tracing` subscriber**
//!
//! The notification pipeline only emits `tracing` events. Installing the
//! subscriber happens once, here, at the edge of the host process.

use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Clone)]
pub struct EventLogger;

impl EventLogger {
    /// Installs the global subscriber. Panics if one is already set.
    pub fn init() {
        fmt()
            .with_env_filter(Self::filter())
            .with_target(true)
            .with_span_events(FmtSpan::CLOSE)
            .init()
    }

    /// Installs the global subscriber unless the host already owns one.
    ///
    /// Returns `false` when another subscriber was kept.
    pub fn try_init() -> bool {
        fmt()
            .with_env_filter(Self::filter())
            .with_target(true)
            .try_init()
            .is_ok()
    }

    fn filter() -> EnvFilter {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    }

    /// Records that a failure report left the process.
    pub fn log_delivery(subject: &str, recipient: &str, message_id: &str) {
        tracing::info!(subject, recipient, message_id, "Failure report delivered");
    }
}
