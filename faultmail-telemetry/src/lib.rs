//! # faultmail telemetry
//!
//! Logging setup and notification counters.

pub mod logging;
pub mod metrics;

pub use logging::EventLogger;
pub use metrics::NotificationMetrics;
