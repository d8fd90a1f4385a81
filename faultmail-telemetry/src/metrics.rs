//! ## faultmail-telemetry::metrics
//! **Prometheus counters for failure notifications**

use prometheus::{IntCounter, Registry};

#[derive(Debug, Clone)]
pub struct NotificationMetrics {
    pub registry: Registry,
    pub sent: IntCounter,
    pub failed: IntCounter,
    pub suppressed: IntCounter,
    pub aborted: IntCounter,
}

impl NotificationMetrics {
    pub fn new() -> Result<Self, prometheus::Error> {
        Self::with_registry(Registry::new())
    }

    /// Registers the counters on an existing registry.
    pub fn with_registry(registry: Registry) -> Result<Self, prometheus::Error> {
        let sent = IntCounter::new(
            "faultmail_notifications_sent_total",
            "Failure reports accepted by the mail transport",
        )?;
        let failed = IntCounter::new(
            "faultmail_notifications_failed_total",
            "Per-recipient deliveries that failed",
        )?;
        let suppressed = IntCounter::new(
            "faultmail_notifications_suppressed_total",
            "Failures not mailed because of an ignore list",
        )?;
        let aborted = IntCounter::new(
            "faultmail_notifications_aborted_total",
            "Notifications abandoned before dispatch",
        )?;

        registry.register(Box::new(sent.clone()))?;
        registry.register(Box::new(failed.clone()))?;
        registry.register(Box::new(suppressed.clone()))?;
        registry.register(Box::new(aborted.clone()))?;

        Ok(Self {
            registry,
            sent,
            failed,
            suppressed,
            aborted,
        })
    }

    /// Text exposition of every registered metric.
    pub fn gather_metrics(&self) -> Result<String, prometheus::Error> {
        use prometheus::Encoder;
        let encoder = prometheus::TextEncoder::new();
        let mut buffer = Vec::<u8>::new();
        encoder.encode(&self.registry.gather(), &mut buffer)?;
        String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(e.to_string()))
    }
}
