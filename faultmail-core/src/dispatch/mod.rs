//! Notification dispatch.
//!
//! One message per recipient, so a bad address or a transient relay error
//! only costs that recipient. Failures are logged and summarised, never
//! returned to the caller.

mod ses;

pub use ses::{derive_smtp_password, SesSmtpFactory};

use std::sync::Arc;

use faultmail_config::MailCredentials;
use faultmail_telemetry::{EventLogger, NotificationMetrics};
use thiserror::Error;

pub const CHARSET: &str = "UTF-8";

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("Mail credentials not found")]
    NoCredentials,

    #[error("Incomplete mail credentials: missing {}", .0.join(", "))]
    PartialCredentials(Vec<&'static str>),

    #[error("Invalid address {address}: {message}")]
    Address { address: String, message: String },

    #[error("Failed to build message: {0}")]
    Message(String),

    #[error("SMTP error: {0}")]
    Smtp(String),

    #[error("Failed to derive SMTP password: {0}")]
    Signing(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodyFormat {
    Html,
    Text,
}

/// A single message to a single recipient.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundMail<'a> {
    pub source: &'a str,
    pub destination: &'a str,
    pub subject: &'a str,
    pub body: &'a str,
    pub format: BodyFormat,
    pub charset: &'static str,
}

/// Sends one message; returns the provider's message id.
pub trait MailTransport {
    fn send(&self, mail: &OutboundMail<'_>) -> Result<String, TransportError>;
}

/// Opens a transport for a set of credentials.
pub trait TransportFactory: Send + Sync {
    fn connect(&self, credentials: &MailCredentials)
        -> Result<Box<dyn MailTransport>, TransportError>;
}

/// Credential completeness check shared by transport factories.
pub fn check_credentials(credentials: &MailCredentials) -> Result<(), TransportError> {
    let missing = credentials.missing_fields();
    match missing.len() {
        0 => Ok(()),
        3 => Err(TransportError::NoCredentials),
        _ => Err(TransportError::PartialCredentials(missing)),
    }
}

/// What happened to each recipient of one dispatch.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DispatchSummary {
    /// `(recipient, message id)`
    pub delivered: Vec<(String, String)>,
    /// `(recipient, error text)`
    pub failed: Vec<(String, String)>,
}

impl DispatchSummary {
    pub fn attempted(&self) -> usize {
        self.delivered.len() + self.failed.len()
    }

    pub fn all_delivered(&self) -> bool {
        self.failed.is_empty()
    }
}

#[derive(Clone)]
pub struct Dispatcher {
    factory: Arc<dyn TransportFactory>,
    metrics: Option<NotificationMetrics>,
}

impl Dispatcher {
    pub fn new(factory: Arc<dyn TransportFactory>) -> Self {
        Self {
            factory,
            metrics: None,
        }
    }

    pub fn with_metrics(mut self, metrics: NotificationMetrics) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// Sends `body` to every recipient in order. Never fails.
    #[tracing::instrument(skip_all, fields(recipients = recipients.len()))]
    pub fn dispatch(
        &self,
        send_from: &str,
        recipients: &[String],
        subject: &str,
        body: &str,
        credentials: &MailCredentials,
        format: BodyFormat,
    ) -> DispatchSummary {
        let mut summary = DispatchSummary::default();

        let transport = match self.factory.connect(credentials) {
            Ok(transport) => transport,
            Err(e) => {
                tracing::error!(error = %e, "Could not open mail transport");
                for recipient in recipients {
                    summary.failed.push((recipient.clone(), e.to_string()));
                }
                self.count_failed(recipients.len());
                return summary;
            }
        };

        for recipient in recipients {
            let mail = OutboundMail {
                source: send_from,
                destination: recipient,
                subject,
                body,
                format,
                charset: CHARSET,
            };
            match transport.send(&mail) {
                Ok(message_id) => {
                    EventLogger::log_delivery(subject, recipient, &message_id);
                    if let Some(metrics) = &self.metrics {
                        metrics.sent.inc();
                    }
                    summary.delivered.push((recipient.clone(), message_id));
                }
                Err(e) => {
                    tracing::error!(recipient = %recipient, error = %e, "Failed to send failure report");
                    self.count_failed(1);
                    summary.failed.push((recipient.clone(), e.to_string()));
                }
            }
        }

        summary
    }

    fn count_failed(&self, count: usize) {
        if let Some(metrics) = &self.metrics {
            metrics.failed.inc_by(count as u64);
        }
    }
}
