//! Mail transport settings.

use serde::{Deserialize, Serialize};
use validator::Validate;

/// SMTP relay parameters for the SES transport.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct TransportConfig {
    /// Relay host. `{region}` is replaced with the credential region.
    #[validate(length(min = 1))]
    #[serde(default = "default_host")]
    pub host: String,

    /// STARTTLS submission port.
    #[serde(default = "default_port")]
    pub port: u16,

    /// Upper bound on a single SMTP exchange, in seconds.
    #[validate(range(min = 1, max = 600))]
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    /// Derive the SES SMTP password from the secret access key. Disable when
    /// the secret already is an SMTP password.
    #[serde(default = "default_true")]
    pub derive_smtp_password: bool,
}

fn default_host() -> String {
    "email-smtp.{region}.amazonaws.com".into()
}
fn default_port() -> u16 {
    587
}
fn default_timeout() -> u64 {
    30
}
fn default_true() -> bool {
    true
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            timeout_secs: default_timeout(),
            derive_smtp_password: default_true(),
        }
    }
}

impl TransportConfig {
    /// Relay host for `region`.
    pub fn host_for(&self, region: &str) -> String {
        self.host.replace("{region}", region)
    }
}
