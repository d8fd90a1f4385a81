//! The `error_mailer` parameter block.
//!
//! ```yaml
//! error_mailer:
//!   email:
//!     send_to: [oncall@example.com]
//!     send_from: pipelines@example.com
//!   ignored_exceptions: [KeyboardInterrupt]
//!   ignored_envs: [local]
//!   additional_info:
//!     Team: data-platform
//! ```

use std::collections::BTreeSet;

use serde::{Deserialize, Deserializer, Serialize};
use serde_yaml::{Mapping, Value};
use validator::Validate;

use crate::validation;
use crate::ConfigError;

/// Parameter namespace holding the mailer configuration.
pub const MAILER_NAMESPACE: &str = "error_mailer";

/// Mailer configuration as read from a pipeline's parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct MailerConfig {
    /// Sender and recipients.
    #[validate(nested)]
    pub email: EmailConfig,

    /// Error kind names that never trigger a mail.
    #[serde(default, deserialize_with = "null_as_default")]
    pub ignored_exceptions: BTreeSet<String>,

    /// Environment names in which failures are never mailed.
    #[serde(default, deserialize_with = "null_as_default")]
    pub ignored_envs: BTreeSet<String>,

    /// Static rows placed at the top of every report, in order.
    #[serde(default, deserialize_with = "null_as_default")]
    pub additional_info: Mapping,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct EmailConfig {
    /// Addresses are checked one by one at send time.
    #[validate(length(min = 1, message = "at least one recipient is required"))]
    pub send_to: Vec<String>,

    #[validate(custom(
        function = validation::validate_not_blank,
        message = "send_from is required"
    ))]
    pub send_from: String,
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

impl MailerConfig {
    /// Deserialize and validate the contents of the `error_mailer` namespace.
    pub fn from_value(value: Value) -> Result<Self, ConfigError> {
        let config: MailerConfig = serde_yaml::from_value(value)?;
        config.validate()?;
        Ok(config)
    }

    pub fn is_ignored_exception(&self, kind: &str) -> bool {
        self.ignored_exceptions.contains(kind)
    }

    pub fn is_ignored_env(&self, env: &str) -> bool {
        self.ignored_envs.contains(env)
    }
}
