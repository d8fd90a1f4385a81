//! Provider trait for reading the mailer configuration out of whatever
//! parameter store the pipeline framework hands us.

use serde_yaml::{Mapping, Value};

use crate::{ConfigError, MailerConfig};

/// Anything that can produce the `error_mailer` parameter block.
///
/// Implementors only supply [`mailer_params`](Self::mailer_params); both
/// readers below normalise every source to the same shape.
pub trait MailerConfigProvider {
    /// Short name used in log lines.
    fn provider_name(&self) -> &'static str;

    /// Raw contents of the `error_mailer` namespace.
    fn mailer_params(&self) -> Result<Value, ConfigError>;

    /// Parsed and validated mailer configuration.
    fn load_mailer_config(&self) -> Result<MailerConfig, ConfigError> {
        MailerConfig::from_value(self.mailer_params()?)
    }

    /// `error_mailer.additional_info`, in configured order. Absent means empty.
    fn additional_info(&self) -> Result<Mapping, ConfigError> {
        match self.mailer_params()?.get("additional_info") {
            None | Some(Value::Null) => Ok(Mapping::new()),
            Some(Value::Mapping(info)) => Ok(info.clone()),
            Some(_) => Err(ConfigError::Provider(
                "error_mailer.additional_info must be a mapping".into(),
            )),
        }
    }
}
