//! # faultmail configuration
//!
//! Everything faultmail reads before it can send a failure report:
//!
//! - **Mailer configuration**: the `error_mailer` block of the pipeline's
//!   parameters, reached through [`MailerConfigProvider`]
//! - **Credentials**: mail transport keys taken from the environment
//! - **Settings**: faultmail's own transport settings, layered with figment

#![warn(unsafe_code)]
#![deny(rustdoc::broken_intra_doc_links)]

use std::path::{Path, PathBuf};

use figment::{
    providers::{Env, Format, Serialized, Yaml},
    Figment,
};
use serde::{Deserialize, Serialize};
use validator::Validate;

mod credentials;
mod error;
mod mailer;
mod provider;
mod transport;
mod validation;

pub use credentials::{
    resolve_credentials_with, CredentialSource, EnvCredentials, MailCredentials,
    ACCESS_KEY_VAR, REGION_VAR, SECRET_KEY_VAR,
};
pub use error::{ConfigError, CredentialsError};
pub use mailer::{EmailConfig, MailerConfig, MAILER_NAMESPACE};
pub use provider::MailerConfigProvider;
pub use transport::TransportConfig;

pub const SETTINGS_FILE: &str = "config/faultmail.yaml";

/// faultmail's own settings, independent of any pipeline project.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct FaultmailSettings {
    /// Mail transport parameters.
    #[validate(nested)]
    #[serde(default)]
    pub transport: TransportConfig,

    /// Env file holding the mail credentials. Missing files are skipped.
    #[serde(default = "default_env_file")]
    pub env_file: PathBuf,
}

fn default_env_file() -> PathBuf {
    PathBuf::from(".env")
}

impl Default for FaultmailSettings {
    fn default() -> Self {
        Self {
            transport: TransportConfig::default(),
            env_file: default_env_file(),
        }
    }
}

impl FaultmailSettings {
    /// Load settings from defaults, files and environment.
    ///
    /// Hierarchy:
    /// 1. Default values
    /// 2. `config/faultmail.yaml`, if present
    /// 3. `FAULTMAIL_*` environment variables (`__` separates nesting)
    pub fn load() -> Result<Self, ConfigError> {
        let mut figment = Figment::from(Serialized::defaults(FaultmailSettings::default()));

        if Path::new(SETTINGS_FILE).exists() {
            figment = figment.merge(Yaml::file(SETTINGS_FILE));
        } else {
            tracing::debug!("{} not found, using default settings", SETTINGS_FILE);
        }

        Self::extract(figment)
    }

    /// Load settings from a specific file, still honouring `FAULTMAIL_*` overrides.
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ConfigError::FileNotFound(path.to_path_buf()));
        }

        Self::extract(
            Figment::from(Serialized::defaults(FaultmailSettings::default()))
                .merge(Yaml::file(path)),
        )
    }

    fn extract(figment: Figment) -> Result<Self, ConfigError> {
        figment
            .merge(Env::prefixed("FAULTMAIL_").split("__"))
            .extract()
            .map_err(ConfigError::from)
            .and_then(|settings: Self| {
                settings.validate()?;
                Ok(settings)
            })
    }

    /// Credential source reading this settings' env file.
    pub fn credential_source(&self) -> EnvCredentials {
        EnvCredentials::new(self.env_file.clone())
    }
}
