use faultmail_config::{ConfigError, CredentialsError};
use thiserror::Error;

use crate::hooks::HookName;
use crate::select::SelectError;

/// Why a notification attempt was abandoned. Never escapes the interceptor.
#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("Argument selection failed: {0}")]
    Selection(#[from] SelectError),

    #[error("Mailer configuration missing: {0}")]
    ConfigurationMissing(String),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Credentials(#[from] CredentialsError),
}

/// The interceptor was applied where it must not be.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum UsageError {
    #[error(
        "Hook {0} is not allowed to use the error mailer (it will be triggered by on_pipeline_error)"
    )]
    PerNodeHook(HookName),
}
