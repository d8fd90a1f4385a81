//! Mail transport credentials.
//!
//! Read fresh on every failure; nothing here is cached.

use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;

use crate::CredentialsError;

pub const ACCESS_KEY_VAR: &str = "MAILER_AWS_ACCESS_KEY_ID";
pub const SECRET_KEY_VAR: &str = "MAILER_AWS_SECRET_ACCESS_KEY";
pub const REGION_VAR: &str = "MAILER_REGION_NAME";

/// Keys for the mail transport.
#[derive(Clone, PartialEq, Eq)]
pub struct MailCredentials {
    pub access_key: String,
    pub secret_key: String,
    pub region: String,
}

impl fmt::Debug for MailCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MailCredentials")
            .field("access_key", &self.access_key)
            .field("secret_key", &"<redacted>")
            .field("region", &self.region)
            .finish()
    }
}

impl MailCredentials {
    pub fn new(
        access_key: impl Into<String>,
        secret_key: impl Into<String>,
        region: impl Into<String>,
    ) -> Self {
        Self {
            access_key: access_key.into(),
            secret_key: secret_key.into(),
            region: region.into(),
        }
    }

    /// Names of the variables whose values are empty.
    pub fn missing_fields(&self) -> Vec<&'static str> {
        [
            (ACCESS_KEY_VAR, &self.access_key),
            (SECRET_KEY_VAR, &self.secret_key),
            (REGION_VAR, &self.region),
        ]
        .into_iter()
        .filter(|(_, value)| value.trim().is_empty())
        .map(|(name, _)| name)
        .collect()
    }
}

/// Builds credentials from a variable lookup. Unset and empty are both missing.
pub fn resolve_credentials_with<F>(lookup: F) -> Result<MailCredentials, CredentialsError>
where
    F: Fn(&str) -> Option<String>,
{
    let read = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

    let access_key = read(ACCESS_KEY_VAR);
    let secret_key = read(SECRET_KEY_VAR);
    let region = read(REGION_VAR);

    match (access_key, secret_key, region) {
        (Some(access_key), Some(secret_key), Some(region)) => Ok(MailCredentials {
            access_key,
            secret_key,
            region,
        }),
        (access_key, secret_key, region) => {
            let variables = [
                (ACCESS_KEY_VAR, access_key.is_none()),
                (SECRET_KEY_VAR, secret_key.is_none()),
                (REGION_VAR, region.is_none()),
            ]
            .into_iter()
            .filter_map(|(name, missing)| missing.then_some(name))
            .collect();
            Err(CredentialsError::Missing { variables })
        }
    }
}

/// Where credentials come from at notification time.
pub trait CredentialSource: Send + Sync {
    fn resolve(&self) -> Result<MailCredentials, CredentialsError>;
}

/// Env file values, falling back to the process environment. The file is
/// re-read on every call and never copied into the process environment.
#[derive(Debug, Clone)]
pub struct EnvCredentials {
    env_file: PathBuf,
}

impl EnvCredentials {
    pub fn new(env_file: impl Into<PathBuf>) -> Self {
        Self {
            env_file: env_file.into(),
        }
    }
}

impl Default for EnvCredentials {
    fn default() -> Self {
        Self::new(".env")
    }
}

impl EnvCredentials {
    fn read_env_file(&self) -> Result<HashMap<String, String>, CredentialsError> {
        if !self.env_file.exists() {
            return Ok(HashMap::new());
        }
        let env_file_error = |e: dotenv::Error| CredentialsError::EnvFile {
            path: self.env_file.clone(),
            message: e.to_string(),
        };

        dotenv::from_path_iter(&self.env_file)
            .map_err(env_file_error)?
            .map(|entry| entry.map_err(env_file_error))
            .collect()
    }
}

impl CredentialSource for EnvCredentials {
    fn resolve(&self) -> Result<MailCredentials, CredentialsError> {
        let file = self.read_env_file()?;
        resolve_credentials_with(|name| {
            file.get(name)
                .cloned()
                .or_else(|| std::env::var(name).ok())
        })
    }
}

/// Fixed credentials, for embedding and tests.
impl CredentialSource for MailCredentials {
    fn resolve(&self) -> Result<MailCredentials, CredentialsError> {
        Ok(self.clone())
    }
}
