use std::path::{Path, PathBuf};

use faultmail_config::{ConfigError, MailerConfigProvider, MAILER_NAMESPACE};
use serde_yaml::{Mapping, Value};

/// Project handle for the current run: where it lives, which environment
/// is active and which parameters it resolved.
#[derive(Debug, Clone, PartialEq)]
pub struct RunContext {
    pub project_path: PathBuf,
    pub env: String,
    pub params: Mapping,
    pub runtime_params: Mapping,
}

impl RunContext {
    pub fn new(project_path: impl Into<PathBuf>, env: impl Into<String>) -> Self {
        Self {
            project_path: project_path.into(),
            env: env.into(),
            params: Mapping::new(),
            runtime_params: Mapping::new(),
        }
    }

    pub fn with_params(mut self, params: Mapping) -> Self {
        self.params = params;
        self
    }

    pub fn with_runtime_params(mut self, runtime_params: Mapping) -> Self {
        self.runtime_params = runtime_params;
        self
    }

    pub fn project_path(&self) -> &Path {
        &self.project_path
    }

    /// Last component of the project path.
    pub fn project_name(&self) -> String {
        self.project_path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.project_path.display().to_string())
    }
}

impl MailerConfigProvider for RunContext {
    fn provider_name(&self) -> &'static str {
        "run context"
    }

    fn mailer_params(&self) -> Result<Value, ConfigError> {
        self.params
            .get(MAILER_NAMESPACE)
            .cloned()
            .ok_or_else(|| ConfigError::MissingKey(MAILER_NAMESPACE.into()))
    }
}
