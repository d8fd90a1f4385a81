use std::path::Path;

use serde_yaml::{Mapping, Value};

/// Run details the framework passes to pipeline-level hooks.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunParams(pub Mapping);

impl RunParams {
    pub fn new(details: Mapping) -> Self {
        Self(details)
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn env(&self) -> Option<&str> {
        self.get("env").and_then(Value::as_str)
    }

    pub fn project_path(&self) -> Option<&str> {
        self.get("project_path").and_then(Value::as_str)
    }

    /// Last component of `project_path`.
    pub fn project_name(&self) -> Option<String> {
        let path = Path::new(self.project_path()?);
        path.file_name()
            .map(|name| name.to_string_lossy().into_owned())
    }

    pub fn extra_params(&self) -> Value {
        self.get("extra_params").cloned().unwrap_or(Value::Null)
    }

    pub fn namespace(&self) -> Option<&str> {
        self.get("namespace").and_then(Value::as_str)
    }
}

impl From<Mapping> for RunParams {
    fn from(details: Mapping) -> Self {
        Self(details)
    }
}
