use std::collections::BTreeMap;

use faultmail_config::{ConfigError, MailerConfigProvider, MAILER_NAMESPACE};
use serde_yaml::{Mapping, Value};
use thiserror::Error;

const PARAMETERS_KEY: &str = "parameters";
const PARAMS_PREFIX: &str = "params:";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CatalogError {
    #[error("Dataset '{0}' not found in the catalog")]
    DatasetNotFound(String),
}

/// Key-value store of datasets and parameters.
///
/// Keys follow the usual catalog conventions:
/// - `parameters` loads every parameter
/// - `params:a.b.c` loads one nested parameter
/// - anything else loads a registered dataset
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DataCatalog {
    parameters: Mapping,
    datasets: BTreeMap<String, Value>,
}

impl DataCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_parameters(mut self, parameters: Mapping) -> Self {
        self.parameters = parameters;
        self
    }

    pub fn add(&mut self, name: impl Into<String>, data: Value) {
        self.datasets.insert(name.into(), data);
    }

    pub fn load(&self, key: &str) -> Result<Value, CatalogError> {
        if key == PARAMETERS_KEY {
            return Ok(Value::Mapping(self.parameters.clone()));
        }
        if let Some(path) = key.strip_prefix(PARAMS_PREFIX) {
            return self
                .parameter(path)
                .cloned()
                .ok_or_else(|| CatalogError::DatasetNotFound(key.to_string()));
        }
        self.datasets
            .get(key)
            .cloned()
            .ok_or_else(|| CatalogError::DatasetNotFound(key.to_string()))
    }

    fn parameter(&self, dotted: &str) -> Option<&Value> {
        let mut segments = dotted.split('.');
        let mut current = self.parameters.get(segments.next()?)?;
        for segment in segments {
            current = current.get(segment)?;
        }
        Some(current)
    }
}

impl MailerConfigProvider for DataCatalog {
    fn provider_name(&self) -> &'static str {
        "data catalog"
    }

    fn mailer_params(&self) -> Result<Value, ConfigError> {
        self.load(&format!("{PARAMS_PREFIX}{MAILER_NAMESPACE}"))
            .map_err(|_| ConfigError::MissingKey(MAILER_NAMESPACE.into()))
    }
}
