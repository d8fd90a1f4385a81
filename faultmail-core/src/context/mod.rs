//! What the pipeline framework hands to a hook.
//!
//! Hooks receive a positional argument list whose shape depends on the hook
//! name. [`HookArg`] is the closed set of things that can appear in it; the
//! notification pipeline finds what it needs by kind via
//! [`select`](crate::select::select), never by position.

mod catalog;
mod run_context;
mod run_params;

pub use catalog::{CatalogError, DataCatalog};
pub use run_context::RunContext;
pub use run_params::RunParams;

use serde_yaml::Value;

/// One positional argument of a hook call.
#[derive(Debug, Clone)]
pub enum HookArg {
    /// Long-lived project handle.
    Context(RunContext),
    /// Key-value access to datasets and parameters.
    Catalog(DataCatalog),
    /// Run details such as `env`, `project_path` and `extra_params`.
    Params(RunParams),
    /// The pipeline being run.
    Pipeline(Pipeline),
    /// Anything else the framework passes along.
    Value(Value),
}

impl From<RunContext> for HookArg {
    fn from(context: RunContext) -> Self {
        HookArg::Context(context)
    }
}

impl From<DataCatalog> for HookArg {
    fn from(catalog: DataCatalog) -> Self {
        HookArg::Catalog(catalog)
    }
}

impl From<RunParams> for HookArg {
    fn from(params: RunParams) -> Self {
        HookArg::Params(params)
    }
}

impl From<Pipeline> for HookArg {
    fn from(pipeline: Pipeline) -> Self {
        HookArg::Pipeline(pipeline)
    }
}

impl From<Value> for HookArg {
    fn from(value: Value) -> Self {
        HookArg::Value(value)
    }
}

/// The pipeline being run. Only its presence in the argument list matters.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Pipeline {
    pub name: String,
}

impl Pipeline {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}
