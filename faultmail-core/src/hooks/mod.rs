//! Hook integration: the interceptor that wraps hook implementations and a
//! ready-made hook object for pipeline errors.

mod interceptor;
mod mailer_hook;
mod recipe;

pub use interceptor::{
    compose_report, resolve_mailer_config, ComposedMail, ErrorMailer, NotifyOutcome,
};
pub use mailer_hook::MailerHook;

use std::fmt;
use std::str::FromStr;

/// Lifecycle hooks the framework invokes.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum HookName {
    AfterContextCreated,
    AfterCatalogCreated,
    BeforePipelineRun,
    AfterPipelineRun,
    OnPipelineError,
    BeforeNodeRun,
    AfterNodeRun,
    OnNodeError,
    BeforeDatasetLoaded,
    AfterDatasetLoaded,
    BeforeDatasetSaved,
    AfterDatasetSaved,
    /// Project specific hook.
    Custom(String),
}

impl HookName {
    pub fn as_str(&self) -> &str {
        match self {
            HookName::AfterContextCreated => "after_context_created",
            HookName::AfterCatalogCreated => "after_catalog_created",
            HookName::BeforePipelineRun => "before_pipeline_run",
            HookName::AfterPipelineRun => "after_pipeline_run",
            HookName::OnPipelineError => "on_pipeline_error",
            HookName::BeforeNodeRun => "before_node_run",
            HookName::AfterNodeRun => "after_node_run",
            HookName::OnNodeError => "on_node_error",
            HookName::BeforeDatasetLoaded => "before_dataset_loaded",
            HookName::AfterDatasetLoaded => "after_dataset_loaded",
            HookName::BeforeDatasetSaved => "before_dataset_saved",
            HookName::AfterDatasetSaved => "after_dataset_saved",
            HookName::Custom(name) => name,
        }
    }

    /// Hooks that fire once per node. Wrapping them would send one mail per
    /// node; their failures surface through `on_pipeline_error` instead.
    pub fn is_per_node(&self) -> bool {
        matches!(
            self,
            HookName::BeforeNodeRun | HookName::AfterNodeRun | HookName::OnNodeError
        )
    }
}

impl fmt::Display for HookName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HookName {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "after_context_created" => HookName::AfterContextCreated,
            "after_catalog_created" => HookName::AfterCatalogCreated,
            "before_pipeline_run" => HookName::BeforePipelineRun,
            "after_pipeline_run" => HookName::AfterPipelineRun,
            "on_pipeline_error" => HookName::OnPipelineError,
            "before_node_run" => HookName::BeforeNodeRun,
            "after_node_run" => HookName::AfterNodeRun,
            "on_node_error" => HookName::OnNodeError,
            "before_dataset_loaded" => HookName::BeforeDatasetLoaded,
            "after_dataset_loaded" => HookName::AfterDatasetLoaded,
            "before_dataset_saved" => HookName::BeforeDatasetSaved,
            "after_dataset_saved" => HookName::AfterDatasetSaved,
            other => HookName::Custom(other.to_string()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_round_trip_through_strings() {
        for name in ["on_pipeline_error", "after_catalog_created", "my_hook"] {
            let hook: HookName = name.parse().unwrap();
            assert_eq!(hook.to_string(), name);
        }
        assert_eq!(
            "my_hook".parse::<HookName>().unwrap(),
            HookName::Custom("my_hook".into())
        );
    }

    #[test]
    fn only_node_hooks_are_per_node() {
        assert!(HookName::BeforeNodeRun.is_per_node());
        assert!(HookName::OnNodeError.is_per_node());
        assert!(HookName::AfterNodeRun.is_per_node());
        assert!(!HookName::OnPipelineError.is_per_node());
        assert!(!HookName::Custom("before_node_run_extra".into()).is_per_node());
    }
}
