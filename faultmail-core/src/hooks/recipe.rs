//! Which arguments a hook carries and which facts its report holds.

use faultmail_config::MailerConfigProvider;
use serde_yaml::Value;
use sysinfo::System;

use super::HookName;
use crate::context::{DataCatalog, HookArg, RunContext, RunParams};
use crate::error::NotifyError;
use crate::failure::FailureEvent;
use crate::report::{
    value_to_text, ErrorReport, ENVIRONMENT, ERROR, FILE, HOOK_NAME, HOST_NAME, LOCATION,
    NAMESPACE, PIPELINE_NAME, RUNTIME_PARAMETERS, TRACEBACK,
};
use crate::select::{select, ConflictPolicy};

const UNKNOWN_HOST: &str = "<unknown>";

/// Per-failure report content and the provider holding the static rows.
pub(crate) struct Recipe<'a> {
    pub provider: &'a dyn MailerConfigProvider,
    pub pipeline_name: String,
    pub facts: ErrorReport,
}

pub(crate) fn prepare<'a>(
    args: &'a [HookArg],
    event: &FailureEvent,
) -> Result<Recipe<'a>, NotifyError> {
    let host = host_name();
    match &event.hook {
        HookName::OnPipelineError => on_pipeline_error(args, event, host),
        HookName::AfterPipelineRun => after_pipeline_run(args, event, host),
        HookName::AfterCatalogCreated | HookName::BeforePipelineRun => {
            catalog_only(args, event, host)
        }
        _ => with_context(args, event, host),
    }
}

fn on_pipeline_error<'a>(
    args: &'a [HookArg],
    event: &FailureEvent,
    host: String,
) -> Result<Recipe<'a>, NotifyError> {
    let run_params: &RunParams = select(args, ConflictPolicy::Raise)?;
    let catalog: &DataCatalog = select(args, ConflictPolicy::Raise)?;
    let pipeline_name = run_params
        .project_name()
        .unwrap_or_else(|| location_root(&event.location));

    let facts = ErrorReport::new()
        .with(HOST_NAME, host)
        .with(PIPELINE_NAME, pipeline_name.as_str())
        .with(RUNTIME_PARAMETERS, value_to_text(&run_params.extra_params()))
        .with(ENVIRONMENT, run_params.env().unwrap_or("None"))
        .with(NAMESPACE, run_params.namespace().unwrap_or("None"))
        .with(FILE, event.source_file.as_str())
        .with(HOOK_NAME, event.hook.as_str())
        .with(ERROR, event.message.as_str())
        .with(TRACEBACK, event.traceback.as_str());

    Ok(Recipe {
        provider: catalog,
        pipeline_name,
        facts,
    })
}

fn after_pipeline_run<'a>(
    args: &'a [HookArg],
    event: &FailureEvent,
    host: String,
) -> Result<Recipe<'a>, NotifyError> {
    let run_params: &RunParams = select(args, ConflictPolicy::First)?;
    let catalog: &DataCatalog = select(args, ConflictPolicy::Raise)?;
    let pipeline_name = location_root(&event.location);

    let facts = ErrorReport::new()
        .with(HOST_NAME, host)
        .with(PIPELINE_NAME, pipeline_name.as_str())
        .with(RUNTIME_PARAMETERS, value_to_text(&run_params.extra_params()))
        .with(ENVIRONMENT, run_params.env().unwrap_or("None"))
        .with(HOOK_NAME, event.hook.as_str())
        .with(FILE, event.source_file.as_str())
        .with(ERROR, event.message.as_str())
        .with(TRACEBACK, event.traceback.as_str());

    Ok(Recipe {
        provider: catalog,
        pipeline_name,
        facts,
    })
}

fn catalog_only<'a>(
    args: &'a [HookArg],
    event: &FailureEvent,
    host: String,
) -> Result<Recipe<'a>, NotifyError> {
    let catalog: &DataCatalog = select(args, ConflictPolicy::Raise)?;
    let pipeline_name = location_root(&event.location);

    let facts = ErrorReport::new()
        .with(HOST_NAME, host)
        .with(PIPELINE_NAME, pipeline_name.as_str())
        .with(HOOK_NAME, event.hook.as_str())
        .with(FILE, event.source_file.as_str())
        .with(ERROR, event.message.as_str())
        .with(TRACEBACK, event.traceback.as_str());

    Ok(Recipe {
        provider: catalog,
        pipeline_name,
        facts,
    })
}

fn with_context<'a>(
    args: &'a [HookArg],
    event: &FailureEvent,
    host: String,
) -> Result<Recipe<'a>, NotifyError> {
    let context: &RunContext = select(args, ConflictPolicy::Raise)?;
    let pipeline_name = context.project_name();

    let facts = ErrorReport::new()
        .with(HOST_NAME, host)
        .with(PIPELINE_NAME, pipeline_name.as_str())
        .with(
            RUNTIME_PARAMETERS,
            value_to_text(&Value::Mapping(context.runtime_params.clone())),
        )
        .with(HOOK_NAME, event.hook.as_str())
        .with(LOCATION, event.location.as_str())
        .with(FILE, event.source_file.as_str())
        .with(ERROR, event.message.as_str())
        .with(TRACEBACK, event.traceback.as_str());

    Ok(Recipe {
        provider: context,
        pipeline_name,
        facts,
    })
}

/// Leading segment of a module path such as `etl::hooks` or `etl.hooks`.
fn location_root(location: &str) -> String {
    location
        .split([':', '.'])
        .find(|segment| !segment.is_empty())
        .unwrap_or(location)
        .to_string()
}

fn host_name() -> String {
    System::host_name().unwrap_or_else(|| {
        tracing::debug!("Host name unavailable");
        UNKNOWN_HOST.to_string()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::Pipeline;
    use crate::failure::PipelineError;
    use crate::report::REQUIRED_LABELS;
    use serde_yaml::Mapping;

    fn event(hook: HookName, location: &str) -> FailureEvent {
        FailureEvent::from_fault(hook, location, &PipelineError::new("OSError", "disk full"))
    }

    fn run_params(yaml: &str) -> HookArg {
        let details: Mapping = serde_yaml::from_str(yaml).unwrap();
        HookArg::Params(RunParams::new(details))
    }

    #[test]
    fn pipeline_error_facts() {
        let args = vec![
            run_params("{env: prod, project_path: /srv/projects/etl, extra_params: {date: '2024-05-01'}}"),
            HookArg::Pipeline(Pipeline::new("__default__")),
            HookArg::Catalog(DataCatalog::new()),
        ];
        let recipe = prepare(&args, &event(HookName::OnPipelineError, "etl::hooks")).unwrap();

        assert_eq!(recipe.pipeline_name, "etl");
        assert_eq!(recipe.facts.get(ENVIRONMENT), Some("prod"));
        assert_eq!(recipe.facts.get(NAMESPACE), Some("None"));
        assert_eq!(recipe.facts.get(RUNTIME_PARAMETERS), Some(r#"{"date":"2024-05-01"}"#));
        assert_eq!(recipe.facts.get(ERROR), Some("disk full"));
        assert!(recipe.facts.missing_required().is_empty());
        assert_eq!(recipe.provider.provider_name(), "data catalog");
    }

    #[test]
    fn pipeline_error_rejects_duplicate_run_params() {
        let args = vec![
            run_params("{env: prod}"),
            run_params("{env: dev}"),
            HookArg::Catalog(DataCatalog::new()),
        ];
        assert!(matches!(
            prepare(&args, &event(HookName::OnPipelineError, "etl")),
            Err(NotifyError::Selection(_))
        ));
    }

    #[test]
    fn after_pipeline_run_takes_first_run_params() {
        let args = vec![
            run_params("{env: prod, extra_params: null}"),
            run_params("{env: dev}"),
            HookArg::Catalog(DataCatalog::new()),
        ];
        let recipe =
            prepare(&args, &event(HookName::AfterPipelineRun, "etl.hooks.alerts")).unwrap();

        assert_eq!(recipe.pipeline_name, "etl");
        assert_eq!(recipe.facts.get(ENVIRONMENT), Some("prod"));
        assert_eq!(recipe.facts.get(RUNTIME_PARAMETERS), Some("None"));
    }

    #[test]
    fn catalog_hooks_need_only_the_catalog() {
        let args = vec![HookArg::Catalog(DataCatalog::new())];
        let recipe = prepare(&args, &event(HookName::BeforePipelineRun, "etl::hooks")).unwrap();

        assert!(recipe.facts.missing_required().is_empty());
        assert!(!recipe.facts.contains(ENVIRONMENT));
    }

    #[test]
    fn other_hooks_read_the_run_context() {
        let context = RunContext::new("/srv/projects/forecast", "staging");
        let args = vec![HookArg::Context(context)];
        let recipe = prepare(&args, &event(HookName::AfterContextCreated, "forecast::hooks")).unwrap();

        assert_eq!(recipe.pipeline_name, "forecast");
        assert_eq!(recipe.facts.get(LOCATION), Some("forecast::hooks"));
        assert_eq!(recipe.facts.get(HOOK_NAME), Some("after_context_created"));
        for label in REQUIRED_LABELS {
            assert!(recipe.facts.contains(label), "missing {label}");
        }
    }

    #[test]
    fn missing_context_is_a_selection_error() {
        let args = vec![HookArg::Catalog(DataCatalog::new())];
        assert!(matches!(
            prepare(&args, &event(HookName::AfterDatasetLoaded, "etl")),
            Err(NotifyError::Selection(_))
        ));
    }

    #[test]
    fn location_root_handles_both_separators() {
        assert_eq!(location_root("etl::hooks"), "etl");
        assert_eq!(location_root("etl.hooks"), "etl");
        assert_eq!(location_root("etl"), "etl");
        assert_eq!(location_root(""), "");
    }
}
