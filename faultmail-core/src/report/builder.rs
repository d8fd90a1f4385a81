use faultmail_config::MailerConfigProvider;
use serde_yaml::{Mapping, Value};

use super::ErrorReport;
use crate::context::HookArg;
use crate::error::NotifyError;

/// Merges `error_mailer.additional_info` with the facts of one failure.
///
/// Static rows come first in their configured order; `dynamic_facts` are
/// written over them, so failure specific values always win.
pub fn build_report(
    provider: &dyn MailerConfigProvider,
    dynamic_facts: &ErrorReport,
) -> Result<ErrorReport, NotifyError> {
    let additional_info = provider.additional_info()?;
    let mut report = from_mapping(&additional_info);
    report.overlay(dynamic_facts);
    Ok(report)
}

/// The parameter provider behind a hook argument.
pub fn provider_for(arg: &HookArg) -> Result<&dyn MailerConfigProvider, NotifyError> {
    match arg {
        HookArg::Context(context) => Ok(context as &dyn MailerConfigProvider),
        HookArg::Catalog(catalog) => Ok(catalog as &dyn MailerConfigProvider),
        _ => Err(NotifyError::ConfigurationMissing(
            "argument is neither a RunContext nor a DataCatalog".into(),
        )),
    }
}

fn from_mapping(mapping: &Mapping) -> ErrorReport {
    let mut report = ErrorReport::new();
    for (label, value) in mapping {
        report.insert(value_to_text(label), value_to_text(value));
    }
    report
}

/// Display form of a parameter value: strings as is, everything else as
/// compact JSON.
pub fn value_to_text(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        Value::Null => "None".to_string(),
        other => serde_json::to_string(other).unwrap_or_else(|_| format!("{other:?}")),
    }
}
