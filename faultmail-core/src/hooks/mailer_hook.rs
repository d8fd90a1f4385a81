use super::{ErrorMailer, HookName, NotifyOutcome};
use crate::context::{DataCatalog, HookArg, Pipeline, RunParams};
use crate::failure::{FailureEvent, HookFault};

/// Hook object to register with the framework's hook manager.
///
/// Reports pipeline failures directly; no wrapping involved.
#[derive(Clone)]
pub struct MailerHook {
    mailer: ErrorMailer,
}

impl MailerHook {
    pub fn new(mailer: ErrorMailer) -> Self {
        Self { mailer }
    }

    pub fn on_pipeline_error<E: HookFault + ?Sized>(
        &self,
        error: &E,
        run_params: &RunParams,
        pipeline: &Pipeline,
        catalog: &DataCatalog,
    ) -> NotifyOutcome {
        let args = [
            HookArg::Params(run_params.clone()),
            HookArg::Pipeline(pipeline.clone()),
            HookArg::Catalog(catalog.clone()),
        ];
        let event = FailureEvent::from_fault(HookName::OnPipelineError, module_path!(), error);
        self.mailer.notify(&args, &event)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatch::testing::RecordingFactory;
    use crate::failure::PipelineError;
    use faultmail_config::MailCredentials;
    use serde_yaml::Mapping;
    use std::sync::Arc;

    #[test]
    fn pipeline_failure_is_reported_from_the_catalog() {
        let factory = Arc::new(RecordingFactory::default());
        let hook = MailerHook::new(ErrorMailer::with_transport(
            factory.clone(),
            Arc::new(MailCredentials::new("AKIA123", "s3cr3t", "eu-west-1")),
        ));
        let parameters: Mapping = serde_yaml::from_str(
            "error_mailer: {email: {send_to: [ops@x.com], send_from: noreply@x.com}}",
        )
        .unwrap();
        let details: Mapping =
            serde_yaml::from_str("{env: prod, project_path: /srv/etl, namespace: daily}").unwrap();

        let outcome = hook.on_pipeline_error(
            &PipelineError::new("OSError", "disk full"),
            &RunParams::new(details),
            &Pipeline::new("__default__"),
            &DataCatalog::new().with_parameters(parameters),
        );

        assert!(outcome.is_dispatched());
        let sent = factory.sent();
        assert_eq!(sent.len(), 1);
        assert!(sent[0].subject.starts_with("Pipeline Error in etl at "));
        assert!(sent[0].body.contains("<th>Namespace</th><td><pre>daily</pre></td>"));
    }
}
