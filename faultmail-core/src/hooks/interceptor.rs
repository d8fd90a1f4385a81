//! Hook interception.
//!
//! [`ErrorMailer::intercept`] wraps a hook implementation. When the wrapped
//! hook fails, the failure is reported by mail and then handed back to the
//! framework untouched.

use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use chrono::Local;
use faultmail_config::{
    CredentialSource, FaultmailSettings, MailerConfig, MailerConfigProvider,
};
use faultmail_telemetry::NotificationMetrics;

use super::{recipe, HookName};
use crate::context::{DataCatalog, HookArg, RunContext, RunParams};
use crate::dispatch::{BodyFormat, DispatchSummary, Dispatcher, SesSmtpFactory, TransportFactory};
use crate::error::{NotifyError, UsageError};
use crate::failure::{FailureEvent, HookFault};
use crate::report::{build_report, render_report};
use crate::select::{select, ConflictPolicy};
use crate::suppression::{self, Suppression};

const SUBJECT_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// What a notification attempt ended with.
#[derive(Debug)]
pub enum NotifyOutcome {
    Dispatched(DispatchSummary),
    Suppressed(Suppression),
    /// Configuration, argument or credential problem; nothing was sent.
    Aborted(NotifyError),
}

impl NotifyOutcome {
    pub fn is_dispatched(&self) -> bool {
        matches!(self, NotifyOutcome::Dispatched(_))
    }
}

/// Reads the mailer configuration from the run context, or failing that
/// from the data catalog.
pub fn resolve_mailer_config(args: &[HookArg]) -> Result<MailerConfig, NotifyError> {
    if let Ok(context) = select::<RunContext>(args, ConflictPolicy::First) {
        return Ok(context.load_mailer_config()?);
    }
    if let Ok(catalog) = select::<DataCatalog>(args, ConflictPolicy::First) {
        return Ok(catalog.load_mailer_config()?);
    }
    Err(NotifyError::ConfigurationMissing(
        "no RunContext or DataCatalog among the hook arguments".into(),
    ))
}

/// Subject line and HTML body of a failure report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComposedMail {
    pub subject: String,
    pub body: String,
}

/// Builds the report for `event` from the hook arguments and renders it.
pub fn compose_report(args: &[HookArg], event: &FailureEvent) -> Result<ComposedMail, NotifyError> {
    let recipe = recipe::prepare(args, event)?;
    let report = build_report(recipe.provider, &recipe.facts)?;
    let missing = report.missing_required();
    if !missing.is_empty() {
        tracing::warn!(missing = ?missing, "Failure report is missing required rows");
    }

    Ok(ComposedMail {
        subject: format!(
            "Pipeline Error in {} at {}",
            recipe.pipeline_name,
            Local::now().format(SUBJECT_TIME_FORMAT)
        ),
        body: render_report(&report),
    })
}

/// Active environment as the hook arguments describe it.
fn environment(args: &[HookArg]) -> Option<&str> {
    if let Ok(context) = select::<RunContext>(args, ConflictPolicy::First) {
        return Some(context.env.as_str());
    }
    select::<RunParams>(args, ConflictPolicy::First)
        .ok()
        .and_then(RunParams::env)
}

/// Reports hook failures by mail.
#[derive(Clone)]
pub struct ErrorMailer {
    dispatcher: Dispatcher,
    credentials: Arc<dyn CredentialSource>,
    metrics: Option<NotificationMetrics>,
}

impl ErrorMailer {
    /// SES transport and environment credentials as `settings` describe them.
    pub fn new(settings: &FaultmailSettings) -> Self {
        Self::with_transport(
            Arc::new(SesSmtpFactory::new(settings.transport.clone())),
            Arc::new(settings.credential_source()),
        )
    }

    pub fn with_transport(
        factory: Arc<dyn TransportFactory>,
        credentials: Arc<dyn CredentialSource>,
    ) -> Self {
        Self {
            dispatcher: Dispatcher::new(factory),
            credentials,
            metrics: None,
        }
    }

    pub fn with_metrics(mut self, metrics: NotificationMetrics) -> Self {
        self.dispatcher = self.dispatcher.with_metrics(metrics.clone());
        self.metrics = Some(metrics);
        self
    }

    /// Wraps `hook_fn` so that its failures are mailed before being returned.
    ///
    /// Per-node hooks are refused here; their failures surface through
    /// `on_pipeline_error` instead. Panics are reported with kind `panic`
    /// and then resumed with the original payload.
    pub fn intercept<T, E, F>(
        &self,
        hook: HookName,
        location: impl Into<String>,
        hook_fn: F,
    ) -> Result<impl Fn(&[HookArg]) -> Result<T, E>, UsageError>
    where
        E: HookFault,
        F: Fn(&[HookArg]) -> Result<T, E>,
    {
        if hook.is_per_node() {
            return Err(UsageError::PerNodeHook(hook));
        }

        let mailer = self.clone();
        let location = location.into();

        Ok(move |args: &[HookArg]| {
            match panic::catch_unwind(AssertUnwindSafe(|| hook_fn(args))) {
                Ok(Ok(value)) => Ok(value),
                Ok(Err(error)) => {
                    let event = FailureEvent::from_fault(hook.clone(), &location, &error);
                    mailer.notify_guarded(args, &event);
                    Err(error)
                }
                Err(payload) => {
                    let event = FailureEvent::from_panic(hook.clone(), &location, payload.as_ref());
                    mailer.notify_guarded(args, &event);
                    panic::resume_unwind(payload)
                }
            }
        })
    }

    /// Runs the notification pipeline for one failure. Never fails; the
    /// outcome says what happened.
    #[tracing::instrument(skip_all, fields(hook = %event.hook, kind = %event.kind))]
    pub fn notify(&self, args: &[HookArg], event: &FailureEvent) -> NotifyOutcome {
        let config = match resolve_mailer_config(args) {
            Ok(config) => config,
            Err(e) => return self.abort(e),
        };

        if let Some(suppression) = suppression::evaluate(&event.kind, environment(args), &config) {
            if let Some(metrics) = &self.metrics {
                metrics.suppressed.inc();
            }
            return NotifyOutcome::Suppressed(suppression);
        }

        match self.compose_and_send(args, event, &config) {
            Ok(summary) => NotifyOutcome::Dispatched(summary),
            Err(e) => self.abort(e),
        }
    }

    fn compose_and_send(
        &self,
        args: &[HookArg],
        event: &FailureEvent,
        config: &MailerConfig,
    ) -> Result<DispatchSummary, NotifyError> {
        let mail = compose_report(args, event)?;
        let credentials = self.credentials.resolve()?;

        Ok(self.dispatcher.dispatch(
            &config.email.send_from,
            &config.email.send_to,
            &mail.subject,
            &mail.body,
            &credentials,
            BodyFormat::Html,
        ))
    }

    /// [`notify`](Self::notify), with a panic during notification contained
    /// so the original failure still reaches the caller.
    fn notify_guarded(&self, args: &[HookArg], event: &FailureEvent) {
        if panic::catch_unwind(AssertUnwindSafe(|| self.notify(args, event))).is_err() {
            tracing::error!(hook = %event.hook, "Error notification panicked");
            if let Some(metrics) = &self.metrics {
                metrics.aborted.inc();
            }
        }
    }

    fn abort(&self, error: NotifyError) -> NotifyOutcome {
        tracing::error!(error = %error, "Error notification aborted");
        if let Some(metrics) = &self.metrics {
            metrics.aborted.inc();
        }
        NotifyOutcome::Aborted(error)
    }
}
