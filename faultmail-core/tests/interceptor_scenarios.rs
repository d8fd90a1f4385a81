//! End-to-end behaviour of wrapped hooks against a recording transport.

use std::borrow::Cow;
use std::error::Error;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use chrono::Local;
use faultmail_config::MailCredentials;
use faultmail_core::context::{DataCatalog, HookArg, Pipeline, RunContext, RunParams};
use faultmail_core::dispatch::{
    check_credentials, MailTransport, OutboundMail, TransportError, TransportFactory,
};
use faultmail_core::{ErrorMailer, HookFault, HookName, PipelineError, UsageError};
use lettre::address::AddressError;
use lettre::message::Mailbox;
use serde_yaml::Mapping;
use tracing_test::traced_test;

#[derive(Debug, Clone)]
struct Delivery {
    to: String,
    subject: String,
    body: String,
}

#[derive(Default)]
struct Outbox {
    delivered: Arc<Mutex<Vec<Delivery>>>,
    bounce: Vec<String>,
}

impl Outbox {
    fn bouncing(address: &str) -> Self {
        Self {
            bounce: vec![address.to_string()],
            ..Self::default()
        }
    }

    fn delivered(&self) -> Vec<Delivery> {
        self.delivered.lock().unwrap().clone()
    }
}

struct OutboxTransport {
    delivered: Arc<Mutex<Vec<Delivery>>>,
    bounce: Vec<String>,
}

impl TransportFactory for Outbox {
    fn connect(
        &self,
        credentials: &MailCredentials,
    ) -> Result<Box<dyn MailTransport>, TransportError> {
        check_credentials(credentials)?;
        Ok(Box::new(OutboxTransport {
            delivered: Arc::clone(&self.delivered),
            bounce: self.bounce.clone(),
        }))
    }
}

fn mailbox(address: &str) -> Result<Mailbox, TransportError> {
    address.parse().map_err(|e: AddressError| TransportError::Address {
        address: address.to_string(),
        message: e.to_string(),
    })
}

impl MailTransport for OutboxTransport {
    fn send(&self, mail: &OutboundMail<'_>) -> Result<String, TransportError> {
        mailbox(mail.source)?;
        mailbox(mail.destination)?;
        if self.bounce.iter().any(|b| b == mail.destination) {
            return Err(TransportError::Smtp("550 Mailbox unavailable".into()));
        }
        let mut delivered = self.delivered.lock().unwrap();
        delivered.push(Delivery {
            to: mail.destination.to_string(),
            subject: mail.subject.to_string(),
            body: mail.body.to_string(),
        });
        Ok(format!("0100-{}", delivered.len()))
    }
}

/// A hook error whose identity the tests can check.
#[derive(Debug, PartialEq, Eq)]
struct ValueError {
    id: u32,
}

impl fmt::Display for ValueError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "bad value #{}", self.id)
    }
}

impl Error for ValueError {}

impl HookFault for ValueError {
    fn kind(&self) -> Cow<'_, str> {
        Cow::Borrowed("ValueError")
    }
}

const PARAMETERS: &str = r#"
error_mailer:
  email:
    send_to: [a@x.com, b@x.com]
    send_from: noreply@x.com
  ignored_exceptions: [ValueError]
  additional_info:
    Team: forecasting
"#;

fn parameters(yaml: &str) -> Mapping {
    serde_yaml::from_str(yaml).unwrap()
}

fn mailer(outbox: &Arc<Outbox>) -> ErrorMailer {
    ErrorMailer::with_transport(
        outbox.clone(),
        Arc::new(MailCredentials::new("AKIA123", "s3cr3t", "eu-west-1")),
    )
}

fn pipeline_error_args(params: &str) -> Vec<HookArg> {
    let details = parameters(
        "{env: prod, project_path: /srv/projects/etl, extra_params: {date: '2024-05-01'}}",
    );
    vec![
        HookArg::Params(RunParams::new(details)),
        HookArg::Pipeline(Pipeline::new("__default__")),
        HookArg::Catalog(DataCatalog::new().with_parameters(parameters(params))),
    ]
}

#[test]
fn disk_full_is_mailed_to_every_recipient() {
    let outbox = Arc::new(Outbox::default());
    let params = r#"
error_mailer:
  email:
    send_to: [a@x.com, b@x.com]
    send_from: noreply@x.com
  ignored_exceptions: []
"#;
    let hook = mailer(&outbox)
        .intercept(HookName::OnPipelineError, "etl::hooks", |_: &[HookArg]| {
            Err::<(), _>(PipelineError::new("ValueError", "disk full"))
        })
        .unwrap();

    let err = hook(&pipeline_error_args(params)).unwrap_err();
    assert_eq!(err.message(), "disk full");

    let delivered = outbox.delivered();
    assert_eq!(delivered.len(), 2);
    assert_eq!(delivered[0].to, "a@x.com");
    assert_eq!(delivered[1].to, "b@x.com");

    let today = Local::now().format("%Y-%m-%d").to_string();
    for mail in &delivered {
        assert!(mail.subject.starts_with("Pipeline Error in etl at "));
        assert!(mail.subject.contains(&today));
        assert!(mail.body.contains("disk full"));
        assert!(mail.body.contains("<th>Traceback</th><td><pre>ValueError: disk full"));
        assert!(mail.body.contains("<th>Environment</th><td><pre>prod</pre></td>"));
    }
}

#[traced_test]
#[test]
fn ignored_error_kind_is_raised_but_not_mailed() {
    let outbox = Arc::new(Outbox::default());
    let hook = mailer(&outbox)
        .intercept(HookName::OnPipelineError, "etl::hooks", |_: &[HookArg]| {
            Err::<(), _>(ValueError { id: 7 })
        })
        .unwrap();

    let err = hook(&pipeline_error_args(PARAMETERS)).unwrap_err();

    assert_eq!(err, ValueError { id: 7 });
    assert!(outbox.delivered().is_empty());
    logs_assert(|lines: &[&str]| {
        let warnings: Vec<_> = lines.iter().filter(|line| line.contains(" WARN ")).collect();
        match warnings.as_slice() {
            [only] if only.contains("Ignoring mailing for ValueError error.") => Ok(()),
            other => Err(format!("expected exactly one warning, got {other:?}")),
        }
    });
}

#[test]
fn per_node_hooks_never_run() {
    let outbox = Arc::new(Outbox::default());
    let ran = AtomicBool::new(false);

    for hook in [
        HookName::BeforeNodeRun,
        HookName::AfterNodeRun,
        HookName::OnNodeError,
    ] {
        let result = mailer(&outbox).intercept(hook.clone(), "etl::hooks", |_: &[HookArg]| {
            ran.store(true, Ordering::SeqCst);
            Ok::<_, PipelineError>(())
        });
        assert_eq!(result.err(), Some(UsageError::PerNodeHook(hook)));
    }

    assert!(!ran.load(Ordering::SeqCst));
    assert!(outbox.delivered().is_empty());
}

#[test]
fn panic_is_reported_then_resumed() {
    let outbox = Arc::new(Outbox::default());
    let hook = mailer(&outbox)
        .intercept(HookName::AfterContextCreated, "etl::hooks", |_: &[HookArg]| -> Result<(), PipelineError> {
            panic!("catalog exploded")
        })
        .unwrap();
    let args = vec![HookArg::Context(
        RunContext::new("/srv/projects/etl", "prod").with_params(parameters(PARAMETERS)),
    )];

    let payload = panic::catch_unwind(AssertUnwindSafe(|| hook(&args))).unwrap_err();

    assert_eq!(payload.downcast_ref::<&str>(), Some(&"catalog exploded"));
    let delivered = outbox.delivered();
    assert_eq!(delivered.len(), 2);
    assert!(delivered[0].body.contains("panic: catalog exploded"));
}

#[traced_test]
#[test]
fn bounced_recipient_does_not_block_the_others() {
    let outbox = Arc::new(Outbox::bouncing("b@x.com"));
    let params = r#"
error_mailer:
  email:
    send_to: [a@x.com, b@x.com, c@x.com]
    send_from: noreply@x.com
"#;
    let hook = mailer(&outbox)
        .intercept(HookName::OnPipelineError, "etl::hooks", |_: &[HookArg]| {
            Err::<(), _>(PipelineError::new("OSError", "disk full"))
        })
        .unwrap();

    assert!(hook(&pipeline_error_args(params)).is_err());

    let recipients: Vec<_> = outbox.delivered().into_iter().map(|d| d.to).collect();
    assert_eq!(recipients, vec!["a@x.com", "c@x.com"]);
    assert!(logs_contain("550 Mailbox unavailable"));
}

#[traced_test]
#[test]
fn malformed_recipient_only_costs_that_recipient() {
    let outbox = Arc::new(Outbox::default());
    let params = r#"
error_mailer:
  email:
    send_to: [a@x.com, oncall, c@x.com]
    send_from: noreply@x.com
"#;
    let hook = mailer(&outbox)
        .intercept(HookName::OnPipelineError, "etl::hooks", |_: &[HookArg]| {
            Err::<(), _>(PipelineError::new("OSError", "disk full"))
        })
        .unwrap();

    assert!(hook(&pipeline_error_args(params)).is_err());

    let recipients: Vec<_> = outbox.delivered().into_iter().map(|d| d.to).collect();
    assert_eq!(recipients, vec!["a@x.com", "c@x.com"]);
    assert!(logs_contain("Invalid address oncall"));
    assert!(!logs_contain("Error notification aborted"));
}

#[test]
fn display_name_sender_is_accepted() {
    let outbox = Arc::new(Outbox::default());
    let params = r#"
error_mailer:
  email:
    send_to: [a@x.com, b@x.com]
    send_from: Pipelines <noreply@x.com>
"#;
    let hook = mailer(&outbox)
        .intercept(HookName::OnPipelineError, "etl::hooks", |_: &[HookArg]| {
            Err::<(), _>(PipelineError::new("OSError", "disk full"))
        })
        .unwrap();

    assert!(hook(&pipeline_error_args(params)).is_err());
    assert_eq!(outbox.delivered().len(), 2);
}

#[traced_test]
#[test]
fn missing_configuration_keeps_the_original_error() {
    let outbox = Arc::new(Outbox::default());
    let hook = mailer(&outbox)
        .intercept(HookName::AfterCatalogCreated, "etl::hooks", |_: &[HookArg]| {
            Err::<(), _>(ValueError { id: 3 })
        })
        .unwrap();

    let err = hook(&[HookArg::Pipeline(Pipeline::new("__default__"))]).unwrap_err();

    assert_eq!(err, ValueError { id: 3 });
    assert!(outbox.delivered().is_empty());
    assert!(logs_contain("Error notification aborted"));
}

#[traced_test]
#[test]
fn missing_credentials_are_logged_per_recipient() {
    let outbox = Arc::new(Outbox::default());
    let mailer = ErrorMailer::with_transport(
        outbox.clone(),
        Arc::new(MailCredentials::new("AKIA123", "", "eu-west-1")),
    );
    let hook = mailer
        .intercept(HookName::OnPipelineError, "etl::hooks", |_: &[HookArg]| {
            Err::<(), _>(PipelineError::new("OSError", "disk full"))
        })
        .unwrap();

    assert!(hook(&pipeline_error_args(PARAMETERS)).is_err());
    assert!(outbox.delivered().is_empty());
    assert!(logs_contain("Incomplete mail credentials"));
}

#[test]
fn successful_hook_sends_nothing() {
    let outbox = Arc::new(Outbox::default());
    let hook = mailer(&outbox)
        .intercept(HookName::BeforePipelineRun, "etl::hooks", |args: &[HookArg]| {
            Ok::<_, PipelineError>(args.len())
        })
        .unwrap();

    assert_eq!(hook(&pipeline_error_args(PARAMETERS)).unwrap(), 3);
    assert!(outbox.delivered().is_empty());
}
