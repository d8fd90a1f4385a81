use std::fmt::Write;
use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand};
use faultmail_config::{
    CredentialSource, CredentialsError, FaultmailSettings, MailerConfigProvider,
};
use faultmail_core::context::{DataCatalog, HookArg, Pipeline, RunContext, RunParams};
use faultmail_core::{
    compose_report, ComposedMail, ErrorMailer, FailureEvent, HookName, PipelineError, UsageError,
};
use faultmail_telemetry::metrics::NotificationMetrics;
use serde_yaml::{Mapping, Value};

use crate::error::CliError;

const SAMPLE_KIND: &str = "SampleError";
const TEST_KIND: &str = "FaultmailTest";

#[derive(Parser)]
#[command(version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Validate the error_mailer parameters and the mail credentials
    Check(CheckArgs),
    /// Print the HTML report a sample failure would produce
    Render(RenderArgs),
    /// Fail a hook on purpose and mail the report for real
    SendTest(SendTestArgs),
}

#[derive(Args, Debug, Clone)]
pub struct CheckArgs {
    /// YAML file with the project parameters
    #[arg(short, long)]
    pub params: PathBuf,
}

#[derive(Args, Debug, Clone)]
pub struct RenderArgs {
    #[arg(short, long)]
    pub params: PathBuf,
    /// Hook the sample failure is raised in
    #[arg(long, default_value = "on_pipeline_error")]
    pub hook: String,
    #[arg(short, long, default_value = "dev")]
    pub env: String,
    /// Project directory; defaults to the current directory
    #[arg(long)]
    pub project: Option<PathBuf>,
}

#[derive(Args, Debug, Clone)]
pub struct SendTestArgs {
    #[arg(short, long)]
    pub params: PathBuf,
    #[arg(short, long, default_value = "dev")]
    pub env: String,
    #[arg(long)]
    pub project: Option<PathBuf>,
}

pub fn run_command(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Commands::Check(args) => {
            let settings = FaultmailSettings::load()?;
            print!("{}", check(&args, &settings.credential_source())?);
        }
        Commands::Render(args) => {
            let mail = render(&args)?;
            tracing::info!(subject = %mail.subject, "Rendered sample report");
            println!("{}", mail.body);
        }
        Commands::SendTest(args) => {
            let settings = FaultmailSettings::load()?;
            let delivered = send_test(&args, ErrorMailer::new(&settings))?;
            println!("Test report delivered to {delivered} recipient(s)");
        }
    }
    Ok(())
}

pub fn load_params(path: &Path) -> Result<Mapping, CliError> {
    let text = std::fs::read_to_string(path).map_err(|source| CliError::ParamsFile {
        path: path.to_path_buf(),
        source,
    })?;
    match serde_yaml::from_str(&text) {
        Ok(Value::Mapping(params)) => Ok(params),
        Ok(_) => Err(CliError::NotAMapping(path.to_path_buf())),
        Err(source) => Err(CliError::ParamsFormat {
            path: path.to_path_buf(),
            source,
        }),
    }
}

fn check(args: &CheckArgs, credentials: &dyn CredentialSource) -> anyhow::Result<String> {
    let catalog = DataCatalog::new().with_parameters(load_params(&args.params)?);
    let config = catalog.load_mailer_config()?;

    let mut out = String::new();
    writeln!(out, "error_mailer: ok")?;
    writeln!(out, "  send_from: {}", config.email.send_from)?;
    writeln!(out, "  send_to: {}", config.email.send_to.join(", "))?;
    writeln!(out, "  ignored_exceptions: {}", join(&config.ignored_exceptions))?;
    writeln!(out, "  ignored_envs: {}", join(&config.ignored_envs))?;
    writeln!(out, "  additional_info rows: {}", config.additional_info.len())?;

    match credentials.resolve() {
        Ok(_) => writeln!(out, "credentials: ok")?,
        Err(CredentialsError::Missing { variables }) => {
            tracing::warn!(?variables, "Mail credentials incomplete");
            writeln!(out, "credentials: missing {}", variables.join(", "))?
        }
        Err(e) => return Err(e.into()),
    }
    Ok(out)
}

fn render(args: &RenderArgs) -> anyhow::Result<ComposedMail> {
    let hook: HookName = args.hook.parse()?;
    if hook.is_per_node() {
        return Err(UsageError::PerNodeHook(hook).into());
    }

    let params = load_params(&args.params)?;
    let project = project_dir(args.project.as_deref())?;
    let hook_args = sample_args(params, &args.env, &project);
    let event = FailureEvent::from_fault(
        hook,
        module_path!(),
        &PipelineError::new(SAMPLE_KIND, "sample failure rendered by faultmail"),
    );
    Ok(compose_report(&hook_args, &event)?)
}

/// Returns the number of recipients the report reached.
fn send_test(args: &SendTestArgs, mailer: ErrorMailer) -> anyhow::Result<u64> {
    let params = load_params(&args.params)?;
    let project = project_dir(args.project.as_deref())?;
    let hook_args = sample_args(params, &args.env, &project);

    let metrics = NotificationMetrics::new()?;
    let hook = mailer
        .with_metrics(metrics.clone())
        .intercept(HookName::AfterContextCreated, module_path!(), |_: &[HookArg]| {
            Err::<(), _>(PipelineError::new(
                TEST_KIND,
                "test failure raised by faultmail send-test",
            ))
        })?;

    if let Err(e) = hook(&hook_args) {
        tracing::info!(error = %e, "Test hook failed as intended");
    }
    tracing::debug!(metrics = %metrics.gather_metrics()?, "Notification counters");

    match metrics.sent.get() {
        0 => Err(CliError::NothingDelivered.into()),
        delivered => Ok(delivered),
    }
}

fn project_dir(project: Option<&Path>) -> std::io::Result<PathBuf> {
    match project {
        Some(path) => Ok(path.to_path_buf()),
        None => std::env::current_dir(),
    }
}

/// Hook arguments covering every recipe: context, run details, pipeline and
/// catalog, all built from the same parameters.
fn sample_args(params: Mapping, env: &str, project: &Path) -> Vec<HookArg> {
    let mut details = Mapping::new();
    details.insert("env".into(), env.into());
    details.insert(
        "project_path".into(),
        project.display().to_string().into(),
    );
    details.insert("extra_params".into(), Value::Mapping(Mapping::new()));

    vec![
        HookArg::Context(RunContext::new(project, env).with_params(params.clone())),
        HookArg::Params(RunParams::new(details)),
        HookArg::Pipeline(Pipeline::new("__default__")),
        HookArg::Catalog(DataCatalog::new().with_parameters(params)),
    ]
}

fn join<'a>(values: impl IntoIterator<Item = &'a String>) -> String {
    let joined: Vec<&str> = values.into_iter().map(String::as_str).collect();
    if joined.is_empty() {
        "-".to_string()
    } else {
        joined.join(", ")
    }
}
