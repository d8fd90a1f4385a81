//! ## faultmail-cli
//! **Operator tooling for failure reports**
//! Validates a project's `error_mailer` parameters, previews the HTML report
//! and sends a real test notification through the interceptor.

use clap::Parser;
use faultmail_telemetry::logging::EventLogger;

mod commands;
mod error;

use commands::Cli;

fn main() -> anyhow::Result<()> {
    EventLogger::init();
    let cli = Cli::parse();
    commands::run_command(cli)
}
