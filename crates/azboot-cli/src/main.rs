mod cli;
mod commands;
mod output;

use std::process::ExitCode;

use azboot_workflow::WorkflowError;
use clap::Parser;
use cli::{Cli, Command};
use tracing_subscriber::EnvFilter;

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match run(cli).await {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            eprintln!("error: {:#}", e);
            if let Some(we) = e.downcast_ref::<WorkflowError>() {
                eprintln!("\nTo fix:");
                for line in we.remediation() {
                    eprintln!("  - {}", line);
                }
            }
            ExitCode::FAILURE
        }
    }
}

/// `Ok(false)` means the command ran but reported failures.
async fn run(cli: Cli) -> anyhow::Result<bool> {
    let profile = commands::profile(cli.config.as_deref())?;
    match cli.command {
        Command::Setup(args) => commands::setup(args, profile).await.map(|()| true),
        Command::Validate(args) => commands::validate(args, profile).await,
    }
}
