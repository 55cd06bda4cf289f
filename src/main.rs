//! Reconcile container formations against a docker host.

use bay::cli::{BayCommand, Cli, configure_cli};
use bay::commands::{self, CommandContext, report_error};
use bay::config::load_config;
use bay::error::Result;
use bay::gateway::DockerGateway;
use env_logger::Env;
use std::process::ExitCode;
use std::sync::Arc;

#[tokio::main]
async fn main() -> ExitCode {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();
    let cli = configure_cli();
    match dispatch(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            report_error(&error);
            ExitCode::FAILURE
        }
    }
}

async fn dispatch(cli: Cli) -> Result<()> {
    let config = load_config(&cli.config)?;
    let containers = Arc::new(config.container_set()?);
    let host = config.host(&cli.host);
    let gateway = DockerGateway::connect(&host)?;
    let ctx = CommandContext {
        gateway: &gateway,
        containers,
        host,
    };
    match cli.command {
        BayCommand::Run { containers, tail } => commands::run(&ctx, &containers, tail).await,
        BayCommand::Shell {
            containers,
            command,
        } => commands::shell(&ctx, &containers, &command).await,
        BayCommand::Stop { containers } => commands::stop(&ctx, &containers).await,
        BayCommand::Restart { containers } => commands::restart(&ctx, &containers).await,
        BayCommand::Up => commands::up(&ctx).await,
        BayCommand::Tail { container, follow } => commands::tail(&ctx, &container, follow).await,
    }
}
