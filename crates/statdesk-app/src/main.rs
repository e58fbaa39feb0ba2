//! CLI entry point.

use std::process::ExitCode;

use clap::Parser;
use tracing::error;

use statdesk_app::{
    Cli, CliError, Commands, build_config, handlers, init_tracing, shutdown_signal,
};

#[tokio::main]
async fn main() -> ExitCode {
    // Load .env before clap reads STATDESK_* variables
    let dotenv = dotenvy::dotenv();

    let cli = Cli::parse();
    let _log_guard = init_tracing(cli.verbose);

    if let Ok(path) = dotenv {
        tracing::debug!(path = %path.display(), "Loaded environment file");
    }

    match dispatch(&cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e}");
            eprintln!("Error: {e}");
            ExitCode::from(u8::try_from(e.exit_code()).unwrap_or(1))
        }
    }
}

async fn dispatch(cli: &Cli) -> Result<(), CliError> {
    let config = build_config(&cli.launch)?;

    match cli.command_or_default() {
        Commands::Run => {
            handlers::run::execute(config, cli.launch.headless, shutdown_signal()).await
        }
        Commands::Backend => handlers::backend::execute(&config, shutdown_signal()).await,
        Commands::Paths { json } => handlers::paths::execute(&config, json),
    }
}
