use std::process::ExitCode;

use clap::Parser;
use walink_lib::bootstrap::config::CONFIG_PATH_ENV;
use walink_lib::bootstrap::{init_tracing_subscriber, load_or_default, resolve_config_path};
use walink_lib::cli::{self, Cli};

#[tokio::main]
async fn main() -> ExitCode {
    let args = Cli::parse();

    let explicit = args.config.is_some()
        || std::env::var_os(CONFIG_PATH_ENV).is_some_and(|path| !path.is_empty());
    let config_path = resolve_config_path(args.config);
    let config = match load_or_default(&config_path, explicit) {
        Ok(config) => config,
        Err(err) => {
            eprintln!("{:#}", err);
            return ExitCode::FAILURE;
        }
    };

    if let Err(err) = init_tracing_subscriber(&config.logging) {
        eprintln!("Failed to initialize tracing: {:#}", err);
    }
    tracing::info!(config = %config_path.display(), "walink starting");

    match cli::run(args.command, &config).await {
        Ok(code) => code,
        Err(err) => {
            tracing::error!(error = %format!("{:#}", err), "Command failed");
            eprintln!("Error: {:#}", err);
            ExitCode::FAILURE
        }
    }
}
