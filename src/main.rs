//! logcast - Real-time log broadcast gateway
//!
//! Main entry point for the logcast CLI and server.

mod cli;
mod server;

use clap::Parser;

use logcast_config::{ConfigLoader, ConfigValidator};

use crate::cli::{Cli, Commands, RunArgs};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    match cli.command {
        None => run(&cli, &RunArgs::default()).await,
        Some(Commands::Run(ref args)) => run(&cli, args).await,
        Some(Commands::CheckConfig) => check_config(&cli),
    }
}

async fn run(cli: &Cli, args: &RunArgs) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = ConfigLoader::load_or_default(&cli.config)?;
    args.apply(&mut config);

    server::init_tracing(&ConfigLoader::log_dir(&config), &config.logging.level)?;
    server::run_gateway(config, args.stdin).await
}

fn check_config(cli: &Cli) -> Result<(), Box<dyn std::error::Error>> {
    let config = ConfigLoader::load(&cli.config)?;
    let report = ConfigValidator::validate(&config);

    for issue in report.issues() {
        println!("{}", issue);
    }

    if !report.is_valid() {
        return Err(format!("{} is invalid", cli.config.display()).into());
    }
    println!("{} is valid", cli.config.display());
    Ok(())
}
