//! CLI definitions for logcast.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use logcast_config::Config;

/// logcast CLI.
#[derive(Parser)]
#[command(name = "logcast")]
#[command(about = "Real-time log broadcast gateway")]
#[command(version)]
pub(crate) struct Cli {
    /// Configuration file path
    #[arg(short, long, default_value = "config/default.toml", global = true)]
    pub config: PathBuf,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub(crate) enum Commands {
    /// Run the gateway in foreground (default)
    Run(RunArgs),

    /// Validate the configuration file
    CheckConfig,
}

/// Overrides for the `[gateway]` section.
#[derive(Args, Debug, Default)]
pub(crate) struct RunArgs {
    /// Address to bind listeners to
    #[arg(long)]
    pub bind: Option<String>,

    /// Standalone viewer port (0 picks a free port)
    #[arg(short, long)]
    pub port: Option<u16>,

    /// Do not open a standalone listener
    #[arg(long)]
    pub no_standalone: bool,

    /// Broadcast throttle in milliseconds (0 disables)
    #[arg(long)]
    pub throttle_ms: Option<u64>,

    /// Start a host application on this port and attach to it
    #[arg(long)]
    pub app_port: Option<u16>,

    /// Emit every line read from stdin as a record
    #[arg(long)]
    pub stdin: bool,
}

impl RunArgs {
    /// Apply command-line overrides on top of the loaded file.
    pub fn apply(&self, config: &mut Config) {
        let gateway = &mut config.gateway;
        if let Some(bind) = &self.bind {
            gateway.bind = bind.clone();
        }
        if let Some(port) = self.port {
            gateway.port = port;
        }
        if self.no_standalone {
            gateway.standalone = false;
        }
        if let Some(throttle_ms) = self.throttle_ms {
            gateway.throttle_ms = throttle_ms;
        }
        if self.app_port.is_some() {
            gateway.app_port = self.app_port;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_defaults_to_run() {
        let cli = Cli::parse_from(["logcast"]);
        assert!(cli.command.is_none());
        assert_eq!(cli.config, PathBuf::from("config/default.toml"));
    }

    #[test]
    fn test_run_overrides() {
        let cli = Cli::parse_from([
            "logcast",
            "run",
            "--port",
            "0",
            "--throttle-ms",
            "50",
            "--app-port",
            "3000",
            "--stdin",
        ]);
        let Some(Commands::Run(args)) = cli.command else {
            panic!("expected run");
        };
        assert!(args.stdin);

        let mut config = Config::default();
        args.apply(&mut config);
        assert_eq!(config.gateway.port, 0);
        assert_eq!(config.gateway.throttle_ms, 50);
        assert_eq!(config.gateway.app_port, Some(3000));
        assert!(config.gateway.standalone);
    }

    #[test]
    fn test_no_standalone() {
        let cli = Cli::parse_from(["logcast", "run", "--no-standalone"]);
        let Some(Commands::Run(args)) = cli.command else {
            panic!("expected run");
        };
        let mut config = Config::default();
        args.apply(&mut config);
        assert_eq!(config.gateway.standalone_port(), None);
    }

    #[test]
    fn test_check_config_with_path() {
        let cli = Cli::parse_from(["logcast", "check-config", "--config", "other.toml"]);
        assert!(matches!(cli.command, Some(Commands::CheckConfig)));
        assert_eq!(cli.config, PathBuf::from("other.toml"));
    }
}
