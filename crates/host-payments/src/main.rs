mod cli;

use anyhow::Result;
use clap::{Parser, Subcommand};
use cli::{export::ExportCommands, report::ReportCommands};
use helium_host_payments::settings::Settings;
use std::path::PathBuf;
use tracing::debug;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(
    name = "helium-host-payments",
    about = "Hotspot reward aggregation and host payment reports for Helium wallets",
    version,
    author,
    after_help = r#"Configuration:
    Configuration can be provided via:
    1. Environment variables with HHP__ prefix (e.g., HHP__REPORT__WALLET_ADDRESS)
    2. .env file in the current directory
    3. Config file with -c option (see example.config.toml)

Examples:
    # Payments report for October 2021
    helium-host-payments -c config.toml report --start 2021-10-01 --end 2021-11-01

    # Raw reward history of every hotspot owned by the wallet
    helium-host-payments -c config.toml export-rewards --since 2021-01-01

    # Append the wallet's hotspot status to its status log
    helium-host-payments -c config.toml export-status

    # Oracle price history
    helium-host-payments -c config.toml oracle-prices"#
)]
pub struct Cli {
    /// Path to the configuration file (TOML format)
    ///
    /// If not provided, will attempt to load from environment variables
    #[clap(short = 'c', long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    #[command(flatten)]
    Report(ReportCommands),
    #[command(flatten)]
    Export(ExportCommands),
}

impl Cli {
    pub async fn run(self) -> Result<()> {
        let settings = if let Some(config_path) = &self.config {
            Settings::from_path(config_path)?
        } else {
            Settings::from_env()?
        };
        init_logging(&settings.log_level)?;
        debug!("{settings}");

        match self.command {
            Commands::Report(cmd) => cli::report::handle(settings, cmd).await,
            Commands::Export(cmd) => cli::export::handle(settings, cmd).await,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    cli.run().await
}

fn init_logging(log_level: &str) -> Result<()> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level)))
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_thread_ids(false)
                .with_thread_names(false),
        )
        .init();

    Ok(())
}
