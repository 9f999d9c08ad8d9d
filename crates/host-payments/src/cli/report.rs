use anyhow::Result;
use chrono::Utc;
use clap::{Args, Subcommand};
use helium_host_payments::{
    ingestor::explorer::HttpExplorer,
    report::{load_registry, run_report},
    settings::{Settings, validation::validate_config},
};
use rust_decimal::Decimal;
use std::path::PathBuf;
use tracing::info;

/// Payment report commands
#[derive(Subcommand, Debug)]
pub enum ReportCommands {
    #[command(
        about = "Attribute a wallet's hotspot rewards to hosts and compute their payments",
        after_help = r#"Examples:
    # Report using the configured window
    report

    # Report for a given month, with a different hosts file
    report --start 2021-10-01 --end 2021-11-01 --hosts hosts.json

    # Write artifacts to a separate directory
    report -o reports/2021-10"#
    )]
    Report(ReportArgs),
}

/// Overrides for the `report` section of the configuration
#[derive(Args, Debug, Clone, Default)]
pub struct ReportArgs {
    /// Wallet owning the hotspots
    #[arg(short, long, value_name = "ADDRESS")]
    pub wallet: Option<String>,

    /// Inclusive start of the report window (ISO 8601)
    #[arg(long, value_name = "TIMESTAMP")]
    pub start: Option<String>,

    /// Exclusive end of the report window (ISO 8601)
    #[arg(long, value_name = "TIMESTAMP")]
    pub end: Option<String>,

    /// Ownership configuration JSON
    #[arg(long, value_name = "FILE")]
    pub hosts: Option<PathBuf>,

    /// Payment memo, at most 8 bytes
    #[arg(short, long)]
    pub memo: Option<String>,

    /// Host earnings below this amount are deferred
    #[arg(long, value_name = "AMOUNT")]
    pub payment_minimum: Option<Decimal>,

    /// Directory receiving the artifacts
    #[arg(short, long, value_name = "DIR")]
    pub output_dir: Option<PathBuf>,
}

impl ReportArgs {
    /// Apply overrides and re-validate
    pub fn apply(self, mut settings: Settings) -> Result<Settings> {
        if let Some(wallet) = self.wallet {
            settings.report.wallet_address = wallet;
        }
        if let Some(start) = self.start {
            settings.report.start = start;
        }
        if let Some(end) = self.end {
            settings.report.end = end;
        }
        if let Some(hosts) = self.hosts {
            settings.report.hosts_file = Some(hosts);
        }
        if let Some(memo) = self.memo {
            settings.report.memo = memo;
        }
        if let Some(minimum) = self.payment_minimum {
            settings.report.payment_minimum = minimum;
        }
        if let Some(dir) = self.output_dir {
            settings.output.dir = dir;
        }
        validate_config(&settings)?;
        Ok(settings)
    }
}

pub async fn handle(settings: Settings, cmd: ReportCommands) -> Result<()> {
    match cmd {
        ReportCommands::Report(args) => {
            let settings = args.apply(settings)?;
            let run_start = Utc::now();
            let explorer = HttpExplorer::from_settings(&settings)?;
            let registry = load_registry(&settings, run_start)?;

            info!(
                "Reporting on hotspots owned by {} for {}",
                settings.report.wallet_address,
                settings.window()?
            );
            let summary = run_report(&explorer, &settings, registry, run_start).await?;

            println!("{summary}");
            info!(
                "Wrote {} artifacts to {}",
                summary.artifacts.len(),
                settings.output.dir.display()
            );
            Ok(())
        }
    }
}
