use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use clap::Subcommand;
use helium_host_payments::{
    calculator::window::parse_iso8601,
    exporter::{
        ArtifactNames, ArtifactWriter,
        rows::{ORACLE_PRICE_HEADERS, OraclePriceRow},
    },
    ingestor::explorer::HttpExplorer,
    oracle::{WalkLimits, price_history},
    report::{export_rewards, export_status},
    settings::Settings,
};
use std::path::PathBuf;
use tracing::info;

/// Raw data exports that need no ownership configuration
#[derive(Subcommand, Debug)]
pub enum ExportCommands {
    #[command(
        about = "Export the reward transactions of every hotspot owned by the wallet",
        after_help = r#"Examples:
    # Everything back to the configured lowest block
    export-rewards

    # Only rewards since the start of 2021
    export-rewards --since 2021-01-01 -o rewards"#
    )]
    ExportRewards {
        /// Stop at the first transaction before this time (ISO 8601)
        #[arg(long, value_name = "TIMESTAMP", value_parser = parse_iso8601)]
        since: Option<DateTime<Utc>>,

        /// Wallet owning the hotspots (defaults to report.wallet_address)
        #[arg(short, long, value_name = "ADDRESS")]
        wallet: Option<String>,

        /// Directory receiving the CSV files
        #[arg(short, long, value_name = "DIR")]
        output_dir: Option<PathBuf>,
    },
    #[command(
        about = "Append the current status of every hotspot owned by the wallet to its status log",
        after_help = r#"Examples:
    # Status of the configured wallet's hotspots
    export-status

    # Another wallet, into a separate directory
    export-status -w 13shErS29gws7ikVxkb4s13PZ6sQLSY63xRKP8DEBww2qWFhUu5 -o status"#
    )]
    ExportStatus {
        /// Wallet owning the hotspots (defaults to report.wallet_address)
        #[arg(short, long, value_name = "ADDRESS")]
        wallet: Option<String>,

        /// Directory holding the status log
        #[arg(short, long, value_name = "DIR")]
        output_dir: Option<PathBuf>,
    },
    #[command(
        about = "Export the oracle price history, newest first",
        after_help = r#"Examples:
    # Walk back to the genesis block
    oracle-prices

    # Only the last 24 price changes
    oracle-prices --max-queries 23"#
    )]
    OraclePrices {
        /// Stop once a price set at or below this block is reached
        #[arg(long, value_name = "BLOCK")]
        lowest_block: Option<u64>,

        /// Maximum number of historical price queries
        #[arg(long, value_name = "NUM")]
        max_queries: Option<usize>,

        /// Directory receiving the CSV file
        #[arg(short, long, value_name = "DIR")]
        output_dir: Option<PathBuf>,
    },
}

pub async fn handle(mut settings: Settings, cmd: ExportCommands) -> Result<()> {
    let run_start = Utc::now();
    let explorer = HttpExplorer::from_settings(&settings)?;

    match cmd {
        ExportCommands::ExportRewards {
            since,
            wallet,
            output_dir,
        } => {
            if let Some(wallet) = wallet {
                settings.report.wallet_address = wallet;
            }
            if let Some(dir) = output_dir {
                settings.output.dir = dir;
            }
            let since = since.unwrap_or(DateTime::UNIX_EPOCH);

            let artifacts = export_rewards(&explorer, &settings, since, run_start).await?;
            info!("Exported rewards for {} hotspots", artifacts.len());
        }
        ExportCommands::ExportStatus { wallet, output_dir } => {
            if let Some(wallet) = wallet {
                settings.report.wallet_address = wallet;
            }
            if let Some(dir) = output_dir {
                settings.output.dir = dir;
            }
            export_status(&explorer, &settings, run_start).await?;
        }
        ExportCommands::OraclePrices {
            lowest_block,
            max_queries,
            output_dir,
        } => {
            let mut limits = WalkLimits::from(&settings.oracle);
            if let Some(lowest_block) = lowest_block {
                limits.lowest_block = lowest_block;
            }
            if let Some(max_queries) = max_queries {
                limits.max_queries = max_queries;
            }
            let dir = output_dir.unwrap_or(settings.output.dir);

            let prices = price_history(&explorer, limits)
                .await
                .context("Failed to fetch oracle prices")?;
            let rows = prices.iter().map(OraclePriceRow::from).collect::<Vec<_>>();

            let writer = ArtifactWriter::new(dir)?;
            writer.write_csv(
                &ArtifactNames::unbounded(run_start).oracle_prices(),
                &ORACLE_PRICE_HEADERS,
                &rows,
                "oracle prices",
            )?;
        }
    }
    Ok(())
}
