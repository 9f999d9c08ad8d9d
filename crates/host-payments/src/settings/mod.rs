pub mod validation;

use crate::calculator::window::ReportWindow;
use anyhow::{Context, Result};
use config::{Config as ConfigBuilder, Environment, File};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::{
    fmt,
    path::{Path, PathBuf},
};
use validation::validate_config;

/// Environment variable prefix, e.g. `HHP__REPORT__MEMO`
pub const ENV_PREFIX: &str = "HHP";

/// Main settings configuration for host payment reports
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Log level for application logging (e.g., "info", "debug", "warn", "error")
    pub log_level: String,
    /// Blockchain explorer endpoints
    pub explorer: ExplorerSettings,
    /// Report period, payment and ownership inputs
    pub report: ReportSettings,
    /// Safety caps applied while paging through the explorer API
    pub limits: LimitSettings,
    /// Where report artifacts are written
    #[serde(default)]
    pub output: OutputSettings,
    /// Oracle price export parameters
    #[serde(default)]
    pub oracle: OracleSettings,
}

/// Explorer endpoint configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExplorerSettings {
    /// REST API base URL, including the version segment
    /// e.g., https://api.helium.io/v1
    pub api_url: String,
    /// Web explorer base URL used for hyperlinks in the earnings report
    pub web_url: String,
    /// Per-request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

/// Report inputs
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportSettings {
    /// Wallet owning the hotspots to report on
    pub wallet_address: String,
    /// Inclusive start of the report window (ISO 8601)
    pub start: String,
    /// Exclusive end of the report window (ISO 8601)
    pub end: String,
    /// Memo attached to every payment, truncated to 8 bytes
    pub memo: String,
    /// Host earnings below this amount are deferred
    pub payment_minimum: Decimal,
    /// Ownership configuration JSON; every hotspot gets a default entry when absent
    #[serde(default)]
    pub hosts_file: Option<PathBuf>,
}

/// Pagination safety caps
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LimitSettings {
    /// Maximum number of hotspots processed per run
    pub max_hotspots: usize,
    /// Maximum number of transaction pages fetched per hotspot
    pub max_transaction_pages: usize,
    /// Transactions requested per page
    pub page_size: usize,
    /// Transactions in blocks below this height end the scan
    pub lowest_block: u64,
}

/// Output configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputSettings {
    /// Directory receiving every artifact (default: current directory)
    pub dir: PathBuf,
}

impl Default for OutputSettings {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("."),
        }
    }
}

/// Oracle price walk-back configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OracleSettings {
    /// Stop once the walk reaches this block (default: 1, the genesis block)
    pub lowest_block: u64,
    /// Maximum number of price queries (default: 8760, hourly changes for a year)
    pub max_queries: usize,
}

impl Default for OracleSettings {
    fn default() -> Self {
        Self {
            lowest_block: 1,
            max_queries: 8_760,
        }
    }
}

fn default_timeout_secs() -> u64 {
    30
}

impl Settings {
    /// Load configuration from a specific config file path
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        // Construct settings, env vars take priority still
        let settings = ConfigBuilder::builder()
            .add_source(File::with_name(&path.as_ref().to_string_lossy()))
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .context("Failed to build configuration")?
            .try_deserialize()
            .context("Failed to deserialize configuration")?;

        validate_config(&settings)?;

        Ok(settings)
    }

    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        // NOTE: It's ok if this fails (file might not exist)
        let _ = dotenvy::dotenv();

        let settings: Settings = ConfigBuilder::builder()
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .context("Failed to build configuration")?
            .try_deserialize()
            .context("Failed to deserialize configuration")?;

        validate_config(&settings)?;

        Ok(settings)
    }

    /// Parsed report window
    pub fn window(&self) -> Result<ReportWindow> {
        Ok(ReportWindow::parse(&self.report.start, &self.report.end)?)
    }
}

impl fmt::Display for Settings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Settings {{\n\
             \tLog Level: {}\n\
             \tAPI URL: {}\n\
             \tHotspots Owned By: {}\n\
             \tReport From: {}\n\
             \tReport To: {}\n\
             \tPayment Memo: {}\n\
             \tPayment Minimum: {}\n\
             \tEarliest Block: {}\n\
             \tMax Hotspots: {}\n\
             \tMax Transactions: {}\n\
             }}",
            self.log_level,
            self.explorer.api_url,
            self.report.wallet_address,
            self.report.start,
            self.report.end,
            self.report.memo,
            self.report.payment_minimum,
            self.limits.lowest_block,
            self.limits.max_hotspots,
            self.limits.max_transaction_pages * self.limits.page_size,
        )
    }
}
