use crate::{calculator::window::ReportWindow, settings::Settings};
use anyhow::{Result, bail};
use rust_decimal::Decimal;

/// Validate the configuration values
pub fn validate_config(settings: &Settings) -> Result<()> {
    // Validate log level
    let valid_log_levels = ["trace", "debug", "info", "warn", "error"];
    if !valid_log_levels.contains(&settings.log_level.to_lowercase().as_str()) {
        bail!(
            "Invalid log level '{}'. Valid options are: {:?}",
            settings.log_level,
            valid_log_levels
        );
    }

    // Validate explorer settings
    if !is_http_url(&settings.explorer.api_url) {
        bail!("Explorer API URL must start with http:// or https://");
    }
    if !is_http_url(&settings.explorer.web_url) {
        bail!("Explorer web URL must start with http:// or https://");
    }
    if settings.explorer.timeout_secs == 0 {
        bail!("Explorer timeout_secs must be greater than 0");
    }

    // Validate report settings
    if settings.report.wallet_address.trim().is_empty() {
        bail!("Report wallet_address cannot be empty");
    }
    if settings.report.memo.is_empty() {
        bail!("Report memo cannot be empty");
    }
    if settings.report.payment_minimum <= Decimal::ZERO {
        bail!(
            "Report payment_minimum must be positive, got {}",
            settings.report.payment_minimum
        );
    }
    if settings
        .report
        .hosts_file
        .as_ref()
        .is_some_and(|path| path.as_os_str().is_empty())
    {
        bail!("Report hosts_file cannot be empty; omit it to use default entries only");
    }

    // Invalid timestamps and inverted windows are fatal before any processing
    ReportWindow::parse(&settings.report.start, &settings.report.end)?;

    // Validate limits
    if settings.limits.max_hotspots == 0 {
        bail!("Limits max_hotspots must be greater than 0");
    }
    if settings.limits.max_transaction_pages == 0 {
        bail!("Limits max_transaction_pages must be greater than 0");
    }
    if settings.limits.page_size == 0 {
        bail!("Limits page_size must be greater than 0");
    }
    if settings.limits.lowest_block == 0 {
        bail!("Limits lowest_block must be greater than 0 (1 is the genesis block)");
    }

    // Validate oracle settings
    if settings.oracle.lowest_block == 0 {
        bail!("Oracle lowest_block must be greater than 0 (1 is the genesis block)");
    }
    if settings.oracle.max_queries == 0 {
        bail!("Oracle max_queries must be greater than 0");
    }

    Ok(())
}

fn is_http_url(url: &str) -> bool {
    url.starts_with("http://") || url.starts_with("https://")
}
