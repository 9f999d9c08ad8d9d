use crate::{
    calculator::{
        accumulator::RewardAccumulator,
        allocator::{Payment, PaymentAllocator, PaymentMemo, PaymentRecord},
        diagnostics::{Diagnostic, DiagnosticKind, Diagnostics},
        merger,
        money,
        registry::{OwnershipEntry, OwnershipRegistry, WALLET_ADDRESS_LEN},
        window::ReportWindow,
    },
    error::ReportError,
    exporter::{
        ArtifactNames, ArtifactWriter,
        rows::{
            EARNINGS_HEADERS, EarningsRow, HOTSPOT_STATUS_HEADERS, HotspotStatusRow,
            REWARD_HEADERS, RewardRow,
        },
    },
    ingestor::{
        explorer::ExplorerApi,
        pager::{ScanLimits, scan_rewards},
        types::Hotspot,
    },
    settings::Settings,
};
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use std::{fmt, path::PathBuf};
use tabled::{Table, Tabled, settings::Style};
use tracing::{error, info, warn};

/// Subject of diagnostics that concern the run rather than one hotspot
const RUN_SUBJECT: &str = "(run)";

#[derive(Debug, Clone, PartialEq, Eq, Tabled)]
pub struct HotspotSummary {
    pub hotspot: String,
    pub pages: usize,
    pub transactions: usize,
    pub stopped: String,
    pub entries: usize,
}

/// Everything a report run produced
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub window: ReportWindow,
    pub hotspots: Vec<HotspotSummary>,
    pub payments: Vec<PaymentRecord>,
    pub merged_payments: Vec<PaymentRecord>,
    pub deferred_payments: Vec<PaymentRecord>,
    pub merged_deferred_payments: Vec<PaymentRecord>,
    /// Registry state at the end of the run
    pub entries: Vec<OwnershipEntry>,
    pub diagnostics: Diagnostics,
    pub artifacts: Vec<PathBuf>,
}

impl RunSummary {
    pub fn total_payable(&self) -> Decimal {
        self.payments.iter().map(|p| p.amount).sum()
    }

    pub fn total_deferred(&self) -> Decimal {
        self.deferred_payments.iter().map(|p| p.amount).sum()
    }
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Report window {}", self.window)?;
        writeln!(
            f,
            "Hotspots:\n{}",
            Table::new(&self.hotspots).with(Style::psql().remove_horizontals())
        )?;
        writeln!(
            f,
            "Payments ({} merged, total {}):\n{}",
            self.merged_payments.len(),
            money::to_fixed(self.total_payable()),
            Table::new(&self.merged_payments).with(Style::psql().remove_horizontals())
        )?;
        writeln!(
            f,
            "Deferred payments ({} merged, total {}):\n{}",
            self.merged_deferred_payments.len(),
            money::to_fixed(self.total_deferred()),
            Table::new(&self.merged_deferred_payments).with(Style::psql().remove_horizontals())
        )?;
        if !self.diagnostics.is_empty() {
            writeln!(
                f,
                "Diagnostics:\n{}",
                Table::new(self.diagnostics.as_slice()).with(Style::psql().remove_horizontals())
            )?;
        }
        Ok(())
    }
}

/// Load the ownership configuration, or start empty when none is configured
pub fn load_registry(settings: &Settings, run_start: DateTime<Utc>) -> Result<OwnershipRegistry> {
    match &settings.report.hosts_file {
        Some(path) => OwnershipRegistry::load(path, run_start)
            .with_context(|| format!("Failed to load hosts file {}", path.display())),
        None => {
            warn!("No hosts file configured; every hotspot gets a default entry");
            Ok(OwnershipRegistry::new())
        }
    }
}

/// Hotspots of the configured wallet, capped at `limits.max_hotspots`
pub async fn owned_hotspots<A>(api: &A, settings: &Settings) -> Result<Vec<Hotspot>>
where
    A: ExplorerApi + ?Sized,
{
    let wallet = &settings.report.wallet_address;
    let mut hotspots = api
        .account_hotspots(wallet)
        .await
        .with_context(|| format!("Failed to fetch hotspots owned by {wallet}"))?;
    info!("Hotspots owned by {wallet}: {}", hotspots.len());

    apply_hotspot_limit(&mut hotspots, settings.limits.max_hotspots);
    Ok(hotspots)
}

fn apply_hotspot_limit<T>(hotspots: &mut Vec<T>, max_hotspots: usize) {
    if hotspots.len() > max_hotspots {
        warn!(
            "Reached hotspot limit ({max_hotspots}); skipping {} hotspots",
            hotspots.len() - max_hotspots
        );
        hotspots.truncate(max_hotspots);
    }
}

/// Produce the host payments report for one wallet and window
///
/// Hotspots are processed one at a time. A failed page fetch abandons only
/// that hotspot: rewards already attributed from it stay in the registry,
/// but it gets no rewards CSV, earnings rows or payments.
pub async fn run_report<A>(
    api: &A,
    settings: &Settings,
    registry: OwnershipRegistry,
    run_start: DateTime<Utc>,
) -> Result<RunSummary>
where
    A: ExplorerApi + ?Sized,
{
    let window = settings.window()?;
    let web_url = settings.explorer.web_url.as_str();
    let limits = ScanLimits::from(&settings.limits);
    let names = ArtifactNames::new(&window, run_start);
    let writer = ArtifactWriter::new(&settings.output.dir)
        .with_context(|| format!("Failed to create {}", settings.output.dir.display()))?;

    let mut diagnostics = Diagnostics::new();
    diagnostics.extend(registry.overlapping_entries());

    let memo = PaymentMemo::new(&settings.report.memo);
    if memo.was_truncated() {
        diagnostics.push(Diagnostic::new(
            DiagnosticKind::MemoTruncated,
            RUN_SUBJECT,
            format!(
                "memo '{}' is longer than 8 bytes; using '{}'",
                settings.report.memo,
                memo.text()
            ),
        ));
    }
    info!("Payment memo: {} ({})", memo.text(), memo.encoded());
    let allocator = PaymentAllocator::new(settings.report.payment_minimum, memo);

    let hotspots = owned_hotspots(api, settings).await?;

    let mut accumulator = RewardAccumulator::new(registry, window, run_start);
    let mut artifacts = vec![];
    let mut summaries = vec![];
    let mut earnings = vec![];
    let mut payments = vec![];
    let mut deferred_payments = vec![];

    for (index, hotspot) in hotspots.iter().enumerate() {
        info!(
            "Requesting reward transactions for hotspot {}/{}: {} ({})",
            index + 1,
            hotspots.len(),
            hotspot.name,
            hotspot.address
        );

        let mut rewards = vec![];
        let scan = scan_rewards(api, &hotspot.address, window.start(), limits, |transaction| {
            rewards.extend(RewardRow::from_transaction(transaction));
            accumulator.attribute_transaction(hotspot, transaction);
        })
        .await;
        diagnostics.extend(accumulator.take_diagnostics());

        let outcome = match scan {
            Ok(outcome) => outcome,
            Err(err) => {
                record_fetch_failure(&mut diagnostics, hotspot, &err);
                continue;
            }
        };

        artifacts.push(writer.write_csv(
            &names.rewards(hotspot),
            &REWARD_HEADERS,
            &rewards,
            "hotspot reward transactions",
        )?);

        let ids = accumulator.registry().entries_for(&hotspot.address).to_vec();
        for id in &ids {
            let entry = accumulator.registry_mut().get_mut(*id);
            check_entry(&mut diagnostics, hotspot, entry);

            let allocation = allocator.allocate(entry);
            allocation.record_on(entry);

            if let Some(payment) = allocation.payment {
                if allocation.below_minimum {
                    diagnostics.push(Diagnostic::new(
                        DiagnosticKind::BelowMinimum,
                        hotspot.name.clone(),
                        format!(
                            "host earnings for {} ({}) are below the payment minimum ({}); deferred",
                            entry.host_name,
                            money::to_fixed(allocation.host_earnings),
                            allocator.minimum()
                        ),
                    ));
                }
                match payment {
                    Payment::Payable(record) => payments.push(record),
                    Payment::Deferred(record) => deferred_payments.push(record),
                }
            }

            earnings.push(EarningsRow::new(&window, &hotspot.name, entry, web_url));
        }

        summaries.push(HotspotSummary {
            hotspot: hotspot.name.clone(),
            pages: outcome.pages,
            transactions: outcome.transactions,
            stopped: outcome.stop.to_string(),
            entries: ids.len(),
        });
    }

    info!("Payments: {}", payments.len());
    artifacts.push(writer.write_json(&names.payments(), &payments, "host payments")?);
    let merged_payments = merger::merge(&payments);
    if merged_payments.len() != payments.len() {
        info!("Merged payments: {}", merged_payments.len());
        artifacts.push(writer.write_json(
            &names.payments_merged(),
            &merged_payments,
            "merged host payments",
        )?);
    }

    info!("Deferred payments: {}", deferred_payments.len());
    artifacts.push(writer.write_json(
        &names.deferred_payments(),
        &deferred_payments,
        "deferred host payments",
    )?);
    let merged_deferred_payments = merger::merge(&deferred_payments);
    if merged_deferred_payments.len() != deferred_payments.len() {
        info!("Merged deferred payments: {}", merged_deferred_payments.len());
        artifacts.push(writer.write_json(
            &names.deferred_payments_merged(),
            &merged_deferred_payments,
            "merged deferred host payments",
        )?);
    }

    artifacts.push(writer.write_csv(
        &names.earnings(),
        &EARNINGS_HEADERS,
        &earnings,
        "host earnings report",
    )?);

    let registry = accumulator.into_registry();
    artifacts.push(writer.write_json(
        &names.hosts_snapshot(),
        registry.entries(),
        "hotspot host data",
    )?);
    artifacts.push(writer.write_json(&names.diagnostics(), &diagnostics, "diagnostics")?);

    Ok(RunSummary {
        window,
        hotspots: summaries,
        payments,
        merged_payments,
        deferred_payments,
        merged_deferred_payments,
        entries: registry.entries().to_vec(),
        diagnostics,
        artifacts,
    })
}

/// Export every owned hotspot's reward feed back to `since`, without payments
pub async fn export_rewards<A>(
    api: &A,
    settings: &Settings,
    since: DateTime<Utc>,
    run_start: DateTime<Utc>,
) -> Result<Vec<PathBuf>>
where
    A: ExplorerApi + ?Sized,
{
    let limits = ScanLimits::from(&settings.limits);
    let names = ArtifactNames::unbounded(run_start);
    let writer = ArtifactWriter::new(&settings.output.dir)
        .with_context(|| format!("Failed to create {}", settings.output.dir.display()))?;

    let mut artifacts = vec![];
    for hotspot in owned_hotspots(api, settings).await? {
        let mut rewards = vec![];
        let scan = scan_rewards(api, &hotspot.address, since, limits, |transaction| {
            rewards.extend(RewardRow::from_transaction(transaction));
        })
        .await;

        // Whatever was read before a failure is still worth keeping here
        if let Err(err) = &scan {
            error!("Exporting rewards for hotspot {}: {err}", hotspot.name);
        }
        artifacts.push(writer.write_csv(
            &names.hotspot_rewards(&hotspot),
            &REWARD_HEADERS,
            &rewards,
            "hotspot reward transactions",
        )?);
    }
    Ok(artifacts)
}

/// Append the status of every owned hotspot to the wallet's status log
pub async fn export_status<A>(
    api: &A,
    settings: &Settings,
    run_start: DateTime<Utc>,
) -> Result<PathBuf>
where
    A: ExplorerApi + ?Sized,
{
    let wallet = &settings.report.wallet_address;
    let mut statuses = api
        .account_hotspot_statuses(wallet)
        .await
        .with_context(|| format!("Failed to fetch hotspots owned by {wallet}"))?;
    apply_hotspot_limit(&mut statuses, settings.limits.max_hotspots);

    let rows = statuses
        .iter()
        .map(|status| HotspotStatusRow::new(run_start, status))
        .collect::<Vec<_>>();
    let writer = ArtifactWriter::new(&settings.output.dir)
        .with_context(|| format!("Failed to create {}", settings.output.dir.display()))?;
    let path = writer.extend_csv(
        &ArtifactNames::hotspot_status(wallet),
        &HOTSPOT_STATUS_HEADERS,
        &rows,
        "hotspot status",
    )?;
    info!("Exported {} hotspot status rows", rows.len());
    Ok(path)
}

fn record_fetch_failure(diagnostics: &mut Diagnostics, hotspot: &Hotspot, err: &ReportError) {
    error!("Retrieving transactions for hotspot {}: {err}", hotspot.name);
    if matches!(err.status().map(|s| s.as_u16()), Some(503 | 504)) {
        info!(
            "503 and 504 errors indicate that the explorer API may be overloaded; try again at an off-peak time or use a different endpoint"
        );
    }
    diagnostics.push(Diagnostic::new(
        DiagnosticKind::FetchFailed,
        hotspot.name.clone(),
        format!("{err}; earnings accumulated before the failure are kept"),
    ));
}

/// Configuration checks raised once per entry of a processed hotspot
fn check_entry(diagnostics: &mut Diagnostics, hotspot: &Hotspot, entry: &OwnershipEntry) {
    if entry.hotspot_name != hotspot.name {
        diagnostics.push(Diagnostic::new(
            DiagnosticKind::HotspotNameMismatch,
            hotspot.name.clone(),
            format!(
                "configured name '{}' does not match the hotspot name",
                entry.hotspot_name
            ),
        ));
    }

    match entry.host_wallet.as_deref() {
        None => diagnostics.push(Diagnostic::new(
            DiagnosticKind::MissingWallet,
            hotspot.name.clone(),
            format!(
                "no wallet for host {}; any payment is deferred",
                entry.host_name
            ),
        )),
        Some(wallet) if !entry.has_valid_wallet() => diagnostics.push(Diagnostic::new(
            DiagnosticKind::InvalidWallet,
            hotspot.name.clone(),
            format!(
                "wallet '{wallet}' of host {} is not {WALLET_ADDRESS_LEN} characters; any payment is deferred",
                entry.host_name
            ),
        )),
        Some(_) => {}
    }
}
