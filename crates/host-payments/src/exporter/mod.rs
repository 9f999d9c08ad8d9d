pub mod rows;

use crate::{calculator::window::ReportWindow, error::Result, ingestor::types::Hotspot};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::{
    fs::{OpenOptions, create_dir_all},
    io::Write,
    path::{Path, PathBuf},
};
use tracing::info;

/// Timestamp layout used in artifact names
const STAMP_FORMAT: &str = "%Y%m%d%H%M%S";

pub fn stamp(time: &DateTime<Utc>) -> String {
    time.format(STAMP_FORMAT).to_string()
}

/// File names for one run's artifacts
///
/// Every name carries the run start, and report artifacts also carry the
/// report window, so reruns never collide with earlier output.
#[derive(Debug, Clone)]
pub struct ArtifactNames {
    run: String,
    period: String,
}

impl ArtifactNames {
    pub fn new(window: &ReportWindow, run_start: DateTime<Utc>) -> Self {
        Self {
            run: stamp(&run_start),
            period: format!("{}-{}", stamp(&window.start()), stamp(&window.end())),
        }
    }

    /// Names for commands without a report window
    pub fn unbounded(run_start: DateTime<Utc>) -> Self {
        Self {
            run: stamp(&run_start),
            period: String::new(),
        }
    }

    pub fn rewards(&self, hotspot: &Hotspot) -> String {
        format!("Rewards_{}_{}_{}.csv", hotspot.name, hotspot.address, self.run)
    }

    pub fn hotspot_rewards(&self, hotspot: &Hotspot) -> String {
        format!("Hotspot_{}_{}_{}.csv", hotspot.name, hotspot.address, self.run)
    }

    pub fn earnings(&self) -> String {
        self.report_name("Earnings", "csv")
    }

    pub fn payments(&self) -> String {
        self.report_name("Payments", "json")
    }

    pub fn payments_merged(&self) -> String {
        self.report_name("PaymentsMerged", "json")
    }

    pub fn deferred_payments(&self) -> String {
        self.report_name("DeferredPayments", "json")
    }

    pub fn deferred_payments_merged(&self) -> String {
        self.report_name("DeferredPaymentsMerged", "json")
    }

    pub fn hosts_snapshot(&self) -> String {
        self.report_name("HotspotsHostsData", "json")
    }

    pub fn diagnostics(&self) -> String {
        self.report_name("Diagnostics", "json")
    }

    pub fn oracle_prices(&self) -> String {
        format!("OraclePrices_{}.csv", self.run)
    }

    /// Running log shared by every status export of a wallet
    pub fn hotspot_status(wallet_address: &str) -> String {
        format!("Hotspots_{wallet_address}_Status.csv")
    }

    fn report_name(&self, prefix: &str, extension: &str) -> String {
        format!("{prefix}_{}_{}.{extension}", self.period, self.run)
    }
}

/// Append-only writer for report artifacts
///
/// Artifacts are rendered in memory and appended in a single write, so an
/// existing file of the same name is extended, never truncated.
#[derive(Debug, Clone)]
pub struct ArtifactWriter {
    dir: PathBuf,
}

impl ArtifactWriter {
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn append(&self, name: &str, contents: &[u8], description: &str) -> Result<PathBuf> {
        let path = self.dir.join(name);
        info!("Exporting {description} to: {}", path.display());
        let mut file = OpenOptions::new().create(true).append(true).open(&path)?;
        file.write_all(contents)?;
        file.flush()?;
        Ok(path)
    }

    /// Header row first, even when there are no rows
    pub fn write_csv<T: Serialize>(
        &self,
        name: &str,
        headers: &[&str],
        rows: &[T],
        description: &str,
    ) -> Result<PathBuf> {
        self.append(name, &collection_to_csv(headers, rows)?, description)
    }

    /// Append rows to a CSV log; the header row is written only for a new file
    pub fn extend_csv<T: Serialize>(
        &self,
        name: &str,
        headers: &[&str],
        rows: &[T],
        description: &str,
    ) -> Result<PathBuf> {
        let contents = if self.dir.join(name).exists() {
            rows_to_csv(None, rows)?
        } else {
            rows_to_csv(Some(headers), rows)?
        };
        self.append(name, &contents, description)
    }

    pub fn write_json<T: Serialize + ?Sized>(
        &self,
        name: &str,
        data: &T,
        description: &str,
    ) -> Result<PathBuf> {
        self.append(name, &serde_json::to_vec_pretty(data)?, description)
    }
}

/// Render rows as CSV under an explicit header row
pub fn collection_to_csv<T: Serialize>(headers: &[&str], rows: &[T]) -> Result<Vec<u8>> {
    rows_to_csv(Some(headers), rows)
}

fn rows_to_csv<T: Serialize>(headers: Option<&[&str]>, rows: &[T]) -> Result<Vec<u8>> {
    let mut wtr = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(vec![]);
    if let Some(headers) = headers {
        wtr.write_record(headers)?;
    }
    for row in rows {
        wtr.serialize(row)?;
    }
    wtr.into_inner().map_err(|e| e.into_error().into())
}
