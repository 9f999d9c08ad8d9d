use crate::{
    calculator::{
        diagnostics::{Diagnostic, DiagnosticKind},
        money,
        window::{iso, iso_serde, parse_iso8601},
    },
    error::{ReportError, Result},
    ingestor::types::Hotspot,
};
use chrono::{DateTime, Months, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::{collections::HashMap, fs, path::Path};
use tracing::info;

/// Exact length of a valid wallet address
pub const WALLET_ADDRESS_LEN: usize = 51;

/// Placeholder used for hosts of auto-created entries
pub const UNKNOWN_HOST: &str = "unknown";

/// Open-ended ownership periods end this long after the run started
const FOREVER_MONTHS: u32 = 100 * 12;

/// One host's claim on a hotspot's earnings for `[valid_from, valid_to)`
///
/// Field names follow the ownership configuration file so the end-of-run
/// snapshot can be fed back in as configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OwnershipEntry {
    #[serde(rename = "name")]
    pub hotspot_name: String,
    #[serde(rename = "address")]
    pub hotspot_address: String,
    pub gross_share: Decimal,
    pub net_share: Decimal,
    pub host_name: String,
    #[serde(default)]
    pub host_wallet: Option<String>,
    #[serde(rename = "fromDatetimeISO", with = "iso_serde")]
    pub valid_from: DateTime<Utc>,
    #[serde(rename = "toDatetimeISO", with = "iso_serde")]
    pub valid_to: DateTime<Utc>,
    #[serde(with = "money::fixed")]
    pub gross_earnings: Decimal,
    #[serde(default, with = "money::fixed_opt", skip_serializing_if = "Option::is_none")]
    pub net_earnings: Option<Decimal>,
    #[serde(default, with = "money::fixed_opt", skip_serializing_if = "Option::is_none")]
    pub host_earnings: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub host_wallet_validated: Option<bool>,
}

impl OwnershipEntry {
    /// Entry registered for a hotspot with no covering configuration
    pub fn default_for(hotspot: &Hotspot, run_start: DateTime<Utc>) -> Self {
        Self {
            hotspot_name: hotspot.name.clone(),
            hotspot_address: hotspot.address.clone(),
            gross_share: Decimal::ZERO,
            net_share: Decimal::ZERO,
            host_name: UNKNOWN_HOST.to_string(),
            host_wallet: None,
            valid_from: DateTime::UNIX_EPOCH,
            valid_to: far_future(run_start),
            gross_earnings: Decimal::ZERO,
            net_earnings: None,
            host_earnings: None,
            host_wallet_validated: None,
        }
    }

    pub fn covers(&self, time: DateTime<Utc>) -> bool {
        self.valid_from <= time && time < self.valid_to
    }

    pub fn overlaps(&self, other: &OwnershipEntry) -> bool {
        self.hotspot_address == other.hotspot_address
            && self.valid_from < other.valid_to
            && other.valid_from < self.valid_to
    }

    /// Length check only; a malformed 51-character string still passes
    pub fn has_valid_wallet(&self) -> bool {
        self.host_wallet
            .as_deref()
            .is_some_and(|wallet| wallet.chars().count() == WALLET_ADDRESS_LEN)
    }
}

/// Ownership configuration record as written by hand
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HostRecord {
    pub name: String,
    pub address: String,
    pub gross_share: Decimal,
    pub net_share: Decimal,
    pub host_name: String,
    #[serde(default)]
    pub host_wallet: Option<String>,
    #[serde(default, rename = "fromDatetimeISO")]
    pub from_datetime_iso: Option<String>,
    #[serde(default, rename = "toDatetimeISO")]
    pub to_datetime_iso: Option<String>,
}

impl HostRecord {
    /// Resolve defaults; earnings start at zero whatever the record held
    pub fn into_entry(self, run_start: DateTime<Utc>) -> Result<OwnershipEntry> {
        for (label, share) in [("grossShare", self.gross_share), ("netShare", self.net_share)] {
            if share < Decimal::ZERO || share > Decimal::ONE {
                return Err(ReportError::HostsConfig(format!(
                    "{label} for {} ({}) must be between 0 and 1, got {share}",
                    self.name, self.host_name
                )));
            }
        }

        let valid_from = match self.from_datetime_iso.as_deref() {
            Some(value) => parse_iso8601(value)?,
            None => DateTime::UNIX_EPOCH,
        };
        let valid_to = match self.to_datetime_iso.as_deref() {
            Some(value) => parse_iso8601(value)?,
            None => far_future(run_start),
        };

        Ok(OwnershipEntry {
            hotspot_name: self.name,
            hotspot_address: self.address,
            gross_share: self.gross_share,
            net_share: self.net_share,
            host_name: self.host_name,
            host_wallet: self.host_wallet,
            valid_from,
            valid_to,
            gross_earnings: Decimal::ZERO,
            net_earnings: None,
            host_earnings: None,
            host_wallet_validated: None,
        })
    }
}

/// Position of an entry in the registry, stable for the whole run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntryId(usize);

/// Ownership entries for one report run, in registration order
#[derive(Debug, Clone, Default)]
pub struct OwnershipRegistry {
    entries: Vec<OwnershipEntry>,
    by_hotspot: HashMap<String, Vec<EntryId>>,
}

impl OwnershipRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_entries(entries: impl IntoIterator<Item = OwnershipEntry>) -> Self {
        let mut registry = Self::new();
        for entry in entries {
            registry.add_entry(entry);
        }
        registry
    }

    pub fn from_records(
        records: impl IntoIterator<Item = HostRecord>,
        run_start: DateTime<Utc>,
    ) -> Result<Self> {
        let entries = records
            .into_iter()
            .map(|record| record.into_entry(run_start))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self::from_entries(entries))
    }

    /// Load the ownership configuration JSON array
    pub fn load(path: &Path, run_start: DateTime<Utc>) -> Result<Self> {
        let contents = fs::read_to_string(path).map_err(|e| {
            ReportError::HostsConfig(format!("failed to read {}: {e}", path.display()))
        })?;
        let records: Vec<HostRecord> = serde_json::from_str(&contents).map_err(|e| {
            ReportError::HostsConfig(format!("failed to parse {}: {e}", path.display()))
        })?;
        let registry = Self::from_records(records, run_start)?;
        info!(
            "Loaded {} hotspot host entries from {}",
            registry.len(),
            path.display()
        );
        Ok(registry)
    }

    /// Append an entry; it is matched after every entry registered before it
    pub fn add_entry(&mut self, entry: OwnershipEntry) -> EntryId {
        let id = EntryId(self.entries.len());
        self.by_hotspot
            .entry(entry.hotspot_address.clone())
            .or_default()
            .push(id);
        self.entries.push(entry);
        id
    }

    /// Entries for `hotspot_address` whose period contains `time`, in registration order
    pub fn find_matching_entries(&self, hotspot_address: &str, time: DateTime<Utc>) -> Vec<EntryId> {
        self.entries_for(hotspot_address)
            .iter()
            .copied()
            .filter(|id| self.entries[id.0].covers(time))
            .collect()
    }

    /// Every entry registered for `hotspot_address`, in registration order
    pub fn entries_for(&self, hotspot_address: &str) -> &[EntryId] {
        self.by_hotspot
            .get(hotspot_address)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    pub fn get(&self, id: EntryId) -> &OwnershipEntry {
        &self.entries[id.0]
    }

    pub fn get_mut(&mut self, id: EntryId) -> &mut OwnershipEntry {
        &mut self.entries[id.0]
    }

    pub fn entries(&self) -> &[OwnershipEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Report every pair of entries for the same hotspot with intersecting periods
    pub fn overlapping_entries(&self) -> Vec<Diagnostic> {
        let mut diagnostics = vec![];
        for ids in self.by_hotspot.values() {
            for (i, a) in ids.iter().enumerate() {
                for b in &ids[i + 1..] {
                    let (first, second) = (self.get(*a), self.get(*b));
                    if first.overlaps(second) {
                        diagnostics.push(Diagnostic::new(
                            DiagnosticKind::OverlappingEntries,
                            first.hotspot_name.clone(),
                            format!(
                                "{} [{}, {}) overlaps {} [{}, {}); rewards go to {}",
                                first.host_name,
                                iso(&first.valid_from),
                                iso(&first.valid_to),
                                second.host_name,
                                iso(&second.valid_from),
                                iso(&second.valid_to),
                                first.host_name,
                            ),
                        ));
                    }
                }
            }
        }
        // HashMap iteration order is arbitrary
        diagnostics.sort_by(|a, b| a.hotspot.cmp(&b.hotspot).then(a.detail.cmp(&b.detail)));
        diagnostics
    }
}

fn far_future(run_start: DateTime<Utc>) -> DateTime<Utc> {
    run_start
        .checked_add_months(Months::new(FOREVER_MONTHS))
        .unwrap_or(DateTime::<Utc>::MAX_UTC)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rust_decimal::dec;

    const HOTSPOT: &str = "11TpYdBXWfg88Nm28XBDJeomKTkVjURfUMcaHu6ZDF5sfm8u6Kk";

    fn run_start() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2021, 11, 13, 0, 0, 0).unwrap()
    }

    fn record(host: &str, from: Option<&str>, to: Option<&str>) -> HostRecord {
        HostRecord {
            name: "cheerful-fern-shrimp".to_string(),
            address: HOTSPOT.to_string(),
            gross_share: dec!(0.78),
            net_share: dec!(0.25),
            host_name: host.to_string(),
            host_wallet: None,
            from_datetime_iso: from.map(str::to_string),
            to_datetime_iso: to.map(str::to_string),
        }
    }

    #[test]
    fn test_defaults_for_missing_period() {
        let entry = record("Bob", None, None).into_entry(run_start()).unwrap();
        assert_eq!(entry.valid_from, DateTime::UNIX_EPOCH);
        assert_eq!(
            entry.valid_to,
            Utc.with_ymd_and_hms(2121, 11, 13, 0, 0, 0).unwrap()
        );
        assert_eq!(entry.gross_earnings, Decimal::ZERO);
    }

    #[test]
    fn test_share_out_of_range() {
        let mut bad = record("Bob", None, None);
        bad.net_share = dec!(1.25);
        assert!(matches!(
            bad.into_entry(run_start()),
            Err(ReportError::HostsConfig(_))
        ));
    }

    #[test]
    fn test_find_matching_entries_by_period() {
        let registry = OwnershipRegistry::from_records(
            [
                record("Bob", Some("2019-01-01T00:00:00.000Z"), Some("2020-01-01T00:00:00.000Z")),
                record("Barbara", Some("2020-01-01T00:00:00.000Z"), Some("2099-01-01T00:00:00.000Z")),
            ],
            run_start(),
        )
        .unwrap();

        let in_2019 = Utc.with_ymd_and_hms(2019, 6, 1, 0, 0, 0).unwrap();
        let boundary = Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap();

        let matches = registry.find_matching_entries(HOTSPOT, in_2019);
        assert_eq!(matches.len(), 1);
        assert_eq!(registry.get(matches[0]).host_name, "Bob");

        // `to` is exclusive, `from` inclusive
        let matches = registry.find_matching_entries(HOTSPOT, boundary);
        assert_eq!(matches.len(), 1);
        assert_eq!(registry.get(matches[0]).host_name, "Barbara");

        assert!(registry.find_matching_entries("other", in_2019).is_empty());
    }

    #[test]
    fn test_matches_in_registration_order() {
        let mut registry = OwnershipRegistry::new();
        let first = registry.add_entry(record("Alice", None, None).into_entry(run_start()).unwrap());
        let second = registry.add_entry(record("Claire", None, None).into_entry(run_start()).unwrap());

        let time = Utc.with_ymd_and_hms(2021, 10, 5, 0, 0, 0).unwrap();
        assert_eq!(registry.find_matching_entries(HOTSPOT, time), vec![first, second]);
    }

    #[test]
    fn test_overlap_detection() {
        let registry = OwnershipRegistry::from_records(
            [
                record("Bob", Some("2019-01-01T00:00:00Z"), Some("2020-06-01T00:00:00Z")),
                record("Barbara", Some("2020-01-01T00:00:00Z"), None),
            ],
            run_start(),
        )
        .unwrap();

        let overlaps = registry.overlapping_entries();
        assert_eq!(overlaps.len(), 1);
        assert_eq!(overlaps[0].kind, DiagnosticKind::OverlappingEntries);

        // Adjacent half-open periods do not overlap
        let registry = OwnershipRegistry::from_records(
            [
                record("Bob", Some("2019-01-01T00:00:00Z"), Some("2020-01-01T00:00:00Z")),
                record("Barbara", Some("2020-01-01T00:00:00Z"), None),
            ],
            run_start(),
        )
        .unwrap();
        assert!(registry.overlapping_entries().is_empty());
    }

    #[test]
    fn test_wallet_length_check() {
        let mut entry = record("Alice", None, None).into_entry(run_start()).unwrap();
        assert!(!entry.has_valid_wallet());

        entry.host_wallet = Some("Alice's Wallet Address".to_string());
        assert!(!entry.has_valid_wallet());

        entry.host_wallet = Some("13shErS29gws7ikVxkb4s13PZ6sQLSY63xRKP8DEBww2qWFhUu5".to_string());
        assert!(entry.has_valid_wallet());

        // Necessary, not sufficient
        entry.host_wallet = Some("x".repeat(WALLET_ADDRESS_LEN));
        assert!(entry.has_valid_wallet());
    }

    #[test]
    fn test_snapshot_round_trips_as_configuration() {
        let mut entry = record("Bob", Some("2019-01-01T00:00:00.000Z"), None)
            .into_entry(run_start())
            .unwrap();
        entry.gross_earnings = dec!(12.5);

        let json = serde_json::to_value(&entry).unwrap();
        assert_eq!(json["grossEarnings"], "12.50000000");
        assert_eq!(json["fromDatetimeISO"], "2019-01-01T00:00:00.000Z");
        assert!(json.get("hostEarnings").is_none());

        // The snapshot also reads back as entries, computed figures included
        let mut allocated = entry.clone();
        allocated.net_earnings = Some(dec!(9.75));
        allocated.host_earnings = Some(dec!(2.4375));
        let snapshot = serde_json::to_string(&allocated).unwrap();
        let restored: OwnershipEntry = serde_json::from_str(&snapshot).unwrap();
        assert_eq!(restored.gross_earnings, dec!(12.5));
        assert_eq!(restored.net_earnings, Some(dec!(9.75)));
        assert_eq!(restored.host_earnings, Some(dec!(2.4375)));
        assert_eq!(restored.valid_to, entry.valid_to);

        // Reloading resets the accumulator
        let reloaded: HostRecord = serde_json::from_value(json).unwrap();
        let reloaded = reloaded.into_entry(run_start()).unwrap();
        assert_eq!(reloaded.gross_earnings, Decimal::ZERO);
        assert_eq!(reloaded.valid_from, entry.valid_from);
        assert_eq!(reloaded.valid_to, entry.valid_to);
    }
}
