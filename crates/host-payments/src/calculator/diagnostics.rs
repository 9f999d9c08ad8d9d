use serde::{Deserialize, Serialize};
use std::fmt;
use tabled::Tabled;
use tracing::warn;

/// Data-quality anomalies raised during a run; none of them abort it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiagnosticKind {
    /// Reward without an amount, skipped
    MissingAmount,
    /// Reward amount without a currency, skipped
    MissingCurrency,
    /// More than one ownership entry covers a reward; only the first got it
    MultipleMatches,
    /// No ownership entry covered a reward; a default entry was registered
    DefaultEntryCreated,
    /// Two configured entries for the same hotspot have intersecting periods
    OverlappingEntries,
    /// Host wallet is not a 51-character address; payments are deferred
    InvalidWallet,
    /// Host wallet is not configured; payments are deferred
    MissingWallet,
    /// Host earnings are under the payment minimum; payment is deferred
    BelowMinimum,
    /// Configured hotspot name differs from the explorer's name
    HotspotNameMismatch,
    /// Payment memo was longer than 8 bytes
    MemoTruncated,
    /// Transaction pages for a hotspot could not be fetched
    FetchFailed,
}

impl fmt::Display for DiagnosticKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::MissingAmount => "missing-amount",
            Self::MissingCurrency => "missing-currency",
            Self::MultipleMatches => "multiple-matches",
            Self::DefaultEntryCreated => "default-entry-created",
            Self::OverlappingEntries => "overlapping-entries",
            Self::InvalidWallet => "invalid-wallet",
            Self::MissingWallet => "missing-wallet",
            Self::BelowMinimum => "below-minimum",
            Self::HotspotNameMismatch => "hotspot-name-mismatch",
            Self::MemoTruncated => "memo-truncated",
            Self::FetchFailed => "fetch-failed",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Tabled)]
pub struct Diagnostic {
    pub kind: DiagnosticKind,
    pub hotspot: String,
    pub detail: String,
}

impl Diagnostic {
    pub fn new(kind: DiagnosticKind, hotspot: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            kind,
            hotspot: hotspot.into(),
            detail: detail.into(),
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}: {}", self.kind, self.hotspot, self.detail)
    }
}

/// Ordered list of anomalies, logged as they are recorded
#[derive(Debug, Clone, Default, Serialize)]
#[serde(transparent)]
pub struct Diagnostics(Vec<Diagnostic>);

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, diagnostic: Diagnostic) {
        warn!("{diagnostic}");
        self.0.push(diagnostic);
    }

    pub fn extend(&mut self, diagnostics: impl IntoIterator<Item = Diagnostic>) {
        for diagnostic in diagnostics {
            self.push(diagnostic);
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.0.iter()
    }

    pub fn count(&self, kind: DiagnosticKind) -> usize {
        self.0.iter().filter(|d| d.kind == kind).count()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_slice(&self) -> &[Diagnostic] {
        &self.0
    }
}
