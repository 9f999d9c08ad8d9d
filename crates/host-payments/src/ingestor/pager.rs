use crate::{
    error::Result,
    ingestor::{explorer::ExplorerApi, types::RewardTransaction},
    settings::LimitSettings,
};
use chrono::{DateTime, Utc};
use std::fmt;
use tracing::{debug, info};

/// Bounds on how far back a hotspot's activity feed is read
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScanLimits {
    /// Transactions in blocks below this height end the scan
    pub lowest_block: u64,
    /// Pages fetched before giving up, even if more remain
    pub max_pages: usize,
    /// Transactions requested per page
    pub page_size: usize,
}

impl From<&LimitSettings> for ScanLimits {
    fn from(limits: &LimitSettings) -> Self {
        Self {
            lowest_block: limits.lowest_block,
            max_pages: limits.max_transaction_pages,
            page_size: limits.page_size,
        }
    }
}

/// Why a scan stopped fetching pages
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// The API reported no further pages
    Exhausted,
    /// A transaction older than the earliest time of interest was reached
    BeforeEarliest,
    /// A transaction below the lowest block was reached
    BelowLowestBlock,
    /// The page cap was hit
    PageLimit,
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let reason = match self {
            Self::Exhausted => "no more pages",
            Self::BeforeEarliest => "reached report start",
            Self::BelowLowestBlock => "reached lowest block",
            Self::PageLimit => "reached page limit",
        };
        f.write_str(reason)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScanOutcome {
    pub pages: usize,
    /// Transactions handed to the visitor
    pub transactions: usize,
    pub stop: StopReason,
}

/// Walk a hotspot's reward transactions newest first, handing each one to `visit`
///
/// The feed is ordered newest first, so the first transaction older than
/// `earliest` or below `limits.lowest_block` ends the scan; neither it nor
/// anything after it is visited. Transactions newer than the report window
/// are still visited. A fetch error aborts the scan; transactions visited
/// before it stay visited.
pub async fn scan_rewards<A, F>(
    api: &A,
    hotspot_address: &str,
    earliest: DateTime<Utc>,
    limits: ScanLimits,
    mut visit: F,
) -> Result<ScanOutcome>
where
    A: ExplorerApi + ?Sized,
    F: FnMut(&RewardTransaction),
{
    let mut cursor: Option<String> = None;
    let mut pages = 0;
    let mut transactions = 0;

    let stop = loop {
        let page = api
            .reward_transactions(hotspot_address, cursor.take(), limits.page_size)
            .await?;
        pages += 1;
        debug!(
            "Processing reward transactions (page {pages}): {}",
            page.len()
        );

        let mut cutoff = None;
        for transaction in &page.transactions {
            if transaction.time < earliest {
                cutoff = Some(StopReason::BeforeEarliest);
                break;
            }
            if transaction.height < limits.lowest_block {
                cutoff = Some(StopReason::BelowLowestBlock);
                break;
            }
            visit(transaction);
            transactions += 1;
        }

        if let Some(reason) = cutoff {
            break reason;
        }
        if !page.has_more() {
            break StopReason::Exhausted;
        }
        if pages >= limits.max_pages {
            break StopReason::PageLimit;
        }
        cursor = page.cursor;
    };

    info!("Scanned {transactions} reward transactions in {pages} pages for {hotspot_address}: {stop}");
    Ok(ScanOutcome {
        pages,
        transactions,
        stop,
    })
}
