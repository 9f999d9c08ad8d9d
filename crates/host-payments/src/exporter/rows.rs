use crate::{
    calculator::{
        money,
        registry::OwnershipEntry,
        window::{ReportWindow, iso},
    },
    ingestor::types::{HotspotStatus, OraclePrice, Reward, RewardTransaction},
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

pub const REWARD_HEADERS: [&str; 6] = [
    "Date",
    "Received Quantity",
    "Received Currency",
    "Reward Type",
    "Block",
    "Hash",
];

pub const EARNINGS_HEADERS: [&str; 12] = [
    "Period Start Time UTC",
    "Period End Time UTC",
    "Hotspot Name",
    "Hotspot URL",
    "Host Name",
    "Host Wallet",
    "Host Wallet URL",
    "Gross Split",
    "Net Split",
    "Period Gross Earnings",
    "Period Net Earnings",
    "Period Host Share",
];

pub const ORACLE_PRICE_HEADERS: [&str; 2] = ["Block Height", "Price"];

pub const HOTSPOT_STATUS_HEADERS: [&str; 13] = [
    "Date (UTC)",
    "Time (UTC)",
    "Name",
    "Online",
    "Height",
    "Block",
    "LastPocChallenge",
    "LastChangeBlock",
    "BlockAdded",
    "RewardScale",
    "Gain",
    "Elevation",
    "Address",
];

/// One reward of a hotspot's activity feed
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RewardRow {
    #[serde(rename = "Date")]
    pub date: String,
    #[serde(rename = "Received Quantity")]
    pub quantity: Option<String>,
    #[serde(rename = "Received Currency")]
    pub currency: Option<String>,
    #[serde(rename = "Reward Type")]
    pub reward_type: String,
    #[serde(rename = "Block")]
    pub block: u64,
    #[serde(rename = "Hash")]
    pub hash: String,
}

impl RewardRow {
    /// Missing amounts and currencies become empty cells
    pub fn new(transaction: &RewardTransaction, reward: &Reward) -> Self {
        Self {
            date: iso(&transaction.time),
            quantity: reward.amount.as_ref().map(|a| money::to_fixed(a.value)),
            currency: reward.amount.as_ref().and_then(|a| a.currency.clone()),
            reward_type: reward.reward_type.clone(),
            block: transaction.height,
            hash: transaction.hash.clone(),
        }
    }

    /// One row per reward, in feed order
    pub fn from_transaction(transaction: &RewardTransaction) -> Vec<Self> {
        transaction
            .rewards
            .iter()
            .map(|reward| Self::new(transaction, reward))
            .collect()
    }
}

/// One ownership entry's share of the period's earnings
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EarningsRow {
    #[serde(rename = "Period Start Time UTC")]
    pub period_start: String,
    #[serde(rename = "Period End Time UTC")]
    pub period_end: String,
    #[serde(rename = "Hotspot Name")]
    pub hotspot_name: String,
    #[serde(rename = "Hotspot URL")]
    pub hotspot_url: String,
    #[serde(rename = "Host Name")]
    pub host_name: String,
    #[serde(rename = "Host Wallet")]
    pub host_wallet: Option<String>,
    #[serde(rename = "Host Wallet URL")]
    pub host_wallet_url: Option<String>,
    #[serde(rename = "Gross Split")]
    pub gross_share: String,
    #[serde(rename = "Net Split")]
    pub net_share: String,
    #[serde(rename = "Period Gross Earnings")]
    pub gross_earnings: String,
    #[serde(rename = "Period Net Earnings")]
    pub net_earnings: String,
    #[serde(rename = "Period Host Share")]
    pub host_earnings: String,
}

impl EarningsRow {
    /// `hotspot_name` is the explorer's name, which may differ from the entry's
    pub fn new(
        window: &ReportWindow,
        hotspot_name: &str,
        entry: &OwnershipEntry,
        web_url: &str,
    ) -> Self {
        let web_url = web_url.trim_end_matches('/');
        Self {
            period_start: iso(&window.start()),
            period_end: iso(&window.end()),
            hotspot_name: hotspot_name.to_string(),
            hotspot_url: format!("{web_url}/hotspots/{}", entry.hotspot_address),
            host_name: entry.host_name.clone(),
            host_wallet: entry.host_wallet.clone(),
            host_wallet_url: entry
                .host_wallet
                .as_ref()
                .map(|wallet| format!("{web_url}/accounts/{wallet}")),
            gross_share: entry.gross_share.normalize().to_string(),
            net_share: entry.net_share.normalize().to_string(),
            gross_earnings: money::to_fixed(entry.gross_earnings),
            net_earnings: money::to_fixed(entry.net_earnings.unwrap_or_default()),
            host_earnings: money::to_fixed(entry.host_earnings.unwrap_or_default()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OraclePriceRow {
    #[serde(rename = "Block Height")]
    pub block: u64,
    #[serde(rename = "Price")]
    pub price: String,
}

impl From<&OraclePrice> for OraclePriceRow {
    fn from(price: &OraclePrice) -> Self {
        Self {
            block: price.block,
            price: money::to_fixed(price.price),
        }
    }
}

/// One hotspot's status, stamped with the time of the export
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HotspotStatusRow {
    #[serde(rename = "Date (UTC)")]
    pub date: String,
    #[serde(rename = "Time (UTC)")]
    pub time: String,
    #[serde(rename = "Name")]
    pub name: String,
    #[serde(rename = "Online")]
    pub online: Option<String>,
    #[serde(rename = "Height")]
    pub height: Option<u64>,
    #[serde(rename = "Block")]
    pub block: Option<u64>,
    #[serde(rename = "LastPocChallenge")]
    pub last_poc_challenge: Option<u64>,
    #[serde(rename = "LastChangeBlock")]
    pub last_change_block: Option<u64>,
    #[serde(rename = "BlockAdded")]
    pub block_added: Option<u64>,
    #[serde(rename = "RewardScale")]
    pub reward_scale: Option<Decimal>,
    #[serde(rename = "Gain")]
    pub gain: Option<i64>,
    #[serde(rename = "Elevation")]
    pub elevation: Option<i64>,
    #[serde(rename = "Address")]
    pub address: String,
}

impl HotspotStatusRow {
    pub fn new(exported_at: DateTime<Utc>, status: &HotspotStatus) -> Self {
        Self {
            date: exported_at.format("%Y-%m-%d").to_string(),
            time: exported_at.format("%H:%M:%S%.3f").to_string(),
            name: status.name.clone(),
            online: status.online.clone(),
            height: status.height,
            block: status.block,
            last_poc_challenge: status.last_poc_challenge,
            last_change_block: status.last_change_block,
            block_added: status.block_added,
            reward_scale: status.reward_scale,
            gain: status.gain,
            elevation: status.elevation,
            address: status.address.clone(),
        }
    }
}
