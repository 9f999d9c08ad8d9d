use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Ticker of the network's native currency
pub const NATIVE_TICKER: &str = "HNT";

/// Transaction types carrying hotspot rewards
pub const REWARD_TRANSACTION_TYPES: [&str; 2] = ["rewards_v1", "rewards_v2"];

/// A hotspot owned by the reported wallet
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Hotspot {
    pub address: String,
    pub name: String,
    #[serde(default)]
    pub owner: Option<String>,
}

/// A hotspot's chain and network status at the time it was listed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HotspotStatus {
    pub address: String,
    pub name: String,
    /// `online` or `offline`, as reported by the hotspot's peers
    pub online: Option<String>,
    /// Block height the hotspot has synced to
    pub height: Option<u64>,
    /// Chain height when the status was read
    pub block: Option<u64>,
    pub last_poc_challenge: Option<u64>,
    pub last_change_block: Option<u64>,
    pub block_added: Option<u64>,
    pub reward_scale: Option<Decimal>,
    /// Antenna gain in tenths of a dBi
    pub gain: Option<i64>,
    /// Antenna elevation in meters
    pub elevation: Option<i64>,
}

/// Reward amount with the currency it is denominated in
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RewardAmount {
    pub value: Decimal,
    #[serde(default)]
    pub currency: Option<String>,
}

impl RewardAmount {
    pub fn native(value: Decimal) -> Self {
        Self {
            value,
            currency: Some(NATIVE_TICKER.to_string()),
        }
    }
}

/// A single reward within a rewards transaction
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reward {
    pub reward_type: String,
    #[serde(default)]
    pub amount: Option<RewardAmount>,
}

/// A rewards transaction as seen in a hotspot's activity feed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RewardTransaction {
    pub hash: String,
    pub height: u64,
    pub time: DateTime<Utc>,
    pub rewards: Vec<Reward>,
}

/// One page of a hotspot's reward transactions, newest first
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TransactionPage {
    pub transactions: Vec<RewardTransaction>,
    /// Cursor for the following page, absent on the last page
    pub cursor: Option<String>,
}

impl TransactionPage {
    pub fn has_more(&self) -> bool {
        self.cursor.as_deref().is_some_and(|c| !c.is_empty())
    }

    pub fn len(&self) -> usize {
        self.transactions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transactions.is_empty()
    }
}

/// Oracle price in effect from `block` onwards
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OraclePrice {
    pub block: u64,
    pub price: Decimal,
}
