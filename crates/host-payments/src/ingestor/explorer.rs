use crate::{
    calculator::money,
    error::{ReportError, Result},
    ingestor::types::{
        Hotspot, HotspotStatus, OraclePrice, REWARD_TRANSACTION_TYPES, Reward, RewardAmount,
        RewardTransaction, TransactionPage,
    },
    settings::Settings,
};
use async_trait::async_trait;
use chrono::DateTime;
use mockall::automock;
use rust_decimal::Decimal;
use serde::{Deserialize, de::DeserializeOwned};
use std::time::Duration;
use tracing::debug;
use url::Url;

/// Read-only view of the blockchain explorer API
#[automock]
#[async_trait]
pub trait ExplorerApi {
    /// Hotspots owned by a wallet
    async fn account_hotspots(&self, wallet_address: &str) -> Result<Vec<Hotspot>>;

    /// Hotspots owned by a wallet, with their chain and network status
    async fn account_hotspot_statuses(&self, wallet_address: &str) -> Result<Vec<HotspotStatus>>;

    /// Next page of a hotspot's reward transactions, newest first
    async fn reward_transactions(
        &self,
        hotspot_address: &str,
        cursor: Option<String>,
        limit: usize,
    ) -> Result<TransactionPage>;

    async fn current_oracle_price(&self) -> Result<OraclePrice>;

    /// Price in effect at `block`, tagged with the block where it was set
    async fn oracle_price_at(&self, block: u64) -> Result<OraclePrice>;
}

#[derive(Debug, Deserialize)]
struct Envelope<T> {
    data: T,
    #[serde(default)]
    cursor: Option<String>,
}

#[derive(Debug, Deserialize)]
struct WireHotspot {
    address: String,
    name: String,
    #[serde(default)]
    owner: Option<String>,
}

#[derive(Debug, Deserialize)]
struct WireHotspotStatus {
    address: String,
    name: String,
    #[serde(default)]
    status: Option<WireStatus>,
    #[serde(default)]
    block: Option<u64>,
    #[serde(default)]
    last_poc_challenge: Option<u64>,
    #[serde(default)]
    last_change_block: Option<u64>,
    #[serde(default)]
    block_added: Option<u64>,
    #[serde(default)]
    reward_scale: Option<Decimal>,
    #[serde(default)]
    gain: Option<i64>,
    #[serde(default)]
    elevation: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct WireStatus {
    #[serde(default)]
    online: Option<String>,
    #[serde(default)]
    height: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct WireTransaction {
    hash: String,
    height: u64,
    /// Seconds since the epoch, UTC
    time: i64,
    #[serde(default)]
    rewards: Vec<WireReward>,
}

#[derive(Debug, Deserialize)]
struct WireReward {
    #[serde(rename = "type")]
    reward_type: String,
    /// Integer sub-units (10^-8) of the native currency; the feed carries no ticker
    #[serde(default)]
    amount: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct WireOraclePrice {
    price: i64,
    block: u64,
}

impl TryFrom<WireTransaction> for RewardTransaction {
    type Error = ReportError;

    fn try_from(wire: WireTransaction) -> Result<Self> {
        let time = DateTime::from_timestamp(wire.time, 0).ok_or_else(|| {
            ReportError::InvalidTransactionTime {
                hash: wire.hash.clone(),
                seconds: wire.time,
            }
        })?;
        Ok(Self {
            hash: wire.hash,
            height: wire.height,
            time,
            rewards: wire.rewards.into_iter().map(Reward::from).collect(),
        })
    }
}

impl From<WireHotspot> for Hotspot {
    fn from(wire: WireHotspot) -> Self {
        Self {
            address: wire.address,
            name: wire.name,
            owner: wire.owner,
        }
    }
}

impl From<WireHotspotStatus> for HotspotStatus {
    fn from(wire: WireHotspotStatus) -> Self {
        let (online, height) = match wire.status {
            Some(status) => (status.online, status.height),
            None => (None, None),
        };
        Self {
            address: wire.address,
            name: wire.name,
            online,
            height,
            block: wire.block,
            last_poc_challenge: wire.last_poc_challenge,
            last_change_block: wire.last_change_block,
            block_added: wire.block_added,
            reward_scale: wire.reward_scale,
            gain: wire.gain,
            elevation: wire.elevation,
        }
    }
}

/// Rewards are always paid in the native currency, so every amount the API
/// returns is tagged with its ticker. Only a caller building `Reward` values
/// directly can produce an amount without a currency.
impl From<WireReward> for Reward {
    fn from(wire: WireReward) -> Self {
        Self {
            reward_type: wire.reward_type,
            amount: wire
                .amount
                .map(|units| RewardAmount::native(money::from_base_units(units))),
        }
    }
}

impl From<WireOraclePrice> for OraclePrice {
    fn from(wire: WireOraclePrice) -> Self {
        Self {
            block: wire.block,
            price: money::from_base_units(wire.price),
        }
    }
}

/// reqwest client for the public REST API
#[derive(Debug, Clone)]
pub struct HttpExplorer {
    client: reqwest::Client,
    base_url: Url,
}

impl HttpExplorer {
    pub fn new(api_url: &str, timeout: Duration) -> Result<Self> {
        // Url::join replaces the last segment unless the base ends with a slash
        let base_url = if api_url.ends_with('/') {
            Url::parse(api_url)?
        } else {
            Url::parse(&format!("{api_url}/"))?
        };
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { client, base_url })
    }

    pub fn from_settings(settings: &Settings) -> Result<Self> {
        Self::new(
            &settings.explorer.api_url,
            Duration::from_secs(settings.explorer.timeout_secs),
        )
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> Result<Url> {
        Ok(self.base_url.join(path)?)
    }

    /// Every page of a wallet's hotspot list, in the shape `T`
    async fn account_hotspot_pages<T: DeserializeOwned>(&self, wallet_address: &str) -> Result<Vec<T>> {
        let mut hotspots = vec![];
        let mut cursor: Option<String> = None;
        loop {
            let mut url = self.endpoint(&format!("accounts/{wallet_address}/hotspots"))?;
            if let Some(cursor) = &cursor {
                url.query_pairs_mut().append_pair("cursor", cursor);
            }
            let page = self.get::<Vec<T>>(url).await?;
            hotspots.extend(page.data);
            match page.cursor {
                Some(next) if !next.is_empty() => cursor = Some(next),
                _ => break,
            }
        }
        Ok(hotspots)
    }

    async fn get<T: DeserializeOwned>(&self, url: Url) -> Result<Envelope<T>> {
        debug!("Fetching: {url}");
        let response = self.client.get(url).send().await?.error_for_status()?;
        Ok(response.json::<Envelope<T>>().await?)
    }
}

#[async_trait]
impl ExplorerApi for HttpExplorer {
    async fn account_hotspots(&self, wallet_address: &str) -> Result<Vec<Hotspot>> {
        let hotspots = self
            .account_hotspot_pages::<WireHotspot>(wallet_address)
            .await?;
        Ok(hotspots.into_iter().map(Hotspot::from).collect())
    }

    async fn account_hotspot_statuses(&self, wallet_address: &str) -> Result<Vec<HotspotStatus>> {
        let hotspots = self
            .account_hotspot_pages::<WireHotspotStatus>(wallet_address)
            .await?;
        Ok(hotspots.into_iter().map(HotspotStatus::from).collect())
    }

    async fn reward_transactions(
        &self,
        hotspot_address: &str,
        cursor: Option<String>,
        limit: usize,
    ) -> Result<TransactionPage> {
        let mut url = self.endpoint(&format!("hotspots/{hotspot_address}/activity"))?;
        {
            let mut query = url.query_pairs_mut();
            query.append_pair("filter_types", &REWARD_TRANSACTION_TYPES.join(","));
            query.append_pair("limit", &limit.to_string());
            if let Some(cursor) = &cursor {
                query.append_pair("cursor", cursor);
            }
        }
        let page = self.get::<Vec<WireTransaction>>(url).await?;
        let transactions = page
            .data
            .into_iter()
            .map(RewardTransaction::try_from)
            .collect::<Result<Vec<_>>>()?;
        Ok(TransactionPage {
            transactions,
            cursor: page.cursor,
        })
    }

    async fn current_oracle_price(&self) -> Result<OraclePrice> {
        let url = self.endpoint("oracle/prices/current")?;
        Ok(self.get::<WireOraclePrice>(url).await?.data.into())
    }

    async fn oracle_price_at(&self, block: u64) -> Result<OraclePrice> {
        let url = self.endpoint(&format!("oracle/prices/{block}"))?;
        Ok(self.get::<WireOraclePrice>(url).await?.data.into())
    }
}
