use crate::{
    error::Result,
    ingestor::{explorer::ExplorerApi, types::OraclePrice},
    settings::OracleSettings,
};
use tracing::{debug, info, warn};

/// Bounds on the oracle price walk
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WalkLimits {
    /// Stop once a price set at or below this block is reached
    pub lowest_block: u64,
    /// Historical queries issued after the current price
    pub max_queries: usize,
}

impl From<&OracleSettings> for WalkLimits {
    fn from(settings: &OracleSettings) -> Self {
        Self {
            lowest_block: settings.lowest_block,
            max_queries: settings.max_queries,
        }
    }
}

/// Collect oracle price changes, newest first
///
/// Starts from the current price and repeatedly asks for the price in effect
/// one block before the last change, so each query yields one earlier price.
pub async fn price_history<A>(api: &A, limits: WalkLimits) -> Result<Vec<OraclePrice>>
where
    A: ExplorerApi + ?Sized,
{
    let mut price = api.current_oracle_price().await?;
    let mut prices = vec![];
    let mut queries = 0;

    loop {
        debug!("{}: {}", price.block, price.price);
        let block = price.block;
        prices.push(price);

        if block <= limits.lowest_block {
            info!("Reached lowest block: {}", limits.lowest_block);
            break;
        }
        if queries >= limits.max_queries {
            warn!("Reached query limit: {}", limits.max_queries);
            break;
        }

        price = api.oracle_price_at(block - 1).await?;
        queries += 1;

        // A price tagged at or after the block asked about would repeat forever
        if price.block >= block {
            warn!(
                "Oracle returned block {} for a query before block {block}; stopping",
                price.block
            );
            break;
        }
    }

    info!("Collected {} oracle prices", prices.len());
    Ok(prices)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ingestor::explorer::MockExplorerApi;
    use mockall::predicate::eq;
    use rust_decimal::dec;

    fn price(block: u64, price: rust_decimal::Decimal) -> OraclePrice {
        OraclePrice { block, price }
    }

    #[tokio::test]
    async fn test_walks_back_to_lowest_block() {
        let mut mock = MockExplorerApi::new();
        mock.expect_current_oracle_price()
            .times(1)
            .returning(|| Ok(price(300, dec!(12.92555385))));
        mock.expect_oracle_price_at()
            .with(eq(299))
            .times(1)
            .returning(|_| Ok(price(200, dec!(12.5))));
        mock.expect_oracle_price_at()
            .with(eq(199))
            .times(1)
            .returning(|_| Ok(price(100, dec!(11))));

        let limits = WalkLimits {
            lowest_block: 150,
            max_queries: 10,
        };
        let prices = price_history(&mock, limits).await.unwrap();

        let blocks = prices.iter().map(|p| p.block).collect::<Vec<_>>();
        assert_eq!(blocks, vec![300, 200, 100]);
        assert_eq!(prices[0].price, dec!(12.92555385));
    }

    #[tokio::test]
    async fn test_query_cap() {
        let mut mock = MockExplorerApi::new();
        mock.expect_current_oracle_price()
            .returning(|| Ok(price(1_000, dec!(10))));
        mock.expect_oracle_price_at()
            .times(2)
            .returning(|block| Ok(price(block - 9, dec!(10))));

        let limits = WalkLimits {
            lowest_block: 1,
            max_queries: 2,
        };
        let prices = price_history(&mock, limits).await.unwrap();
        assert_eq!(prices.len(), 3);
    }

    #[tokio::test]
    async fn test_current_price_at_genesis() {
        let mut mock = MockExplorerApi::new();
        mock.expect_current_oracle_price()
            .returning(|| Ok(price(1, dec!(0.3))));
        mock.expect_oracle_price_at().never();

        let prices = price_history(
            &mock,
            WalkLimits {
                lowest_block: 1,
                max_queries: 8_760,
            },
        )
        .await
        .unwrap();
        assert_eq!(prices, vec![price(1, dec!(0.3))]);
    }

    #[tokio::test]
    async fn test_non_decreasing_block_stops() {
        let mut mock = MockExplorerApi::new();
        mock.expect_current_oracle_price()
            .returning(|| Ok(price(50, dec!(1))));
        mock.expect_oracle_price_at()
            .times(1)
            .returning(|_| Ok(price(50, dec!(1))));

        let prices = price_history(
            &mock,
            WalkLimits {
                lowest_block: 1,
                max_queries: 100,
            },
        )
        .await
        .unwrap();
        assert_eq!(prices.len(), 1);
    }
}
