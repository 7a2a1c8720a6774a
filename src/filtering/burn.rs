// DANS : src/filtering/burn.rs

use super::{Filter, FilterMetrics, FilterResult, PoolIdentity};
use crate::error::FilterError;
use crate::math::Amount;
use crate::rpc::ChainAccessor;
use async_trait::async_trait;
use std::sync::Arc;
use tracing::debug;

/// Passe si l'offre restante de LP tokens est sous le seuil (LP brûlés ou verrouillés).
pub struct BurnFilter {
    chain: Arc<dyn ChainAccessor>,
    threshold: Amount,
}

impl BurnFilter {
    pub fn new(chain: Arc<dyn ChainAccessor>, threshold: Amount) -> Self {
        Self { chain, threshold }
    }
}

#[async_trait]
impl Filter for BurnFilter {
    fn name(&self) -> &'static str {
        "Burn Filter"
    }

    fn label(&self) -> &'static str {
        "Burn"
    }

    fn subject(&self) -> &'static str {
        "if LP is burned"
    }

    async fn check(&self, pool: &PoolIdentity) -> Result<FilterResult, FilterError> {
        let supply = self
            .chain
            .get_token_supply(&pool.lp_mint)
            .await?
            .to_amount()
            .map_err(FilterError::decode)?;
        debug!(lp_mint = %pool.lp_mint, %supply, "Offre de LP récupérée.");

        let metrics = FilterMetrics { lp_supply: Some(supply), ..FilterMetrics::default() };
        let result = if supply <= self.threshold {
            FilterResult::pass(format!("Burn -> LP burned, remaining supply {}", supply))
        } else {
            FilterResult::fail(format!("Burn -> Creator didn't burn LP: supply {} > {}", supply, self.threshold))
        };
        Ok(result.with_metrics(metrics))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filtering::test_support::pool;
    use crate::rpc::{InMemoryChain, TokenBalance};

    fn filter(chain: InMemoryChain, threshold: &str) -> BurnFilter {
        BurnFilter::new(Arc::new(chain), Amount::parse_decimal(threshold).unwrap())
    }

    #[tokio::test]
    async fn zero_supply_passes() {
        let pool = pool();
        let chain = InMemoryChain::new().with_token_supply(pool.lp_mint, TokenBalance::new("0", 9));
        let result = filter(chain, "0").execute(&pool).await;
        assert!(result.ok, "{}", result.message);
        assert_eq!(result.metrics.lp_supply, Some(Amount::ZERO));
    }

    #[tokio::test]
    async fn supply_above_threshold_fails() {
        let pool = pool();
        let chain = InMemoryChain::new().with_token_supply(pool.lp_mint, TokenBalance::new("1000", 9));
        let result = filter(chain, "0").execute(&pool).await;
        assert!(!result.ok);
        assert_eq!(result.message, "Burn -> Creator didn't burn LP: supply 0.000001 > 0");
    }

    #[tokio::test]
    async fn supply_at_threshold_passes() {
        let pool = pool();
        let chain = InMemoryChain::new().with_token_supply(pool.lp_mint, TokenBalance::new("1000", 9));
        assert!(filter(chain, "0.000001").execute(&pool).await.ok);
    }

    #[tokio::test]
    async fn fetch_error_fails_closed() {
        let pool = pool();
        let chain = InMemoryChain::new().with_failure(pool.lp_mint);
        let result = filter(chain, "0").execute(&pool).await;
        assert!(!result.ok);
        assert_eq!(result.message, "Burn -> Failed to check if LP is burned");
    }
}
