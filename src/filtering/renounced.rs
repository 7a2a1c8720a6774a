// DANS : src/filtering/renounced.rs

use super::{Filter, FilterMetrics, FilterResult, PoolIdentity};
use crate::decoders::decode_mint;
use crate::error::FilterError;
use crate::rpc::ChainAccessor;
use async_trait::async_trait;
use std::sync::Arc;

/// Vérifie que l'autorité de mint est renoncée et/ou que le token ne peut pas être gelé.
pub struct RenouncedFreezeFilter {
    chain: Arc<dyn ChainAccessor>,
    check_renounced: bool,
    check_freezable: bool,
}

impl RenouncedFreezeFilter {
    pub fn new(chain: Arc<dyn ChainAccessor>, check_renounced: bool, check_freezable: bool) -> Self {
        Self { chain, check_renounced, check_freezable }
    }
}

#[async_trait]
impl Filter for RenouncedFreezeFilter {
    fn name(&self) -> &'static str {
        "Renounced/Freeze Filter"
    }

    fn label(&self) -> &'static str {
        "RenouncedFreeze"
    }

    fn subject(&self) -> &'static str {
        "if mint is renounced"
    }

    async fn check(&self, pool: &PoolIdentity) -> Result<FilterResult, FilterError> {
        let data = self
            .chain
            .get_account_info(&pool.base_mint)
            .await?
            .ok_or(FilterError::AccountNotFound(pool.base_mint))?;
        let mint = decode_mint(&pool.base_mint, &data).map_err(FilterError::decode)?;

        let mut issues = Vec::with_capacity(2);
        if self.check_renounced && !mint.is_renounced() {
            issues.push("mint");
        }
        if self.check_freezable && mint.is_freezable() {
            issues.push("freeze");
        }

        let metrics = FilterMetrics {
            mint_renounced: Some(mint.is_renounced()),
            freezable: Some(mint.is_freezable()),
            transfer_fee_basis_points: Some(mint.transfer_fee_basis_points),
            ..FilterMetrics::default()
        };
        let result = if issues.is_empty() {
            FilterResult::pass("RenouncedFreeze -> Creator cannot mint or freeze tokens")
        } else {
            FilterResult::fail(format!("RenouncedFreeze -> Creator can {} tokens", issues.join(" and ")))
        };
        Ok(result.with_metrics(metrics))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decoders::fixtures::mint_bytes;
    use crate::filtering::test_support::pool;
    use crate::rpc::InMemoryChain;
    use solana_sdk::pubkey::Pubkey;

    fn chain_with_mint(pool: &PoolIdentity, mint_authority: Option<Pubkey>, freeze: Option<Pubkey>) -> Arc<InMemoryChain> {
        Arc::new(InMemoryChain::new().with_account(pool.base_mint, mint_bytes(mint_authority, 1_000, 6, freeze)))
    }

    #[tokio::test]
    async fn renounced_and_unfreezable_passes() {
        let pool = pool();
        let result = RenouncedFreezeFilter::new(chain_with_mint(&pool, None, None), true, true)
            .execute(&pool)
            .await;
        assert!(result.ok);
        assert_eq!(result.metrics.mint_renounced, Some(true));
        assert_eq!(result.metrics.freezable, Some(false));
        assert_eq!(result.metrics.transfer_fee_basis_points, Some(0));
    }

    #[tokio::test]
    async fn lists_every_live_authority() {
        let pool = pool();
        let key = Some(Pubkey::new_unique());
        let result = RenouncedFreezeFilter::new(chain_with_mint(&pool, key, key), true, true)
            .execute(&pool)
            .await;
        assert!(!result.ok);
        assert_eq!(result.message, "RenouncedFreeze -> Creator can mint and freeze tokens");

        let result = RenouncedFreezeFilter::new(chain_with_mint(&pool, None, key), true, true)
            .execute(&pool)
            .await;
        assert_eq!(result.message, "RenouncedFreeze -> Creator can freeze tokens");
    }

    #[tokio::test]
    async fn disabled_checks_always_pass() {
        let pool = pool();
        let key = Some(Pubkey::new_unique());
        let result = RenouncedFreezeFilter::new(chain_with_mint(&pool, key, key), false, false)
            .execute(&pool)
            .await;
        assert!(result.ok);

        let result = RenouncedFreezeFilter::new(chain_with_mint(&pool, key, None), false, true)
            .execute(&pool)
            .await;
        assert!(result.ok);
    }

    #[tokio::test]
    async fn missing_mint_is_a_failure_not_a_pass() {
        let pool = pool();
        let result = RenouncedFreezeFilter::new(Arc::new(InMemoryChain::new()), false, false)
            .execute(&pool)
            .await;
        assert!(!result.ok);
        assert_eq!(
            result.message,
            format!("RenouncedFreeze -> Failed to check if mint is renounced: account {} not found", pool.base_mint)
        );
    }
}
