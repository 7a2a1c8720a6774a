// DANS : src/filtering/pool_size.rs

use super::{Filter, FilterMetrics, FilterResult, PoolIdentity};
use crate::error::{ConfigError, FilterError};
use crate::math::Amount;
use crate::rpc::ChainAccessor;
use async_trait::async_trait;
use solana_sdk::pubkey::Pubkey;
use std::sync::Arc;

/// Liquidité du vault quote comparée à l'intervalle fermé `[min, max]`.
/// Un pool dans l'intervalle PASSE. Une borne nulle désactive son côté.
pub struct PoolSizeFilter {
    chain: Arc<dyn ChainAccessor>,
    quote_mint: Pubkey,
    min_pool_size: Amount,
    max_pool_size: Amount,
}

/// Refuse un intervalle inversé. Une borne nulle n'est jamais comparée.
pub fn validate_bounds(min_pool_size: &Amount, max_pool_size: &Amount) -> Result<(), ConfigError> {
    if !min_pool_size.is_zero() && !max_pool_size.is_zero() && min_pool_size > max_pool_size {
        return Err(ConfigError::InvertedPoolSizeBounds {
            min: min_pool_size.to_string(),
            max: max_pool_size.to_string(),
        });
    }
    Ok(())
}

impl PoolSizeFilter {
    pub fn new(
        chain: Arc<dyn ChainAccessor>,
        quote_mint: Pubkey,
        min_pool_size: Amount,
        max_pool_size: Amount,
    ) -> Result<Self, ConfigError> {
        validate_bounds(&min_pool_size, &max_pool_size)?;
        Ok(Self { chain, quote_mint, min_pool_size, max_pool_size })
    }

    fn judge(&self, pool_size: Amount) -> FilterResult {
        let result = if !self.max_pool_size.is_zero() && pool_size > self.max_pool_size {
            FilterResult::fail(format!("PoolSize -> Pool size {} > {}", pool_size, self.max_pool_size))
        } else if !self.min_pool_size.is_zero() && pool_size < self.min_pool_size {
            FilterResult::fail(format!("PoolSize -> Pool size {} < {}", pool_size, self.min_pool_size))
        } else {
            FilterResult::pass(format!("PoolSize -> Pool size {}", pool_size))
        };
        result.with_metrics(FilterMetrics { pool_size: Some(pool_size), ..FilterMetrics::default() })
    }
}

#[async_trait]
impl Filter for PoolSizeFilter {
    fn name(&self) -> &'static str {
        "Pool Size Filter"
    }

    fn label(&self) -> &'static str {
        "PoolSize"
    }

    fn subject(&self) -> &'static str {
        "pool size"
    }

    async fn check(&self, pool: &PoolIdentity) -> Result<FilterResult, FilterError> {
        // La taille serait exprimée dans la mauvaise unité.
        if pool.quote_mint != self.quote_mint {
            return Ok(FilterResult::fail(format!(
                "PoolSize -> Quote mint {} is not the configured quote token {}",
                pool.quote_mint, self.quote_mint
            )));
        }

        let pool_size = self
            .chain
            .get_token_account_balance(&pool.quote_vault)
            .await?
            .to_amount()
            .map_err(FilterError::decode)?;
        Ok(self.judge(pool_size))
    }
}
