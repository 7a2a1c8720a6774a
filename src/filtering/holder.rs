// DANS : src/filtering/holder.rs

use super::{Filter, FilterMetrics, FilterResult, PoolIdentity};
use crate::decoders::spl_token_decoders::account::{read_amount, MINT_OFFSET, TOKEN_ACCOUNT_LEN};
use crate::error::{ConfigError, FilterError};
use crate::rpc::{ChainAccessor, MemcmpFilter, ProgramAccountsQuery};
use async_trait::async_trait;
use solana_sdk::pubkey::Pubkey;
use std::sync::Arc;
use tracing::debug;

/// Répartition des balances d'un ensemble de comptes de token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HolderDistribution {
    pub holder_count: usize,
    pub total_supply: u128,
    pub largest_holding: u64,
}

impl HolderDistribution {
    pub fn from_accounts(accounts: &[(Pubkey, Vec<u8>)]) -> anyhow::Result<Self> {
        let mut total_supply: u128 = 0;
        let mut largest_holding: u64 = 0;
        for (_, data) in accounts {
            let amount = read_amount(data)?;
            total_supply += u128::from(amount);
            largest_holding = largest_holding.max(amount);
        }
        Ok(Self { holder_count: accounts.len(), total_supply, largest_holding })
    }

    /// Part du plus gros holder, tronquée (1/3 -> 33). 0 si l'offre est nulle.
    pub fn top_holder_percent(&self) -> u8 {
        if self.total_supply == 0 {
            return 0;
        }
        let percent = u128::from(self.largest_holding) * 100 / self.total_supply;
        u8::try_from(percent).unwrap_or(u8::MAX)
    }
}

/// Nombre de holders du token de base et concentration du plus gros d'entre eux.
pub struct HolderFilter {
    chain: Arc<dyn ChainAccessor>,
    min_holder_count: usize,
    max_top_holder_percent: u8,
}

/// Un pourcentage au-delà de 100 ne peut jamais être dépassé.
pub fn validate_top_holder_percent(max_top_holder_percent: u8) -> Result<(), ConfigError> {
    if max_top_holder_percent > 100 {
        return Err(ConfigError::TopHolderPercentOutOfRange(max_top_holder_percent));
    }
    Ok(())
}

impl HolderFilter {
    pub fn new(
        chain: Arc<dyn ChainAccessor>,
        min_holder_count: usize,
        max_top_holder_percent: u8,
    ) -> Result<Self, ConfigError> {
        validate_top_holder_percent(max_top_holder_percent)?;
        Ok(Self { chain, min_holder_count, max_top_holder_percent })
    }

    fn query(mint: &Pubkey) -> ProgramAccountsQuery {
        ProgramAccountsQuery {
            data_size: Some(TOKEN_ACCOUNT_LEN as u64),
            memcmp: vec![MemcmpFilter::new(MINT_OFFSET, mint.to_bytes().to_vec())],
        }
    }
}

#[async_trait]
impl Filter for HolderFilter {
    fn name(&self) -> &'static str {
        "Holder Filter"
    }

    fn label(&self) -> &'static str {
        "Holder"
    }

    fn subject(&self) -> &'static str {
        "holders"
    }

    async fn check(&self, pool: &PoolIdentity) -> Result<FilterResult, FilterError> {
        let accounts = self
            .chain
            .get_program_accounts(&spl_token::ID, &Self::query(&pool.base_mint))
            .await?;

        let holder_count = accounts.len();
        if holder_count < self.min_holder_count {
            return Ok(FilterResult::fail(format!(
                "Holder -> Insufficient holders: {} < {}",
                holder_count, self.min_holder_count
            ))
            .with_metrics(FilterMetrics { holder_count: Some(holder_count), ..FilterMetrics::default() }));
        }

        let distribution = HolderDistribution::from_accounts(&accounts).map_err(FilterError::decode)?;
        let top_holder_percent = distribution.top_holder_percent();
        debug!(mint = %pool.base_mint, holder_count, top_holder_percent, "Répartition des holders calculée.");

        let metrics = FilterMetrics {
            holder_count: Some(holder_count),
            total_supply: Some(distribution.total_supply),
            top_holder_percent: Some(top_holder_percent),
            ..FilterMetrics::default()
        };
        let result = if top_holder_percent > self.max_top_holder_percent {
            FilterResult::fail(format!(
                "Holder -> Top holder owns too much: {}% > {}%",
                top_holder_percent, self.max_top_holder_percent
            ))
        } else {
            FilterResult::pass(format!(
                "Holder -> Passed checks: {} holders, Top holder: {}%",
                holder_count, top_holder_percent
            ))
        };
        Ok(result.with_metrics(metrics))
    }
}
