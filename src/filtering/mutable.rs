// DANS : src/filtering/mutable.rs

use super::{Filter, FilterMetrics, FilterResult, PoolIdentity};
use crate::decoders::{decode_metadata, metadata_address};
use crate::error::FilterError;
use crate::rpc::{has_socials, ChainAccessor, MetadataFetcher};
use anyhow::Context;
use async_trait::async_trait;
use std::sync::Arc;
use tracing::debug;

/// Lit les métadonnées Metaplex du token de base : mutabilité et liens sociaux.
pub struct MutableFilter {
    chain: Arc<dyn ChainAccessor>,
    fetcher: Arc<dyn MetadataFetcher>,
    check_mutable: bool,
    check_socials: bool,
}

impl MutableFilter {
    pub fn new(
        chain: Arc<dyn ChainAccessor>,
        fetcher: Arc<dyn MetadataFetcher>,
        check_mutable: bool,
        check_socials: bool,
    ) -> Self {
        Self { chain, fetcher, check_mutable, check_socials }
    }

    async fn socials(&self, uri: &str) -> Result<bool, FilterError> {
        if uri.is_empty() {
            return Ok(false);
        }
        let document = self
            .fetcher
            .fetch_json(uri)
            .await
            .with_context(|| format!("Échec de la lecture des métadonnées off-chain {}", uri))?;
        Ok(has_socials(&document))
    }
}

#[async_trait]
impl Filter for MutableFilter {
    fn name(&self) -> &'static str {
        "Mutable/Socials Filter"
    }

    fn label(&self) -> &'static str {
        "MutableSocials"
    }

    fn subject(&self) -> &'static str {
        "if metadata are mutable"
    }

    async fn check(&self, pool: &PoolIdentity) -> Result<FilterResult, FilterError> {
        let address = metadata_address(&pool.base_mint);
        let data = self
            .chain
            .get_account_info(&address)
            .await?
            .ok_or(FilterError::AccountNotFound(address))?;
        let metadata = decode_metadata(&data).map_err(FilterError::decode)?;
        debug!(mint = %pool.base_mint, name = %metadata.name, mutable = metadata.is_mutable, "Métadonnées décodées.");

        // Le JSON off-chain n'est lu que si les socials sont demandés.
        let has_socials = if self.check_socials { Some(self.socials(&metadata.uri).await?) } else { None };

        let mut issues = Vec::with_capacity(2);
        if self.check_mutable && metadata.is_mutable {
            issues.push("metadata can be changed");
        }
        if has_socials == Some(false) {
            issues.push("has no socials");
        }

        let metrics = FilterMetrics {
            mutable: Some(metadata.is_mutable),
            has_socials,
            ..FilterMetrics::default()
        };
        let result = if issues.is_empty() {
            FilterResult::pass(format!("MutableSocials -> Metadata checks passed for {}", metadata.symbol))
        } else {
            FilterResult::fail(format!("MutableSocials -> Token {}", issues.join(" and ")))
        };
        Ok(result.with_metrics(metrics))
    }
}
