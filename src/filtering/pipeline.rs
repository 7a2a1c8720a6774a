// DANS : src/filtering/pipeline.rs

use super::{
    holder, pool_size, AnalysisVerdict, BurnFilter, Filter, FilterReport, HolderFilter, MutableFilter, PoolFilter, PoolIdentity,
    PoolSizeFilter, RenouncedFreezeFilter,
};
use crate::error::{AnalysisError, ConfigError, FilterError};
use crate::math::Amount;
use crate::rpc::{ChainAccessor, MetadataFetcher};
use futures_util::{stream, StreamExt};
use solana_sdk::pubkey::Pubkey;
use std::{collections::HashSet, sync::Arc, time::Duration};
use tokio::time::{timeout, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// La configuration des filtres, validée une fois puis jamais modifiée.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterSettings {
    pub check_burned: bool,
    /// Offre de LP restante tolérée, en unités du LP token.
    pub burn_threshold: Amount,
    pub check_renounced: bool,
    pub check_freezable: bool,
    pub check_mutable: bool,
    pub check_socials: bool,
    pub quote_mint: Pubkey,
    /// Bornes en token quote. Zéro = côté désactivé.
    pub min_pool_size: Amount,
    pub max_pool_size: Amount,
    pub check_holders: bool,
    pub min_holder_count: usize,
    pub max_top_holder_percent: u8,
}

impl Default for FilterSettings {
    fn default() -> Self {
        let sol = |units: u128| Amount::new(units * 1_000_000_000, 9).unwrap_or(Amount::ZERO);
        Self {
            check_burned: true,
            burn_threshold: Amount::ZERO,
            check_renounced: true,
            check_freezable: true,
            check_mutable: true,
            check_socials: true,
            quote_mint: spl_token::native_mint::ID,
            min_pool_size: sol(20),
            max_pool_size: sol(300),
            check_holders: true,
            min_holder_count: 150,
            max_top_holder_percent: 5,
        }
    }
}

impl FilterSettings {
    pub fn validate(&self) -> Result<(), ConfigError> {
        pool_size::validate_bounds(&self.min_pool_size, &self.max_pool_size)?;
        holder::validate_top_holder_percent(self.max_top_holder_percent)
    }

    fn pool_size_enabled(&self) -> bool {
        !self.min_pool_size.is_zero() || !self.max_pool_size.is_zero()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PipelineOptions {
    /// Nombre de filtres exécutés en même temps (limite de débit RPC).
    pub max_concurrency: usize,
    /// Au-delà, le filtre est compté comme un échec de récupération.
    pub filter_timeout: Duration,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self { max_concurrency: 5, filter_timeout: Duration::from_secs(15) }
    }
}

impl PipelineOptions {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_concurrency == 0 {
            return Err(ConfigError::ZeroConcurrency);
        }
        if self.filter_timeout.is_zero() {
            return Err(ConfigError::ZeroTimeout("filter timeout"));
        }
        Ok(())
    }
}

/// Le Pipeline exécute tous les filtres configurés sur un même pool.
/// Aucun court-circuit : chaque filtre produit son rapport, dans l'ordre de configuration.
pub struct Pipeline {
    filters: Vec<PoolFilter>,
    options: PipelineOptions,
}

impl Pipeline {
    pub fn new(filters: Vec<PoolFilter>, options: PipelineOptions) -> Result<Self, ConfigError> {
        options.validate()?;
        let mut names = HashSet::with_capacity(filters.len());
        for filter in &filters {
            if !names.insert(filter.name()) {
                return Err(ConfigError::DuplicateFilter(filter.name()));
            }
        }
        Ok(Self { filters, options })
    }

    /// Construit le pipeline avec les seuls filtres activés, dans l'ordre
    /// Burn, RenouncedFreeze, MutableSocials, PoolSize, Holder.
    pub fn from_settings(
        settings: &FilterSettings,
        chain: Arc<dyn ChainAccessor>,
        fetcher: Arc<dyn MetadataFetcher>,
        options: PipelineOptions,
    ) -> Result<Self, ConfigError> {
        settings.validate()?;

        let mut filters: Vec<PoolFilter> = Vec::with_capacity(5);
        if settings.check_burned {
            filters.push(BurnFilter::new(chain.clone(), settings.burn_threshold).into());
        }
        if settings.check_renounced || settings.check_freezable {
            filters.push(
                RenouncedFreezeFilter::new(chain.clone(), settings.check_renounced, settings.check_freezable).into(),
            );
        }
        if settings.check_mutable || settings.check_socials {
            filters.push(
                MutableFilter::new(chain.clone(), fetcher, settings.check_mutable, settings.check_socials).into(),
            );
        }
        if settings.pool_size_enabled() {
            filters.push(
                PoolSizeFilter::new(
                    chain.clone(),
                    settings.quote_mint,
                    settings.min_pool_size,
                    settings.max_pool_size,
                )?
                .into(),
            );
        }
        if settings.check_holders {
            filters.push(HolderFilter::new(chain, settings.min_holder_count, settings.max_top_holder_percent)?.into());
        }

        Self::new(filters, options)
    }

    pub fn filter_names(&self) -> Vec<&'static str> {
        self.filters.iter().map(|filter| filter.name()).collect()
    }

    /// Évalue un pool. Refuse une identité incomplète avant tout appel réseau.
    pub async fn analyze(&self, pool: &PoolIdentity) -> Result<AnalysisVerdict, AnalysisError> {
        pool.validate()?;
        let started = Instant::now();
        info!(pool = %pool.address, mint = %pool.base_mint, filters = self.filters.len(), "Analyse du pool...");

        // `buffered` rend les résultats dans l'ordre d'entrée, quel que soit l'ordre de fin.
        let reports: Vec<FilterReport> = stream::iter(&self.filters)
            .map(|filter| self.run_filter(filter, pool))
            .buffered(self.options.max_concurrency)
            .collect()
            .await;

        let verdict = AnalysisVerdict::new(reports);
        info!(
            pool = %pool.address,
            all_passed = verdict.all_passed(),
            failed = verdict.failed().count(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Analyse terminée."
        );
        Ok(verdict)
    }

    /// Comme `analyze`, mais abandonne tout (filtres en vol compris) dès que `cancel` est déclenché.
    pub async fn analyze_until_cancelled(
        &self,
        pool: &PoolIdentity,
        cancel: &CancellationToken,
    ) -> Result<AnalysisVerdict, AnalysisError> {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                warn!(pool = %pool.address, "Analyse annulée.");
                Err(AnalysisError::Cancelled)
            }
            verdict = self.analyze(pool) => verdict,
        }
    }

    async fn run_filter(&self, filter: &PoolFilter, pool: &PoolIdentity) -> FilterReport {
        let started = Instant::now();
        let result = match timeout(self.options.filter_timeout, filter.execute(pool)).await {
            Ok(result) => result,
            Err(_) => {
                warn!(filter = filter.name(), pool = %pool.address, timeout = ?self.options.filter_timeout, "Filtre hors délai.");
                filter.failure(&FilterError::Timeout(self.options.filter_timeout))
            }
        };
        debug!(
            filter = filter.name(),
            passed = result.ok,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Filtre terminé."
        );
        FilterReport::new(filter.name(), result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rpc::{InMemoryChain, StaticMetadataFetcher};

    fn build(settings: &FilterSettings, options: PipelineOptions) -> Result<Pipeline, ConfigError> {
        Pipeline::from_settings(
            settings,
            Arc::new(InMemoryChain::new()),
            Arc::new(StaticMetadataFetcher::new()),
            options,
        )
    }

    #[test]
    fn default_settings_enable_every_filter_in_order() {
        let pipeline = build(&FilterSettings::default(), PipelineOptions::default()).unwrap();
        assert_eq!(
            pipeline.filter_names(),
            vec![
                "Burn Filter",
                "Renounced/Freeze Filter",
                "Mutable/Socials Filter",
                "Pool Size Filter",
                "Holder Filter"
            ]
        );
    }

    #[test]
    fn disabled_toggles_drop_their_filter() {
        let settings = FilterSettings {
            check_burned: false,
            check_renounced: false,
            check_freezable: true,
            check_mutable: false,
            check_socials: false,
            min_pool_size: Amount::ZERO,
            max_pool_size: Amount::ZERO,
            ..FilterSettings::default()
        };
        let pipeline = build(&settings, PipelineOptions::default()).unwrap();
        assert_eq!(pipeline.filter_names(), vec!["Renounced/Freeze Filter", "Holder Filter"]);
    }

    #[test]
    fn invalid_settings_are_rejected_eagerly() {
        let inverted = FilterSettings {
            min_pool_size: Amount::from_ui_str("300", 9).unwrap(),
            max_pool_size: Amount::from_ui_str("20", 9).unwrap(),
            ..FilterSettings::default()
        };
        assert!(matches!(
            build(&inverted, PipelineOptions::default()),
            Err(ConfigError::InvertedPoolSizeBounds { .. })
        ));

        let percent = FilterSettings { max_top_holder_percent: 101, ..FilterSettings::default() };
        assert!(matches!(
            build(&percent, PipelineOptions::default()),
            Err(ConfigError::TopHolderPercentOutOfRange(101))
        ));

        let no_workers = PipelineOptions { max_concurrency: 0, ..PipelineOptions::default() };
        assert!(matches!(build(&FilterSettings::default(), no_workers), Err(ConfigError::ZeroConcurrency)));
    }

    #[test]
    fn zero_max_with_positive_min_is_valid() {
        let settings = FilterSettings { max_pool_size: Amount::ZERO, ..FilterSettings::default() };
        assert!(build(&settings, PipelineOptions::default()).is_ok());
    }

    fn hand_built(min: &str, max: &str, max_top_holder_percent: u8) -> Result<Pipeline, ConfigError> {
        let chain: Arc<dyn ChainAccessor> = Arc::new(InMemoryChain::new());
        let filters = vec![
            PoolSizeFilter::new(
                chain.clone(),
                spl_token::native_mint::ID,
                Amount::from_ui_str(min, 9).unwrap(),
                Amount::from_ui_str(max, 9).unwrap(),
            )?
            .into(),
            HolderFilter::new(chain, 150, max_top_holder_percent)?.into(),
        ];
        Pipeline::new(filters, PipelineOptions::default())
    }

    #[test]
    fn hand_built_filters_with_invalid_thresholds_never_form_a_pipeline() {
        assert!(matches!(hand_built("300", "20", 5), Err(ConfigError::InvertedPoolSizeBounds { .. })));
        assert!(matches!(hand_built("20", "300", 250), Err(ConfigError::TopHolderPercentOutOfRange(250))));

        let pipeline = hand_built("20", "300", 5).unwrap();
        assert_eq!(pipeline.filter_names(), vec!["Pool Size Filter", "Holder Filter"]);
    }

    #[test]
    fn duplicate_filters_are_rejected() {
        let chain: Arc<dyn ChainAccessor> = Arc::new(InMemoryChain::new());
        let filters = vec![
            BurnFilter::new(chain.clone(), Amount::ZERO).into(),
            BurnFilter::new(chain, Amount::ZERO).into(),
        ];
        assert!(matches!(
            Pipeline::new(filters, PipelineOptions::default()),
            Err(ConfigError::DuplicateFilter("Burn Filter"))
        ));
    }
}
