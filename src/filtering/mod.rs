// DANS : src/filtering/mod.rs

use crate::error::{AnalysisError, FilterError};
use crate::math::Amount;
use async_trait::async_trait;
use serde::{ser::SerializeStruct, Serialize, Serializer};
use solana_sdk::pubkey::Pubkey;
use tracing::error;

pub mod burn;
pub mod holder;
pub mod mutable;
pub mod pipeline;
pub mod pool_size;
pub mod renounced;

pub use burn::BurnFilter;
pub use holder::HolderFilter;
pub use mutable::MutableFilter;
pub use pipeline::{FilterSettings, Pipeline, PipelineOptions};
pub use pool_size::PoolSizeFilter;
pub use renounced::RenouncedFreezeFilter;

/// Les comptes dérivés du marché OpenBook associé au pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MarketAccounts {
    pub bids: Pubkey,
    pub asks: Pubkey,
    pub event_queue: Pubkey,
}

/// Représente l'identité d'un pool de liquidité à analyser.
/// Construite une fois par analyse, puis partagée en lecture seule avec chaque filtre.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PoolIdentity {
    /// L'adresse du compte du pool lui-même.
    pub address: Pubkey,
    pub base_mint: Pubkey,
    pub quote_mint: Pubkey,
    /// Le vault qui détient la liquidité en token quote.
    pub quote_vault: Pubkey,
    pub lp_mint: Pubkey,
    pub market: Pubkey,
    pub market_accounts: Option<MarketAccounts>,
}

impl PoolIdentity {
    pub fn new(
        address: Pubkey,
        base_mint: Pubkey,
        quote_mint: Pubkey,
        quote_vault: Pubkey,
        lp_mint: Pubkey,
        market: Pubkey,
    ) -> Result<Self, AnalysisError> {
        let identity = Self {
            address,
            base_mint,
            quote_mint,
            quote_vault,
            lp_mint,
            market,
            market_accounts: None,
        };
        identity.validate()?;
        Ok(identity)
    }

    pub fn with_market_accounts(mut self, market_accounts: MarketAccounts) -> Result<Self, AnalysisError> {
        self.market_accounts = Some(market_accounts);
        self.validate()?;
        Ok(self)
    }

    /// Aucune adresse ne peut être la clé nulle.
    pub fn validate(&self) -> Result<(), AnalysisError> {
        let mut fields = vec![
            ("address", self.address),
            ("base_mint", self.base_mint),
            ("quote_mint", self.quote_mint),
            ("quote_vault", self.quote_vault),
            ("lp_mint", self.lp_mint),
            ("market", self.market),
        ];
        if let Some(market) = &self.market_accounts {
            fields.extend([("bids", market.bids), ("asks", market.asks), ("event_queue", market.event_queue)]);
        }

        match fields.into_iter().find(|(_, key)| *key == Pubkey::default()) {
            Some((name, _)) => Err(AnalysisError::IncompletePool(name)),
            None => Ok(()),
        }
    }
}

/// Valeurs intermédiaires qu'un filtre juge utile d'exposer dans son rapport.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FilterMetrics {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lp_supply: Option<Amount>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mint_renounced: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub freezable: Option<bool>,
    /// Frais de transfert Token-2022, en points de base. 0 pour un mint SPL classique.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transfer_fee_basis_points: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mutable: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub has_socials: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pool_size: Option<Amount>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub holder_count: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_supply: Option<u128>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_holder_percent: Option<u8>,
}

/// Le verdict d'un filtre : `ok = true` signifie que le pool PASSE ce critère.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterResult {
    pub ok: bool,
    pub message: String,
    pub metrics: FilterMetrics,
}

impl FilterResult {
    pub fn pass(message: impl Into<String>) -> Self {
        Self { ok: true, message: message.into(), metrics: FilterMetrics::default() }
    }

    pub fn fail(message: impl Into<String>) -> Self {
        Self { ok: false, message: message.into(), metrics: FilterMetrics::default() }
    }

    pub fn with_metrics(mut self, metrics: FilterMetrics) -> Self {
        self.metrics = metrics;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FilterDetails {
    pub message: String,
    #[serde(flatten)]
    pub metrics: FilterMetrics,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FilterReport {
    pub name: &'static str,
    pub passed: bool,
    pub details: FilterDetails,
}

impl FilterReport {
    pub fn new(name: &'static str, result: FilterResult) -> Self {
        Self {
            name,
            passed: result.ok,
            details: FilterDetails { message: result.message, metrics: result.metrics },
        }
    }
}

/// Les rapports, dans l'ordre de configuration des filtres.
/// `all_passed` est toujours recalculé à partir des rapports.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalysisVerdict {
    reports: Vec<FilterReport>,
}

impl AnalysisVerdict {
    pub fn new(reports: Vec<FilterReport>) -> Self {
        Self { reports }
    }

    pub fn reports(&self) -> &[FilterReport] {
        &self.reports
    }

    pub fn all_passed(&self) -> bool {
        self.reports.iter().all(|report| report.passed)
    }

    pub fn failed(&self) -> impl Iterator<Item = &FilterReport> {
        self.reports.iter().filter(|report| !report.passed)
    }

    pub fn report(&self, name: &str) -> Option<&FilterReport> {
        self.reports.iter().find(|report| report.name == name)
    }
}

impl Serialize for AnalysisVerdict {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("AnalysisVerdict", 2)?;
        state.serialize_field("all_passed", &self.all_passed())?;
        state.serialize_field("reports", &self.reports)?;
        state.end()
    }
}

/// Un critère de sécurité évalué sur un pool.
///
/// Les implémentations écrivent `check`, qui peut échouer. Le pipeline appelle
/// `execute`, qui ne peut pas échouer : toute erreur devient un rapport négatif.
#[async_trait]
pub trait Filter: Send + Sync {
    /// Nom affiché dans le rapport, unique dans un pipeline.
    fn name(&self) -> &'static str;

    /// Préfixe des messages (`"Burn -> ..."`).
    fn label(&self) -> &'static str;

    /// Ce que le filtre vérifie, pour le message d'échec.
    fn subject(&self) -> &'static str;

    async fn check(&self, pool: &PoolIdentity) -> Result<FilterResult, FilterError>;

    async fn execute(&self, pool: &PoolIdentity) -> FilterResult {
        match self.check(pool).await {
            Ok(result) => result,
            Err(e) => {
                error!(filter = self.name(), mint = %pool.base_mint, error = %e, "Failed to check {}", self.subject());
                self.failure(&e)
            }
        }
    }

    fn failure(&self, error: &FilterError) -> FilterResult {
        let base = format!("{} -> Failed to check {}", self.label(), self.subject());
        match error.reason() {
            Some(reason) => FilterResult::fail(format!("{}: {}", base, reason)),
            None => FilterResult::fail(base),
        }
    }
}

/// L'ensemble fermé des filtres connus.
pub enum PoolFilter {
    Burn(BurnFilter),
    RenouncedFreeze(RenouncedFreezeFilter),
    Mutable(MutableFilter),
    PoolSize(PoolSizeFilter),
    Holder(HolderFilter),
}

impl PoolFilter {
    fn inner(&self) -> &dyn Filter {
        match self {
            PoolFilter::Burn(f) => f,
            PoolFilter::RenouncedFreeze(f) => f,
            PoolFilter::Mutable(f) => f,
            PoolFilter::PoolSize(f) => f,
            PoolFilter::Holder(f) => f,
        }
    }
}

#[async_trait]
impl Filter for PoolFilter {
    fn name(&self) -> &'static str {
        self.inner().name()
    }

    fn label(&self) -> &'static str {
        self.inner().label()
    }

    fn subject(&self) -> &'static str {
        self.inner().subject()
    }

    async fn check(&self, pool: &PoolIdentity) -> Result<FilterResult, FilterError> {
        match self {
            PoolFilter::Burn(f) => f.check(pool).await,
            PoolFilter::RenouncedFreeze(f) => f.check(pool).await,
            PoolFilter::Mutable(f) => f.check(pool).await,
            PoolFilter::PoolSize(f) => f.check(pool).await,
            PoolFilter::Holder(f) => f.check(pool).await,
        }
    }
}

impl From<BurnFilter> for PoolFilter {
    fn from(filter: BurnFilter) -> Self {
        PoolFilter::Burn(filter)
    }
}

impl From<RenouncedFreezeFilter> for PoolFilter {
    fn from(filter: RenouncedFreezeFilter) -> Self {
        PoolFilter::RenouncedFreeze(filter)
    }
}

impl From<MutableFilter> for PoolFilter {
    fn from(filter: MutableFilter) -> Self {
        PoolFilter::Mutable(filter)
    }
}

impl From<PoolSizeFilter> for PoolFilter {
    fn from(filter: PoolSizeFilter) -> Self {
        PoolFilter::PoolSize(filter)
    }
}

impl From<HolderFilter> for PoolFilter {
    fn from(filter: HolderFilter) -> Self {
        PoolFilter::Holder(filter)
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;

    pub fn pool() -> PoolIdentity {
        PoolIdentity::new(
            Pubkey::new_unique(),
            Pubkey::new_unique(),
            Pubkey::new_unique(),
            Pubkey::new_unique(),
            Pubkey::new_unique(),
            Pubkey::new_unique(),
        )
        .unwrap()
    }
}
