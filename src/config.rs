// DANS : src/config.rs

use crate::error::ConfigError;
use crate::filtering::{FilterSettings, PipelineOptions};
use crate::math::Amount;
use crate::rpc::ResilientRpcClient;
use serde::Deserialize;
use solana_sdk::{commitment_config::CommitmentConfig, pubkey::Pubkey};
use std::{str::FromStr, time::Duration};

/// Variables d'environnement (ou `.env`). Seule `SOLANA_RPC_URL` est obligatoire.
#[derive(Deserialize, Debug, Clone)]
pub struct Config {
    pub solana_rpc_url: String,
    #[serde(default = "default_commitment")]
    pub commitment_level: String,
    #[serde(default = "default_rpc_timeout_ms")]
    pub rpc_timeout_ms: u64,
    #[serde(default = "default_rpc_max_retries")]
    pub rpc_max_retries: u8,
    #[serde(default = "default_rpc_retry_delay_ms")]
    pub rpc_retry_delay_ms: u64,

    // --- Pipeline ---
    #[serde(default = "default_filter_timeout_ms")]
    pub filter_timeout_ms: u64,
    #[serde(default = "default_max_concurrent_filters")]
    pub max_concurrent_filters: usize,
    #[serde(default = "default_metadata_fetch_timeout_ms")]
    pub metadata_fetch_timeout_ms: u64,
    #[serde(default)]
    pub log_json: bool,

    // --- Filtres ---
    #[serde(default = "default_quote_mint")]
    pub quote_mint: String,
    #[serde(default = "default_quote_decimals")]
    pub quote_decimals: u8,
    #[serde(default = "enabled")]
    pub check_if_burned: bool,
    #[serde(default = "default_burn_threshold")]
    pub burn_threshold: String,
    #[serde(default = "enabled")]
    pub check_if_mint_is_renounced: bool,
    #[serde(default = "enabled")]
    pub check_if_freezable: bool,
    #[serde(default = "enabled")]
    pub check_if_mutable: bool,
    #[serde(default = "enabled")]
    pub check_if_socials: bool,
    /// En unités "humaines" du token quote (`"20"` = 20 SOL).
    #[serde(default = "default_min_pool_size")]
    pub min_pool_size: String,
    #[serde(default = "default_max_pool_size")]
    pub max_pool_size: String,
    #[serde(default = "enabled")]
    pub check_holders: bool,
    #[serde(default = "default_min_holder_count")]
    pub min_holder_count: usize,
    #[serde(default = "default_max_top_holder_percent")]
    pub max_top_holder_percent: u8,
}

fn default_commitment() -> String { "confirmed".to_string() }
fn default_rpc_timeout_ms() -> u64 { 10_000 }
fn default_rpc_max_retries() -> u8 { 2 }
fn default_rpc_retry_delay_ms() -> u64 { 500 }
fn default_filter_timeout_ms() -> u64 { 15_000 }
fn default_max_concurrent_filters() -> usize { 5 }
fn default_metadata_fetch_timeout_ms() -> u64 { 5_000 }
fn default_quote_mint() -> String { spl_token::native_mint::ID.to_string() }
fn default_quote_decimals() -> u8 { 9 }
fn default_burn_threshold() -> String { "0".to_string() }
fn default_min_pool_size() -> String { "20".to_string() }
fn default_max_pool_size() -> String { "300".to_string() }
fn default_min_holder_count() -> usize { 150 }
fn default_max_top_holder_percent() -> u8 { 5 }
fn enabled() -> bool { true }

impl Config {
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        let config = envy::from_env::<Config>()?;
        Ok(config)
    }

    /// Même chose que `load`, depuis des paires explicites plutôt que l'environnement du process.
    pub fn from_vars<I>(vars: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        Ok(envy::from_iter::<_, Config>(vars)?)
    }

    pub fn commitment(&self) -> Result<CommitmentConfig, ConfigError> {
        match self.commitment_level.to_ascii_lowercase().as_str() {
            "processed" => Ok(CommitmentConfig::processed()),
            "confirmed" => Ok(CommitmentConfig::confirmed()),
            "finalized" => Ok(CommitmentConfig::finalized()),
            other => Err(ConfigError::InvalidCommitment(other.to_string())),
        }
    }

    pub fn quote_mint(&self) -> Result<Pubkey, ConfigError> {
        Pubkey::from_str(&self.quote_mint).map_err(|_| ConfigError::InvalidQuoteMint(self.quote_mint.clone()))
    }

    pub fn filter_settings(&self) -> Result<FilterSettings, ConfigError> {
        let amount = |field: &'static str, value: &str, decimals: Option<u8>| {
            let parsed = match decimals {
                Some(decimals) => Amount::from_ui_str(value, decimals),
                None => Amount::parse_decimal(value),
            };
            parsed.map_err(|source| ConfigError::InvalidAmount { field, source })
        };

        let settings = FilterSettings {
            check_burned: self.check_if_burned,
            burn_threshold: amount("BURN_THRESHOLD", &self.burn_threshold, None)?,
            check_renounced: self.check_if_mint_is_renounced,
            check_freezable: self.check_if_freezable,
            check_mutable: self.check_if_mutable,
            check_socials: self.check_if_socials,
            quote_mint: self.quote_mint()?,
            min_pool_size: amount("MIN_POOL_SIZE", &self.min_pool_size, Some(self.quote_decimals))?,
            max_pool_size: amount("MAX_POOL_SIZE", &self.max_pool_size, Some(self.quote_decimals))?,
            check_holders: self.check_holders,
            min_holder_count: self.min_holder_count,
            max_top_holder_percent: self.max_top_holder_percent,
        };
        settings.validate()?;
        Ok(settings)
    }

    pub fn pipeline_options(&self) -> Result<PipelineOptions, ConfigError> {
        let options = PipelineOptions {
            max_concurrency: self.max_concurrent_filters,
            filter_timeout: Duration::from_millis(self.filter_timeout_ms),
        };
        options.validate()?;
        Ok(options)
    }

    pub fn metadata_fetch_timeout(&self) -> Result<Duration, ConfigError> {
        positive(self.metadata_fetch_timeout_ms, "METADATA_FETCH_TIMEOUT_MS")
    }

    pub fn rpc_client(&self) -> Result<ResilientRpcClient, ConfigError> {
        Ok(ResilientRpcClient::new(
            self.solana_rpc_url.clone(),
            self.commitment()?,
            positive(self.rpc_timeout_ms, "RPC_TIMEOUT_MS")?,
            self.rpc_max_retries,
            self.rpc_retry_delay_ms,
        ))
    }
}

fn positive(millis: u64, field: &'static str) -> Result<Duration, ConfigError> {
    if millis == 0 {
        return Err(ConfigError::ZeroTimeout(field));
    }
    Ok(Duration::from_millis(millis))
}
