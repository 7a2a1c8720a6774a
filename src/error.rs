// DANS : src/error.rs

use crate::math::AmountError;
use solana_sdk::pubkey::Pubkey;
use std::time::Duration;
use thiserror::Error;

/// Configuration refusée avant le moindre appel réseau.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid amount for {field}: {source}")]
    InvalidAmount {
        field: &'static str,
        #[source]
        source: AmountError,
    },

    #[error("min pool size {min} is above max pool size {max}")]
    InvertedPoolSizeBounds { min: String, max: String },

    #[error("max top holder percent must be within 0..=100, got {0}")]
    TopHolderPercentOutOfRange(u8),

    #[error("invalid quote mint {0}")]
    InvalidQuoteMint(String),

    #[error("invalid commitment level {0} (expected processed, confirmed or finalized)")]
    InvalidCommitment(String),

    #[error("max concurrency must be at least 1")]
    ZeroConcurrency,

    #[error("{0} must be greater than zero")]
    ZeroTimeout(&'static str),

    #[error("filter {0} is configured twice")]
    DuplicateFilter(&'static str),

    #[error("failed to read configuration: {0}")]
    Env(#[from] envy::Error),
}

/// Ce qui peut arriver à un filtre pendant sa vérification.
/// Jamais propagé au-delà de `Filter::execute`.
#[derive(Debug, Error)]
pub enum FilterError {
    #[error(transparent)]
    Fetch(#[from] anyhow::Error),

    #[error("timed out after {0:?}")]
    Timeout(Duration),

    #[error("account {0} not found")]
    AccountNotFound(Pubkey),

    #[error("{0}")]
    Decode(String),
}

impl FilterError {
    pub fn decode(error: impl std::fmt::Display) -> Self {
        FilterError::Decode(error.to_string())
    }

    /// Raison ajoutée au message du rapport (comptes absents, données illisibles).
    pub fn reason(&self) -> Option<String> {
        match self {
            FilterError::AccountNotFound(_) | FilterError::Decode(_) => Some(self.to_string()),
            FilterError::Fetch(_) | FilterError::Timeout(_) => None,
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum AnalysisError {
    #[error("incomplete pool identity: {0} is missing")]
    IncompletePool(&'static str),

    #[error("pool {0} not found")]
    PoolNotFound(Pubkey),

    #[error("analysis cancelled")]
    Cancelled,
}
