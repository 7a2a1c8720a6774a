// DANS : src/rpc/chain.rs

use crate::math::{Amount, AmountError};
use anyhow::Result;
use async_trait::async_trait;
use solana_sdk::pubkey::Pubkey;

/// Filtre `memcmp` d'un scan de comptes de programme.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemcmpFilter {
    pub offset: usize,
    pub bytes: Vec<u8>,
}

impl MemcmpFilter {
    pub fn new(offset: usize, bytes: Vec<u8>) -> Self {
        Self { offset, bytes }
    }

    pub fn matches(&self, data: &[u8]) -> bool {
        data.get(self.offset..self.offset + self.bytes.len())
            .is_some_and(|window| window == self.bytes.as_slice())
    }
}

/// Les filtres d'un `getProgramAccounts` : taille exacte et comparaisons d'octets.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProgramAccountsQuery {
    pub data_size: Option<u64>,
    pub memcmp: Vec<MemcmpFilter>,
}

impl ProgramAccountsQuery {
    pub fn matches(&self, data: &[u8]) -> bool {
        self.data_size.is_none_or(|size| data.len() as u64 == size)
            && self.memcmp.iter().all(|filter| filter.matches(data))
    }
}

/// Réponse de `getTokenAccountBalance` / `getTokenSupply` : montant brut en chaîne + décimales.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenBalance {
    pub amount: String,
    pub decimals: u8,
}

impl TokenBalance {
    pub fn new(amount: impl Into<String>, decimals: u8) -> Self {
        Self { amount: amount.into(), decimals }
    }

    pub fn to_amount(&self) -> Result<Amount, AmountError> {
        Amount::from_raw_str(&self.amount, self.decimals)
    }
}

/// Tout ce que les filtres lisent de la chaîne. Une requête, une réponse, aucune logique.
#[async_trait]
pub trait ChainAccessor: Send + Sync {
    /// Données brutes d'un compte, `None` s'il n'existe pas.
    async fn get_account_info(&self, address: &Pubkey) -> Result<Option<Vec<u8>>>;

    async fn get_program_accounts(
        &self,
        program_id: &Pubkey,
        query: &ProgramAccountsQuery,
    ) -> Result<Vec<(Pubkey, Vec<u8>)>>;

    async fn get_token_account_balance(&self, address: &Pubkey) -> Result<TokenBalance>;

    async fn get_token_supply(&self, mint: &Pubkey) -> Result<TokenBalance>;
}
