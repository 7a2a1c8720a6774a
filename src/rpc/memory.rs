// DANS : src/rpc/memory.rs

use crate::rpc::chain::{ChainAccessor, ProgramAccountsQuery, TokenBalance};
use anyhow::{anyhow, bail, Result};
use async_trait::async_trait;
use solana_sdk::pubkey::Pubkey;
use std::{
    collections::{HashMap, HashSet},
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    },
    time::Duration,
};

/// Un `ChainAccessor` servi depuis un instantané en mémoire.
///
/// Sert à rejouer une analyse hors ligne et aux tests : chaque adresse peut
/// recevoir une latence (`with_delay`) ou une panne RPC simulée (`with_failure`).
/// Pour un scan de programme, l'adresse concernée est l'id du programme.
#[derive(Debug, Clone, Default)]
pub struct InMemoryChain {
    accounts: HashMap<Pubkey, Vec<u8>>,
    program_accounts: HashMap<Pubkey, Vec<(Pubkey, Vec<u8>)>>,
    token_balances: HashMap<Pubkey, TokenBalance>,
    token_supplies: HashMap<Pubkey, TokenBalance>,
    failures: HashSet<Pubkey>,
    delays: HashMap<Pubkey, Duration>,
    calls: Arc<AtomicUsize>,
    in_flight: Arc<AtomicUsize>,
    peak_in_flight: Arc<AtomicUsize>,
}

/// Décrémente le compteur de requêtes en vol, y compris quand la requête est abandonnée.
struct InFlightGuard<'a>(&'a AtomicUsize);

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

impl InMemoryChain {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_account(mut self, address: Pubkey, data: Vec<u8>) -> Self {
        self.accounts.insert(address, data);
        self
    }

    pub fn with_program_account(mut self, program_id: Pubkey, address: Pubkey, data: Vec<u8>) -> Self {
        self.program_accounts.entry(program_id).or_default().push((address, data));
        self
    }

    pub fn with_token_balance(mut self, address: Pubkey, balance: TokenBalance) -> Self {
        self.token_balances.insert(address, balance);
        self
    }

    pub fn with_token_supply(mut self, mint: Pubkey, supply: TokenBalance) -> Self {
        self.token_supplies.insert(mint, supply);
        self
    }

    pub fn with_failure(mut self, address: Pubkey) -> Self {
        self.failures.insert(address);
        self
    }

    pub fn with_delay(mut self, address: Pubkey, delay: Duration) -> Self {
        self.delays.insert(address, delay);
        self
    }

    /// Nombre total de requêtes reçues (toutes méthodes confondues).
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Plus grand nombre de requêtes simultanées observé depuis la création.
    pub fn peak_in_flight(&self) -> usize {
        self.peak_in_flight.load(Ordering::SeqCst)
    }

    async fn gate(&self, method: &str, address: &Pubkey) -> Result<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let in_flight = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak_in_flight.fetch_max(in_flight, Ordering::SeqCst);
        let _guard = InFlightGuard(&self.in_flight);
        if let Some(delay) = self.delays.get(address) {
            tokio::time::sleep(*delay).await;
        }
        if self.failures.contains(address) {
            bail!("{} : erreur RPC simulée pour {}", method, address);
        }
        Ok(())
    }
}

#[async_trait]
impl ChainAccessor for InMemoryChain {
    async fn get_account_info(&self, address: &Pubkey) -> Result<Option<Vec<u8>>> {
        self.gate("get_account_info", address).await?;
        Ok(self.accounts.get(address).cloned())
    }

    async fn get_program_accounts(
        &self,
        program_id: &Pubkey,
        query: &ProgramAccountsQuery,
    ) -> Result<Vec<(Pubkey, Vec<u8>)>> {
        self.gate("get_program_accounts", program_id).await?;
        Ok(self
            .program_accounts
            .get(program_id)
            .map(|accounts| {
                accounts
                    .iter()
                    .filter(|(_, data)| query.matches(data))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn get_token_account_balance(&self, address: &Pubkey) -> Result<TokenBalance> {
        self.gate("get_token_account_balance", address).await?;
        self.token_balances
            .get(address)
            .cloned()
            .ok_or_else(|| anyhow!("could not find token account {}", address))
    }

    async fn get_token_supply(&self, mint: &Pubkey) -> Result<TokenBalance> {
        self.gate("get_token_supply", mint).await?;
        self.token_supplies
            .get(mint)
            .cloned()
            .ok_or_else(|| anyhow!("could not find mint {}", mint))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rpc::chain::MemcmpFilter;

    #[tokio::test]
    async fn serves_snapshot_and_counts_calls() {
        let address = Pubkey::new_unique();
        let chain = InMemoryChain::new().with_account(address, vec![1, 2, 3]);

        assert_eq!(chain.get_account_info(&address).await.unwrap(), Some(vec![1, 2, 3]));
        assert_eq!(chain.get_account_info(&Pubkey::new_unique()).await.unwrap(), None);
        assert_eq!(chain.call_count(), 2);
    }

    #[tokio::test]
    async fn program_scan_applies_query() {
        let program = Pubkey::new_unique();
        let chain = InMemoryChain::new()
            .with_program_account(program, Pubkey::new_unique(), vec![9, 0])
            .with_program_account(program, Pubkey::new_unique(), vec![8, 0])
            .with_program_account(program, Pubkey::new_unique(), vec![9, 0, 0]);
        let query = ProgramAccountsQuery {
            data_size: Some(2),
            memcmp: vec![MemcmpFilter::new(0, vec![9])],
        };

        let found = chain.get_program_accounts(&program, &query).await.unwrap();
        assert_eq!(found.len(), 1);
    }

    #[tokio::test]
    async fn peak_counts_only_overlapping_requests() {
        let slow = Pubkey::new_unique();
        let chain = InMemoryChain::new().with_delay(slow, Duration::from_millis(50));

        chain.get_account_info(&slow).await.unwrap();
        chain.get_account_info(&slow).await.unwrap();
        assert_eq!(chain.peak_in_flight(), 1);

        let (first, second) = tokio::join!(chain.get_account_info(&slow), chain.get_account_info(&slow));
        assert!(first.is_ok() && second.is_ok());
        assert_eq!(chain.peak_in_flight(), 2);
        assert_eq!(chain.in_flight.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn injected_failure_surfaces_as_error() {
        let mint = Pubkey::new_unique();
        let chain = InMemoryChain::new()
            .with_token_supply(mint, TokenBalance::new("0", 9))
            .with_failure(mint);
        assert!(chain.get_token_supply(&mint).await.is_err());
    }
}
