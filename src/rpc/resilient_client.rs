use crate::rpc::chain::{ChainAccessor, ProgramAccountsQuery, TokenBalance};
use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use solana_account_decoder::UiAccountEncoding;
use solana_client::{
    client_error::{ClientError, ClientErrorKind},
    nonblocking::rpc_client::RpcClient,
    rpc_config::{RpcAccountInfoConfig, RpcProgramAccountsConfig},
    rpc_filter::{Memcmp, RpcFilterType},
};
use solana_sdk::{account::Account, commitment_config::CommitmentConfig, pubkey::Pubkey};
use std::{future::Future, sync::Arc, time::Duration};
use tokio::time::{sleep, timeout};
use tracing::warn;

/// Un "wrapper" autour du RpcClient de Solana qui ajoute une logique de
/// ré-essai automatique pour les appels RPC qui échouent à cause d'erreurs réseau temporaires.
/// Chaque tentative est bornée par `request_timeout` : aucun appel ne reste en attente indéfiniment.
#[derive(Clone)]
pub struct ResilientRpcClient {
    client: Arc<RpcClient>,
    max_retries: u8,
    delay_ms: u64,
    request_timeout: Duration,
}

impl ResilientRpcClient {
    /// Construit un nouveau client RPC résilient.
    pub fn new(
        rpc_url: String,
        commitment: CommitmentConfig,
        request_timeout: Duration,
        max_retries: u8,
        delay_ms: u64,
    ) -> Self {
        Self {
            client: Arc::new(RpcClient::new_with_timeout_and_commitment(
                rpc_url,
                request_timeout,
                commitment,
            )),
            max_retries,
            delay_ms,
            request_timeout,
        }
    }

    /// Méthode "passe-plat" pour accéder à la configuration de commitment du client sous-jacent.
    pub fn commitment(&self) -> CommitmentConfig {
        self.client.commitment()
    }

    /// Détermine si une erreur du client est temporaire et si une nouvelle tentative doit être effectuée.
    fn is_retryable(error: &ClientError) -> bool {
        matches!(
            error.kind,
            ClientErrorKind::Reqwest(_) | ClientErrorKind::RpcError(_) | ClientErrorKind::Io(_)
        )
    }

    /// Boucle de ré-essai commune à toutes les méthodes wrappées.
    async fn call<T, F, Fut>(&self, method: &'static str, target: &Pubkey, op: F) -> Result<T>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = Result<T, ClientError>>,
    {
        let mut attempt: u8 = 0;
        loop {
            let error = match timeout(self.request_timeout, op()).await {
                Ok(Ok(value)) => return Ok(value),
                Ok(Err(e)) if !Self::is_retryable(&e) => {
                    return Err(e).with_context(|| format!("Échec de {} pour {}", method, target));
                }
                Ok(Err(e)) => anyhow::Error::new(e),
                Err(_) => anyhow!("timeout après {:?}", self.request_timeout),
            };

            if attempt >= self.max_retries {
                return Err(error.context(format!("Échec final de {} pour {}", method, target)));
            }
            attempt += 1;
            warn!(method, target = %target, attempt, error = %error, "Erreur RPC temporaire, nouvelle tentative...");
            sleep(Duration::from_millis(self.delay_ms)).await;
        }
    }

    // --- MÉTHODES WRAPPÉES AVEC LOGIQUE DE RÉ-ESSAI ---

    /// Récupère un compte complet, `None` s'il n'existe pas.
    pub async fn get_account(&self, pubkey: &Pubkey) -> Result<Option<Account>> {
        let client = &self.client;
        let commitment = self.commitment();
        self.call("get_account", pubkey, move || async move {
            client
                .get_account_with_commitment(pubkey, commitment)
                .await
                .map(|response| response.value)
        })
        .await
    }

    pub async fn get_program_accounts_with_config(
        &self,
        program_id: &Pubkey,
        config: RpcProgramAccountsConfig,
    ) -> Result<Vec<(Pubkey, Account)>> {
        let client = &self.client;
        self.call("get_program_accounts", program_id, move || {
            let config = config.clone();
            async move { client.get_program_accounts_with_config(program_id, config).await }
        })
        .await
    }

    pub async fn get_token_account_balance(&self, pubkey: &Pubkey) -> Result<TokenBalance> {
        let client = &self.client;
        let commitment = self.commitment();
        self.call("get_token_account_balance", pubkey, move || async move {
            client
                .get_token_account_balance_with_commitment(pubkey, commitment)
                .await
                .map(|response| TokenBalance::new(response.value.amount, response.value.decimals))
        })
        .await
    }

    pub async fn get_token_supply(&self, mint: &Pubkey) -> Result<TokenBalance> {
        let client = &self.client;
        let commitment = self.commitment();
        self.call("get_token_supply", mint, move || async move {
            client
                .get_token_supply_with_commitment(mint, commitment)
                .await
                .map(|response| TokenBalance::new(response.value.amount, response.value.decimals))
        })
        .await
    }

    fn program_accounts_config(&self, query: &ProgramAccountsQuery) -> RpcProgramAccountsConfig {
        let mut filters = Vec::with_capacity(query.memcmp.len() + 1);
        if let Some(size) = query.data_size {
            filters.push(RpcFilterType::DataSize(size));
        }
        for memcmp in &query.memcmp {
            filters.push(RpcFilterType::Memcmp(Memcmp::new_base58_encoded(memcmp.offset, &memcmp.bytes)));
        }

        RpcProgramAccountsConfig {
            filters: Some(filters),
            account_config: RpcAccountInfoConfig {
                encoding: Some(UiAccountEncoding::Base64),
                data_slice: None,
                commitment: Some(self.commitment()),
                min_context_slot: None,
            },
            with_context: Some(false),
            sort_results: None,
        }
    }
}

#[async_trait]
impl ChainAccessor for ResilientRpcClient {
    async fn get_account_info(&self, address: &Pubkey) -> Result<Option<Vec<u8>>> {
        Ok(self.get_account(address).await?.map(|account| account.data))
    }

    async fn get_program_accounts(
        &self,
        program_id: &Pubkey,
        query: &ProgramAccountsQuery,
    ) -> Result<Vec<(Pubkey, Vec<u8>)>> {
        let config = self.program_accounts_config(query);
        let accounts = self.get_program_accounts_with_config(program_id, config).await?;
        Ok(accounts.into_iter().map(|(address, account)| (address, account.data)).collect())
    }

    async fn get_token_account_balance(&self, address: &Pubkey) -> Result<TokenBalance> {
        ResilientRpcClient::get_token_account_balance(self, address).await
    }

    async fn get_token_supply(&self, mint: &Pubkey) -> Result<TokenBalance> {
        ResilientRpcClient::get_token_supply(self, mint).await
    }
}
