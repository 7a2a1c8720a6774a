// Un pool Raydium AMM v4 complet, servi depuis un InMemoryChain.
#![allow(dead_code)]

use pool_sentinel::{
    decoders::{
        fixtures::{amm_v4_pool_bytes, market_bytes, metadata_bytes, mint_bytes, token_account_bytes, AmmFixture},
        metadata_address,
        raydium_amm_v4::discover_pool,
    },
    filtering::{FilterSettings, Pipeline, PipelineOptions, PoolIdentity},
    rpc::{InMemoryChain, StaticMetadataFetcher, TokenBalance},
};
use serde_json::json;
use solana_sdk::pubkey::Pubkey;
use std::{sync::Arc, time::Duration};

pub const METADATA_URI: &str = "https://arweave.net/dog.json";

/// 50 SOL en unités brutes.
pub const HEALTHY_VAULT: &str = "50000000000";

pub struct Scenario {
    pub fixture: AmmFixture,
    pub chain: InMemoryChain,
    pub fetcher: StaticMetadataFetcher,
}

/// 200 holders, le plus gros à 2 % de l'offre.
pub fn healthy_holders() -> Vec<u64> {
    let mut balances = vec![100; 199];
    balances.push(410);
    balances
}

/// LP brûlés, autorités renoncées, métadonnées immuables avec un site web.
pub fn scenario(vault_raw: &str, holders: &[u64]) -> Scenario {
    let mut fixture = AmmFixture::random();
    fixture.quote_mint = spl_token::native_mint::ID;

    let chain = InMemoryChain::new()
        .with_account(fixture.address, amm_v4_pool_bytes(&fixture))
        .with_account(
            fixture.market,
            market_bytes(&Pubkey::new_unique(), &Pubkey::new_unique(), &Pubkey::new_unique()),
        )
        .with_token_supply(fixture.lp_mint, TokenBalance::new("0", 9))
        .with_account(fixture.base_mint, mint_bytes(None, 1_000_000_000, 6, None))
        .with_account(
            metadata_address(&fixture.base_mint),
            metadata_bytes(&fixture.base_mint, "Dog", "DOG", METADATA_URI, false),
        )
        .with_token_balance(fixture.quote_vault, TokenBalance::new(vault_raw, 9));

    let chain = holders.iter().fold(chain, |chain, amount| {
        chain.with_program_account(
            spl_token::ID,
            Pubkey::new_unique(),
            token_account_bytes(&fixture.base_mint, &Pubkey::new_unique(), *amount),
        )
    });

    let fetcher = StaticMetadataFetcher::new()
        .with_document(METADATA_URI, json!({ "name": "Dog", "extensions": { "website": "https://dog.xyz" } }));

    Scenario { fixture, chain, fetcher }
}

impl Scenario {
    pub fn with_delay(self, address: Pubkey, delay: Duration) -> Self {
        Scenario { chain: self.chain.with_delay(address, delay), ..self }
    }

    pub fn with_failure(self, address: Pubkey) -> Self {
        Scenario { chain: self.chain.with_failure(address), ..self }
    }

    pub fn pipeline(&self, options: PipelineOptions) -> Pipeline {
        Pipeline::from_settings(
            &FilterSettings::default(),
            Arc::new(self.chain.clone()),
            Arc::new(self.fetcher.clone()),
            options,
        )
        .unwrap()
    }

    pub async fn identity(&self) -> PoolIdentity {
        discover_pool(&self.chain, &self.fixture.address).await.unwrap()
    }
}
