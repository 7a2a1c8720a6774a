// DANS : src/decoders/raydium_amm_v4.rs
// Découverte d'un pool Raydium AMM v4 : compte du pool + marché OpenBook -> PoolIdentity.

use crate::error::AnalysisError;
use crate::filtering::{MarketAccounts, PoolIdentity};
use crate::rpc::{ChainAccessor, MemcmpFilter, ProgramAccountsQuery};
use anyhow::{anyhow, bail, Context, Result};
use bytemuck::{from_bytes, Pod, Zeroable};
use solana_sdk::{pubkey, pubkey::Pubkey};
use std::mem::size_of;
use tracing::{debug, info};

pub const RAYDIUM_AMM_V4_PROGRAM_ID: Pubkey = pubkey!("675kPX9MHTjS2zt1qfr1NYHuzeLXfQM9H24wFSUt1Mp8");

// Les structures on-chain. Les clés sont gardées en [u8; 32] pour rester Pod.
#[repr(C, packed)] #[derive(Clone, Copy, Pod, Zeroable, Debug)] struct Fees { pub min_separate_numerator: u64, pub min_separate_denominator: u64, pub trade_fee_numerator: u64, pub trade_fee_denominator: u64, pub pnl_numerator: u64, pub pnl_denominator: u64, pub swap_fee_numerator: u64, pub swap_fee_denominator: u64, }
#[repr(C, packed)] #[derive(Clone, Copy, Pod, Zeroable, Debug)] struct OutPutData { pub need_take_pnl_coin: u64, pub need_take_pnl_pc: u64, pub total_pnl_pc: u64, pub total_pnl_coin: u64, pub pool_open_time: u64, pub punish_pc_amount: u64, pub punish_coin_amount: u64, pub orderbook_to_init_time: u64, pub swap_coin_in_amount: u128, pub swap_pc_out_amount: u128, pub swap_take_pc_fee: u64, pub swap_pc_in_amount: u128, pub swap_coin_out_amount: u128, pub swap_take_coin_fee: u64, }
#[repr(C, packed)] #[derive(Clone, Copy, Pod, Zeroable, Debug)] struct AmmInfoData { pub status: u64, pub nonce: u64, pub order_num: u64, pub depth: u64, pub coin_decimals: u64, pub pc_decimals: u64, pub state: u64, pub reset_flag: u64, pub min_size: u64, pub vol_max_cut_ratio: u64, pub amount_wave: u64, pub coin_lot_size: u64, pub pc_lot_size: u64, pub min_price_multiplier: u64, pub max_price_multiplier: u64, pub sys_decimal_value: u64, pub fees: Fees, pub out_put: OutPutData, pub token_coin: [u8; 32], pub token_pc: [u8; 32], pub coin_mint: [u8; 32], pub pc_mint: [u8; 32], pub lp_mint: [u8; 32], pub open_orders: [u8; 32], pub market: [u8; 32], pub serum_dex: [u8; 32], pub target_orders: [u8; 32], pub withdraw_queue: [u8; 32], pub token_temp_lp: [u8; 32], pub amm_owner: [u8; 32], pub lp_amount: u64, pub client_order_id: u64, pub padding: [u64; 2], }

/// Début du layout `MarketStateV3` d'OpenBook (5 octets de padding "serum" inclus).
#[repr(C, packed)]
#[derive(Clone, Copy, Pod, Zeroable, Debug)]
struct MinimalMarketLayout {
    blob: [u8; 5],
    account_flags: u64,
    own_address: [u8; 32],
    vault_signer_nonce: u64,
    base_mint: [u8; 32],
    quote_mint: [u8; 32],
    base_vault: [u8; 32],
    base_deposits_total: u64,
    base_fees_accrued: u64,
    quote_vault: [u8; 32],
    quote_deposits_total: u64,
    quote_fees_accrued: u64,
    quote_dust_threshold: u64,
    request_queue: [u8; 32],
    event_queue: [u8; 32],
    bids: [u8; 32],
    asks: [u8; 32],
}

/// Taille d'un compte de pool AMM v4 (752 octets).
pub const AMM_V4_ACCOUNT_LEN: usize = size_of::<AmmInfoData>();
/// Position du mint "pc" (quote) dans le compte du pool, pour les scans memcmp.
pub const QUOTE_MINT_OFFSET: usize = 432;

/// Les clés d'un pool AMM v4 telles qu'elles sont stockées on-chain.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedAmmKeys {
    pub address: Pubkey,
    pub base_mint: Pubkey,
    pub quote_mint: Pubkey,
    pub base_vault: Pubkey,
    pub quote_vault: Pubkey,
    pub lp_mint: Pubkey,
    pub market: Pubkey,
    pub market_program_id: Pubkey,
    pub open_orders: Pubkey,
    pub base_decimals: u8,
    pub quote_decimals: u8,
}

pub fn decode_pool(address: &Pubkey, data: &[u8]) -> Result<DecodedAmmKeys> {
    if data.len() < AMM_V4_ACCOUNT_LEN {
        bail!("AMM V4 data length mismatch ({} < {}).", data.len(), AMM_V4_ACCOUNT_LEN);
    }
    let pool_struct: &AmmInfoData = from_bytes(&data[..AMM_V4_ACCOUNT_LEN]);
    let status = pool_struct.status;
    if status == 0 {
        bail!("Pool {} is not initialized.", address);
    }

    let key = Pubkey::new_from_array;
    Ok(DecodedAmmKeys {
        address: *address,
        base_mint: key(pool_struct.coin_mint),
        quote_mint: key(pool_struct.pc_mint),
        base_vault: key(pool_struct.token_coin),
        quote_vault: key(pool_struct.token_pc),
        lp_mint: key(pool_struct.lp_mint),
        market: key(pool_struct.market),
        market_program_id: key(pool_struct.serum_dex),
        open_orders: key(pool_struct.open_orders),
        base_decimals: u8::try_from(pool_struct.coin_decimals).context("coin_decimals invalide")?,
        quote_decimals: u8::try_from(pool_struct.pc_decimals).context("pc_decimals invalide")?,
    })
}

/// Extrait bids / asks / event queue d'un compte de marché OpenBook.
pub fn decode_market_accounts(data: &[u8]) -> Result<MarketAccounts> {
    let market: &MinimalMarketLayout = from_bytes(
        data.get(..size_of::<MinimalMarketLayout>())
            .ok_or_else(|| anyhow!("Données du marché trop courtes ({} octets)", data.len()))?,
    );
    Ok(MarketAccounts {
        bids: Pubkey::new_from_array(market.bids),
        asks: Pubkey::new_from_array(market.asks),
        event_queue: Pubkey::new_from_array(market.event_queue),
    })
}

impl DecodedAmmKeys {
    pub fn identity(&self, market_accounts: MarketAccounts) -> Result<PoolIdentity, AnalysisError> {
        PoolIdentity::new(
            self.address,
            self.base_mint,
            self.quote_mint,
            self.quote_vault,
            self.lp_mint,
            self.market,
        )?
        .with_market_accounts(market_accounts)
    }
}

/// Retrouve les clés d'un pool à partir de son adresse.
pub async fn discover_pool(chain: &dyn ChainAccessor, pool_id: &Pubkey) -> Result<PoolIdentity> {
    debug!(pool = %pool_id, "Récupération du compte du pool...");
    let pool_data = chain
        .get_account_info(pool_id)
        .await?
        .ok_or(AnalysisError::PoolNotFound(*pool_id))?;
    let keys = decode_pool(pool_id, &pool_data)
        .with_context(|| format!("Pool {} invalide", pool_id))?;

    debug!(pool = %pool_id, market = %keys.market, "Récupération du marché...");
    let market_data = chain
        .get_account_info(&keys.market)
        .await?
        .ok_or_else(|| anyhow!("Marché {} du pool {} introuvable", keys.market, pool_id))?;
    let market_accounts = decode_market_accounts(&market_data)?;

    let identity = keys.identity(market_accounts)?;
    info!(pool = %pool_id, base_mint = %identity.base_mint, quote_mint = %identity.quote_mint, "Pool trouvé.");
    Ok(identity)
}

/// Résultat d'un scan : le nombre de pools trouvés et les premiers d'entre eux.
#[derive(Debug, Clone)]
pub struct PoolListing {
    pub total: usize,
    pub pools: Vec<DecodedAmmKeys>,
}

/// Scanne les pools AMM v4 dont le token quote est `quote_mint`.
/// `total` compte tous les pools décodables, `pools` n'en garde que `limit`.
pub async fn list_pools(chain: &dyn ChainAccessor, quote_mint: &Pubkey, limit: usize) -> Result<PoolListing> {
    let query = ProgramAccountsQuery {
        data_size: Some(AMM_V4_ACCOUNT_LEN as u64),
        memcmp: vec![MemcmpFilter::new(QUOTE_MINT_OFFSET, quote_mint.to_bytes().to_vec())],
    };
    let accounts = chain
        .get_program_accounts(&RAYDIUM_AMM_V4_PROGRAM_ID, &query)
        .await
        .context("Échec du scan des pools AMM v4")?;

    let mut pools: Vec<DecodedAmmKeys> = accounts
        .iter()
        .filter_map(|(address, data)| decode_pool(address, data).ok())
        .collect();
    let total = pools.len();
    pools.truncate(limit);
    info!(scanned = accounts.len(), found = total, kept = pools.len(), "Scan des pools AMM v4 terminé.");

    Ok(PoolListing { total, pools })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decoders::fixtures::{amm_v4_pool_bytes, market_bytes, AmmFixture};
    use crate::rpc::InMemoryChain;
    use std::mem::offset_of;

    #[test]
    fn layout_matches_on_chain_offsets() {
        assert_eq!(AMM_V4_ACCOUNT_LEN, 752);
        assert_eq!(offset_of!(AmmInfoData, pc_mint), QUOTE_MINT_OFFSET);
        assert_eq!(offset_of!(AmmInfoData, lp_mint), 464);
        assert_eq!(offset_of!(MinimalMarketLayout, event_queue), 253);
        assert_eq!(offset_of!(MinimalMarketLayout, bids), 285);
        assert_eq!(offset_of!(MinimalMarketLayout, asks), 317);
    }

    #[test]
    fn decodes_pool_keys() {
        let fixture = AmmFixture::random();
        let data = amm_v4_pool_bytes(&fixture);
        let keys = decode_pool(&fixture.address, &data).unwrap();
        assert_eq!(keys.base_mint, fixture.base_mint);
        assert_eq!(keys.quote_mint, fixture.quote_mint);
        assert_eq!(keys.quote_vault, fixture.quote_vault);
        assert_eq!(keys.lp_mint, fixture.lp_mint);
        assert_eq!(keys.market, fixture.market);
        assert_eq!(keys.quote_decimals, 9);
    }

    #[test]
    fn uninitialized_pool_is_rejected() {
        let fixture = AmmFixture::random();
        let mut data = amm_v4_pool_bytes(&fixture);
        data[..8].copy_from_slice(&0u64.to_le_bytes());
        assert!(decode_pool(&fixture.address, &data).is_err());
    }

    #[tokio::test]
    async fn discovers_identity_with_market_accounts() {
        let fixture = AmmFixture::random();
        let (bids, asks, event_queue) = (Pubkey::new_unique(), Pubkey::new_unique(), Pubkey::new_unique());
        let chain = InMemoryChain::new()
            .with_account(fixture.address, amm_v4_pool_bytes(&fixture))
            .with_account(fixture.market, market_bytes(&event_queue, &bids, &asks));

        let identity = discover_pool(&chain, &fixture.address).await.unwrap();
        assert_eq!(identity.lp_mint, fixture.lp_mint);
        assert_eq!(
            identity.market_accounts,
            Some(MarketAccounts { bids, asks, event_queue })
        );
    }

    #[tokio::test]
    async fn missing_pool_is_reported_as_not_found() {
        let chain = InMemoryChain::new();
        let pool_id = Pubkey::new_unique();
        let err = discover_pool(&chain, &pool_id).await.unwrap_err();
        assert!(matches!(
            err.downcast_ref::<AnalysisError>(),
            Some(AnalysisError::PoolNotFound(id)) if *id == pool_id
        ));
    }

    #[tokio::test]
    async fn lists_only_pools_quoted_in_requested_mint() {
        let wanted = AmmFixture::random();
        let mut other = AmmFixture::random();
        other.quote_mint = Pubkey::new_unique();
        let chain = InMemoryChain::new()
            .with_program_account(RAYDIUM_AMM_V4_PROGRAM_ID, wanted.address, amm_v4_pool_bytes(&wanted))
            .with_program_account(RAYDIUM_AMM_V4_PROGRAM_ID, other.address, amm_v4_pool_bytes(&other));

        let listing = list_pools(&chain, &wanted.quote_mint, 5).await.unwrap();
        assert_eq!(listing.total, 1);
        assert_eq!(listing.pools.len(), 1);
        assert_eq!(listing.pools[0].address, wanted.address);
    }

    #[tokio::test]
    async fn limit_truncates_pools_but_not_the_total() {
        let quote_mint = Pubkey::new_unique();
        let chain = (0..4).fold(InMemoryChain::new(), |chain, _| {
            let mut fixture = AmmFixture::random();
            fixture.quote_mint = quote_mint;
            chain.with_program_account(RAYDIUM_AMM_V4_PROGRAM_ID, fixture.address, amm_v4_pool_bytes(&fixture))
        });

        let listing = list_pools(&chain, &quote_mint, 2).await.unwrap();
        assert_eq!(listing.total, 4);
        assert_eq!(listing.pools.len(), 2);
    }
}
