//! Encodeurs de comptes on-chain (layouts réels) pour les tests et les snapshots `InMemoryChain`.

use solana_sdk::pubkey::Pubkey;

use super::metadata::{RawCreator, RawMetadata};
use super::raydium_amm_v4::{AMM_V4_ACCOUNT_LEN, QUOTE_MINT_OFFSET};
use super::spl_token_decoders::account::{AMOUNT_OFFSET, TOKEN_ACCOUNT_LEN};

/// Mint SPL classique : 82 octets, COption = tag u32 + clé.
pub fn mint_bytes(
    mint_authority: Option<Pubkey>,
    supply: u64,
    decimals: u8,
    freeze_authority: Option<Pubkey>,
) -> Vec<u8> {
    let mut data = vec![0u8; 82];
    write_coption(&mut data[0..36], mint_authority);
    data[36..44].copy_from_slice(&supply.to_le_bytes());
    data[44] = decimals;
    data[45] = 1; // is_initialized
    write_coption(&mut data[46..82], freeze_authority);
    data
}

/// Compte de token initialisé de 165 octets.
pub fn token_account_bytes(mint: &Pubkey, owner: &Pubkey, amount: u64) -> Vec<u8> {
    let mut data = vec![0u8; TOKEN_ACCOUNT_LEN];
    data[0..32].copy_from_slice(mint.as_ref());
    data[32..64].copy_from_slice(owner.as_ref());
    data[AMOUNT_OFFSET..AMOUNT_OFFSET + 8].copy_from_slice(&amount.to_le_bytes());
    data[108] = 1; // AccountState::Initialized
    data
}

/// Compte de métadonnées Metaplex v1, chaînes paddées comme on-chain.
pub fn metadata_bytes(mint: &Pubkey, name: &str, symbol: &str, uri: &str, is_mutable: bool) -> Vec<u8> {
    let pad = |s: &str, len: usize| {
        let mut padded = s.to_string();
        padded.extend(std::iter::repeat_n('\0', len.saturating_sub(s.len())));
        padded
    };
    let raw = RawMetadata {
        key: 4,
        update_authority: Pubkey::new_unique().to_bytes(),
        mint: mint.to_bytes(),
        name: pad(name, 32),
        symbol: pad(symbol, 10),
        uri: pad(uri, 200),
        seller_fee_basis_points: 0,
        creators: Some(vec![RawCreator { address: Pubkey::new_unique().to_bytes(), verified: true, share: 100 }]),
        primary_sale_happened: false,
        is_mutable,
    };
    let mut data = borsh::to_vec(&raw).unwrap_or_default();
    // edition_nonce, token_standard, collection... : le décodeur doit les ignorer.
    data.extend_from_slice(&[1, 255, 0, 0, 0]);
    data
}

/// Clés d'un pool AMM v4 de test.
#[derive(Debug, Clone)]
pub struct AmmFixture {
    pub address: Pubkey,
    pub base_mint: Pubkey,
    pub quote_mint: Pubkey,
    pub base_vault: Pubkey,
    pub quote_vault: Pubkey,
    pub lp_mint: Pubkey,
    pub market: Pubkey,
}

impl AmmFixture {
    pub fn random() -> Self {
        Self {
            address: Pubkey::new_unique(),
            base_mint: Pubkey::new_unique(),
            quote_mint: Pubkey::new_unique(),
            base_vault: Pubkey::new_unique(),
            quote_vault: Pubkey::new_unique(),
            lp_mint: Pubkey::new_unique(),
            market: Pubkey::new_unique(),
        }
    }
}

/// Compte de pool AMM v4 (752 octets) : status initialisé, décimales 6/9.
pub fn amm_v4_pool_bytes(fixture: &AmmFixture) -> Vec<u8> {
    let mut data = vec![0u8; AMM_V4_ACCOUNT_LEN];
    data[0..8].copy_from_slice(&6u64.to_le_bytes()); // status
    data[32..40].copy_from_slice(&6u64.to_le_bytes()); // coin_decimals
    data[40..48].copy_from_slice(&9u64.to_le_bytes()); // pc_decimals
    let mut put = |offset: usize, key: &Pubkey| data[offset..offset + 32].copy_from_slice(key.as_ref());
    put(336, &fixture.base_vault);
    put(368, &fixture.quote_vault);
    put(400, &fixture.base_mint);
    put(QUOTE_MINT_OFFSET, &fixture.quote_mint);
    put(464, &fixture.lp_mint);
    put(528, &fixture.market);
    data
}

/// Début d'un compte de marché OpenBook v3 (jusqu'aux asks inclus).
pub fn market_bytes(event_queue: &Pubkey, bids: &Pubkey, asks: &Pubkey) -> Vec<u8> {
    let mut data = vec![0u8; 388];
    data[0..5].copy_from_slice(b"serum");
    data[253..285].copy_from_slice(event_queue.as_ref());
    data[285..317].copy_from_slice(bids.as_ref());
    data[317..349].copy_from_slice(asks.as_ref());
    data
}

fn write_coption(slot: &mut [u8], key: Option<Pubkey>) {
    if let Some(key) = key {
        slot[0..4].copy_from_slice(&1u32.to_le_bytes());
        slot[4..36].copy_from_slice(key.as_ref());
    }
}
