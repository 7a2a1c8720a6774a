// src/decoders/spl_token_decoders/mint.rs

use anyhow::{Context, Result};
use solana_sdk::pubkey::Pubkey;
use spl_token_2022::{
    extension::{BaseStateWithExtensions, StateWithExtensions},
    extension::transfer_fee::TransferFeeConfig,
    state::Mint,
};

// --- STRUCTURE DE SORTIE PROPRE ---
// Ce que les filtres lisent d'un compte de mint.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedMint {
    pub address: Pubkey,
    pub decimals: u8,
    pub supply: u64,
    /// `None` = autorité de mint renoncée.
    pub mint_authority: Option<Pubkey>,
    /// `None` = impossible de geler les comptes.
    pub freeze_authority: Option<Pubkey>,
    pub transfer_fee_basis_points: u16, // Les frais en points de base (100 = 1%)
}

impl DecodedMint {
    pub fn is_renounced(&self) -> bool {
        self.mint_authority.is_none()
    }

    pub fn is_freezable(&self) -> bool {
        self.freeze_authority.is_some()
    }
}

/// Décode les données brutes d'un compte de mint (SPL Token ou Token-2022).
pub fn decode_mint(address: &Pubkey, data: &[u8]) -> Result<DecodedMint> {
    // StateWithExtensions lit à la fois les anciens mints (82 octets) et ceux avec extensions.
    let mint_state = StateWithExtensions::<Mint>::unpack(data)
        .with_context(|| format!("Compte {} n'est pas un mint SPL valide", address))?;
    let base_mint = mint_state.base;

    let transfer_fee_basis_points = mint_state
        .get_extension::<TransferFeeConfig>()
        .map(|config| u16::from(config.newer_transfer_fee.transfer_fee_basis_points))
        .unwrap_or(0);

    Ok(DecodedMint {
        address: *address,
        decimals: base_mint.decimals,
        supply: base_mint.supply,
        mint_authority: base_mint.mint_authority.into(),
        freeze_authority: base_mint.freeze_authority.into(),
        transfer_fee_basis_points,
    })
}
