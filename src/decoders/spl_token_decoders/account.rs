use anyhow::{anyhow, Result};
use solana_program_pack::Pack;
use spl_token::state::Account as SplTokenAccount;

/// Taille d'un compte de token SPL classique (165 octets).
pub const TOKEN_ACCOUNT_LEN: usize = SplTokenAccount::LEN;
/// Le mint occupe les 32 premiers octets.
pub const MINT_OFFSET: usize = 0;
/// Le solde (u64 little-endian) suit le mint et le propriétaire.
pub const AMOUNT_OFFSET: usize = 64;

/// Lit le solde d'un compte de token directement dans son layout brut,
/// sans passer par `unpack` (qui rejette les comptes gelés ou non initialisés).
pub fn read_amount(data: &[u8]) -> Result<u64> {
    let bytes: [u8; 8] = data
        .get(AMOUNT_OFFSET..AMOUNT_OFFSET + 8)
        .ok_or_else(|| anyhow!("Compte de token trop court ({} octets)", data.len()))?
        .try_into()?;
    Ok(u64::from_le_bytes(bytes))
}
