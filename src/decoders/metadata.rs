// DANS : src/decoders/metadata.rs

use anyhow::{bail, Context, Result};
use borsh::{BorshDeserialize, BorshSerialize};
use solana_sdk::{pubkey, pubkey::Pubkey};

pub const TOKEN_METADATA_PROGRAM_ID: Pubkey = pubkey!("metaqbxxUerdq28cj1RbAWkYQm3ybzjb6a8bt518x1s");

/// Discriminant `Key::MetadataV1` du programme Metaplex.
const METADATA_V1_KEY: u8 = 4;

// Les structures on-chain, dans l'ordre exact des champs Borsh.
// Les champs qui suivent `is_mutable` (edition nonce, collection...) ne nous intéressent pas.
#[derive(BorshSerialize, BorshDeserialize, Debug, Clone)]
pub struct RawCreator {
    pub address: [u8; 32],
    pub verified: bool,
    pub share: u8,
}

#[derive(BorshSerialize, BorshDeserialize, Debug, Clone)]
pub struct RawMetadata {
    pub key: u8,
    pub update_authority: [u8; 32],
    pub mint: [u8; 32],
    pub name: String,
    pub symbol: String,
    pub uri: String,
    pub seller_fee_basis_points: u16,
    pub creators: Option<Vec<RawCreator>>,
    pub primary_sale_happened: bool,
    pub is_mutable: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DecodedMetadata {
    pub mint: Pubkey,
    pub update_authority: Pubkey,
    pub name: String,
    pub symbol: String,
    pub uri: String,
    pub is_mutable: bool,
    pub creators: Vec<Pubkey>,
}

/// Adresse (PDA) du compte de métadonnées d'un mint.
pub fn metadata_address(mint: &Pubkey) -> Pubkey {
    let (address, _bump) = Pubkey::find_program_address(
        &[b"metadata", TOKEN_METADATA_PROGRAM_ID.as_ref(), mint.as_ref()],
        &TOKEN_METADATA_PROGRAM_ID,
    );
    address
}

/// Décode un compte de métadonnées Metaplex (v1).
pub fn decode_metadata(data: &[u8]) -> Result<DecodedMetadata> {
    let mut cursor = data;
    let raw = RawMetadata::deserialize(&mut cursor)
        .context("Données de métadonnées illisibles")?;
    if raw.key != METADATA_V1_KEY {
        bail!("Clé de compte inattendue {} (attendu MetadataV1)", raw.key);
    }

    // Les chaînes sont paddées avec des \0 sur la chaîne.
    let clean = |s: String| s.trim_end_matches('\0').trim().to_string();

    Ok(DecodedMetadata {
        mint: Pubkey::new_from_array(raw.mint),
        update_authority: Pubkey::new_from_array(raw.update_authority),
        name: clean(raw.name),
        symbol: clean(raw.symbol),
        uri: clean(raw.uri),
        is_mutable: raw.is_mutable,
        creators: raw
            .creators
            .unwrap_or_default()
            .into_iter()
            .map(|c| Pubkey::new_from_array(c.address))
            .collect(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decoders::fixtures::metadata_bytes;

    #[test]
    fn decodes_padded_strings_and_mutability() {
        let mint = Pubkey::new_unique();
        let data = metadata_bytes(&mint, "Dog Coin", "DOG", "https://example.org/dog.json", false);

        let decoded = decode_metadata(&data).unwrap();
        assert_eq!(decoded.mint, mint);
        assert_eq!(decoded.name, "Dog Coin");
        assert_eq!(decoded.symbol, "DOG");
        assert_eq!(decoded.uri, "https://example.org/dog.json");
        assert!(!decoded.is_mutable);
    }

    #[test]
    fn rejects_other_account_kinds() {
        let mut data = metadata_bytes(&Pubkey::new_unique(), "A", "A", "", true);
        data[0] = 6; // MasterEditionV2
        assert!(decode_metadata(&data).is_err());
    }

    #[test]
    fn rejects_garbage() {
        assert!(decode_metadata(&[4, 1, 2, 3]).is_err());
    }

    #[test]
    fn metadata_address_is_deterministic_per_mint() {
        let mint = Pubkey::new_unique();
        assert_eq!(metadata_address(&mint), metadata_address(&mint));
        assert_ne!(metadata_address(&mint), metadata_address(&Pubkey::new_unique()));
    }
}
