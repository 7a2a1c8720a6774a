// src/decoders/mod.rs

// Décodage des comptes bruts lus sur la chaîne : mints et comptes SPL,
// métadonnées Metaplex, pools Raydium AMM v4.
pub mod fixtures;
pub mod metadata;
pub mod raydium_amm_v4;
pub mod spl_token_decoders;

pub use metadata::{decode_metadata, metadata_address, DecodedMetadata};
pub use spl_token_decoders::{decode_mint, DecodedMint};
