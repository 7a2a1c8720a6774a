pub mod account;
pub mod mint;

pub use mint::{decode_mint, DecodedMint};
