pub mod chain;
pub mod memory;
pub mod offchain;
pub mod resilient_client;

pub use chain::{ChainAccessor, MemcmpFilter, ProgramAccountsQuery, TokenBalance};
pub use memory::InMemoryChain;
pub use offchain::{has_socials, HttpMetadataFetcher, MetadataFetcher, StaticMetadataFetcher};
pub use resilient_client::ResilientRpcClient;
