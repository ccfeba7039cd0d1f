pub mod amount;
pub mod apy;
pub mod event;
pub mod strategy;
pub mod vault;

pub use amount::{to_normalized_amount, u256_to_bigint};
pub use apy::{CompositeData, ForwardApy, ForwardApyKind};
pub use event::{EventHistory, EventKind, EventRecord};
pub use strategy::Strategy;
pub use vault::{Vault, VaultKind, VaultMetadata, is_v3_vault};

/// EVM chain identifier.
pub type ChainId = u64;
