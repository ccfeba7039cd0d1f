//! Access to the chains the vaults live on.
//!
//! The indexing core only sees the traits of [`source`]; [`evm`] implements
//! them on top of alloy JSON-RPC providers.

pub mod config;
pub mod error;
pub mod evm;
pub mod source;

pub use config::{ChainConfig, ChainRegistry};
pub use error::{ChainError, ConfigError};
pub use evm::AlloyChainDataSource;
pub use source::{AprOracle, ChainDataSource, EventFilter, EventSource, EventStream, RawEvent};
