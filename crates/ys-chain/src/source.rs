use std::sync::Arc;

use alloy::primitives::{Address, I256, TxHash, U256};
use futures::stream::BoxStream;
use yieldscope_types::{ChainId, EventKind};

use crate::error::ChainError;

/// Lazily consumed sequence of decoded logs. An `Err` item either reports a
/// single undecodable log (the stream continues) or a failed request (the
/// stream ends right after it).
pub type EventStream<'a> = BoxStream<'a, Result<RawEvent, ChainError>>;

/// Which logs to fetch for one vault.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EventFilter {
    pub address: Address,
    pub kind: EventKind,
    pub from_block: u64,
    /// `None` means up to the chain head.
    pub to_block: Option<u64>,
}

/// A log as returned by the node, with its numeric payload decoded.
///
/// Location fields are optional because pending logs do not carry them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawEvent {
    pub block_number: Option<u64>,
    pub tx_hash: Option<TxHash>,
    pub tx_index: Option<u64>,
    pub log_index: Option<u64>,
    pub value: U256,
}

pub trait EventSource: Send + Sync {
    fn events(&self, filter: EventFilter) -> EventStream<'_>;
}

/// Read-only bindings of the on-chain APR oracle. Both calls return an APR
/// as an 18 decimals fixed-point integer.
#[async_trait::async_trait]
pub trait AprOracle: Send + Sync {
    /// Expected APR of a strategy (or of a V3 vault seen as a strategy) after
    /// a change of `debt_change` in its debt.
    async fn get_strategy_apr(&self, strategy: Address, debt_change: I256)
    -> Result<U256, ChainError>;

    /// Current APR of a vault, supported by older oracle deployments.
    async fn get_current_apr(&self, vault: Address) -> Result<U256, ChainError>;
}

/// Hands out per-chain connections.
pub trait ChainDataSource: Send + Sync {
    fn event_source(&self, chain_id: ChainId) -> Result<Arc<dyn EventSource>, ChainError>;

    fn apr_oracle(
        &self,
        chain_id: ChainId,
        oracle: Address,
    ) -> Result<Arc<dyn AprOracle>, ChainError>;
}
