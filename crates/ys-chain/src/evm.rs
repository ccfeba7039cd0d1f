use std::fmt::Display;
use std::future::IntoFuture;
use std::sync::Arc;
use std::time::Duration;

use alloy::primitives::{Address, B256, I256, LogData, U256};
use alloy::providers::{DynProvider, Provider, ProviderBuilder};
use alloy::rpc::types::{Filter, Log};
use alloy::sol;
use alloy::sol_types::SolEvent;
use dashmap::DashMap;
use yieldscope_types::{ChainId, EventKind};

use crate::config::{ChainConfig, ChainRegistry};
use crate::error::ChainError;
use crate::source::{AprOracle, ChainDataSource, EventFilter, EventSource, EventStream, RawEvent};

sol! {
    #[allow(missing_docs)]
    contract IYearnVault {
        event UpdateManagementFee(uint256 managementFee);
        event UpdatePerformanceFee(uint256 performanceFee);
    }

    #[allow(missing_docs)]
    #[sol(rpc)]
    contract IAprOracle {
        function getStrategyApr(address _strategy, int256 _debtChange) external view returns (uint256);
        function getCurrentApr(address _vault) external view returns (uint256);
    }
}

/// topic0 of the log emitted for `kind`.
pub fn signature_hash(kind: EventKind) -> B256 {
    match kind {
        EventKind::UpdateManagementFee => IYearnVault::UpdateManagementFee::SIGNATURE_HASH,
        EventKind::UpdatePerformanceFee => IYearnVault::UpdatePerformanceFee::SIGNATURE_HASH,
    }
}

pub fn decode_value(kind: EventKind, data: &LogData) -> Result<U256, ChainError> {
    match kind {
        EventKind::UpdateManagementFee => {
            IYearnVault::UpdateManagementFee::decode_log_data(data).map(|e| e.managementFee)
        }
        EventKind::UpdatePerformanceFee => {
            IYearnVault::UpdatePerformanceFee::decode_log_data(data).map(|e| e.performanceFee)
        }
    }
    .map_err(ChainError::decode)
}

fn to_raw_event(kind: EventKind, log: &Log) -> Result<RawEvent, ChainError> {
    let value = decode_value(kind, log.data())?;
    Ok(RawEvent {
        block_number: log.block_number,
        tx_hash: log.transaction_hash,
        tx_index: log.transaction_index,
        log_index: log.log_index,
        value,
    })
}

/// Splits `[from_block, to_block]` in inclusive windows of at most `max_range` blocks.
pub fn block_windows(
    from_block: u64,
    to_block: u64,
    max_range: u64,
) -> impl Iterator<Item = (u64, u64)> {
    let step = max_range.max(1);
    let mut next = (from_block <= to_block).then_some(from_block);
    std::iter::from_fn(move || {
        let start = next?;
        let end = start.saturating_add(step - 1).min(to_block);
        next = end.checked_add(1).filter(|n| *n <= to_block);
        Some((start, end))
    })
}

async fn with_timeout<T, E, F>(operation: &str, timeout: Duration, fut: F) -> Result<T, ChainError>
where
    E: Display,
    F: IntoFuture<Output = Result<T, E>>,
{
    match tokio::time::timeout(timeout, fut).await {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(e)) => Err(ChainError::rpc(operation, e)),
        Err(_) => Err(ChainError::timeout(operation, timeout)),
    }
}

/// [`ChainDataSource`] backed by one HTTP JSON-RPC provider per chain.
pub struct AlloyChainDataSource {
    registry: Arc<ChainRegistry>,
    providers: DashMap<ChainId, DynProvider>,
}

impl AlloyChainDataSource {
    pub fn new(registry: Arc<ChainRegistry>) -> Self {
        Self {
            registry,
            providers: DashMap::new(),
        }
    }

    fn chain(&self, chain_id: ChainId) -> Result<&ChainConfig, ChainError> {
        self.registry
            .get(chain_id)
            .ok_or(ChainError::UnknownChain(chain_id))
    }

    fn provider(&self, config: &ChainConfig) -> DynProvider {
        self.providers
            .entry(config.chain_id)
            .or_insert_with(|| {
                tracing::debug!(
                    chain_id = config.chain_id,
                    "[AlloyChainDataSource] 🔌 Creating RPC provider for {}",
                    config.name
                );
                ProviderBuilder::new()
                    .connect_http(config.rpc_url.clone())
                    .erased()
            })
            .clone()
    }
}

impl ChainDataSource for AlloyChainDataSource {
    fn event_source(&self, chain_id: ChainId) -> Result<Arc<dyn EventSource>, ChainError> {
        let config = self.chain(chain_id)?;
        Ok(Arc::new(AlloyEventSource {
            provider: self.provider(config),
            max_block_range: config.max_block_range,
            timeout: config.rpc_timeout(),
        }))
    }

    fn apr_oracle(
        &self,
        chain_id: ChainId,
        oracle: Address,
    ) -> Result<Arc<dyn AprOracle>, ChainError> {
        let config = self.chain(chain_id)?;
        if oracle.is_zero() {
            return Err(ChainError::OracleUnavailable(chain_id));
        }
        Ok(Arc::new(AlloyAprOracle {
            contract: IAprOracle::new(oracle, self.provider(config)),
            timeout: config.rpc_timeout(),
        }))
    }
}

pub struct AlloyEventSource {
    provider: DynProvider,
    max_block_range: u64,
    timeout: Duration,
}

impl EventSource for AlloyEventSource {
    fn events(&self, filter: EventFilter) -> EventStream<'_> {
        Box::pin(async_stream::stream! {
            let to_block = match filter.to_block {
                Some(block) => block,
                None => {
                    match with_timeout("eth_blockNumber", self.timeout, self.provider.get_block_number()).await {
                        Ok(head) => head,
                        Err(e) => {
                            yield Err(e);
                            return;
                        }
                    }
                }
            };

            for (from, to) in block_windows(filter.from_block, to_block, self.max_block_range) {
                let query = Filter::new()
                    .address(filter.address)
                    .event_signature(signature_hash(filter.kind))
                    .from_block(from)
                    .to_block(to);

                match with_timeout("eth_getLogs", self.timeout, self.provider.get_logs(&query)).await {
                    Ok(logs) => {
                        for log in &logs {
                            yield to_raw_event(filter.kind, log);
                        }
                    }
                    Err(e) => {
                        yield Err(e);
                        return;
                    }
                }
            }
        })
    }
}

pub struct AlloyAprOracle {
    contract: IAprOracle::IAprOracleInstance<DynProvider>,
    timeout: Duration,
}

#[async_trait::async_trait]
impl AprOracle for AlloyAprOracle {
    async fn get_strategy_apr(
        &self,
        strategy: Address,
        debt_change: I256,
    ) -> Result<U256, ChainError> {
        with_timeout(
            "getStrategyApr",
            self.timeout,
            self.contract.getStrategyApr(strategy, debt_change).call(),
        )
        .await
    }

    async fn get_current_apr(&self, vault: Address) -> Result<U256, ChainError> {
        with_timeout(
            "getCurrentApr",
            self.timeout,
            self.contract.getCurrentApr(vault).call(),
        )
        .await
    }
}
