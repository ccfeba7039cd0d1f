use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use alloy::primitives::Address;
use dashmap::DashMap;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use yieldscope_chain::{ChainDataSource, EventFilter};
use yieldscope_metrics::IndexerMetrics;
use yieldscope_types::{ChainId, EventHistory, EventKind, EventRecord, Vault};

use crate::fetcher::{EventKey, filter_vault_events};

#[derive(Debug, Clone)]
pub struct HarvestConfig {
    /// Maximum number of vault log queries in flight at once.
    pub max_concurrency: usize,
}

impl Default for HarvestConfig {
    fn default() -> Self {
        Self {
            max_concurrency: 16,
        }
    }
}

/// Number of semaphore permits for a configured concurrency, within `1..=MAX_PERMITS`.
fn permits(max_concurrency: usize) -> usize {
    max_concurrency.clamp(1, Semaphore::MAX_PERMITS)
}

pub struct EventHarvester {
    source: Arc<dyn ChainDataSource>,
    metrics: Arc<IndexerMetrics>,
    config: HarvestConfig,
}

impl EventHarvester {
    pub fn new(
        source: Arc<dyn ChainDataSource>,
        metrics: Arc<IndexerMetrics>,
        config: HarvestConfig,
    ) -> Self {
        Self {
            source,
            metrics,
            config,
        }
    }

    /// Collects every `kind` event emitted by `vaults` between `start` and `end`.
    ///
    /// A `start` of 0 makes each vault start at its own activation block and a
    /// missing `end` means up to the chain head. Returns once every vault query
    /// has completed. A vault whose query fails simply has no entry.
    pub async fn harvest(
        &self,
        chain_id: ChainId,
        vaults: &HashMap<Address, Vault>,
        kind: EventKind,
        start: u64,
        end: Option<u64>,
    ) -> EventHistory {
        let time_before = Instant::now();

        let source = match self.source.event_source(chain_id) {
            Ok(source) => source,
            Err(e) => {
                tracing::error!(chain_id, "[EventHarvester] 🔴 No event source for {kind}: {e}");
                return EventHistory::new();
            }
        };

        let accumulator: Arc<DashMap<EventKey, Vec<EventRecord>>> = Arc::default();
        let semaphore = Arc::new(Semaphore::new(permits(self.config.max_concurrency)));
        let mut tasks = JoinSet::new();

        for (address, vault) in vaults {
            if vault.chain_id != chain_id {
                tracing::warn!(
                    chain_id,
                    vault = %address,
                    "[EventHarvester] ⏭️ Skipping vault registered on chain {}",
                    vault.chain_id
                );
                continue;
            }

            let filter = EventFilter {
                address: *address,
                kind,
                from_block: if start == 0 { vault.activation } else { start },
                to_block: end,
            };
            let source = Arc::clone(&source);
            let accumulator = Arc::clone(&accumulator);
            let semaphore = Arc::clone(&semaphore);
            let metrics = Arc::clone(&self.metrics);

            tasks.spawn(async move {
                let Ok(_permit) = semaphore.acquire_owned().await else {
                    return;
                };
                filter_vault_events(chain_id, source.as_ref(), filter, &accumulator, &metrics)
                    .await;
            });
        }

        while let Some(joined) = tasks.join_next().await {
            if let Err(e) = joined {
                tracing::error!(chain_id, "[EventHarvester] 😱 Vault log task aborted: {e}");
            }
        }

        // Every task is joined, so this is the last reference.
        let accumulator = Arc::try_unwrap(accumulator).unwrap_or_else(|shared| (*shared).clone());

        let mut history = EventHistory::new();
        for (key, records) in accumulator {
            history.extend_block(key.vault, key.block_number, records);
        }

        tracing::info!(
            chain_id,
            vaults = history.vault_count(),
            records = history.record_count(),
            "[EventHarvester] ✅ It took {:?} to retrieve the {kind} updates",
            time_before.elapsed()
        );
        history
    }

    /// Historical management fee changes of `vaults`.
    pub async fn handle_update_management_fee(
        &self,
        chain_id: ChainId,
        vaults: &HashMap<Address, Vault>,
        start: u64,
        end: Option<u64>,
    ) -> EventHistory {
        self.harvest(chain_id, vaults, EventKind::UpdateManagementFee, start, end)
            .await
    }

    /// Historical performance fee changes of `vaults`.
    pub async fn handle_update_performance_fee(
        &self,
        chain_id: ChainId,
        vaults: &HashMap<Address, Vault>,
        start: u64,
        end: Option<u64>,
    ) -> EventHistory {
        self.harvest(chain_id, vaults, EventKind::UpdatePerformanceFee, start, end)
            .await
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use alloy::primitives::{TxHash, U256, address};
    use yieldscope_chain::{AprOracle, ChainError, EventSource, EventStream, RawEvent};
    use yieldscope_metrics::MetricsRegistry;

    use super::*;

    const VAULT_A: Address = address!("0x028eC7330ff87667b6dfb0D94b954c820195336c");
    const VAULT_B: Address = address!("0xa258C4606Ca8206D8aA700cE2143D7db854D168c");
    const VAULT_C: Address = address!("0xdA816459F1AB5631232FE5e97a05BBBb94970c95");

    #[derive(Clone)]
    enum MockItem {
        Log {
            block: u64,
            tx_index: u64,
            log_index: u64,
            value: u64,
        },
        Pending,
        DecodeError,
        RpcError,
    }

    impl MockItem {
        fn into_result(self) -> Result<RawEvent, ChainError> {
            match self {
                Self::Log {
                    block,
                    tx_index,
                    log_index,
                    value,
                } => Ok(RawEvent {
                    block_number: Some(block),
                    tx_hash: Some(TxHash::with_last_byte(tx_index as u8)),
                    tx_index: Some(tx_index),
                    log_index: Some(log_index),
                    value: U256::from(value),
                }),
                Self::Pending => Ok(RawEvent {
                    block_number: None,
                    tx_hash: None,
                    tx_index: None,
                    log_index: None,
                    value: U256::ZERO,
                }),
                Self::DecodeError => Err(ChainError::decode("bad data")),
                Self::RpcError => Err(ChainError::rpc("eth_getLogs", "connection reset")),
            }
        }
    }

    const fn log(block: u64, tx_index: u64, log_index: u64, value: u64) -> MockItem {
        MockItem::Log {
            block,
            tx_index,
            log_index,
            value,
        }
    }

    #[derive(Default)]
    struct MockEventSource {
        logs: HashMap<Address, Vec<MockItem>>,
        delays: HashMap<Address, Duration>,
        requested: Mutex<Vec<EventFilter>>,
        in_flight: AtomicUsize,
        max_in_flight: AtomicUsize,
    }

    impl MockEventSource {
        fn with_logs(mut self, vault: Address, items: Vec<MockItem>) -> Self {
            self.logs.insert(vault, items);
            self
        }

        fn with_delay(mut self, vault: Address, delay: Duration) -> Self {
            self.delays.insert(vault, delay);
            self
        }
    }

    impl EventSource for MockEventSource {
        fn events(&self, filter: EventFilter) -> EventStream<'_> {
            self.requested.lock().unwrap().push(filter);
            let items = self.logs.get(&filter.address).cloned().unwrap_or_default();
            let delay = self.delays.get(&filter.address).copied().unwrap_or_default();

            Box::pin(async_stream::stream! {
                let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
                self.max_in_flight.fetch_max(now, Ordering::SeqCst);
                tokio::time::sleep(delay).await;
                for item in items {
                    let is_fatal = matches!(item, MockItem::RpcError);
                    yield item.into_result();
                    if is_fatal {
                        break;
                    }
                }
                self.in_flight.fetch_sub(1, Ordering::SeqCst);
            })
        }
    }

    struct MockChain {
        chain_id: ChainId,
        events: Arc<MockEventSource>,
    }

    impl ChainDataSource for MockChain {
        fn event_source(&self, chain_id: ChainId) -> Result<Arc<dyn EventSource>, ChainError> {
            if chain_id != self.chain_id {
                return Err(ChainError::UnknownChain(chain_id));
            }
            let source: Arc<dyn EventSource> = self.events.clone();
            Ok(source)
        }

        fn apr_oracle(
            &self,
            chain_id: ChainId,
            _oracle: Address,
        ) -> Result<Arc<dyn AprOracle>, ChainError> {
            Err(ChainError::OracleUnavailable(chain_id))
        }
    }

    fn vault(address: Address, activation: u64) -> Vault {
        let mut vault = Vault::new(1, address, "0.4.6");
        vault.activation = activation;
        vault
    }

    fn vaults() -> HashMap<Address, Vault> {
        HashMap::from([
            (VAULT_A, vault(VAULT_A, 100)),
            (VAULT_B, vault(VAULT_B, 200)),
            (VAULT_C, vault(VAULT_C, 300)),
        ])
    }

    fn make_harvester(
        events: MockEventSource,
        max_concurrency: usize,
    ) -> (EventHarvester, Arc<MockEventSource>) {
        let events = Arc::new(events);
        let chain = MockChain {
            chain_id: 1,
            events: events.clone(),
        };
        let harvester = EventHarvester::new(
            Arc::new(chain),
            MetricsRegistry::new().indexer.clone(),
            HarvestConfig { max_concurrency },
        );
        (harvester, events)
    }

    fn sample_source() -> MockEventSource {
        MockEventSource::default()
            .with_logs(
                VAULT_A,
                vec![log(150, 0, 0, 200), log(150, 4, 1, 150), log(180, 1, 0, 100)],
            )
            .with_logs(VAULT_B, vec![log(250, 2, 5, 0)])
    }

    #[tokio::test]
    async fn test_harvest_groups_records_by_vault_and_block() {
        let (harvester, _) = make_harvester(sample_source(), 4);
        let history = harvester
            .handle_update_management_fee(1, &vaults(), 0, None)
            .await;

        assert_eq!(history.vault_count(), 2);
        assert_eq!(history.record_count(), 4);

        let same_block = history.get(&VAULT_A, 150).unwrap();
        assert_eq!(same_block.len(), 2);
        assert_eq!(same_block[0].value, U256::from(200));
        assert_eq!(same_block[1].value, U256::from(150));
        assert!(same_block.iter().all(|r| r.block_number == 150));
        assert!(
            same_block
                .iter()
                .all(|r| r.event_type == EventKind::UpdateManagementFee)
        );

        assert_eq!(history.get(&VAULT_A, 180).unwrap().len(), 1);
        assert_eq!(history.get(&VAULT_B, 250).unwrap()[0].log_index, 5);
        assert!(history.vault(&VAULT_C).is_none());
    }

    #[tokio::test]
    async fn test_harvest_start_block_selection() {
        let (harvester, events) = make_harvester(MockEventSource::default(), 4);
        harvester
            .harvest(1, &vaults(), EventKind::UpdatePerformanceFee, 0, Some(1_000))
            .await;

        let mut requested = events.requested.lock().unwrap().clone();
        requested.sort_by_key(|f| f.from_block);
        let starts: Vec<_> = requested.iter().map(|f| (f.address, f.from_block)).collect();
        assert_eq!(starts, vec![(VAULT_A, 100), (VAULT_B, 200), (VAULT_C, 300)]);
        assert!(requested.iter().all(|f| f.to_block == Some(1_000)));
        assert!(
            requested
                .iter()
                .all(|f| f.kind == EventKind::UpdatePerformanceFee)
        );

        events.requested.lock().unwrap().clear();
        harvester
            .harvest(1, &vaults(), EventKind::UpdatePerformanceFee, 42, None)
            .await;
        let requested = events.requested.lock().unwrap().clone();
        assert_eq!(requested.len(), 3);
        assert!(requested.iter().all(|f| f.from_block == 42 && f.to_block.is_none()));
    }

    #[tokio::test]
    async fn test_harvest_isolates_failing_vaults() {
        let source = MockEventSource::default()
            .with_logs(VAULT_A, vec![MockItem::RpcError])
            .with_logs(
                VAULT_B,
                vec![log(210, 0, 0, 100), MockItem::RpcError, log(220, 0, 0, 300)],
            )
            .with_logs(
                VAULT_C,
                vec![MockItem::DecodeError, MockItem::Pending, log(310, 0, 0, 50)],
            );
        let (harvester, _) = make_harvester(source, 4);
        let history = harvester
            .handle_update_management_fee(1, &vaults(), 0, None)
            .await;

        assert!(history.vault(&VAULT_A).is_none());
        // records read before the failure are kept, the stream stops there
        assert_eq!(history.get(&VAULT_B, 210).unwrap().len(), 1);
        assert!(history.get(&VAULT_B, 220).is_none());
        // bad and pending logs are skipped
        assert_eq!(history.get(&VAULT_C, 310).unwrap().len(), 1);
        assert_eq!(history.record_count(), 2);
    }

    #[tokio::test]
    async fn test_harvest_is_independent_of_completion_order() {
        let fast_a = sample_source()
            .with_logs(VAULT_C, vec![log(300, 0, 0, 10), log(300, 0, 1, 20)])
            .with_delay(VAULT_A, Duration::from_millis(1))
            .with_delay(VAULT_B, Duration::from_millis(20))
            .with_delay(VAULT_C, Duration::from_millis(40));
        let slow_a = sample_source()
            .with_logs(VAULT_C, vec![log(300, 0, 0, 10), log(300, 0, 1, 20)])
            .with_delay(VAULT_A, Duration::from_millis(40))
            .with_delay(VAULT_B, Duration::from_millis(20))
            .with_delay(VAULT_C, Duration::from_millis(1));

        let (first, _) = make_harvester(fast_a, 3);
        let (second, _) = make_harvester(slow_a, 1);

        let a = first.handle_update_management_fee(1, &vaults(), 0, None).await;
        let b = second.handle_update_management_fee(1, &vaults(), 0, None).await;
        assert_eq!(a, b);
    }

    #[tokio::test]
    async fn test_harvest_is_idempotent() {
        let (harvester, _) = make_harvester(sample_source(), 2);
        let first = harvester
            .handle_update_management_fee(1, &vaults(), 0, Some(500))
            .await;
        let second = harvester
            .handle_update_management_fee(1, &vaults(), 0, Some(500))
            .await;
        assert_eq!(first, second);
        assert!(!first.is_empty());
    }

    #[tokio::test]
    async fn test_harvest_bounds_concurrency() {
        let source = MockEventSource::default()
            .with_delay(VAULT_A, Duration::from_millis(20))
            .with_delay(VAULT_B, Duration::from_millis(20))
            .with_delay(VAULT_C, Duration::from_millis(20));
        let (harvester, events) = make_harvester(source, 2);
        harvester
            .handle_update_management_fee(1, &vaults(), 0, None)
            .await;

        assert_eq!(events.requested.lock().unwrap().len(), 3);
        assert!(events.max_in_flight.load(Ordering::SeqCst) <= 2);
        assert_eq!(events.in_flight.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_permits_are_clamped() {
        assert_eq!(permits(0), 1);
        assert_eq!(permits(16), 16);
        assert_eq!(permits(usize::MAX), Semaphore::MAX_PERMITS);
    }

    #[tokio::test]
    async fn test_harvest_with_unbounded_concurrency() {
        let (harvester, _) = make_harvester(sample_source(), usize::MAX);
        let history = harvester
            .handle_update_management_fee(1, &vaults(), 0, None)
            .await;
        assert_eq!(history.record_count(), 4);
    }

    #[tokio::test]
    async fn test_harvest_unknown_chain_and_foreign_vaults() {
        let (harvester, events) = make_harvester(sample_source(), 4);
        let history = harvester
            .handle_update_management_fee(10, &vaults(), 0, None)
            .await;
        assert!(history.is_empty());
        assert!(events.requested.lock().unwrap().is_empty());

        let mut mixed = vaults();
        if let Some(v) = mixed.get_mut(&VAULT_A) {
            v.chain_id = 10;
        }
        let history = harvester
            .handle_update_management_fee(1, &mixed, 0, None)
            .await;
        assert!(history.vault(&VAULT_A).is_none());
        assert!(history.vault(&VAULT_B).is_some());
    }
}
