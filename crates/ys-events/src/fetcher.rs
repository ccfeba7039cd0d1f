use alloy::primitives::Address;
use dashmap::DashMap;
use futures::StreamExt;
use yieldscope_chain::{EventFilter, EventSource, RawEvent};
use yieldscope_metrics::IndexerMetrics;
use yieldscope_types::{ChainId, EventKind, EventRecord};

/// Key of the shared accumulation map.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EventKey {
    pub vault: Address,
    pub block_number: u64,
}

fn to_record(kind: EventKind, raw: RawEvent) -> Option<EventRecord> {
    Some(EventRecord {
        event_type: kind,
        tx_hash: raw.tx_hash?,
        block_number: raw.block_number?,
        tx_index: raw.tx_index?,
        log_index: raw.log_index?,
        value: raw.value,
    })
}

/// Streams the logs matching `filter` and appends every decoded record to
/// `accumulator`. Returns the number of records added.
///
/// Undecodable logs are skipped. A failed request ends the stream; records
/// consumed before the failure stay in the accumulator.
pub async fn filter_vault_events(
    chain_id: ChainId,
    source: &dyn EventSource,
    filter: EventFilter,
    accumulator: &DashMap<EventKey, Vec<EventRecord>>,
    metrics: &IndexerMetrics,
) -> usize {
    let mut events = source.events(filter);
    let mut added = 0;

    while let Some(item) = events.next().await {
        let raw = match item {
            Ok(raw) => raw,
            Err(e) => {
                if e.is_transient() {
                    tracing::warn!(
                        chain_id,
                        vault = %filter.address,
                        event_type = %filter.kind,
                        "[EventFetcher] ⚠️ Log query failed: {e}"
                    );
                } else {
                    tracing::debug!(
                        chain_id,
                        vault = %filter.address,
                        event_type = %filter.kind,
                        "[EventFetcher] Skipping log: {e}"
                    );
                }
                metrics.record_log_query_failed(chain_id, filter.kind.as_ref());
                continue;
            }
        };

        let Some(record) = to_record(filter.kind, raw) else {
            tracing::debug!(
                chain_id,
                vault = %filter.address,
                "[EventFetcher] Ignoring pending log without block location"
            );
            continue;
        };

        let key = EventKey {
            vault: filter.address,
            block_number: record.block_number,
        };
        accumulator.entry(key).or_default().push(record);
        added += 1;
    }

    metrics.record_events_harvested(chain_id, filter.kind.as_ref(), added as u64);
    added
}
