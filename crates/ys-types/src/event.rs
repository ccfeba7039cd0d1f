use std::collections::{BTreeMap, HashMap};

use alloy::primitives::{Address, TxHash, U256};
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumIter, EnumString};

/// Fee-parameter events indexed for every vault.
#[derive(
    Debug,
    Clone,
    Copy,
    Serialize,
    Deserialize,
    Hash,
    Eq,
    PartialEq,
    Display,
    AsRefStr,
    EnumString,
    EnumIter,
)]
pub enum EventKind {
    #[strum(serialize = "updateManagementFee")]
    #[serde(rename = "updateManagementFee")]
    UpdateManagementFee,
    #[strum(serialize = "updatePerformanceFee")]
    #[serde(rename = "updatePerformanceFee")]
    UpdatePerformanceFee,
}

/// One decoded log entry.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "camelCase")]
pub struct EventRecord {
    pub event_type: EventKind,
    pub tx_hash: TxHash,
    pub block_number: u64,
    pub tx_index: u64,
    pub log_index: u64,
    pub value: U256,
}

impl EventRecord {
    /// Position of the log inside its block.
    pub const fn position(&self) -> (u64, u64) {
        (self.tx_index, self.log_index)
    }
}

pub type BlockEvents = BTreeMap<u64, Vec<EventRecord>>;

/// vault address -> block number -> records emitted in that block.
///
/// Records stored under a block always carry that block number and are kept
/// in on-chain order (transaction index, then log index).
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct EventHistory(HashMap<Address, BlockEvents>);

impl EventHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends records for a block. Records whose block number differs from
    /// `block_number` are dropped.
    pub fn extend_block(
        &mut self,
        vault: Address,
        block_number: u64,
        records: impl IntoIterator<Item = EventRecord>,
    ) {
        let block = self
            .0
            .entry(vault)
            .or_default()
            .entry(block_number)
            .or_default();
        block.extend(
            records
                .into_iter()
                .filter(|record| record.block_number == block_number),
        );
        block.sort_by_key(EventRecord::position);
    }

    pub fn vault(&self, vault: &Address) -> Option<&BlockEvents> {
        self.0.get(vault)
    }

    pub fn get(&self, vault: &Address, block_number: u64) -> Option<&[EventRecord]> {
        self.0
            .get(vault)
            .and_then(|blocks| blocks.get(&block_number))
            .map(Vec::as_slice)
    }

    /// Most recent record emitted at or before `block_number`.
    pub fn latest_at(&self, vault: &Address, block_number: u64) -> Option<&EventRecord> {
        self.0
            .get(vault)?
            .range(..=block_number)
            .next_back()
            .and_then(|(_, records)| records.last())
    }

    pub fn vault_count(&self) -> usize {
        self.0.len()
    }

    pub fn record_count(&self) -> usize {
        self.0
            .values()
            .flat_map(BTreeMap::values)
            .map(Vec::len)
            .sum()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}
