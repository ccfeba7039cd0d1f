use std::collections::{BTreeMap, HashMap};
use std::path::Path;

use alloy::primitives::Address;
use anyhow::{Context, Result};
use serde::Deserialize;
use yieldscope_types::{ChainId, Strategy, Vault};

/// Vaults and strategies of one chain, as exported by the indexing pass.
#[derive(Debug, Default, Deserialize)]
pub struct ChainSnapshot {
    #[serde(default)]
    pub vaults: Vec<Vault>,
    /// Strategies keyed by the address of their vault.
    #[serde(default)]
    pub strategies: HashMap<Address, Vec<Strategy>>,
}

impl ChainSnapshot {
    pub fn vaults_by_address(&self) -> HashMap<Address, Vault> {
        self.vaults
            .iter()
            .map(|vault| (vault.address, vault.clone()))
            .collect()
    }

    pub fn strategies_by_vault(&self) -> HashMap<Address, HashMap<Address, Strategy>> {
        self.strategies
            .iter()
            .map(|(vault, strategies)| {
                let by_address = strategies
                    .iter()
                    .map(|strategy| (strategy.address, strategy.clone()))
                    .collect();
                (*vault, by_address)
            })
            .collect()
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(transparent)]
pub struct VaultSnapshot(BTreeMap<ChainId, ChainSnapshot>);

impl VaultSnapshot {
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).context("Invalid vault snapshot")
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("Cannot read vault snapshot {}", path.display()))?;
        Self::from_json(&json)
    }

    pub fn chains(&self) -> impl Iterator<Item = (ChainId, &ChainSnapshot)> {
        self.0.iter().map(|(chain_id, chain)| (*chain_id, chain))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }
}
