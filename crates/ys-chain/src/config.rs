use std::collections::{BTreeMap, HashSet};
use std::path::Path;
use std::time::Duration;

use alloy::primitives::Address;
use serde::{Deserialize, Serialize};
use url::Url;
use yieldscope_types::ChainId;

use crate::error::ConfigError;

const fn default_max_block_range() -> u64 {
    100_000
}

const fn default_rpc_timeout_secs() -> u64 {
    30
}

/// Static description of one indexed chain.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ChainConfig {
    pub chain_id: ChainId,
    pub name: String,
    pub rpc_url: Url,
    /// Zero when no APR oracle is deployed on the chain.
    #[serde(default)]
    pub apr_oracle: Address,
    /// Largest block window requested in a single `eth_getLogs` call.
    #[serde(default = "default_max_block_range")]
    pub max_block_range: u64,
    #[serde(default = "default_rpc_timeout_secs")]
    pub rpc_timeout_secs: u64,
}

impl ChainConfig {
    pub fn new(chain_id: ChainId, name: impl Into<String>, rpc_url: Url) -> Self {
        Self {
            chain_id,
            name: name.into(),
            rpc_url,
            apr_oracle: Address::ZERO,
            max_block_range: default_max_block_range(),
            rpc_timeout_secs: default_rpc_timeout_secs(),
        }
    }

    #[must_use]
    pub fn with_apr_oracle(mut self, apr_oracle: Address) -> Self {
        self.apr_oracle = apr_oracle;
        self
    }

    /// The APR oracle address, `None` when it is not deployed on this chain.
    pub fn apr_oracle(&self) -> Option<Address> {
        (!self.apr_oracle.is_zero()).then_some(self.apr_oracle)
    }

    pub const fn rpc_timeout(&self) -> Duration {
        Duration::from_secs(self.rpc_timeout_secs)
    }
}

/// All the chains known to the process, built once at startup.
#[derive(Debug, Clone, Default)]
pub struct ChainRegistry {
    chains: BTreeMap<ChainId, ChainConfig>,
}

impl ChainRegistry {
    pub fn new(configs: Vec<ChainConfig>) -> Result<Self, ConfigError> {
        let mut seen = HashSet::new();
        let mut chains = BTreeMap::new();

        for config in configs {
            if !seen.insert(config.chain_id) {
                return Err(ConfigError::Invalid(format!(
                    "chain {} is configured twice",
                    config.chain_id
                )));
            }
            if config.max_block_range == 0 {
                return Err(ConfigError::Invalid(format!(
                    "chain {} has a zero maxBlockRange",
                    config.chain_id
                )));
            }
            if config.rpc_timeout_secs == 0 {
                return Err(ConfigError::Invalid(format!(
                    "chain {} has a zero rpcTimeoutSecs",
                    config.chain_id
                )));
            }
            chains.insert(config.chain_id, config);
        }

        Ok(Self { chains })
    }

    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let configs: Vec<ChainConfig> = serde_json::from_str(json)?;
        Self::new(configs)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&content)
    }

    pub fn get(&self, chain_id: ChainId) -> Option<&ChainConfig> {
        self.chains.get(&chain_id)
    }

    pub fn contains(&self, chain_id: ChainId) -> bool {
        self.chains.contains_key(&chain_id)
    }

    /// Chain ids in ascending order.
    pub fn chain_ids(&self) -> impl Iterator<Item = ChainId> + '_ {
        self.chains.keys().copied()
    }

    pub fn len(&self) -> usize {
        self.chains.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chains.is_empty()
    }
}
