use alloy::primitives::{Address, U256};
use serde::{Deserialize, Serialize};

/// A strategy attached to a multi strategy vault.
///
/// Debt ratio and performance fee both use a 10 000 = 100% scale.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Strategy {
    pub address: Address,
    pub vault_address: Address,
    #[serde(default)]
    pub last_debt_ratio: Option<U256>,
    #[serde(default)]
    pub last_performance_fee: U256,
}

impl Strategy {
    pub const fn new(address: Address, vault_address: Address) -> Self {
        Self {
            address,
            vault_address,
            last_debt_ratio: None,
            last_performance_fee: U256::ZERO,
        }
    }

    /// The debt ratio, `None` when the strategy has no allocation.
    ///
    /// Strategies without allocation are skipped by the debt-ratio weighting.
    pub fn active_debt_ratio(&self) -> Option<U256> {
        self.last_debt_ratio.filter(|ratio| !ratio.is_zero())
    }
}
