use alloy::primitives::Address;
use bigdecimal::BigDecimal;
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};

use crate::ChainId;

#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    Serialize,
    Deserialize,
    Hash,
    Eq,
    PartialEq,
    Display,
    AsRefStr,
    EnumString,
)]
#[strum(ascii_case_insensitive)]
#[serde(rename_all = "lowercase")]
pub enum VaultKind {
    #[default]
    Legacy,
    /// Single strategy vault.
    Single,
    /// Multi strategy vault (allocator).
    Multiple,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct VaultMetadata {
    /// When set, the debt-ratio weighted APR is reported as the net APR
    /// instead of the oracle APR.
    #[serde(default, rename = "shouldUseV2APR")]
    pub should_use_v2_apr: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Vault {
    pub chain_id: ChainId,
    pub address: Address,
    pub version: String,
    #[serde(default)]
    pub kind: VaultKind,
    /// Block at which the vault was deployed.
    #[serde(default)]
    pub activation: u64,
    /// `None` when the total assets were never read.
    #[serde(default)]
    pub last_total_assets: Option<BigDecimal>,
    #[serde(default)]
    pub metadata: VaultMetadata,
}

impl Vault {
    pub fn new(chain_id: ChainId, address: Address, version: impl Into<String>) -> Self {
        Self {
            chain_id,
            address,
            version: version.into(),
            kind: VaultKind::default(),
            activation: 0,
            last_total_assets: None,
            metadata: VaultMetadata::default(),
        }
    }

    /// True when the vault has no known deposits.
    pub fn is_empty(&self) -> bool {
        self.last_total_assets
            .as_ref()
            .is_none_or(|assets| *assets == BigDecimal::from(0))
    }
}

/// V3 vaults are either tagged with a V3 kind or carry a `3.x` (or `~3.x`) version.
pub fn is_v3_vault(vault: &Vault) -> bool {
    let version_major = vault.version.split('.').next().unwrap_or_default();
    matches!(vault.kind, VaultKind::Single | VaultKind::Multiple)
        || version_major == "3"
        || version_major == "~3"
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use super::*;

    #[test]
    fn test_is_v3_vault() {
        let mut vault = Vault::new(1, Address::ZERO, "0.4.6");
        assert!(!is_v3_vault(&vault));

        vault.version = "3.0.2".to_string();
        assert!(is_v3_vault(&vault));

        vault.version = "~3.0".to_string();
        assert!(is_v3_vault(&vault));

        vault.version = "0.4.3".to_string();
        vault.kind = VaultKind::Multiple;
        assert!(is_v3_vault(&vault));

        vault.kind = VaultKind::Single;
        assert!(is_v3_vault(&vault));
    }

    #[test]
    fn test_vault_is_empty() {
        let mut vault = Vault::new(1, Address::ZERO, "3.0.2");
        assert!(vault.is_empty());

        vault.last_total_assets = Some(BigDecimal::from(0));
        assert!(vault.is_empty());

        vault.last_total_assets = Some(BigDecimal::from_str("0.000001").unwrap());
        assert!(!vault.is_empty());
    }

    #[test]
    fn test_vault_deserialize_defaults() {
        let vault: Vault = serde_json::from_str(
            r#"{
                "chainId": 1,
                "address": "0x028eC7330ff87667b6dfb0D94b954c820195336c",
                "version": "3.0.2",
                "kind": "multiple",
                "metadata": { "shouldUseV2APR": true }
            }"#,
        )
        .unwrap();

        assert_eq!(vault.kind, VaultKind::Multiple);
        assert_eq!(vault.activation, 0);
        assert!(vault.last_total_assets.is_none());
        assert!(vault.metadata.should_use_v2_apr);
    }
}
