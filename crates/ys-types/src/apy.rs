use bigdecimal::BigDecimal;
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};

/// Method used to derive a forward APY.
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
pub enum ForwardApyKind {
    /// No computation was possible (unknown chain, no oracle).
    #[default]
    #[strum(serialize = "")]
    #[serde(rename = "")]
    Unavailable,
    #[strum(serialize = "v3:onchainOracle")]
    #[serde(rename = "v3:onchainOracle")]
    V3OnchainOracle,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CompositeData {
    /// Compounded oracle APR.
    pub v3_oracle_current_apr: BigDecimal,
    /// Compounded debt-ratio weighted APR.
    pub v3_oracle_strat_ratio_apr: BigDecimal,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ForwardApy {
    #[serde(rename = "type")]
    pub kind: ForwardApyKind,
    pub net_apy: BigDecimal,
    pub composite: CompositeData,
}
