//! Forward APY of V3 vaults.
//!
//! The net APY combines the APR reported by the on-chain APR oracle with a
//! fallback APR computed from the debt ratio and performance fee of every
//! strategy of the vault, both compounded weekly.

pub mod convert;
pub mod forward;
pub mod oracle;

pub use convert::{COMPOUNDING_PERIODS, compound_apr, convert_float_apr_to_apy};
pub use forward::{CalculatorConfig, ForwardApyCalculator};
pub use oracle::OracleAdapter;
