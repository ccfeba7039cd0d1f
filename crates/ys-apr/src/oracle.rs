use std::sync::Arc;

use alloy::primitives::{Address, I256};
use bigdecimal::BigDecimal;
use num_traits::Zero;
use yieldscope_chain::{AprOracle, ChainDataSource, ChainError, ChainRegistry};
use yieldscope_metrics::AprMetrics;
use yieldscope_types::{ChainId, to_normalized_amount};

/// The oracle answers with 18 decimals fixed-point APRs.
pub const APR_DECIMALS: u32 = 18;

/// Wraps the APR oracle of one chain and normalizes its answers.
pub struct OracleAdapter {
    chain_id: ChainId,
    oracle: Arc<dyn AprOracle>,
    metrics: Arc<AprMetrics>,
}

impl OracleAdapter {
    pub fn new(chain_id: ChainId, oracle: Arc<dyn AprOracle>, metrics: Arc<AprMetrics>) -> Self {
        Self {
            chain_id,
            oracle,
            metrics,
        }
    }

    /// Resolves the oracle of `chain_id`.
    ///
    /// Returns `None` when the chain is unknown, has no oracle deployed or the
    /// oracle client cannot be built.
    pub fn connect(
        registry: &ChainRegistry,
        source: &dyn ChainDataSource,
        chain_id: ChainId,
        metrics: Arc<AprMetrics>,
    ) -> Option<Self> {
        let Some(chain) = registry.get(chain_id) else {
            tracing::debug!(chain_id, "[OracleAdapter] Unknown chain, no APR oracle");
            return None;
        };
        let oracle_address = chain.apr_oracle()?;

        match source.apr_oracle(chain_id, oracle_address) {
            Ok(oracle) => Some(Self::new(chain_id, oracle, metrics)),
            Err(e) => {
                tracing::error!(
                    chain_id,
                    oracle = %oracle_address,
                    "[OracleAdapter] 🔴 Cannot build APR oracle client: {e}"
                );
                None
            }
        }
    }

    /// APR of a V3 vault according to the oracle.
    ///
    /// `getStrategyApr` is tried first. A failure or a zero answer means the
    /// call is not supported by this vault, and `getCurrentApr` is used
    /// instead. A genuine 0% APR therefore also goes through the second call.
    /// Zero when both calls fail.
    pub async fn vault_apr(&self, vault: Address) -> BigDecimal {
        match self.oracle.get_strategy_apr(vault, I256::ZERO).await {
            Ok(apr) if !apr.is_zero() => return to_normalized_amount(apr, APR_DECIMALS),
            Ok(_) => {}
            Err(e) => {
                tracing::debug!(
                    chain_id = self.chain_id,
                    vault = %vault,
                    "[OracleAdapter] getStrategyApr unsupported: {e}"
                );
            }
        }

        self.metrics.record_oracle_fallback(self.chain_id);
        match self.oracle.get_current_apr(vault).await {
            Ok(apr) => to_normalized_amount(apr, APR_DECIMALS),
            Err(e) => {
                tracing::warn!(
                    chain_id = self.chain_id,
                    vault = %vault,
                    "[OracleAdapter] ⚠️ getCurrentApr failed: {e}"
                );
                BigDecimal::zero()
            }
        }
    }

    /// Instantaneous APR of a single strategy.
    pub async fn strategy_apr(&self, strategy: Address) -> Result<BigDecimal, ChainError> {
        let apr = self.oracle.get_strategy_apr(strategy, I256::ZERO).await;
        if apr.is_err() {
            self.metrics.record_strategy_apr_failure(self.chain_id);
        }
        apr.map(|apr| to_normalized_amount(apr, APR_DECIMALS))
    }
}
