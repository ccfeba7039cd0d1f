use std::collections::HashMap;
use std::sync::Arc;

use alloy::primitives::{Address, U256};
use bigdecimal::BigDecimal;
use futures::{StreamExt, stream};
use num_traits::{One, Zero};
use yieldscope_chain::{ChainDataSource, ChainRegistry};
use yieldscope_metrics::AprMetrics;
use yieldscope_types::{
    CompositeData, ForwardApy, ForwardApyKind, Strategy, Vault, VaultKind, is_v3_vault,
    to_normalized_amount,
};

use crate::convert::compound_apr;
use crate::oracle::OracleAdapter;

/// Debt ratios and fees are expressed with 4 decimals (10 000 = 100%).
const BPS_DECIMALS: u32 = 4;

/// Flat haircut applied to the debt-ratio APR.
fn haircut() -> BigDecimal {
    BigDecimal::new(9.into(), 1)
}

fn bps(value: U256) -> BigDecimal {
    to_normalized_amount(value, BPS_DECIMALS)
}

/// Share of the strategy gains left to depositors.
fn fee_multiplier(strategy: &Strategy) -> BigDecimal {
    BigDecimal::one() - bps(strategy.last_performance_fee)
}

#[derive(Debug, Clone)]
pub struct CalculatorConfig {
    /// Vaults computed at the same time by [`ForwardApyCalculator::compute_many`].
    pub max_concurrency: usize,
}

impl Default for CalculatorConfig {
    fn default() -> Self {
        Self { max_concurrency: 8 }
    }
}

pub struct ForwardApyCalculator {
    registry: Arc<ChainRegistry>,
    source: Arc<dyn ChainDataSource>,
    metrics: Arc<AprMetrics>,
    config: CalculatorConfig,
}

impl ForwardApyCalculator {
    pub fn new(
        registry: Arc<ChainRegistry>,
        source: Arc<dyn ChainDataSource>,
        metrics: Arc<AprMetrics>,
        config: CalculatorConfig,
    ) -> Self {
        Self {
            registry,
            source,
            metrics,
            config,
        }
    }

    /// Forward APY of one V3 vault given its strategies, keyed by strategy address.
    ///
    /// Returns the zero valued [`ForwardApy`] without any oracle call when the
    /// vault chain has no usable APR oracle.
    pub async fn compute(
        &self,
        vault: &Vault,
        strategies: &HashMap<Address, Strategy>,
    ) -> ForwardApy {
        let Some(adapter) = OracleAdapter::connect(
            &self.registry,
            self.source.as_ref(),
            vault.chain_id,
            self.metrics.clone(),
        ) else {
            return ForwardApy::default();
        };

        let oracle_apr = adapter.vault_apr(vault.address).await;
        let debt_ratio_apr = match vault.kind {
            VaultKind::Multiple => debt_ratio_apr(&adapter, vault, strategies).await,
            VaultKind::Single | VaultKind::Legacy => BigDecimal::zero(),
        };

        let primary_apr = if vault.metadata.should_use_v2_apr {
            &debt_ratio_apr
        } else {
            &oracle_apr
        };

        tracing::debug!(
            chain_id = vault.chain_id,
            vault = %vault.address,
            %oracle_apr,
            %debt_ratio_apr,
            "[ForwardApyCalculator] APRs resolved"
        );

        ForwardApy {
            kind: ForwardApyKind::V3OnchainOracle,
            net_apy: compound_apr(primary_apr),
            composite: CompositeData {
                v3_oracle_current_apr: compound_apr(&oracle_apr),
                v3_oracle_strat_ratio_apr: compound_apr(&debt_ratio_apr),
            },
        }
    }

    /// Computes the forward APY of every V3 vault of `vaults`.
    ///
    /// `strategies` maps a vault address to its strategies. Vaults that are
    /// not V3 are left out of the result.
    pub async fn compute_many(
        &self,
        vaults: &HashMap<Address, Vault>,
        strategies: &HashMap<Address, HashMap<Address, Strategy>>,
    ) -> HashMap<Address, ForwardApy> {
        let start = std::time::Instant::now();
        let no_strategies = HashMap::new();

        let results: HashMap<Address, ForwardApy> = stream::iter(
            vaults.values().filter(|vault| is_v3_vault(vault)),
        )
        .map(|vault| {
            let vault_strategies = strategies.get(&vault.address).unwrap_or(&no_strategies);
            async move { (vault.address, self.compute(vault, vault_strategies).await) }
        })
        .buffer_unordered(self.config.max_concurrency.max(1))
        .collect()
        .await;

        tracing::info!(
            vaults = results.len(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "[ForwardApyCalculator] 📈 Forward APYs computed"
        );
        results
    }
}

/// APR derived from the strategies of a multi strategy vault, after the haircut.
///
/// Strategies are visited in ascending address order. Per-strategy calls are
/// sequential.
async fn debt_ratio_apr(
    adapter: &OracleAdapter,
    vault: &Vault,
    strategies: &HashMap<Address, Strategy>,
) -> BigDecimal {
    let mut ordered: Vec<&Strategy> = strategies.values().collect();
    ordered.sort_by_key(|strategy| strategy.address);

    if vault.is_empty() {
        // No deposits: report the APR of the first strategy that answers.
        for strategy in ordered {
            match adapter.strategy_apr(strategy.address).await {
                Ok(apr) => return apr * fee_multiplier(strategy) * haircut(),
                Err(e) => {
                    tracing::warn!(
                        chain_id = vault.chain_id,
                        vault = %vault.address,
                        strategy = %strategy.address,
                        "[ForwardApyCalculator] ⚠️ Strategy APR unavailable: {e}"
                    );
                }
            }
        }
        return BigDecimal::zero();
    }

    let mut total = BigDecimal::zero();
    for strategy in ordered {
        let Some(debt_ratio) = strategy.active_debt_ratio() else {
            continue;
        };

        match adapter.strategy_apr(strategy.address).await {
            Ok(apr) => total += apr * bps(debt_ratio) * fee_multiplier(strategy),
            Err(e) => {
                tracing::warn!(
                    chain_id = vault.chain_id,
                    vault = %vault.address,
                    strategy = %strategy.address,
                    "[ForwardApyCalculator] ⚠️ Skipping strategy: {e}"
                );
            }
        }
    }

    total * haircut()
}
