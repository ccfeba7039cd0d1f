use std::collections::{BTreeMap, HashMap};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use alloy::primitives::Address;
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;
use yieldscope_apr::ForwardApyCalculator;
use yieldscope_chain::ChainRegistry;
use yieldscope_events::EventHarvester;
use yieldscope_notify::InitializationTracker;
use yieldscope_types::{ChainId, EventHistory, ForwardApy};

use crate::snapshot::{ChainSnapshot, VaultSnapshot};

#[derive(Debug, Clone)]
pub struct IndexerSettings {
    pub start_block: u64,
    pub end_block: Option<u64>,
    pub output: Option<PathBuf>,
    /// `None` runs a single pass.
    pub interval: Option<Duration>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChainReport {
    pub management_fees: EventHistory,
    pub performance_fees: EventHistory,
    pub forward_apy: HashMap<Address, ForwardApy>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexReport {
    pub generated_at: DateTime<Utc>,
    pub chains: BTreeMap<ChainId, ChainReport>,
}

pub struct IndexerService {
    registry: Arc<ChainRegistry>,
    snapshot: VaultSnapshot,
    harvester: EventHarvester,
    calculator: ForwardApyCalculator,
    tracker: InitializationTracker,
    settings: IndexerSettings,
}

impl IndexerService {
    pub fn new(
        registry: Arc<ChainRegistry>,
        snapshot: VaultSnapshot,
        harvester: EventHarvester,
        calculator: ForwardApyCalculator,
        tracker: InitializationTracker,
        settings: IndexerSettings,
    ) -> Self {
        Self {
            registry,
            snapshot,
            harvester,
            calculator,
            tracker,
            settings,
        }
    }

    pub async fn run_forever(&self, shutdown: CancellationToken) -> Result<()> {
        let mut first_pass = true;

        loop {
            if shutdown.is_cancelled() {
                tracing::info!("[IndexerService] Shutdown requested");
                break;
            }

            let report = self.run_once(first_pass, &shutdown).await;
            let written = self.write_report(&report);
            first_pass = false;

            let Some(interval) = self.settings.interval else {
                return written;
            };
            if let Err(err) = written {
                tracing::error!(?err, "[IndexerService] 🔴 Failed to write report, retrying next pass");
            }

            let shutdown_fut = shutdown.clone();
            tokio::select! {
                () = shutdown_fut.cancelled() => break,
                () = sleep(interval) => {}
            }
        }

        Ok(())
    }

    async fn run_once(&self, first_pass: bool, shutdown: &CancellationToken) -> IndexReport {
        let start_time = Utc::now();
        let mut chains = BTreeMap::new();

        for (chain_id, chain) in self.snapshot.chains() {
            if shutdown.is_cancelled() {
                break;
            }
            if !self.registry.contains(chain_id) {
                tracing::warn!(chain_id, "[IndexerService] ⚠️ Chain missing from the chain config, skipping");
                continue;
            }

            chains.insert(chain_id, self.index_chain(chain_id, chain).await);

            if first_pass {
                self.tracker.chain_initialized(chain_id).await;
            }
        }

        let duration = Utc::now() - start_time;
        tracing::info!(
            chains = chains.len(),
            "[IndexerService] ✅ Indexing pass done in {}ms",
            duration.num_milliseconds()
        );

        IndexReport {
            generated_at: Utc::now(),
            chains,
        }
    }

    async fn index_chain(&self, chain_id: ChainId, chain: &ChainSnapshot) -> ChainReport {
        let vaults = chain.vaults_by_address();
        let strategies = chain.strategies_by_vault();
        let IndexerSettings {
            start_block,
            end_block,
            ..
        } = self.settings;

        let management_fees = self
            .harvester
            .handle_update_management_fee(chain_id, &vaults, start_block, end_block)
            .await;
        let performance_fees = self
            .harvester
            .handle_update_performance_fee(chain_id, &vaults, start_block, end_block)
            .await;
        let forward_apy = self.calculator.compute_many(&vaults, &strategies).await;

        tracing::info!(
            chain_id,
            vaults = vaults.len(),
            management_fee_records = management_fees.record_count(),
            performance_fee_records = performance_fees.record_count(),
            forward_apys = forward_apy.len(),
            "[IndexerService] 📊 Chain indexed"
        );

        ChainReport {
            management_fees,
            performance_fees,
            forward_apy,
        }
    }

    fn write_report(&self, report: &IndexReport) -> Result<()> {
        let json = serde_json::to_string_pretty(report).context("Failed to serialize report")?;
        match &self.settings.output {
            Some(path) => std::fs::write(path, json)
                .with_context(|| format!("Failed to write report to {}", path.display())),
            None => {
                println!("{json}");
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use yieldscope_apr::CalculatorConfig;
    use yieldscope_chain::{AprOracle, ChainDataSource, ChainError, EventSource};
    use yieldscope_events::HarvestConfig;
    use yieldscope_metrics::MetricsRegistry;
    use yieldscope_notify::LogNotifier;

    use super::*;

    struct NoChain;

    impl ChainDataSource for NoChain {
        fn event_source(&self, chain_id: ChainId) -> Result<Arc<dyn EventSource>, ChainError> {
            Err(ChainError::UnknownChain(chain_id))
        }

        fn apr_oracle(
            &self,
            chain_id: ChainId,
            _oracle: Address,
        ) -> Result<Arc<dyn AprOracle>, ChainError> {
            Err(ChainError::UnknownChain(chain_id))
        }
    }

    fn service_writing_to(output: PathBuf, interval: Option<Duration>) -> IndexerService {
        let registry = Arc::new(ChainRegistry::new(Vec::new()).unwrap());
        let source: Arc<dyn ChainDataSource> = Arc::new(NoChain);
        let metrics = MetricsRegistry::new();
        IndexerService::new(
            registry.clone(),
            VaultSnapshot::default(),
            EventHarvester::new(source.clone(), metrics.indexer.clone(), HarvestConfig::default()),
            ForwardApyCalculator::new(
                registry,
                source,
                metrics.apr.clone(),
                CalculatorConfig::default(),
            ),
            InitializationTracker::new(Arc::new(LogNotifier), 0),
            IndexerSettings {
                start_block: 0,
                end_block: None,
                output: Some(output),
                interval,
            },
        )
    }

    fn unwritable_path() -> PathBuf {
        std::env::temp_dir()
            .join("yieldscope-missing-report-dir")
            .join("report.json")
    }

    #[tokio::test]
    async fn test_single_pass_reports_write_failure() {
        let service = service_writing_to(unwritable_path(), None);
        assert!(service.run_forever(CancellationToken::new()).await.is_err());
    }

    #[tokio::test]
    async fn test_periodic_run_survives_write_failure() {
        let service = service_writing_to(unwritable_path(), Some(Duration::from_millis(5)));
        let shutdown = CancellationToken::new();
        let stop = shutdown.clone();
        tokio::spawn(async move {
            sleep(Duration::from_millis(50)).await;
            stop.cancel();
        });

        assert!(service.run_forever(shutdown).await.is_ok());
    }

    #[tokio::test]
    async fn test_single_pass_writes_report() {
        let output = std::env::temp_dir().join(format!("yieldscope-report-{}.json", std::process::id()));
        let service = service_writing_to(output.clone(), None);
        service.run_forever(CancellationToken::new()).await.unwrap();

        let report: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&output).unwrap()).unwrap();
        assert!(report["chains"].as_object().unwrap().is_empty());
        assert!(report.get("generatedAt").is_some());
        std::fs::remove_file(output).unwrap();
    }
}
