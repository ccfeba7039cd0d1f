mod cli;
mod service;
mod snapshot;

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use clap::Parser;
use dotenvy::dotenv;
use pragma_common::telemetry::init_telemetry;
use tokio_util::sync::CancellationToken;

use yieldscope_apr::{CalculatorConfig, ForwardApyCalculator};
use yieldscope_chain::{AlloyChainDataSource, ChainDataSource, ChainRegistry};
use yieldscope_events::{EventHarvester, HarvestConfig};
use yieldscope_metrics::MetricsRegistry;
use yieldscope_notify::{InitializationTracker, notifier_from_credentials};

use crate::cli::Cli;
use crate::service::{IndexerService, IndexerSettings};
use crate::snapshot::VaultSnapshot;

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();

    let cli = Cli::parse();

    let app_name = "yieldscope";
    if let Err(e) = init_telemetry(app_name, cli.otel_collector_endpoint.clone()) {
        bail!("Could not init telemetry: {e}");
    }

    let registry = Arc::new(
        ChainRegistry::from_file(&cli.chains_config).context("Failed to load chain config")?,
    );
    let snapshot = VaultSnapshot::from_file(&cli.vaults_snapshot)?;
    tracing::info!(
        chains = registry.len(),
        snapshot_chains = snapshot.len(),
        "[Main] 🚀 Starting yieldscope"
    );

    let source: Arc<dyn ChainDataSource> = Arc::new(AlloyChainDataSource::new(registry.clone()));
    let metrics = MetricsRegistry::new();

    let mut harvest_config = HarvestConfig::default();
    if let Some(max_concurrency) = cli.max_concurrency {
        harvest_config.max_concurrency = max_concurrency;
    }
    let harvester = EventHarvester::new(source.clone(), metrics.indexer.clone(), harvest_config);
    let calculator = ForwardApyCalculator::new(
        registry.clone(),
        source,
        metrics.apr.clone(),
        CalculatorConfig::default(),
    );

    let notifier = notifier_from_credentials(cli.telegram_bot_token, cli.telegram_chat_id);
    let indexed_chains = snapshot
        .chains()
        .filter(|(chain_id, _)| registry.contains(*chain_id))
        .count();
    let tracker = InitializationTracker::new(notifier, indexed_chains);

    let settings = IndexerSettings {
        start_block: cli.start_block,
        end_block: cli.end_block,
        output: cli.output,
        interval: cli.interval_secs.map(Duration::from_secs),
    };
    let service = IndexerService::new(registry, snapshot, harvester, calculator, tracker, settings);

    let shutdown = CancellationToken::new();
    let signal_shutdown = shutdown.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("[Main] Ctrl-C received, stopping after the current pass");
            signal_shutdown.cancel();
        }
    });

    service.run_forever(shutdown).await
}
