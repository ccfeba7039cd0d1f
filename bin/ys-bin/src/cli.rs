use std::path::PathBuf;

use clap::Parser;

#[derive(Parser, Debug)]
#[command(author, version, about = "Vault fee history and forward APY indexer", long_about = None)]
pub struct Cli {
    /// JSON file listing the chains (RPC endpoint, APR oracle, ...)
    #[arg(long, env = "CHAINS_CONFIG")]
    pub chains_config: PathBuf,

    /// JSON snapshot of the vaults and strategies to index
    #[arg(long, env = "VAULTS_SNAPSHOT")]
    pub vaults_snapshot: PathBuf,

    /// Where to write the report. Printed on stdout when absent.
    #[arg(long, env = "OUTPUT_PATH")]
    pub output: Option<PathBuf>,

    /// First block to scan, 0 to start each vault at its activation block
    #[arg(long, env = "START_BLOCK", default_value = "0")]
    pub start_block: u64,

    /// Last block to scan, the chain head when absent
    #[arg(long, env = "END_BLOCK")]
    pub end_block: Option<u64>,

    /// Maximum number of vault log queries in flight per chain
    #[arg(long, env = "MAX_CONCURRENCY")]
    pub max_concurrency: Option<usize>,

    /// Seconds between two indexing passes. Runs once when absent.
    #[arg(long, env = "INDEX_INTERVAL_SECS")]
    pub interval_secs: Option<u64>,

    /// OTEL collector endpoint receiving logs, traces and the counters
    #[arg(long, env = "OTEL_COLLECTOR_ENDPOINT")]
    pub otel_collector_endpoint: Option<String>,

    #[arg(long, env = "TELEGRAM_BOT", hide_env_values = true)]
    pub telegram_bot_token: Option<String>,

    #[arg(long, env = "TELEGRAM_CHAT")]
    pub telegram_chat_id: Option<String>,
}
