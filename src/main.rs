//! Polymarket copy executor - Main Entry Point
//!
//! Polls the activity store for a followed trader's trades, aggregates them
//! per market and side, and places proportionally sized copy orders.

use anyhow::{Context, Result};
use clap::Parser;
use std::sync::Arc;
use tracing::{error, info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use polymarket_copy_executor::common::traits::{OrderExecutor, TradeStore};
use polymarket_copy_executor::config::load_config;
use polymarket_copy_executor::execution::PipelineDeps;
use polymarket_copy_executor::{
    ClobOrderClient, DataApiClient, DryRunOrderExecutor, ExecutionPipeline, Executor,
    InMemoryTradeStore, PgTradeStore, RpcBalanceClient,
};

/// CLI arguments for the application
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to configuration file
    #[arg(short, long, default_value = "config.toml")]
    config: String,

    /// Log level (trace, debug, info, warn, error); defaults to `settings.log_level`,
    /// and RUST_LOG overrides both
    #[arg(long, env = "LOG_LEVEL")]
    log_level: Option<String>,

    /// Emit logs as JSON lines
    #[arg(long)]
    json_logs: bool,

    /// Run a single executor cycle and exit. With aggregation enabled no
    /// window can elapse within one cycle, so nothing is executed.
    #[arg(long)]
    once: bool,
}

fn init_logging(level: &str, json_logs: bool) -> Result<()> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level.to_lowercase()));

    if json_logs {
        let subscriber = FmtSubscriber::builder()
            .with_env_filter(filter)
            .with_target(true)
            .json()
            .finish();
        tracing::subscriber::set_global_default(subscriber)?;
    } else {
        let subscriber = FmtSubscriber::builder()
            .with_env_filter(filter)
            .with_target(true)
            .with_thread_ids(true)
            .with_file(true)
            .with_line_number(true)
            .finish();
        tracing::subscriber::set_global_default(subscriber)?;
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Configuration first: it carries the default log level
    let config = load_config(Some(&args.config)).context("invalid configuration")?;
    let level = args.log_level.as_deref().unwrap_or(&config.settings.log_level);
    init_logging(level, args.json_logs)?;

    info!("Starting Polymarket copy executor");
    info!("Configuration file: {}", args.config);
    let timeout = config.settings.request_timeout();

    let store: Arc<dyn TradeStore> = match &config.database {
        Some(database) => {
            let store = PgTradeStore::connect(database)
                .await
                .context("failed to connect to trade store")?;
            store.ensure_schema().await.context("failed to prepare trade store schema")?;
            Arc::new(store)
        }
        None => {
            warn!("No database configured; using an empty in-memory trade store");
            Arc::new(InMemoryTradeStore::new())
        }
    };

    let proxy_wallet = config.executor.proxy_wallet.clone();
    let orders: Arc<dyn OrderExecutor> = match config.polymarket.credentials() {
        Some(credentials) => Arc::new(
            ClobOrderClient::new(&config.polymarket.clob_url, &proxy_wallet, timeout)?
                .with_credentials(credentials),
        ),
        None => {
            warn!("No CLOB API credentials configured; orders will be logged, not placed");
            Arc::new(DryRunOrderExecutor::new())
        }
    };

    let deps = PipelineDeps {
        store: store.clone(),
        market_data: Arc::new(DataApiClient::new(&config.polymarket.data_api_url, timeout)?),
        balances: Arc::new(RpcBalanceClient::new(
            &config.polymarket.rpc_url,
            &config.polymarket.usdc_contract,
            timeout,
        )?),
        orders,
    };
    let pipeline = ExecutionPipeline::new(deps, proxy_wallet, timeout);
    let mut executor = Executor::new(config.executor.clone(), store, pipeline, timeout);

    if args.once {
        if config.executor.aggregation_enabled {
            warn!(
                window_secs = config.executor.aggregation_window_seconds,
                "--once with aggregation enabled: open aggregates cannot reach their window and will be dropped"
            );
        }
        let summary = executor.run_once().await;
        info!(submitted = summary.orders_submitted, "Single cycle complete");
        return Ok(());
    }

    let shutdown = executor.shutdown_handle();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => info!("Received shutdown signal, finishing current cycle..."),
            Err(e) => error!(error = %e, "Failed to listen for shutdown signal; stopping"),
        }
        shutdown.stop();
    });

    let summary = executor.run().await;
    info!(
        cycles = summary.cycles,
        submitted = summary.orders_submitted,
        skipped = summary.orders_skipped,
        failed = summary.batches_failed,
        "Shutdown complete"
    );

    Ok(())
}
