//! `eth-exporter` binary entry point.
//!
//! Parses CLI / env-var configuration, resolves the transfer scan targets,
//! wires every collector into the registry, and serves the metrics endpoint
//! until a shutdown signal is received.

use std::{net::SocketAddr, sync::Arc, time::Duration};

use alloy_primitives::Address;
use alloy_provider::ProviderBuilder;
use anyhow::Context;
use clap::Parser;
use eth_exporter::{
    collectors::{
        balance::BalanceCollector, block_number::BlockNumberCollector,
        block_timestamp::BlockTimestampCollector, block_transactions::BlockTransactionsCollector,
        erc20_transfers::Erc20TransferCollector, gas_price::GasPriceCollector,
        hashrate::HashrateCollector, peer_count::PeerCountCollector, peers::PeersCollector,
        sync_status::SyncStatusCollector,
    },
    metrics::Registry,
    scanner::DEFAULT_PAGE_SPAN,
    server,
    source::{ChainSource, RpcSource},
    targets::resolve_targets,
    utils::parse_targets,
};
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use url::Url;

/// Configuration for the Ethereum exporter.
#[derive(Parser, Debug, Clone)]
#[command(
    name = "eth-exporter",
    version,
    about = "Prometheus exporter for Ethereum client metrics"
)]
struct Args {
    /// Ethereum JSON-RPC endpoint URL.
    #[arg(long, env = "ETH_EXPORTER_RPC_URL")]
    pub rpc_url: Url,

    /// Address for the metrics HTTP server.
    #[arg(long, env = "ETH_EXPORTER_LISTEN_ADDR", default_value = "0.0.0.0:9368")]
    pub listen_addr: SocketAddr,

    /// ERC-20 contracts to scan for `Transfer` events: `name|0xaddress` pairs.
    #[arg(long, env = "ETH_EXPORTER_TARGETS", value_delimiter = ',')]
    pub targets: Vec<String>,

    /// Wallet address to report the balance of.
    #[arg(long, env = "ETH_EXPORTER_WALLET_ADDRESS")]
    pub wallet_address: Option<Address>,

    /// Block the first transfer scan starts from. Zero or absent means the
    /// current head at startup.
    #[arg(long, env = "ETH_EXPORTER_START_BLOCK")]
    pub start_block: Option<u64>,

    /// Blocks per log-range page when scanning transfer events.
    #[arg(long, env = "ETH_EXPORTER_PAGE_SPAN", default_value_t = DEFAULT_PAGE_SPAN)]
    pub page_span: u64,

    /// Log level.
    #[arg(long, env = "ETH_EXPORTER_LOG_LEVEL", default_value = "info")]
    pub log_level: String,

    /// Log format: `json` or `text`.
    #[arg(long, env = "ETH_EXPORTER_LOG_FORMAT", default_value = "text")]
    pub log_format: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();
    let cfg = Args::parse();

    init_tracing(&cfg.log_level, &cfg.log_format);
    info!(version = env!("CARGO_PKG_VERSION"), "starting eth-exporter");

    let provider = ProviderBuilder::new().connect_http(cfg.rpc_url.clone());
    let source = Arc::new(RpcSource::new(provider.clone()));
    let provider = Arc::new(provider);

    let start_block = match cfg.start_block {
        Some(block) if block > 0 => block,
        _ => {
            let head = source
                .block_number()
                .await
                .context("failed to get current block number for the initial scan position")?;
            info!(head, "no start block configured, scanning from the current head");
            head
        }
    };

    let entries = parse_targets(&cfg.targets).context("failed to parse transfer targets")?;
    info!(count = entries.len(), "resolving transfer targets");
    let targets = resolve_targets(source.as_ref(), &entries)
        .await
        .context("failed to resolve transfer targets")?;

    let mut registry = Registry::new();
    registry.register(Arc::new(Erc20TransferCollector::new(
        Arc::clone(&source),
        targets,
        start_block,
        cfg.page_span,
    )));
    registry.register(Arc::new(BlockNumberCollector::new(Arc::clone(&provider))));
    registry.register(Arc::new(BlockTimestampCollector::new(Arc::clone(&provider))));
    registry.register(Arc::new(GasPriceCollector::new(Arc::clone(&provider))));
    registry.register(Arc::new(SyncStatusCollector::new(Arc::clone(&provider))));
    registry.register(Arc::new(PeerCountCollector::new(Arc::clone(&provider))));
    registry.register(Arc::new(PeersCollector::new(Arc::clone(&provider))));
    registry.register(Arc::new(HashrateCollector::new(Arc::clone(&provider))));
    registry.register(Arc::new(BlockTransactionsCollector::new(Arc::clone(&provider))));
    match cfg.wallet_address {
        Some(wallet) => {
            registry.register(Arc::new(BalanceCollector::new(Arc::clone(&provider), wallet)));
        }
        None => info!("no wallet address configured, skipping balance collector"),
    }

    let registry = Arc::new(registry);
    let cancel = CancellationToken::new();
    let mut set = JoinSet::new();

    let server_registry = Arc::clone(&registry);
    let server_cancel = cancel.clone();
    let listen_addr = cfg.listen_addr;
    set.spawn(async move {
        if let Err(e) = server::serve(listen_addr, server_registry, server_cancel).await {
            error!(error = %e, "metrics server failed");
        }
    });

    info!("exporter started, waiting for shutdown signal");
    await_shutdown(cancel, set).await;

    info!("eth-exporter shut down");
    Ok(())
}

/// Initialise `tracing` with the given level and format (`json` or `text`).
fn init_tracing(level: &str, format: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_new(level).unwrap_or_else(|_| EnvFilter::new("info"));

    match format {
        "json" => {
            tracing_subscriber::fmt().with_env_filter(filter).json().init();
        }
        _ => {
            tracing_subscriber::fmt().with_env_filter(filter).init();
        }
    }
}

/// Wait for SIGINT / SIGTERM, cancel all tasks, and drain the join set.
async fn await_shutdown(cancel: CancellationToken, mut set: JoinSet<()>) {
    use tokio::signal;

    tokio::select! {
        _ = signal::ctrl_c() => {
            info!("received SIGINT, shutting down");
        }
        _ = async {
            #[cfg(unix)]
            {
                let mut sigterm = signal::unix::signal(signal::unix::SignalKind::terminate())
                    .expect("failed to register SIGTERM handler");
                sigterm.recv().await;
            }
            #[cfg(not(unix))]
            {
                std::future::pending::<()>().await;
            }
        } => {
            info!("received SIGTERM, shutting down");
        }
    }

    cancel.cancel();

    // Give tasks 15 seconds to finish.
    let deadline = tokio::time::Instant::now() + Duration::from_secs(15);

    loop {
        tokio::select! {
            result = set.join_next() => {
                match result {
                    None => break,
                    Some(Ok(())) => {}
                    Some(Err(e)) => {
                        error!(error = %e, "task panicked during shutdown");
                    }
                }
            }
            _ = tokio::time::sleep_until(deadline) => {
                warn!("timeout waiting for tasks to shut down");
                set.abort_all();
                break;
            }
        }
    }
}
