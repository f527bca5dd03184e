use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use order_relay_core::{BrokerSession, ConfigLoader};
use order_relay_execution::{
    run_balance_refresher, spawn_open_worker, BalanceCache, PositionRegistry,
};
use order_relay_tradelocker::{connect_with_retry, Credentials, DEMO_API_URL, LIVE_API_URL};
use order_relay_web_api::{RelayServer, StrategyContext};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

mod routes;

#[derive(Debug, Clone, Copy, ValueEnum)]
enum BrokerEnv {
    Live,
    Demo,
}

#[derive(Parser)]
#[command(name = "order-relay")]
#[command(about = "Webhook-to-broker order execution relay", long_about = None)]
struct Cli {
    /// Broker login email
    #[arg(long)]
    username: String,
    /// Broker password
    #[arg(long, env = "ORDER_RELAY_PASSWORD", hide_env_values = true)]
    password: String,
    /// Broker server name
    #[arg(long)]
    server: String,
    /// Trade against the live or the demo environment
    #[arg(long, value_enum)]
    env: BrokerEnv,
    /// Port to listen on (overrides the config file)
    #[arg(long)]
    port: Option<u16>,
    /// Number of strategy endpoints to register (overrides the config file)
    #[arg(long)]
    strategies: Option<u32>,
    /// Config file path
    #[arg(short, long, default_value = "config/Config.toml")]
    config: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let mut config = ConfigLoader::load_from(&cli.config)?;
    if let Some(port) = cli.port {
        config.server.port = port;
    }
    if let Some(strategies) = cli.strategies {
        config.relay.strategies = strategies;
    }

    let api_url = if config.broker.api_url.is_empty() {
        match cli.env {
            BrokerEnv::Live => LIVE_API_URL.to_string(),
            BrokerEnv::Demo => DEMO_API_URL.to_string(),
        }
    } else {
        config.broker.api_url.clone()
    };

    let credentials = Credentials {
        email: cli.username,
        password: cli.password,
        server: cli.server,
    };

    let route_ids = routes::load_or_generate(
        Path::new(&config.relay.routes_file),
        config.relay.strategies as usize,
    )?;

    // One session shared by every strategy: one login at startup keeps the
    // rate-limit exposure minimal. The registry stays strategy-keyed, so
    // switching to per-strategy sessions would not change bookkeeping.
    let session: Arc<dyn BrokerSession> = Arc::new(
        connect_with_retry(&credentials, &config.broker, api_url)
            .await
            .context("broker login failed")?,
    );

    let initial_balance = session
        .balance()
        .await
        .map_err(|e| anyhow::anyhow!("initial balance fetch failed: {e}"))?;
    tracing::info!(%initial_balance, "balance cache primed");

    let balance = Arc::new(BalanceCache::new(initial_balance));
    let registry = Arc::new(PositionRegistry::new());
    let (queue, worker) = spawn_open_worker(
        session.clone(),
        registry.clone(),
        config.relay.queue_depth,
    );
    let refresher = tokio::spawn(run_balance_refresher(
        session.clone(),
        balance.clone(),
        Duration::from_secs(config.relay.balance_refresh_secs),
    ));

    let strategies = route_ids
        .iter()
        .enumerate()
        .map(|(i, route_id)| {
            let id = u32::try_from(i + 1).unwrap_or(u32::MAX);
            let ctx = Arc::new(StrategyContext {
                id,
                session: session.clone(),
                balance: balance.clone(),
                registry: registry.clone(),
                queue: queue.clone(),
            });
            (format!("/{route_id}"), ctx)
        })
        .collect();

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let server = tokio::spawn(async move { RelayServer::new(strategies).serve(&addr).await });

    tokio::signal::ctrl_c()
        .await
        .context("failed to listen for shutdown signal")?;
    tracing::info!("shutting down: draining open queue");

    refresher.abort();
    server.abort();
    queue.shutdown().await.ok();
    worker.await.context("open worker panicked")?;

    Ok(())
}
