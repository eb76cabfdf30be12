use std::net::SocketAddr;
use anyhow::Result;
use dotenv::dotenv;
use std::sync::Arc;
use tokio::net::TcpListener;
use governor::{Quota, RateLimiter};
use nonzero_ext::nonzero;
use clickhouse::Client;
use tokio::time::{sleep, Duration};

mod api;
mod config;
mod db;
mod services;
mod types;

use crate::api::routes::create_router;
use crate::config::Config;
use crate::db::init::init_database;
use crate::services::aggregator::JobContext;
use crate::services::chain::FlowClient;
use crate::services::monitor;

async fn connect_to_clickhouse(url: &str, max_retries: u32) -> Result<Client> {
    let client = Client::default()
        .with_url(url)
        .with_database("default");

    for attempt in 1..=max_retries {
        match client.query("SELECT 1").execute().await {
            Ok(_) => {
                tracing::info!("Connected to ClickHouse at {}", url);
                return Ok(client);
            }
            Err(e) => {
                if attempt == max_retries {
                    return Err(anyhow::anyhow!("Failed to connect to ClickHouse after {} attempts: {}", max_retries, e));
                }
                tracing::warn!("Failed to connect to ClickHouse (attempt {}/{}): {}", attempt, max_retries, e);
                sleep(Duration::from_secs(2)).await;
            }
        }
    }
    unreachable!()
}

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    tracing_subscriber::fmt::init();

    dotenv().ok();
    let config = Arc::new(Config::from_env()?);
    tracing::info!("Running against Flow {} via {}", config.network, config.access_node);

    let rpc_limiter = Arc::new(RateLimiter::direct(Quota::per_second(nonzero!(5u32))));
    let http = reqwest::Client::new();
    let chain = FlowClient::new(http.clone(), rpc_limiter.clone(), &config);

    // Probe the access node at startup
    match chain.latest_block_height().await {
        Ok(height) => tracing::info!("Connected to Flow access node (sealed height: {})", height),
        Err(e) => tracing::error!("Failed to reach access node: {:?}", e),
    };

    // Connect to ClickHouse with retries
    let client = connect_to_clickhouse(&config.clickhouse_url, 5).await?;

    // Initialize database tables
    init_database(&client).await?;

    let ctx = Arc::new(JobContext {
        db: client.clone(),
        chain,
        http,
        config: config.clone(),
    });

    let app = create_router(ctx.clone());

    let addr = SocketAddr::from(([0, 0, 0, 0], config.api_port));
    tracing::info!("Listening on {}", addr);

    let listener = TcpListener::bind(addr).await?;

    // Start the ranking scheduler in a separate task
    let monitor_handle = tokio::spawn({
        let ctx = ctx.clone();
        async move {
            monitor::start_monitoring(ctx).await;
        }
    });

    // Run the API server and the scheduler concurrently
    tokio::select! {
        result = axum::serve(listener, app.into_make_service()) => {
            if let Err(e) = result {
                tracing::error!("Failed to serve API: {:?}", e);
            }
        }
        _ = monitor_handle => {
            tracing::info!("Ranking scheduler finished");
        }
    }

    Ok(())
}
