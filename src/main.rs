mod config;
mod domain;
mod infrastructure;
mod persistence;

use crate::config::EngineConfig;
use crate::domain::services::accounts::AccountService;
use crate::domain::services::pricing::UniformSlippage;
use crate::domain::services::trade_executor::TradeExecutor;
use crate::infrastructure::coingecko::CoinGeckoOracle;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "paperbroker=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Paperbroker ledger engine starting...");

    let engine_config = EngineConfig::from_env();
    let db_config = persistence::DatabaseConfig::from_env();

    let pool = persistence::init_database(&db_config).await?;

    let oracle = Arc::new(CoinGeckoOracle::new(Duration::from_secs(
        engine_config.price_cache_ttl_seconds,
    )));

    let accounts = AccountService::new(pool.clone(), engine_config.initial_balance);
    let executor = Arc::new(TradeExecutor::new(
        pool.clone(),
        oracle,
        &engine_config,
        Arc::new(UniformSlippage),
    ));

    info!(
        "Engine ready (fee rate {}, max slippage {}, limit tolerance {})",
        engine_config.fee_rate, engine_config.max_slippage, engine_config.limit_tolerance
    );

    // Periodically re-mark open positions and account equity. Trade
    // execution itself is request-driven; callers embed this crate and
    // invoke TradeExecutor::execute directly.
    let mut refresh_interval = tokio::time::interval(Duration::from_secs(
        engine_config.pnl_refresh_interval_seconds,
    ));
    refresh_interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            _ = refresh_interval.tick() => {
                match accounts.list_active_accounts().await {
                    Ok(active) => {
                        for account in active {
                            if let Err(e) = executor.refresh_pnl(&account.id).await {
                                error!("PnL refresh failed for {}: {}", account.id, e);
                            }
                        }
                    }
                    Err(e) => error!("Failed to list active accounts: {}", e),
                }
            }
            _ = tokio::signal::ctrl_c() => {
                info!("Shutdown signal received, stopping...");
                break;
            }
        }
    }

    pool.close().await;
    info!("Paperbroker stopped");

    Ok(())
}
