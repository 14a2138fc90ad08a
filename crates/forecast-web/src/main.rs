//! stock-forecast web server

use anyhow::Context;
use forecast_core::ForecastConfig;
use forecast_stock::{ForecastService, StockConfig, SymbolLookup};
use forecast_utils::{AppConfig, init_tracing};
use forecast_web::{AppState, DEFAULT_REQUEST_TIMEOUT, router};
use std::time::Duration;
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let app = AppConfig::from_env()?;
    init_tracing(&app.log);

    let stock = StockConfig::from_env()?;
    let forecast = ForecastConfig::from_env()?;
    let service = ForecastService::from_config(&stock, forecast)?;
    let lookup = SymbolLookup::new(&stock)?;
    let state = AppState::new(service, lookup).with_request_timeout(request_timeout()?);

    let addr = app.bind_address();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;

    info!(
        address = %addr,
        environment = %app.environment,
        models = ?state.service.forecaster().kinds(),
        "Starting {}",
        app.app_name
    );

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

/// `FORECAST_TIMEOUT_SECS`, or the default budget
fn request_timeout() -> anyhow::Result<Duration> {
    match std::env::var("FORECAST_TIMEOUT_SECS") {
        Ok(value) => {
            let secs: u64 = value
                .parse()
                .with_context(|| format!("invalid FORECAST_TIMEOUT_SECS: {value}"))?;
            anyhow::ensure!(secs > 0, "FORECAST_TIMEOUT_SECS must be positive");
            Ok(Duration::from_secs(secs))
        }
        Err(_) => Ok(DEFAULT_REQUEST_TIMEOUT),
    }
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_err() {
        tracing::warn!("Could not listen for shutdown signal");
        std::future::pending::<()>().await;
    }
}
