//! foundation-server: membership and donation backend
//!
//! - Processes donations and provisions donor accounts
//! - Registers members with email verification and referrals
//! - Serves the member dashboard (JWT authenticated)
//! - Delivers receipts and notices through a retrying email outbox

mod api;
mod auth;
mod config;
mod db;
mod email;
mod error;
mod services;
mod state;
mod uploads;
mod util;
mod validation;

#[cfg(test)]
mod testing;

use std::net::SocketAddr;
use std::time::Duration;

use config::Config;
use state::AppState;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Outbox entries handled per worker tick
const OUTBOX_BATCH: i64 = 50;

#[tokio::main]
async fn main() -> Result<(), BoxError> {
    // Load .env file
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "foundation_server=info,tower_http=info".into()),
        )
        .init();

    let config = Config::from_env()?;

    tracing::info!("Starting foundation-server (env: {})", config.environment);

    let state = AppState::new(&config).await?;
    let app = api::create_router(state.clone());

    // Periodic rate limiter cleanup (every 5 minutes)
    let rate_limiter = state.rate_limiter.clone();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_secs(300));
        loop {
            interval.tick().await;
            rate_limiter.cleanup().await;
        }
    });

    // Outbox worker: retries receipts and notices that failed inline
    let outbox_state = state.clone();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_secs(30));
        loop {
            interval.tick().await;
            if let Err(e) =
                services::outbox::process_due(&outbox_state, util::now_millis(), OUTBOX_BATCH).await
            {
                tracing::error!("Outbox worker error: {e}");
            }
        }
    });

    let addr = format!("0.0.0.0:{}", config.http_port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("foundation-server HTTP listening on {addr}");

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}
