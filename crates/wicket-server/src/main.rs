mod config;

use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Context;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{error, info};

use wicket_api::{AppState, AppStateInner, AuthService};
use wicket_db::Store;

use crate::config::Config;

#[tokio::main]
async fn main() -> ExitCode {
    // Load .env if present
    let _ = dotenvy::dotenv();

    // Init logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "wicket=debug,wicket_api=debug,wicket_db=info,tower_http=debug".into()
            }),
        )
        .init();

    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("FATAL: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run() -> anyhow::Result<()> {
    let config = Config::from_env().context("invalid configuration")?;
    let addr = config.listen_addr()?;

    // Connect eagerly so a bad database URL stops startup instead of the first request.
    let store = Store::new(config.database_url.clone());
    store
        .get()
        .await
        .with_context(|| format!("could not open user store at {}", config.database_url))?;

    let state: AppState = Arc::new(AppStateInner {
        auth: AuthService::new(store, config.token_secret),
        cookie_secure: config.cookie_secure,
    });

    let app = wicket_api::router(state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http());

    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("Wicket server listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Wicket server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {}", e);
    }
}
