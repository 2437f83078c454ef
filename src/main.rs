//! Entry point: parses configuration, brings up the process-wide session
//! store, SSO client, and object-store client, then hands off to the HTTP
//! server. These clients are constructed once at startup and shared across
//! every request.

use clap::Parser;
use s3proxy::config::ProxyConfig;
use s3proxy::errors::StartupError;
use s3proxy::state::{ApplicationState, AppState};
use s3proxy::{Args, objectstore, server, session, sso};
use std::sync::Arc;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{Layer, fmt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let env_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());
    tracing_subscriber::registry()
        .with(fmt::layer().with_target(true).compact())
        .with(tracing_subscriber::filter::EnvFilter::new(env_filter))
        .init();

    let app_state = Arc::new(AppState::new());
    app_state.set_state(ApplicationState::Initializing);

    let config = ProxyConfig::from_args(args)
        .map_err(|e| StartupError::ConfigError(e.to_string()))
        .inspect_err(|e| tracing::error!("{e}"))?;

    app_state.set_state(ApplicationState::StartingNetwork);

    let session_store = session::redis_store::RedisSessionStore::connect(&config.redis_endpoint)
        .await
        .map_err(|e| StartupError::SessionStoreUnavailable(e.to_string()))
        .inspect_err(|e| tracing::error!("{e}"))?;

    let sso_client =
        sso::SsoClient::new(&config).map_err(|e| StartupError::Other(e.to_string()))?;
    let object_store = objectstore::ObjectStoreClient::new(&config)
        .await
        .map_err(|e| StartupError::Other(e.to_string()))?;

    app_state.set_config(Arc::new(config));
    app_state.set_session_store(Arc::new(session_store));
    app_state.set_sso_client(Arc::new(sso_client));
    app_state.set_object_store(Arc::new(object_store));

    match server::service::start(app_state).await {
        Ok(()) => tracing::info!("server exited cleanly"),
        Err(e) => tracing::error!("server execution failed: {:?}", e),
    }

    Ok(())
}
