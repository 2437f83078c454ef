//! HTTP server: binds the listener, wires the auth middleware in front of
//! the proxy handler, and serves requests concurrently. On SIGTERM, the
//! listener stops accepting new connections while in-flight streaming
//! responses drain to completion.

use std::sync::Arc;

use axum::{Router, middleware, routing::get};
use tower_http::trace::TraceLayer;

use crate::errors::StartupError;
use crate::server::{auth, health, proxy};
use crate::state::{ApplicationState, AppState};

/// Builds the router and serves it until a graceful shutdown completes.
pub async fn start(app: Arc<AppState>) -> anyhow::Result<()> {
    let config = app.config();
    let addr = format!("0.0.0.0:{}", config.port);

    // Every object-facing path (the healthcheck bypass, the SSO callback,
    // and gated object fetches alike) goes through the auth middleware,
    // which dispatches internally. `/livez` and `/readyz` are ambient
    // ops-only probes and never pass through it.
    let gated = Router::new()
        .route("/", get(proxy::proxy_handler))
        .route("/{*path}", get(proxy::proxy_handler))
        .layer(middleware::from_fn_with_state(
            app.clone(),
            auth::auth_middleware,
        ));

    let ops = Router::new()
        .route("/livez", get(health::livez))
        .route("/readyz", get(health::readyz));

    let router = gated
        .merge(ops)
        .layer(TraceLayer::new_for_http())
        .with_state(app.clone());

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| StartupError::BindFailed(format!("{addr}: {e}")))?;

    app.set_state(ApplicationState::Ready);
    tracing::info!("listening on {addr}");

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal(app.clone()))
        .await?;

    app.set_state(ApplicationState::Terminating);
    tracing::info!("drained all in-flight requests, exiting");

    Ok(())
}

/// Waits for SIGTERM. Resolves exactly once, which is what makes graceful
/// shutdown idempotent under repeated signals: once the listener's accept
/// loop has stopped there is nothing left for a second SIGTERM to cancel.
async fn shutdown_signal(app: Arc<AppState>) {
    let mut term = tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
        .expect("failed to install SIGTERM handler");
    term.recv().await;
    app.set_state(ApplicationState::Terminating);
    tracing::info!("SIGTERM received, draining in-flight requests");
}
