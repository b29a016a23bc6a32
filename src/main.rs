// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::sync::Arc;

use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use cognito_auth_gateway::{
    api::router,
    auth::{refresher, KeyRefresher, KeyRing, TokenVerifier},
    config::{Config, LogFormat},
    identity::CognitoClient,
    state::AppState,
};

const DEFAULT_LOG_FILTER: &str = "info,tower_http=debug";

#[tokio::main]
async fn main() {
    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Configuration error: {e}");
            std::process::exit(1);
        }
    };

    init_tracing(config.log_format);

    info!(
        region = %config.region,
        pool_id = %config.pool_id,
        jwks_url = %config.jwks_url,
        client_secret = config.client_secret.is_some(),
        audience = config.audience.as_deref().unwrap_or("-"),
        "Configuration loaded"
    );

    let keyring = Arc::new(
        KeyRing::new(config.jwks_url.clone(), config.fetch_timeout)
            .expect("Failed to build JWKS HTTP client"),
    );

    // Serve even without keys; readiness reports 503 until a refresh lands.
    if let Err(e) = keyring.refresh().await {
        warn!(error = %e, "Initial JWKS fetch failed; protected routes will reject until keys load");
    }

    let mut verifier = TokenVerifier::new(keyring.clone()).with_issuer(config.issuer());
    if let Some(audience) = &config.audience {
        verifier = verifier.with_audience(audience.clone());
    }

    let identity = CognitoClient::from_config(&config).expect("Failed to build Cognito client");
    let state = AppState::new(verifier, Arc::new(identity));

    let shutdown = CancellationToken::new();
    let refresher = KeyRefresher::new(keyring, config.refresh_interval);
    let refresher_task = tokio::spawn(refresher.run(shutdown.clone()));

    let app = router(state);

    let listener = TcpListener::bind(config.bind_addr)
        .await
        .expect("Failed to bind listener");
    info!(addr = %config.bind_addr, "Auth gateway listening (docs at /docs)");

    let server_shutdown = shutdown.clone();
    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            shutdown_signal().await;
            server_shutdown.cancel();
        })
        .await
        .expect("HTTP server failed");

    shutdown.cancel();
    let _ = refresher::join(refresher_task).await;
    info!("Auth gateway stopped");
}

fn init_tracing(format: LogFormat) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));

    match format {
        LogFormat::Json => tracing_subscriber::fmt()
            .with_env_filter(filter)
            .json()
            .init(),
        LogFormat::Pretty => tracing_subscriber::fmt().with_env_filter(filter).init(),
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received SIGINT, shutting down"),
        _ = terminate => info!("Received SIGTERM, shutting down"),
    }
}
