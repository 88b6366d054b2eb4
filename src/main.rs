// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::error::Error;
use std::process::ExitCode;
use std::time::Duration;

use axum_server::tls_rustls::RustlsConfig;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use bingo_server::{
    api::{admin::init_server_start_time, router},
    auth::AuthEvents,
    config::{LogFormat, ServerConfig},
    reaper::SessionReaper,
    state::AppState,
};

/// How long in-flight requests get to finish after a shutdown signal.
const GRACE_PERIOD: Duration = Duration::from_secs(10);

const DEFAULT_LOG_FILTER: &str = "info,tower_http=debug";

#[tokio::main]
async fn main() -> ExitCode {
    init_tracing();

    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "Server failed");
            ExitCode::FAILURE
        }
    }
}

fn init_tracing() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));

    match LogFormat::from_env() {
        LogFormat::Json => tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .init(),
        LogFormat::Pretty => tracing_subscriber::fmt().with_env_filter(filter).init(),
    }
}

async fn run() -> Result<(), Box<dyn Error>> {
    init_server_start_time();

    let config = ServerConfig::from_env()?;
    let addr = config.bind_addr()?;
    info!(data_dir = %config.data_dir.display(), "Opening database");
    let state = AppState::from_config(&config)?;

    let shutdown = CancellationToken::new();
    tokio::spawn(SessionReaper::new(state.db.clone()).run(shutdown.clone()));
    tokio::spawn(log_auth_events(state.events.clone(), shutdown.clone()));
    tokio::spawn(wait_for_signal(shutdown.clone()));

    let app = router(state);

    match &config.tls {
        Some(tls) => {
            // Must happen before any TLS config is built.
            if rustls::crypto::ring::default_provider()
                .install_default()
                .is_err()
            {
                warn!("A rustls crypto provider was already installed");
            }

            let tls_config = RustlsConfig::from_pem_file(&tls.cert, &tls.key).await?;
            let handle = axum_server::Handle::new();

            let shutdown_handle = handle.clone();
            let token = shutdown.clone();
            tokio::spawn(async move {
                token.cancelled().await;
                shutdown_handle.graceful_shutdown(Some(GRACE_PERIOD));
            });

            info!("Bingo server listening on https://{addr} (docs at /docs)");
            axum_server::bind_rustls(addr, tls_config)
                .handle(handle)
                .serve(app.into_make_service())
                .await?;
        }
        None => {
            let listener = TcpListener::bind(addr).await?;
            info!("Bingo server listening on http://{addr} (docs at /docs)");

            let token = shutdown.clone();
            axum::serve(listener, app)
                .with_graceful_shutdown(async move { token.cancelled().await })
                .await?;
        }
    }

    // Stops background tasks if the server exited on its own.
    shutdown.cancel();
    info!("Server shut down");
    Ok(())
}

/// Cancel `shutdown` on Ctrl+C or SIGTERM.
async fn wait_for_signal(shutdown: CancellationToken) {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
        info!("Received Ctrl+C, shutting down");
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
                info!("Received terminate signal, shutting down");
            }
            Err(e) => {
                warn!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
        _ = shutdown.cancelled() => return,
    }
    shutdown.cancel();
}

/// Structured log line for every sign-in, sign-out and profile change.
async fn log_auth_events(events: AuthEvents, shutdown: CancellationToken) {
    let mut subscription = events.subscribe();
    drop(events);

    loop {
        tokio::select! {
            event = subscription.recv() => match event {
                Some(event) => info!(user_id = event.user_id(), event = ?event, "Auth event"),
                None => return,
            },
            _ = shutdown.cancelled() => return,
        }
    }
}
