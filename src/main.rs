//! Gatekeep Server entry point.

use std::net::SocketAddr;
use std::process::ExitCode;
use std::time::Duration;

use tracing_subscriber::EnvFilter;

use gatekeep_server::config::Config;
use gatekeep_server::{AppState, ServiceState};

#[tokio::main]
async fn main() -> ExitCode {
    let config = Config::parse();

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    if config.log_format == "json" {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(env_filter).init();
    }

    let service = match ServiceState::new(&config.service_config()) {
        Ok(service) => service,
        Err(e) => {
            tracing::error!(error = %e, "invalid configuration");
            return ExitCode::FAILURE;
        }
    };
    let state = match AppState::new(service, &config.cors_origins, config.trust_forwarded_for) {
        Ok(state) => state,
        Err(e) => {
            tracing::error!(error = %e, "invalid configuration");
            return ExitCode::FAILURE;
        }
    };

    let policy = config.policy();
    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        window_ms = policy.window_ms,
        max_requests = policy.max_requests,
        max_login_attempts = policy.max_login_attempts,
        trust_forwarded_for = config.trust_forwarded_for,
        fail_open = config.fail_open,
        "Gatekeep Server starting",
    );

    let addr = SocketAddr::new(config.host, config.port);
    let listener = match tokio::net::TcpListener::bind(addr).await {
        Ok(listener) => listener,
        Err(e) => {
            tracing::error!(%addr, error = %e, "failed to bind");
            return ExitCode::FAILURE;
        }
    };

    // Rate windows are recreated on demand; expired ones only cost memory.
    let cleanup_state = state.clone();
    tokio::spawn(async move {
        loop {
            tokio::time::sleep(Duration::from_secs(60)).await;
            let removed = cleanup_state.cleanup_rate_limits();
            if removed > 0 {
                tracing::debug!(removed, "Cleaned up expired rate windows");
            }
        }
    });

    let app = gatekeep_server::router(state);

    tracing::info!(%addr, "Gatekeep Server ready");

    if let Err(e) = gatekeep_http::serve(listener, app, shutdown_signal()).await {
        tracing::error!(error = %e, "server error");
        return ExitCode::FAILURE;
    }

    tracing::info!("Gatekeep Server shut down");
    ExitCode::SUCCESS
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to install signal handler");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
