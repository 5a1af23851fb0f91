//! Ethos Relay - a read-only CORS relay for the Ethos Integration API.
//!
//! This binary starts the HTTP server and configures all components.

use clap::Parser;
use std::process::ExitCode;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use ethos_relay::{
    config::Config,
    io::HttpTransport,
    relay::RelayService,
    server::{create_router, RouterConfig},
};

#[tokio::main]
async fn main() -> ExitCode {
    let config = Config::parse();

    init_logging(config.verbose);

    if let Err(e) = config.validate() {
        error!("Configuration error: {}", e);
        return ExitCode::FAILURE;
    }

    let settings = match config.relay_settings() {
        Ok(settings) => settings,
        Err(e) => {
            error!("Configuration error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    info!("Ethos Relay v{}", env!("CARGO_PKG_VERSION"));
    info!("Configuration:");
    info!("  Auth endpoint: {}", settings.auth_url);
    info!("  API base: {}", settings.api_base);
    info!(
        "  Timeouts: {}s per call, {}s connect",
        config.upstream_timeout, config.connect_timeout
    );
    if settings.redact_errors {
        info!("  Transport errors: redacted");
    } else {
        warn!("  Transport errors: passed through to callers");
        warn!("        Hide details in production: --redact-errors");
    }

    let transport = match HttpTransport::new(config.upstream_timeout(), config.connect_timeout()) {
        Ok(transport) => transport,
        Err(e) => {
            error!("Failed to build HTTP client: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let relay = RelayService::new(transport, settings);
    let router = create_router(relay, RouterConfig::new().with_tracing(!config.no_tracing));

    let addr = config.bind_address();
    let listener = match tokio::net::TcpListener::bind(&addr).await {
        Ok(listener) => listener,
        Err(e) => {
            error!("Failed to bind to {}: {}", addr, e);
            return ExitCode::FAILURE;
        }
    };

    info!("");
    info!("────────────────────────────────────────────────────────────────");
    info!("  Relay listening on: http://{}", addr);
    info!("");
    info!("  Try:");
    info!(
        "    curl -H 'Accept: application/vnd.hedtech.integration.v12+json' http://{}/ethos/persons",
        addr
    );
    info!("────────────────────────────────────────────────────────────────");
    info!("");

    if let Err(e) = axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
    {
        error!("Server error: {}", e);
        return ExitCode::FAILURE;
    }

    info!("Relay stopped");
    ExitCode::SUCCESS
}

/// Initialize the tracing/logging subsystem.
fn init_logging(verbose: bool) {
    let env_filter = if verbose {
        "ethos_relay=debug,tower_http=debug"
    } else {
        "ethos_relay=info,tower_http=info"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| env_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

/// Resolve when Ctrl+C is received.
async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("Shutdown signal received, draining connections"),
        Err(e) => {
            // Without a signal handler the server runs until killed.
            error!("Failed to listen for shutdown signal: {}", e);
            std::future::pending::<()>().await;
        }
    }
}
