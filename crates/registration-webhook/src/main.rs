//! Registration Webhook - Entry point.

use anyhow::{Context, Result};
use registrant_store::{JsonFileStore, MemoryStore, RegistrantStore};
use registration_webhook::{
    api::{create_router, AppState},
    config::{Config, LogConfig, StoreConfig},
    intake::ApiKey,
};
use std::fs::OpenOptions;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::signal;
use tracing::{info, warn};
use tracing_subscriber::{
    fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer, Registry,
};

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration
    let config = Config::load().context("Failed to load configuration")?;

    // Initialize logging
    init_logging(&config.log)?;

    info!("Starting Registration Webhook");

    let api_key = ApiKey::new(&config.web.api_key);
    info!("API key configured");

    let store = open_store(&config.store).await?;
    let state = AppState::new(api_key, store);
    let app = create_router(state);

    // Bind to address
    let addr = SocketAddr::new(
        config
            .web
            .listen_addr
            .parse()
            .with_context(|| format!("Invalid listen address: {}", config.web.listen_addr))?,
        config.web.port,
    );

    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    info!("Listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Shutting down...");
    Ok(())
}

async fn open_store(config: &StoreConfig) -> Result<Arc<dyn RegistrantStore>> {
    if config.persist {
        let store = JsonFileStore::open(&config.path)
            .await
            .with_context(|| format!("Failed to open registrant file {:?}", config.path))?;
        info!("Persisting registrants to {:?}", store.path());
        Ok(Arc::new(store))
    } else {
        warn!("Persistence disabled, registrants will be lost on restart");
        Ok(Arc::new(MemoryStore::new()))
    }
}

fn init_logging(config: &LogConfig) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.level));

    let console: Box<dyn Layer<Registry> + Send + Sync> = if config.json {
        fmt::layer().json().boxed()
    } else {
        fmt::layer().boxed()
    };

    // Operator log file, no ANSI colors
    let file = match config.file_path() {
        Some(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("Failed to open log file {:?}", path))?;
            Some(
                fmt::layer()
                    .with_ansi(false)
                    .with_writer(Arc::new(file))
                    .with_filter(EnvFilter::new(&config.file_level)),
            )
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(console.with_filter(filter))
        .with(file)
        .try_init()
        .context("Failed to initialize logging")?;

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!("Failed to listen for ctrl-c: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                warn!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received");
}
