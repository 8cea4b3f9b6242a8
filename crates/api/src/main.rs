//! API server entry point.

use std::sync::Arc;

use checkout::InMemoryCatalog;
use event_store::{EventStore, InMemoryEventStore, PostgresEventStore};
use metrics_exporter_prometheus::PrometheusHandle;
use sqlx::postgres::PgPoolOptions;
use storefront_api::config::{Config, LogFormat};
use storefront_api::error::StartupError;
use storefront_api::{AppState, create_app};
use tokio::signal;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Waits for a shutdown signal (SIGINT or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(error) = signal::ctrl_c().await {
            tracing::error!(%error, "failed to listen for SIGINT");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(error) => {
                tracing::error!(%error, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("received SIGINT, starting graceful shutdown");
        }
        () = terminate => {
            tracing::info!("received SIGTERM, starting graceful shutdown");
        }
    }
}

fn init_tracing(config: &Config) {
    let filter = EnvFilter::try_new(&config.log_level).unwrap_or_else(|_| EnvFilter::new("info"));
    let registry = tracing_subscriber::registry().with(filter);

    match config.log_format {
        LogFormat::Json => registry.with(tracing_subscriber::fmt::layer().json()).init(),
        LogFormat::Text => registry.with(tracing_subscriber::fmt::layer()).init(),
    }
}

async fn load_catalog(config: &Config) -> Result<InMemoryCatalog, StartupError> {
    match &config.catalog_path {
        Some(path) => Ok(InMemoryCatalog::from_json_file(path).await?),
        None => {
            tracing::warn!("CATALOG_PATH not set, starting with an empty catalog");
            Ok(InMemoryCatalog::new())
        }
    }
}

async fn serve<S: EventStore + Clone + 'static>(
    config: &Config,
    store: S,
    catalog: InMemoryCatalog,
    metrics_handle: PrometheusHandle,
) -> Result<(), StartupError> {
    let state = Arc::new(AppState::new(store, catalog, config.checkout()));
    let app = create_app(state, metrics_handle);

    let addr = config.addr();
    tracing::info!(%addr, "starting API server");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("server shut down gracefully");
    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), StartupError> {
    // 1. Configuration and tracing
    let config = Config::from_env();
    init_tracing(&config);

    // 2. Prometheus recorder
    let metrics_handle = metrics_exporter_prometheus::PrometheusBuilder::new().install_recorder()?;

    // 3. Catalog
    let catalog = load_catalog(&config).await?;

    // 4. Event store, then serve
    match &config.database_url {
        Some(url) => {
            let pool = PgPoolOptions::new()
                .max_connections(config.database_max_connections)
                .connect(url)
                .await?;
            let store = PostgresEventStore::new(pool);
            store.run_migrations().await?;
            tracing::info!("using Postgres event store");
            serve(&config, store, catalog, metrics_handle).await
        }
        None => {
            tracing::info!("DATABASE_URL not set, using in-memory event store");
            serve(&config, InMemoryEventStore::new(), catalog, metrics_handle).await
        }
    }
}
