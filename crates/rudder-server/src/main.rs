//! Rudder server entry point

use clap::Parser;
use miette::Result;
use rudder::{AppState, Config, ServerError};
use rudder_release::{FileDriver, LocalBackend};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

const DEFAULT_LOG_FILTER: &str = "rudder=info,rudder_release=info,rudder_repo=info,tower_http=info";

#[tokio::main]
async fn main() -> Result<()> {
    miette::set_panic_hook();

    let config = Config::parse();

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    let addr = config.listen_addr()?;
    let storage_dir = config.storage_path();
    let storage = FileDriver::new(&storage_dir).map_err(|e| ServerError::Storage {
        path: storage_dir.display().to_string(),
        message: e.to_string(),
    })?;

    tracing::info!(
        namespace = %config.namespace,
        home = %config.home_dir().root().display(),
        storage = %storage_dir.display(),
        "release backend ready"
    );

    let state = AppState::new(config, Arc::new(LocalBackend::new(storage)));
    let app = rudder::router(state);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|source| ServerError::Bind {
            addr: addr.to_string(),
            source,
        })?;

    tracing::info!(addr = %addr, "http server starting");

    axum::serve(listener, app).await.map_err(ServerError::Serve)?;
    Ok(())
}
