use std::sync::Arc;
use std::time::Duration;

use tokio::net::TcpListener;
use tracing::info;

mod api;
mod chat;
mod config;
mod error;
mod highlight;
mod pdf;
mod qa;
mod service;

use crate::service::PagemarkService;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    init_logging();

    info!(
        "Starting Pagemark service v{}",
        env!("CARGO_PKG_VERSION")
    );

    let config = config::load()?;
    info!(
        host = %config.server.host,
        port = config.server.port,
        model = %config.chat.model,
        "Configuration loaded"
    );

    let addr = format!("{}:{}", config.server.host, config.server.port);

    // Initialize the service
    let service = Arc::new(PagemarkService::new(config)?);

    if service.chat.health_check().await {
        info!("Chat backend reachable");
    } else {
        tracing::warn!("Chat backend unreachable; question answering will fail until it recovers");
    }

    // Build the router
    let app = api::router(service.clone());

    // Expire downloads that were never fetched
    let cleanup_service = service.clone();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_secs(60));
        loop {
            interval.tick().await;
            let removed = cleanup_service.cleanup_downloads();
            if removed > 0 {
                info!(removed, "Expired highlighted PDFs");
            }
        }
    });

    // Start the server
    let listener = TcpListener::bind(&addr).await?;
    info!("Listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}

fn init_logging() {
    use tracing_subscriber::{EnvFilter, fmt, prelude::*};

    let format = fmt::format()
        .with_target(true)
        .with_thread_ids(true)
        .compact();

    // Use RUST_LOG if set, otherwise default to info level for our crate
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("pagemark_service=info"));

    tracing_subscriber::registry()
        .with(fmt::layer().event_format(format))
        .with(filter)
        .init();
}
