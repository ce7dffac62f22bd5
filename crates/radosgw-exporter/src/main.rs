//! RADOSGW exporter binary

use std::sync::Arc;

use anyhow::Result;
use radosgw_admin::AdminClient;
use tokio::net::TcpListener;
use tracing::{error, info};

use radosgw_exporter::{
    server::{self, SHUTDOWN_GRACE},
    telemetry, ExporterConfig, LogFormat, SnapshotBuilder, VERSION,
};

#[tokio::main]
async fn main() -> Result<()> {
    // Reads .env once; logging starts before the result is checked so config errors are logged too
    let config = ExporterConfig::load();
    let log_format = match &config {
        Ok(config) => config.log_format,
        Err(_) => LogFormat::from_lookup(|key| std::env::var(key).ok()),
    };
    telemetry::init(log_format)?;

    info!(version = VERSION, "Starting RADOSGW exporter");

    let config = config.map_err(|e| {
        error!(error = %e, "Invalid configuration");
        e
    })?;
    info!("Loaded configuration: {:?}", config);

    let client = AdminClient::new(config.admin_client_config()).map_err(|e| {
        error!(error = %e, "Failed to create admin API client");
        e
    })?;

    let builder = SnapshotBuilder::new(Arc::new(client), config.store.clone())
        .with_user_concurrency(config.user_concurrency);

    let addr = config.listen_addr()?;
    let listener = TcpListener::bind(addr).await?;
    info!(
        %addr,
        endpoint = %config.endpoint,
        store = %config.store,
        "RADOSGW exporter listening"
    );

    server::serve(
        listener,
        server::router(Arc::new(builder)),
        server::shutdown_signal(),
        SHUTDOWN_GRACE,
    )
    .await?;

    info!("RADOSGW exporter stopped");
    Ok(())
}
