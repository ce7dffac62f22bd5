//! Metrics HTTP server
//!
//! Every `GET /metrics` runs a full collection pass; there is no caching
//! between scrapes.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::State,
    http::{header, StatusCode},
    response::{Html, IntoResponse, Response},
    routing::get,
    Router,
};
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tower_http::trace::TraceLayer;
use tracing::{error, info};

use crate::error::{ExporterError, Result};
use crate::snapshot::SnapshotBuilder;

/// Time allowed for in-flight scrapes after a shutdown signal
pub const SHUTDOWN_GRACE: Duration = Duration::from_secs(10);

const LANDING_PAGE: &str = "<html>
<head><title>RADOSGW Exporter</title></head>
<body>
<h1>RADOSGW Exporter</h1>
<p><a href=\"/metrics\">Metrics</a></p>
</body>
</html>
";

/// Build the exporter's routes
pub fn router(builder: Arc<SnapshotBuilder>) -> Router {
    Router::new()
        .route("/", get(landing_page))
        .route("/health", get(health_check))
        .route("/metrics", get(metrics))
        .layer(TraceLayer::new_for_http())
        .with_state(builder)
}

async fn landing_page() -> Html<&'static str> {
    Html(LANDING_PAGE)
}

async fn health_check() -> &'static str {
    "ok"
}

async fn metrics(State(builder): State<Arc<SnapshotBuilder>>) -> Response {
    let snapshot = builder.collect().await;
    match snapshot.render() {
        Ok(body) => ([(header::CONTENT_TYPE, prometheus::TEXT_FORMAT)], body).into_response(),
        Err(e) => {
            error!(error = %e, "Failed to encode metrics");
            (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response()
        }
    }
}

/// Serve `app` until `shutdown` resolves, then drain for at most `grace`
pub async fn serve<F>(listener: TcpListener, app: Router, shutdown: F, grace: Duration) -> Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let (drain_tx, drain_rx) = oneshot::channel::<()>();
    let server = axum::serve(listener, app).with_graceful_shutdown(async move {
        let _ = drain_rx.await;
    });
    let mut server = tokio::spawn(async move { server.await });

    tokio::select! {
        result = &mut server => {
            return match result {
                Ok(result) => result.map_err(ExporterError::from),
                Err(e) => Err(ExporterError::Internal(e.to_string())),
            };
        }
        _ = shutdown => {
            info!("Shutdown signal received, draining in-flight requests");
        }
    }

    let _ = drain_tx.send(());
    match tokio::time::timeout(grace, server).await {
        Ok(Ok(result)) => {
            result?;
            info!("Server stopped");
            Ok(())
        }
        Ok(Err(e)) => Err(ExporterError::Internal(e.to_string())),
        Err(_) => Err(ExporterError::ShutdownTimeout(grace)),
    }
}

/// Resolves on SIGINT or SIGTERM
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "Failed to install SIGINT handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
}
