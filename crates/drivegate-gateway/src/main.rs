use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use drivegate_catalog::Database;
use drivegate_gateway::http::{self, AppState};
use drivegate_gateway::{BackendKind, Config, Gateway, Limits};
use drivegate_storage_core::StorageBackend;
use drivegate_storage_local::LocalFileBackend;
use drivegate_storage_s3::{S3Backend, S3Options};
use tokio::signal;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = Config::parse();

    info!("Starting drivegate");
    info!("  database: {}", config.database_path.display());

    let db = Database::open(&config.database_path)
        .await
        .context("failed to open catalog database")?;

    let backend: Arc<dyn StorageBackend> = match config.backend {
        BackendKind::Embedded => Arc::new(db.blob_backend()),
        BackendKind::Local => Arc::new(LocalFileBackend::new(&config.storage_dir)),
        BackendKind::S3 => {
            let bucket = config
                .s3_bucket
                .clone()
                .context("--s3-bucket is required for the s3 backend")?;
            let access_key_id = config
                .s3_access_key_id
                .clone()
                .context("--s3-access-key-id is required for the s3 backend")?;
            let secret_access_key = config
                .s3_secret_access_key
                .clone()
                .context("--s3-secret-access-key is required for the s3 backend")?;
            Arc::new(S3Backend::from_options(S3Options {
                bucket,
                region: config.s3_region.clone(),
                endpoint: config.s3_endpoint.clone(),
                access_key_id,
                secret_access_key,
            }))
        }
    };
    info!("  backend: {}", backend.backend_name());

    let gateway = Arc::new(Gateway::new(
        db.credentials(),
        db.sessions(),
        db.files(),
        backend,
        Limits {
            max_upload_bytes: config.max_upload_bytes,
            upload_url_ttl: Duration::from_secs(config.upload_url_ttl_secs),
        },
    ));

    let app = http::router(
        AppState { gateway },
        config.max_upload_bytes as usize,
    );

    let listener = tokio::net::TcpListener::bind((config.host.as_str(), config.port))
        .await
        .context("failed to bind listen address")?;
    info!("Listening on http://{}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    db.close().await;
    info!("Server shutdown complete");
    Ok(())
}

/// Resolves when Ctrl+C or SIGTERM arrives.
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
        info!("Received Ctrl+C, initiating shutdown");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
        info!("Received SIGTERM, initiating shutdown");
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
