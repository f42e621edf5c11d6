//! Note read worker entry point.

mod pubsub;
mod worker;

use std::sync::Arc;
use std::time::Duration;

use noteread_common::Config;
use noteread_core::{NoteReadService, NoteReadStores};
use noteread_db::repositories::NoteRepository;
use tokio::signal;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::pubsub::{CommandSubscriber, RedisEventPublisher};
use crate::worker::NoteReadWorker;

/// Waits for a shutdown signal (SIGINT or SIGTERM).
///
/// On Unix systems, this listens for both SIGINT (Ctrl+C) and SIGTERM.
/// On Windows, this only listens for Ctrl+C.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
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
        () = ctrl_c => {
            info!("Received SIGINT, initiating graceful shutdown...");
        },
        () = terminate => {
            info!("Received SIGTERM, initiating graceful shutdown...");
        },
    }
}

fn init_tracing(json: bool) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "noteread=debug".into());

    if json {
        tracing_subscriber::registry()
            .with(tracing_subscriber::fmt::layer().json())
            .with(filter)
            .init();
    } else {
        tracing_subscriber::registry()
            .with(tracing_subscriber::fmt::layer())
            .with(filter)
            .init();
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    // Load configuration
    let config = Config::load()?;
    init_tracing(config.worker.json_logs);

    info!("Starting noteread worker...");

    // Connect to database
    let db = Arc::new(noteread_db::init(&config).await?);
    info!("Connected to database");

    // Run migrations
    info!("Running database migrations...");
    noteread_db::migrate(&db).await?;
    info!("Migrations completed");

    // Connect to Redis
    info!("Connecting to Redis...");
    let publisher = RedisEventPublisher::new(&config.redis.url, &config.redis.prefix).await?;
    let subscriber = CommandSubscriber::connect(&config.redis.url, &config.command_channel()).await?;
    info!("Connected to Redis");

    let stores = NoteReadStores::from_db(
        &db,
        Duration::from_secs(config.note_read.antenna_cache_ttl_secs),
    );
    let service = NoteReadService::new(
        stores,
        Arc::new(publisher.clone()),
        Duration::from_millis(config.note_read.unread_notice_delay_ms),
    );

    let shutdown = CancellationToken::new();
    let worker = NoteReadWorker::new(service.clone(), NoteRepository::new(Arc::clone(&db)));
    let worker_task = tokio::spawn(worker.run(subscriber, shutdown.clone()));

    shutdown_signal().await;

    shutdown.cancel();
    worker_task.await?;

    service.shutdown();
    service.wait_for_notices().await;

    if let Err(e) = publisher.quit().await {
        warn!(error = %e, "Failed to close Redis publisher");
    }

    info!("Shutdown complete");
    Ok(())
}
