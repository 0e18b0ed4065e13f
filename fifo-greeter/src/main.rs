//! fifo-greeter - greeting API with a queue-backed message endpoint.
//!
//! This binary runs, in one process:
//! - The HTTP server (`/api/hello`, `/api/send-message`, `/actuator/health`)
//! - A background consumer that logs every message on the same queue
//!
//! On SIGINT/SIGTERM the server drains, then the consumer stops, then the
//! queue connection is closed.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::{net::TcpListener, signal};
use tracing::info;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use fifo_greeter::{
    router, AmqpQueue, AppState, Config, InMemoryQueue, MessageQueue, PayloadLogger, Publisher,
    QueueBackend,
};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize structured JSON logging
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().json().flatten_event(true))
        .init();

    info!("service_starting");

    // Load configuration
    let config = Config::from_env();
    info!(
        port = config.port,
        app_version = %config.app_version,
        queue_backend = ?config.queue_backend,
        queue_name = %config.queue_name,
        consumer_enabled = config.consumer_enabled,
        consumer_prefetch = config.consumer_prefetch,
        "config_loaded"
    );

    let queue: Arc<dyn MessageQueue> = match config.queue_backend {
        QueueBackend::Amqp => Arc::new(AmqpQueue::new(
            config.amqp_url.clone(),
            config.consumer_prefetch,
        )),
        QueueBackend::Memory => Arc::new(InMemoryQueue::with_redelivery_delay(
            config.redelivery_delay,
        )),
    };

    // Start the background consumer
    let subscription = if config.consumer_enabled {
        let subscription = queue
            .subscribe(&config.queue_name, Arc::new(PayloadLogger))
            .await
            .context("Failed to start consumer")?;
        Some(subscription)
    } else {
        info!("consumer_disabled");
        None
    };

    let publisher = Publisher::new(Arc::clone(&queue));
    let port = config.port;
    let app = router(AppState::new(config, publisher));

    // Bind to address
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = TcpListener::bind(addr)
        .await
        .context("Failed to bind to address")?;

    info!(address = %addr, "web_server_listening");

    // Run server with graceful shutdown
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    if let Some(subscription) = subscription {
        subscription.stop().await;
    }

    // Close queue connection
    queue.close().await;

    info!("service_shutdown_complete");

    Ok(())
}

/// Create a future that completes when a shutdown signal is received.
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received SIGINT"),
        _ = terminate => info!("Received SIGTERM"),
    }

    info!("service_shutting_down");
}
