use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use siteworks_api::config::{ServerConfig, StorageBackend};
use siteworks_api::router::build_app_router;
use siteworks_api::state::AppState;
use siteworks_api::ws;
use siteworks_db::store::{MemoryStore, PgStore};
use siteworks_events::{EventBus, LiveRelay, PresenceRegistry};
use siteworks_lifecycle::JobScheduler;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    // --- Configuration ---
    let config = ServerConfig::from_env();

    // --- Tracing ---
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "siteworks_api=debug,tower_http=debug".into());
    if config.log_json {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }
    tracing::info!(host = %config.host, port = %config.port, "Loaded server configuration");

    let config = Arc::new(config);

    // --- Live delivery ---
    let bus = Arc::new(EventBus::default());
    let presence = Arc::new(PresenceRegistry::new());
    let heartbeat_handle = ws::start_heartbeat(Arc::clone(&presence));
    let relay_handle = tokio::spawn(LiveRelay::new(Arc::clone(&presence)).run(bus.subscribe()));

    // --- Storage ---
    let state = match config.storage {
        StorageBackend::Postgres => {
            let database_url = config
                .database_url
                .as_deref()
                .expect("DATABASE_URL must be set");

            let pool = siteworks_db::create_pool(database_url)
                .await
                .expect("Failed to connect to database");
            tracing::info!("Database connection pool created");

            siteworks_db::health_check(&pool)
                .await
                .expect("Database health check failed");
            tracing::info!("Database health check passed");

            siteworks_db::run_migrations(&pool)
                .await
                .expect("Failed to run database migrations");

            let store = Arc::new(PgStore::new(pool.clone()));
            AppState::new(
                store,
                Some(pool),
                Arc::clone(&config),
                Arc::clone(&bus),
                Arc::clone(&presence),
            )
        }
        StorageBackend::Memory => {
            tracing::warn!("Using the in-memory store; state is lost on restart");
            AppState::new(
                Arc::new(MemoryStore::new()),
                None,
                Arc::clone(&config),
                Arc::clone(&bus),
                Arc::clone(&presence),
            )
        }
    };

    // --- Job scheduler ---
    let scheduler_cancel = CancellationToken::new();
    let scheduler =
        JobScheduler::new(Arc::clone(&state.engine)).with_interval(config.job_sweep_interval());
    let scheduler_token = scheduler_cancel.clone();
    let scheduler_handle = tokio::spawn(async move {
        scheduler.run(scheduler_token).await;
    });

    tracing::info!("Background services started (relay, heartbeat, job scheduler)");

    // --- Router ---
    let app = build_app_router(state, &config);

    // --- Start server ---
    let addr = SocketAddr::new(
        config.host.parse().expect("Invalid HOST address"),
        config.port,
    );
    tracing::info!(%addr, "Starting server");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind to address");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("Server error");

    // --- Post-shutdown cleanup ---
    tracing::info!("Server stopped accepting connections, cleaning up");
    let drain = Duration::from_secs(config.shutdown_timeout_secs);

    scheduler_cancel.cancel();
    let _ = tokio::time::timeout(drain, scheduler_handle).await;
    tracing::info!("Job scheduler stopped");

    let ws_count = presence.connection_count().await;
    tracing::info!(ws_count, "Closing remaining WebSocket connections");
    presence.shutdown_all().await;

    // The relay exits once every bus handle is gone.
    drop(bus);
    let _ = tokio::time::timeout(drain, relay_handle).await;
    tracing::info!("Live relay stopped");

    heartbeat_handle.abort();
    tracing::info!("Heartbeat task stopped");

    tracing::info!("Graceful shutdown complete");
}

/// Wait for SIGINT (Ctrl-C) or SIGTERM (on Unix).
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl-C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received SIGINT (Ctrl-C), starting graceful shutdown");
        }
        () = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown");
        }
    }
}
