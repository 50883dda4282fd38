use std::error::Error;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use lectern_api::config::{NotificationConfig, ServerConfig};
use lectern_api::engine::ProgressionEngine;
use lectern_api::notifications::build_dispatcher;
use lectern_api::router::build_app_router;
use lectern_api::state::AppState;
use lectern_db::store::{MemoryProgressStore, PgProgressStore, ProgressStore};
use lectern_events::{EmailConfig, EventBus};

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    dotenvy::dotenv().ok();

    // --- Tracing ---
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "lectern_api=debug,lectern_events=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // --- Configuration ---
    let config = ServerConfig::from_env();
    let notification_config = NotificationConfig::from_env();
    notification_config.validate(&config)?;
    tracing::info!(host = %config.host, port = %config.port, "Loaded server configuration");

    // --- Progress store ---
    let store: Arc<dyn ProgressStore> = match std::env::var("DATABASE_URL") {
        Ok(database_url) => {
            let pool = lectern_db::create_pool(&database_url).await?;
            tracing::info!("Database connection pool created");

            lectern_db::health_check(&pool).await?;
            tracing::info!("Database health check passed");

            lectern_db::run_migrations(&pool).await?;
            tracing::info!("Database migrations applied");

            Arc::new(PgProgressStore::new(pool))
        }
        Err(_) => {
            tracing::warn!("DATABASE_URL not set, using in-memory progress store");
            Arc::new(MemoryProgressStore::new())
        }
    };

    // --- Notifications ---
    let event_bus = Arc::new(EventBus::default());
    let dispatcher = build_dispatcher(
        &notification_config,
        EmailConfig::from_env(),
        Arc::clone(&event_bus),
    );

    // --- App state ---
    let state = AppState {
        engine: Arc::new(ProgressionEngine::new(store, Arc::new(dispatcher))),
        config: Arc::new(config.clone()),
    };
    let app = build_app_router(state, &config);

    // --- Start server ---
    let addr = SocketAddr::new(config.host.parse()?, config.port);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(%addr, "Starting server");

    let (shutdown_tx, mut shutdown_rx) = tokio::sync::watch::channel(false);
    let server = tokio::spawn(async move {
        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = shutdown_rx.changed().await;
            })
            .await
    });

    shutdown_signal().await;
    let _ = shutdown_tx.send(true);

    // --- Drain ---
    let drain = Duration::from_secs(config.shutdown_timeout_secs);
    match tokio::time::timeout(drain, server).await {
        Ok(Ok(Ok(()))) => tracing::info!("Graceful shutdown complete"),
        Ok(Ok(Err(e))) => tracing::error!(error = %e, "Server error during shutdown"),
        Ok(Err(e)) => tracing::error!(error = %e, "Server task failed"),
        Err(_) => tracing::warn!(
            timeout_secs = config.shutdown_timeout_secs,
            "In-flight requests did not drain in time, exiting"
        ),
    }

    Ok(())
}

/// Wait for SIGINT (Ctrl-C) or, on Unix, SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
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
