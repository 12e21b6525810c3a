use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use storefront_api::config::ServerConfig;
use storefront_api::router::build_app_router;
use storefront_api::state::AppState;
use storefront_db::DbPool;

const DEFAULT_LOG_FILTER: &str = "storefront_api=debug,storefront_db=debug,tower_http=debug";

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    init_tracing();

    let config = ServerConfig::from_env();
    tracing::info!(
        host = %config.host,
        port = config.port,
        db_max_connections = config.db_max_connections,
        "Loaded server configuration"
    );

    let pool = prepare_database(&config).await;

    let app = build_app_router(
        AppState {
            pool,
            config: Arc::new(config.clone()),
        },
        &config,
    );

    let addr = config.bind_addr().expect("Invalid HOST address");
    let listener = TcpListener::bind(addr)
        .await
        .expect("Failed to bind to address");
    tracing::info!(%addr, "Storefront API listening");

    serve_until_signal(listener, app, Duration::from_secs(config.shutdown_timeout_secs)).await;
}

fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| DEFAULT_LOG_FILTER.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

/// Connect, verify connectivity and apply pending migrations.
///
/// Any failure here aborts startup.
async fn prepare_database(config: &ServerConfig) -> DbPool {
    let pool = storefront_db::create_pool(&config.database_url, config.db_max_connections)
        .await
        .expect("Failed to connect to database");

    storefront_db::health_check(&pool)
        .await
        .expect("Database health check failed");

    storefront_db::run_migrations(&pool)
        .await
        .expect("Failed to run database migrations");
    tracing::info!("Database ready, migrations applied");

    pool
}

/// Serve until SIGINT/SIGTERM, then give in-flight requests up to `drain`
/// to finish.
async fn serve_until_signal(listener: TcpListener, app: Router, drain: Duration) {
    let (stop_tx, mut stop_rx) = tokio::sync::watch::channel(false);
    let server = tokio::spawn(async move {
        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = stop_rx.changed().await;
            })
            .await
    });

    shutdown_signal().await;
    let _ = stop_tx.send(true);

    match tokio::time::timeout(drain, server).await {
        Ok(Ok(Ok(()))) => tracing::info!("Graceful shutdown complete"),
        Ok(Ok(Err(e))) => tracing::error!(error = %e, "Server error"),
        Ok(Err(e)) => tracing::error!(error = %e, "Server task failed"),
        Err(_) => tracing::warn!(
            drain_secs = drain.as_secs(),
            "In-flight requests did not drain in time, exiting"
        ),
    }
}

/// Resolves on Ctrl-C, or SIGTERM on Unix.
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
        () = ctrl_c => tracing::info!("Received SIGINT, shutting down"),
        () = terminate => tracing::info!("Received SIGTERM, shutting down"),
    }
}
