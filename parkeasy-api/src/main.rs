use std::net::SocketAddr;
use std::sync::Arc;

use parkeasy_api::{app, AppState, AuthConfig};
use parkeasy_core::notify::Notifier;
use parkeasy_core::{MemoryStore, ParkingStore};
use parkeasy_store::app_config::{Config, StoreMode};
use parkeasy_store::{DbClient, LogNotifier, PgStore, RedisClient, SmtpNotifier};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "parkeasy_api=debug,parkeasy_booking=debug,tower_http=debug".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::load()?;
    tracing::info!("Starting ParkEasy API on port {}", config.server.port);

    let store: Arc<dyn ParkingStore> = match config.database.mode {
        StoreMode::Memory => {
            tracing::warn!("Using in-memory store, data is lost on restart");
            Arc::new(MemoryStore::new())
        }
        StoreMode::Postgres => {
            let db = DbClient::new(&config.database.url, config.database.max_connections).await?;
            db.migrate().await?;
            Arc::new(PgStore::new(db.pool.clone()))
        }
    };

    let notifier: Arc<dyn Notifier> = match SmtpNotifier::from_config(&config.smtp) {
        Some(smtp) => Arc::new(smtp),
        None => {
            tracing::warn!("SMTP credentials not configured, confirmation emails will only be logged");
            Arc::new(LogNotifier)
        }
    };

    let mut app_state = AppState::new(
        store,
        notifier,
        &config.business_rules,
        AuthConfig { secret: config.auth.jwt_secret.clone() },
    );

    match &config.redis.url {
        Some(url) => match RedisClient::new(url).await {
            Ok(redis) => {
                app_state = app_state.with_rate_limit(Arc::new(redis), config.redis.requests_per_minute)
            }
            Err(e) => tracing::warn!(error = %e, "Redis unavailable, rate limiting disabled"),
        },
        None => tracing::info!("No Redis configured, rate limiting disabled"),
    }

    let tasks = app_state.bookings.tasks().clone();
    let app = app(app_state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server.port));
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    tracing::info!(in_flight = tasks.in_flight(), "Waiting for confirmation tasks");
    tasks.drain().await;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
