use std::net::SocketAddr;
use std::sync::Arc;

use stuff_tracker::config::Config;
use stuff_tracker::db::{create_pool, run_migrations};
use stuff_tracker::routes::{create_router, AppState};
use stuff_tracker::store::{Datastore, PgStore};

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "stuff_tracker=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = Config::from_env()?;

    tracing::info!("Starting stuff-tracker API server...");
    tracing::info!("Connecting to database...");

    let pool = create_pool(&config.database_url, config.database_max_connections).await?;
    tracing::info!("Database connection established");

    run_migrations(&pool).await?;
    tracing::info!("Migrations applied");

    let store: Arc<dyn Datastore> = Arc::new(PgStore::new(pool));
    let state = AppState::new(store, config.jwt_secret.clone());
    let app = create_router(state, &config.allowed_origins);

    let addr: SocketAddr = config.server_addr().parse()?;
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
