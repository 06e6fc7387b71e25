use axum::http::Method;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tower_sessions::cookie::time::Duration;
use tower_sessions::{Expiry, SessionManagerLayer};
use tower_sessions_sqlx_store::SqliteStore;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use connector_core::crypto::EncryptionKey;
use connector_core::db::setup_state::SetupStateRepo;
use connector_core::db::{create_pool, run_migrations};
use connector_server::routes;
use connector_server::state::{AppState, ServerConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "connector_server=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = ServerConfig::from_env().map_err(|e| anyhow::anyhow!(e))?;
    let bind_addr = config.bind_addr.clone();

    let pool = create_pool(&config.database_url).await?;
    run_migrations(&pool).await?;

    let session_store = SqliteStore::new(pool.clone());
    session_store.migrate().await?;

    let purged = SetupStateRepo::purge_expired(&pool).await?;
    if purged > 0 {
        tracing::debug!("Purged {} expired setup state tokens", purged);
    }

    let encryption_key = match EncryptionKey::from_env() {
        Ok(key) => Some(key),
        Err(e) => {
            tracing::warn!("{}. App setup will be unavailable until it is set.", e);
            None
        }
    };

    let session_layer = SessionManagerLayer::new(session_store)
        .with_secure(!config.dev_mode)
        .with_expiry(Expiry::OnInactivity(Duration::hours(24)));

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::DELETE])
        .allow_headers(Any);

    let state = AppState::new(pool, config, encryption_key);

    let app = routes::api_router(state)
        .layer(session_layer)
        .layer(cors)
        .layer(TraceLayer::new_for_http());

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    tracing::info!("Connector server listening on http://{}", bind_addr);

    axum::serve(listener, app).await?;
    Ok(())
}
