use std::sync::Arc;

use tea_id::config::BridgeConfig;
use tea_id::identity::{FirebaseIdentity, StaticToken};
use tea_id::net::api::BackendClient;
use tea_id::services::session::{MemorySessionStore, PgSessionStore, SessionStore, spawn_session_sweeper};
use tea_id::state::AppState;
use tea_id::{db, routes};

#[derive(Debug, thiserror::Error)]
enum StartupError {
    #[error("configuration: {0}")]
    Config(#[from] tea_id::config::ConfigError),
    #[error("database init failed: {0}")]
    Db(#[from] sqlx::Error),
    #[error("identity client: {0}")]
    Identity(#[from] tea_id::identity::IdentityError),
    #[error("backend client: {0}")]
    Backend(#[from] tea_id::net::api::ApiError),
    #[error("invalid CORS origin: {0}")]
    Cors(#[from] axum::http::header::InvalidHeaderValue),
    #[error("server I/O: {0}")]
    Io(#[from] std::io::Error),
}

#[tokio::main]
async fn main() -> Result<(), StartupError> {
    let _ = dotenvy::dotenv();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let config = BridgeConfig::from_env()?;

    let sessions: Arc<dyn SessionStore> = match &config.database_url {
        Some(url) => {
            let pool = db::init_pool(url, config.db_max_connections).await?;
            tracing::info!(max_connections = config.db_max_connections, "postgres session store ready");
            Arc::new(PgSessionStore::new(pool))
        }
        None => {
            tracing::warn!("DATABASE_URL not set; sessions are kept in memory and lost on restart");
            Arc::new(MemorySessionStore::new())
        }
    };

    let verifier = Arc::new(FirebaseIdentity::new(config.identity.clone())?);
    let profiles = Arc::new(BackendClient::new(
        &config.backend.base_url,
        Arc::new(StaticToken(config.backend.service_token.clone())),
    )?);

    let _sweeper = spawn_session_sweeper(sessions.clone(), config.sweep_interval);

    let port = config.port;
    let state = AppState::new(config, sessions, verifier, profiles);
    let app = routes::app(state)?;
    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{port}")).await?;

    tracing::info!(%port, "session bridge listening");
    axum::serve(listener, app).await?;
    Ok(())
}
