use std::sync::Arc;

use anyhow::Result;
use tracing::info;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use common::{database, error::DatabaseError};
use messenger::{
    AppState,
    config::{ServerConfig, StoreBackend},
    jwt::{JwtConfig, JwtService},
    password::Argon2Verifier,
    repositories::{MemoryStore, MessageStore, PgMessageRepository, PgUserRepository, UserStore},
    routes,
};

#[tokio::main]
async fn main() -> Result<()> {
    let config = ServerConfig::from_env()?;

    // Initialize logging
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));
    let subscriber = FmtSubscriber::builder().with_env_filter(filter).finish();

    tracing::subscriber::set_global_default(subscriber).expect("setting default subscriber failed");

    info!("Starting messenger service");

    // Initialize the record stores
    let (users, messages): (Arc<dyn UserStore>, Arc<dyn MessageStore>) = match config.store {
        StoreBackend::Postgres => {
            let db_config = database::DatabaseConfig::from_env()?;
            let pool = database::init_pool(&db_config).await?;

            if database::health_check(&pool).await? {
                info!("Database connection successful");
            } else {
                anyhow::bail!("Failed to connect to database");
            }

            sqlx::migrate!()
                .run(&pool)
                .await
                .map_err(|e| DatabaseError::Migration(e.to_string()))?;
            info!("Database migrations applied");

            let users: Arc<dyn UserStore> = Arc::new(PgUserRepository::new(pool.clone()));
            let messages: Arc<dyn MessageStore> = Arc::new(PgMessageRepository::new(pool));
            (users, messages)
        }
        StoreBackend::Memory => {
            info!("Using in-memory store, data will not survive a restart");
            let store = MemoryStore::new();
            let users: Arc<dyn UserStore> = Arc::new(store.clone());
            let messages: Arc<dyn MessageStore> = Arc::new(store);
            (users, messages)
        }
    };

    // Initialize JWT service
    let jwt_config = JwtConfig::from_env()?;
    let jwt_service = JwtService::new(jwt_config);
    match jwt_service.token_expiry() {
        Some(expiry) => info!("Session tokens expire after {} seconds", expiry),
        None => info!("Session tokens do not expire"),
    }

    let app_state = AppState::new(
        users,
        messages,
        Arc::new(Argon2Verifier::new()),
        Arc::new(jwt_service),
    );

    // Start the web server
    let app = routes::create_router(app_state);

    let listener = tokio::net::TcpListener::bind(&config.bind_address).await?;
    info!("Messenger service listening on {}", config.bind_address);

    axum::serve(listener, app).await?;

    Ok(())
}
