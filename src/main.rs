mod config;
mod db;
mod dtos;
mod error;
mod handler;
mod middleware;
mod models;
mod routes;
mod service;
mod utils;

use std::{net::SocketAddr, sync::Arc, time::Duration};

use axum::http::{
    header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE},
    HeaderValue, Method,
};
use config::Config;
use db::{userdb::UserExt, DBClient};
use dotenv::dotenv;
use middleware::RateLimiter;
use routes::create_router;
use service::storage::ProofStorage;
use sqlx::{mysql::MySqlPoolOptions, MySql, Pool};
use tower_http::cors::{AllowOrigin, CorsLayer};
use tracing_subscriber::filter::LevelFilter;

const LOGIN_ATTEMPTS_PER_MINUTE: usize = 5;

#[derive(Debug, Clone)]
pub struct AppState {
    pub env: Config,
    pub db_client: Arc<DBClient>,
    pub storage: ProofStorage,
    pub login_limiter: RateLimiter,
}

impl AppState {
    pub fn new(config: Config, pool: Pool<MySql>) -> Self {
        AppState {
            storage: ProofStorage::new(&config),
            env: config,
            db_client: Arc::new(DBClient::new(pool)),
            login_limiter: RateLimiter::new(LOGIN_ATTEMPTS_PER_MINUTE, Duration::from_secs(60)),
        }
    }
}

fn log_level() -> LevelFilter {
    std::env::var("LOG_LEVEL")
        .ok()
        .and_then(|level| level.parse::<LevelFilter>().ok())
        .unwrap_or(LevelFilter::DEBUG)
}

#[tokio::main]
async fn main() {
    dotenv().ok();

    tracing_subscriber::fmt()
        .with_max_level(log_level())
        .init();

    let config = Config::init();

    let pool = match MySqlPoolOptions::new()
        .max_connections(config.db_max_connections)
        .connect(&config.database_url)
        .await
    {
        Ok(pool) => {
            tracing::info!("✅Connection to the database is successful!");
            pool
        }
        Err(err) => {
            tracing::error!("🔥 Failed to connect to the database: {:?}", err);
            std::process::exit(1);
        }
    };

    if config.run_migrations {
        if let Err(err) = sqlx::migrate!("./migrations").run(&pool).await {
            tracing::error!("🔥 Failed to run database migrations: {:?}", err);
            std::process::exit(1);
        }
        tracing::info!("database migrations applied");
    }

    let app_state = AppState::new(config.clone(), pool);

    if !config.admin_emails.is_empty() {
        match app_state.db_client.promote_admins(&config.admin_emails).await {
            Ok(promoted) => tracing::info!("{} account(s) promoted to admin", promoted),
            Err(err) => tracing::warn!("failed to promote admin accounts: {}", err),
        }
    }

    if !app_state.storage.is_remote() {
        tracing::warn!("BLOB_UPLOAD_URL not configured, payment proofs are stored inline");
    }

    let allowed_origins: Vec<HeaderValue> = config
        .cors_origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!("ignoring invalid CORS origin {}", origin);
                None
            }
        })
        .collect();

    let cors = CorsLayer::new()
        .allow_origin(AllowOrigin::list(allowed_origins))
        .allow_headers([AUTHORIZATION, ACCEPT, CONTENT_TYPE])
        .allow_credentials(true)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
        ]);

    let app = create_router(Arc::new(app_state)).layer(cors);

    tracing::info!("🚀 Server is running on http://localhost:{}", config.port);

    let listener = match tokio::net::TcpListener::bind(format!("0.0.0.0:{}", &config.port)).await {
        Ok(listener) => listener,
        Err(err) => {
            tracing::error!("🔥 Failed to bind port {}: {}", config.port, err);
            std::process::exit(1);
        }
    };

    if let Err(err) = axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await
    {
        tracing::error!("server error: {}", err);
        std::process::exit(1);
    }
}
