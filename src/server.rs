//! # Server Module
//!
//! HTTP server setup and route configuration for the marketplace API.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use axum::{
    Router,
    extract::DefaultBodyLimit,
    http::{HeaderValue, Method, header},
};
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::auth::JwtService;
use crate::config::Config;
use crate::database::{DatabaseConfig, DatabaseConnection, MemoryStore, PgStore, Store, migrations};
use crate::routes;
use crate::storage::{ObjectStore, S3ObjectStore, remote_client};

/// Application state shared across all route handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub jwt_service: Arc<JwtService>,
    pub store: Arc<dyn Store>,
    pub objects: Arc<dyn ObjectStore>,
    /// Outbound client for upload-by-link
    pub http: reqwest::Client,
}

impl AppState {
    pub fn new(config: Config, store: Arc<dyn Store>, objects: Arc<dyn ObjectStore>) -> Result<Self> {
        let jwt_service = JwtService::from_config(&config.auth).context("Invalid signing configuration")?;
        Ok(Self {
            config: Arc::new(config),
            jwt_service: Arc::new(jwt_service),
            store,
            objects,
            http: remote_client()?,
        })
    }
}

fn cors_layer(origins: &[String]) -> Result<CorsLayer> {
    let origins = origins
        .iter()
        .map(|o| {
            // Wildcard origins cannot carry credentials
            if o.trim() == "*" {
                bail!("Invalid CORS origin: '*' cannot be used with cookie credentials; list origins explicitly");
            }
            o.parse::<HeaderValue>().with_context(|| format!("Invalid CORS origin: {o}"))
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::OPTIONS])
        .allow_headers([
            header::ORIGIN,
            header::CONTENT_TYPE,
            header::ACCEPT,
            header::AUTHORIZATION,
        ])
        .allow_credentials(true)) // Cookies carry the credential
}

/// Assemble the full router for the given state
pub fn build_router(state: AppState) -> Result<Router> {
    let cors = cors_layer(&state.config.server.cors_origins)?;
    let upload_limit = DefaultBodyLimit::max(state.config.server.max_upload_bytes);

    let app = Router::new()
        .merge(routes::health::create_health_routes())
        .merge(routes::auth::create_auth_routes())
        .merge(routes::uploads::create_upload_routes().layer(upload_limit.clone()))
        .merge(routes::places::create_place_routes())
        .merge(routes::bookings::create_booking_routes())
        .merge(routes::guides::create_guide_routes().layer(upload_limit))
        .merge(routes::guide_bookings::create_guide_booking_routes())
        .layer(ServiceBuilder::new().layer(TraceLayer::new_for_http()).layer(cors))
        .with_state(state);

    Ok(app)
}

async fn open_store(config: &Config) -> Result<Arc<dyn Store>> {
    match &config.database {
        Some(settings) => {
            let db = DatabaseConnection::new(DatabaseConfig::from_settings(settings)?).await?;
            migrations::run_migrations(db.pool()).await?;
            Ok(Arc::new(PgStore::new(db.pool().clone())))
        }
        None => {
            tracing::warn!("⚠️  DATABASE_URL not set, using the in-memory store (data is lost on restart)");
            Ok(Arc::new(MemoryStore::new()))
        }
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("🛑 Shutdown signal received");
}

/// Starts the marketplace HTTP server.
///
/// Opens the store (running migrations when backed by PostgreSQL), connects
/// object storage, and serves until interrupted.
pub async fn start(config: Config) -> Result<()> {
    let store = open_store(&config).await?;
    let objects: Arc<dyn ObjectStore> = Arc::new(S3ObjectStore::new(&config.storage).await);

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port)
        .parse()
        .context("Invalid SERVER_HOST / PORT")?;

    let state = AppState::new(config, store, objects)?;
    let app = build_router(state)?;

    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind to {addr} - port may already be in use"))?;

    tracing::info!("🚀 Marketplace server starting...");
    tracing::info!("📡 Listening on http://{}", addr);
    tracing::info!("🏥 Health check available at http://{}/ping", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    Ok(())
}
