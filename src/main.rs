//! # Locus Server
//!
//! Booking marketplace API: property listings, bookings, tour-guide profiles
//! and guide bookings, built with Rust, Axum, and Tokio.
//!
//! ## Architecture
//! - `server`: router assembly, shared state, and startup
//! - `config`: environment variable configuration
//! - `auth`: credential issuing, request authentication, ownership checks
//! - `database`: the `Store` trait with PostgreSQL and in-memory backends
//! - `storage`: object storage for uploaded photos and documents
//! - `routes`: HTTP handlers grouped by resource
//!
//! ## Running the Server
//! ```bash
//! JWT_SECRET=change-me cargo run
//! ```
//!
//! Without `DATABASE_URL` the server keeps its data in memory.

mod auth;
mod config;
mod database;
mod errors;
mod routes;
mod server;
mod storage;
mod types;

#[cfg(test)]
mod test_utils;

use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    dotenv::dotenv().ok();

    // Compact console output; RUST_LOG overrides the default level
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer().with_target(false).compact())
        .init();

    tracing::info!("🏁 Starting Locus Server...");
    tracing::info!("📦 Package: {} v{}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"));
    tracing::info!("🏗️  Build profile: {}", if cfg!(debug_assertions) { "debug" } else { "release" });

    let config = match config::Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("Configuration error: {:#}", e);
            std::process::exit(1);
        }
    };

    if let Err(e) = server::start(config).await {
        tracing::error!("Server exited with error: {:#}", e);
        std::process::exit(1);
    }
}
