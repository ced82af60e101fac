//! # Database Module
//!
//! Persistence for the marketplace collections. PostgreSQL via tokio-postgres
//! and deadpool in production, an in-process store for tests and local runs.

pub mod connection;
pub mod memory;
pub mod migrations;
pub mod models;
pub mod postgres;
pub mod store;

pub use connection::{DatabaseConfig, DatabaseConnection};
pub use memory::MemoryStore;
pub use models::*;
pub use postgres::PgStore;
pub use store::{Store, StoreError};
