//! Configuration module for environment variables and application settings
//!
//! Values are read once at startup (after `.env` has been loaded by `main`).
//! A missing signing secret is a startup error; everything else has a
//! development default.

use std::env;

use anyhow::{Result, anyhow};
use chrono::Duration;

use crate::auth::password::Argon2Params;

#[derive(Debug, Clone)]
pub struct Config {
    /// HTTP server configuration
    pub server: ServerConfig,

    /// Database configuration; `None` runs against the in-memory store
    pub database: Option<DatabaseSettings>,

    /// Credential issuing and verification
    pub auth: AuthConfig,

    /// Object storage for uploaded photos and documents
    pub storage: StorageConfig,
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Origins allowed to send credentialed cross-site requests
    pub cors_origins: Vec<String>,
    /// Request body limit applied to the upload routes
    pub max_upload_bytes: usize,
}

#[derive(Debug, Clone)]
pub struct DatabaseSettings {
    pub url: String,
    pub max_connections: usize,
    pub tls: bool,
}

#[derive(Debug, Clone)]
pub struct AuthConfig {
    /// Secret used to sign new credentials
    pub jwt_secret: String,
    /// Retired secrets still accepted for verification during a rotation window
    pub previous_secrets: Vec<String>,
    pub token_ttl: Duration,
    pub cookie_name: String,
    pub cookie_secure: bool,
    pub password: Argon2Params,
}

#[derive(Debug, Clone)]
pub struct StorageConfig {
    pub bucket: String,
    pub region: String,
    pub access_key: Option<String>,
    pub secret_key: Option<String>,
    /// S3-compatible endpoint override (MinIO, LocalStack, ...)
    pub endpoint: Option<String>,
}

fn var_or(name: &str, default: &str) -> String {
    env::var(name)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .unwrap_or_else(|| default.to_string())
}

fn parsed_or<T: std::str::FromStr>(name: &str, default: T) -> T {
    env::var(name).ok().and_then(|v| v.trim().parse().ok()).unwrap_or(default)
}

fn optional(name: &str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.trim().is_empty())
}

fn list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        let jwt_secret = optional("JWT_SECRET").ok_or_else(|| anyhow!("JWT_SECRET environment variable is required"))?;

        Ok(Self {
            server: ServerConfig {
                host: var_or("SERVER_HOST", "0.0.0.0"),
                port: env::var("PORT")
                    .ok()
                    .and_then(|p| p.parse().ok())
                    .unwrap_or_else(|| parsed_or("SERVER_PORT", 4000)),
                cors_origins: list(&var_or("CORS_ORIGINS", "http://127.0.0.1:5173")),
                max_upload_bytes: parsed_or("MAX_UPLOAD_BYTES", 25 * 1024 * 1024),
            },

            database: optional("DATABASE_URL").map(|url| DatabaseSettings {
                url,
                max_connections: parsed_or("DATABASE_MAX_CONNECTIONS", 16),
                tls: parsed_or("DATABASE_TLS", false),
            }),

            auth: AuthConfig {
                jwt_secret,
                previous_secrets: list(&var_or("JWT_PREVIOUS_SECRETS", "")),
                token_ttl: Duration::hours(parsed_or("JWT_TTL_HOURS", 24)),
                cookie_name: var_or("AUTH_COOKIE_NAME", "token"),
                cookie_secure: parsed_or("AUTH_COOKIE_SECURE", false),
                password: Argon2Params::default(),
            },

            storage: StorageConfig {
                bucket: var_or("S3_BUCKET", "bookticket"),
                region: var_or("S3_REGION", "us-east-1"),
                access_key: optional("S3_ACCESS_KEY"),
                secret_key: optional("S3_SECRET_ACCESS_KEY"),
                endpoint: optional("S3_ENDPOINT"),
            },
        })
    }
}

#[cfg(test)]
impl Config {
    /// In-memory configuration with cheap password hashing
    pub fn for_tests() -> Self {
        Self {
            server: ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 0,
                cors_origins: vec!["http://127.0.0.1:5173".to_string()],
                max_upload_bytes: 1024 * 1024,
            },
            database: None,
            auth: AuthConfig {
                jwt_secret: "test-secret-key-for-testing-only".to_string(),
                previous_secrets: Vec::new(),
                token_ttl: Duration::hours(1),
                cookie_name: "token".to_string(),
                cookie_secure: false,
                password: Argon2Params {
                    memory_kib: 64,
                    iterations: 1,
                    parallelism: 1,
                },
            },
            storage: StorageConfig {
                bucket: "test-bucket".to_string(),
                region: "us-east-1".to_string(),
                access_key: None,
                secret_key: None,
                endpoint: None,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_list_trims_and_drops_empty_entries() {
        assert_eq!(list(" a , ,b,"), vec!["a".to_string(), "b".to_string()]);
        assert!(list("").is_empty());
    }
}
