//! JWT Token Service
//!
//! Handles credential creation and validation. Credentials are HS256 JWTs
//! carrying the user id, email, issue time and expiry. Signing keys live in a
//! small keyring: one active key signs new tokens, retired keys are kept for
//! verification only so a secret can be rotated without logging everyone out
//! at once. Each key is identified by a `kid` derived from its secret.

use anyhow::{Context, Result, anyhow, bail};
use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use chrono::{Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, TokenData, Validation, decode, decode_header, encode};
use ring::digest;
use serde::{Deserialize, Serialize};

use crate::config::AuthConfig;
use crate::types::UserId;

const ISSUER: &str = "locus-server";

/// JWT Claims structure containing user information and token metadata
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    /// User unique identifier
    pub sub: UserId,
    /// User email
    pub email: String,
    /// Token issued at timestamp
    pub iat: i64,
    /// Token expiration timestamp
    pub exp: i64,
    /// Token issuer
    pub iss: String,
}

struct KeyEntry {
    kid: String,
    encoding: EncodingKey,
    decoding: DecodingKey,
}

impl KeyEntry {
    fn new(secret: &str) -> Self {
        Self {
            kid: key_id(secret),
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
        }
    }
}

/// Stable, non-reversible identifier for a secret
fn key_id(secret: &str) -> String {
    let hash = digest::digest(&digest::SHA256, secret.as_bytes());
    URL_SAFE_NO_PAD.encode(&hash.as_ref()[..9])
}

/// JWT Service for token operations
pub struct JwtService {
    active: KeyEntry,
    retired: Vec<KeyEntry>,
    validation: Validation,
    ttl: Duration,
}

impl JwtService {
    /// Create a new JWT service with a single secret and a 24 hour lifetime
    #[cfg(test)]
    pub fn new(secret: &str) -> Self {
        Self::with_keys(secret, &[], Duration::hours(24))
    }

    /// Create a service that signs with `secret` and still accepts tokens
    /// signed by any of `retired`
    pub fn with_keys(secret: &str, retired: &[String], ttl: Duration) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[ISSUER]);
        validation.set_required_spec_claims(&["exp", "iat", "iss", "sub"]);

        let active = KeyEntry::new(secret);
        let retired = retired
            .iter()
            .filter(|s| s.as_str() != secret)
            .map(|s| KeyEntry::new(s))
            .collect();

        Self {
            active,
            retired,
            validation,
            ttl,
        }
    }

    pub fn from_config(config: &AuthConfig) -> Result<Self> {
        if config.jwt_secret.trim().is_empty() {
            bail!("JWT signing secret must not be empty");
        }
        if config.token_ttl <= Duration::zero() {
            bail!("Credential lifetime must be positive");
        }
        Ok(Self::with_keys(&config.jwt_secret, &config.previous_secrets, config.token_ttl))
    }

    /// Lifetime of newly issued tokens
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Generate a JWT token for a user
    pub fn create_token(&self, user_id: UserId, email: String) -> Result<String> {
        let now = Utc::now();
        let expiration = now + self.ttl;

        let claims = Claims {
            sub: user_id,
            email,
            iat: now.timestamp(),
            exp: expiration.timestamp(),
            iss: ISSUER.to_string(),
        };

        let mut header = Header::new(Algorithm::HS256);
        header.kid = Some(self.active.kid.clone());

        encode(&header, &claims, &self.active.encoding).context("Failed to encode JWT token")
    }

    /// Validate and decode a JWT token
    ///
    /// Tokens naming a `kid` are checked against that key only; tokens without
    /// one are tried against every key in the ring.
    pub fn validate_token(&self, token: &str) -> Result<TokenData<Claims>> {
        let header = decode_header(token).context("Malformed JWT header")?;

        let keys: Vec<&KeyEntry> = std::iter::once(&self.active)
            .chain(self.retired.iter())
            .filter(|k| header.kid.as_deref().is_none_or(|kid| kid == k.kid))
            .collect();

        if keys.is_empty() {
            return Err(anyhow!("Unknown signing key"));
        }

        let mut last_err = None;
        for key in keys {
            match decode::<Claims>(token, &key.decoding, &self.validation) {
                Ok(data) => return Ok(data),
                Err(e) => last_err = Some(e),
            }
        }

        let err = match last_err {
            Some(e) => anyhow::Error::new(e),
            None => anyhow!("No signing key accepted the token"),
        };
        Err(err.context("Failed to validate JWT token"))
    }

    /// Validate a token and return its claims
    pub fn decode_claims(&self, token: &str) -> Result<Claims> {
        let token_data = self.validate_token(token)?;
        Ok(token_data.claims)
    }
}
