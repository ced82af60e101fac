//! # Authentication Module
//!
//! Credential issuance and verification, password hashing, the request
//! authenticator used by every protected handler, and the ownership check
//! applied before an owned resource is mutated.

pub mod jwt;
pub mod middleware;
pub mod models;
pub mod ownership;
pub mod password;

pub use jwt::JwtService;
pub use middleware::MaybeAuthUser;
pub use models::{AuthUser, PublicUser};
pub use ownership::ensure_owner;
