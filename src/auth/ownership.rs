//! Ownership check for owned resources.
//!
//! Places and guide profiles carry the id of the account that created them.
//! Only that account may change them; everyone may read them.

use crate::auth::models::AuthUser;
use crate::errors::ApiError;
use crate::types::UserId;

/// A record whose mutation is restricted to one account
pub trait Owned {
    /// Human-readable resource name used in rejection messages
    const RESOURCE: &'static str;

    fn owner(&self) -> UserId;
}

/// Allow the mutation only when `user` owns `resource`.
///
/// Ids are compared as [`uuid::Uuid`] values, never as strings.
pub fn ensure_owner<R: Owned>(user: &AuthUser, resource: &R) -> Result<(), ApiError> {
    if user.id == resource.owner() {
        Ok(())
    } else {
        tracing::warn!(user_id = %user.id, owner = %resource.owner(), "Ownership check denied on {}", R::RESOURCE);
        Err(ApiError::Forbidden(format!("This {} belongs to another account", R::RESOURCE)))
    }
}
