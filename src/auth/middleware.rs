//! Authentication Extractors
//!
//! Axum extractors that authenticate a request from its credential cookie.
//! Handlers that need an identity take [`AuthUser`]; handlers that behave
//! differently for anonymous callers take [`MaybeAuthUser`]. Extraction runs
//! before the handler body, so a request is fully authenticated (or rejected)
//! before it touches the store.

use axum::{
    extract::FromRequestParts,
    http::{HeaderMap, header, request::Parts},
};
use axum_extra::extract::cookie::CookieJar;

use crate::auth::models::AuthUser;
use crate::errors::ApiError;
use crate::server::AppState;

/// Request authenticator shared by the extractors
pub struct AuthMiddleware;

impl AuthMiddleware {
    /// Pull the raw credential out of the request.
    ///
    /// The session cookie is preferred; an `Authorization: Bearer` header is
    /// accepted as a fallback for non-browser clients. Empty values (as left
    /// behind by logout) count as absent.
    pub fn credential(headers: &HeaderMap, cookie_name: &str) -> Option<String> {
        let jar = CookieJar::from_headers(headers);
        jar.get(cookie_name)
            .map(|c| c.value().trim().to_string())
            .filter(|v| !v.is_empty())
            .or_else(|| {
                headers
                    .get(header::AUTHORIZATION)
                    .and_then(|h| h.to_str().ok())
                    .and_then(|h| h.strip_prefix("Bearer "))
                    .map(|t| t.trim().to_string())
                    .filter(|t| !t.is_empty())
            })
    }

    /// Verify a credential and return the identity it carries
    pub fn authenticate(state: &AppState, token: &str) -> Result<AuthUser, ApiError> {
        match state.jwt_service.decode_claims(token) {
            Ok(claims) => {
                tracing::debug!(user_id = %claims.sub, "Credential verified");
                Ok(AuthUser {
                    id: claims.sub,
                    email: claims.email,
                })
            }
            Err(e) => {
                tracing::warn!("Credential rejected: {:#}", e);
                Err(ApiError::Unauthenticated)
            }
        }
    }

    /// Anonymous when no credential is present, an error when one is present
    /// but does not verify.
    pub fn resolve(state: &AppState, headers: &HeaderMap) -> Result<Option<AuthUser>, ApiError> {
        match Self::credential(headers, &state.config.auth.cookie_name) {
            Some(token) => Self::authenticate(state, &token).map(Some),
            None => Ok(None),
        }
    }
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        match AuthMiddleware::resolve(state, &parts.headers)? {
            Some(user) => Ok(user),
            None => {
                tracing::warn!("Anonymous request to {} {}", parts.method, parts.uri.path());
                Err(ApiError::Unauthenticated)
            }
        }
    }
}

/// Optional identity; `None` for anonymous callers
#[derive(Debug, Clone)]
pub struct MaybeAuthUser(pub Option<AuthUser>);

impl FromRequestParts<AppState> for MaybeAuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        AuthMiddleware::resolve(state, &parts.headers).map(MaybeAuthUser)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers(pairs: &[(header::HeaderName, &str)]) -> HeaderMap {
        let mut map = HeaderMap::new();
        for (name, value) in pairs {
            map.append(name.clone(), HeaderValue::from_str(value).unwrap());
        }
        map
    }

    #[test]
    fn test_credential_from_cookie() {
        let map = headers(&[(header::COOKIE, "theme=dark; token=abc.def.ghi")]);
        assert_eq!(AuthMiddleware::credential(&map, "token").as_deref(), Some("abc.def.ghi"));
    }

    #[test]
    fn test_credential_from_bearer_header() {
        let map = headers(&[(header::AUTHORIZATION, "Bearer abc.def.ghi")]);
        assert_eq!(AuthMiddleware::credential(&map, "token").as_deref(), Some("abc.def.ghi"));
    }

    #[test]
    fn test_empty_cookie_is_absent() {
        let map = headers(&[(header::COOKIE, "token=")]);
        assert_eq!(AuthMiddleware::credential(&map, "token"), None);
        assert_eq!(AuthMiddleware::credential(&HeaderMap::new(), "token"), None);
    }

    #[test]
    fn test_other_cookie_names_ignored() {
        let map = headers(&[(header::COOKIE, "access_token=abc")]);
        assert_eq!(AuthMiddleware::credential(&map, "token"), None);
    }
}
