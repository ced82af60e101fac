//! Auth routes for registration, login, profile and logout

use anyhow::Context;
use axum::{Json, Router, extract::State, routing::{get, post}};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};

use crate::auth::models::{LoginRequest, PublicUser, RegisterRequest, normalize_email};
use crate::auth::password::{hash_password, verify_dummy, verify_password};
use crate::auth::MaybeAuthUser;
use crate::config::AuthConfig;
use crate::database::NewUser;
use crate::errors::ApiError;
use crate::routes::{ApiJson, required};
use crate::server::AppState;

fn session_cookie(config: &AuthConfig, token: String, max_age: time::Duration) -> Cookie<'static> {
    let mut cookie = Cookie::new(config.cookie_name.clone(), token);
    cookie.set_http_only(true);
    cookie.set_secure(config.cookie_secure);
    cookie.set_same_site(SameSite::Lax);
    cookie.set_path("/");
    cookie.set_max_age(max_age);
    cookie
}

pub async fn register(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<RegisterRequest>,
) -> Result<Json<PublicUser>, ApiError> {
    let name = required("name", payload.name)?;
    let email = normalize_email(&required("email", payload.email)?);
    let password = payload
        .password
        .filter(|p| !p.is_empty())
        .ok_or_else(|| ApiError::missing("password"))?;

    if !email.contains('@') {
        return Err(ApiError::validation("email", "email must be a valid email address"));
    }

    let params = state.config.auth.password;
    let password_hash = tokio::task::spawn_blocking(move || hash_password(&password, params))
        .await
        .context("Password hashing task failed")??;

    let user = state
        .store
        .create_user(NewUser {
            name,
            email,
            password_hash,
        })
        .await?;

    tracing::info!(user_id = %user.id, "Registered account {}", user.email);
    Ok(Json(PublicUser::from(&user)))
}

/// Verify email and password, then set the credential cookie.
///
/// Unknown email and wrong password fail with the same error after the same
/// amount of hashing work.
pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    ApiJson(payload): ApiJson<LoginRequest>,
) -> Result<(CookieJar, Json<PublicUser>), ApiError> {
    let email = normalize_email(&required("email", payload.email)?);
    let password = payload
        .password
        .filter(|p| !p.is_empty())
        .ok_or_else(|| ApiError::missing("password"))?;

    let user = match state.store.find_user_by_email(&email).await? {
        Some(user) => {
            let hash = user.password_hash.clone();
            let verified = tokio::task::spawn_blocking(move || verify_password(&password, &hash))
                .await
                .context("Password verification task failed")??;
            if !verified {
                tracing::warn!("Failed login attempt");
                return Err(ApiError::InvalidCredentials);
            }
            user
        }
        None => {
            tokio::task::spawn_blocking(move || verify_dummy(&password))
                .await
                .context("Password verification task failed")?;
            tracing::warn!("Failed login attempt");
            return Err(ApiError::InvalidCredentials);
        }
    };

    let token = state.jwt_service.create_token(user.id, user.email.clone())?;
    let max_age = time::Duration::seconds(state.jwt_service.ttl().num_seconds());
    let jar = jar.add(session_cookie(&state.config.auth, token, max_age));

    tracing::info!(user_id = %user.id, "Logged in");
    Ok((jar, Json(PublicUser::from(&user))))
}

/// Current account, or `null` for anonymous callers
pub async fn profile(
    State(state): State<AppState>,
    MaybeAuthUser(user): MaybeAuthUser,
) -> Result<Json<Option<PublicUser>>, ApiError> {
    let Some(user) = user else {
        return Ok(Json(None));
    };
    let account = state.store.find_user(user.id).await?;
    Ok(Json(account.as_ref().map(PublicUser::from)))
}

pub async fn logout(State(state): State<AppState>, jar: CookieJar) -> (CookieJar, Json<bool>) {
    // Removal must use the same path the cookie was set with
    let mut cookie = Cookie::new(state.config.auth.cookie_name.clone(), "");
    cookie.set_path("/");
    (jar.remove(cookie), Json(true))
}

pub fn create_auth_routes() -> Router<AppState> {
    Router::new()
        .route("/api/register", post(register))
        .route("/api/login", post(login))
        .route("/api/logout", post(logout))
        .route("/api/profile", get(profile))
}
