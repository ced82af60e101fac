//! Photo upload routes
//!
//! Both routes store the file in object storage and answer with its public
//! URL; listings and guide profiles reference photos by URL only.

use axum::{
    Json, Router,
    extract::{Multipart, State},
    routing::post,
};
use serde::{Deserialize, Serialize};

use crate::auth::AuthUser;
use crate::errors::ApiError;
use crate::routes::{ApiJson, required};
use crate::server::AppState;
use crate::storage::fetch_remote;

#[derive(Debug, Deserialize)]
pub struct UploadByLinkRequest {
    pub link: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct UploadedUrl {
    pub url: String,
}

/// Store every `photos` part of a multipart body
pub async fn upload(
    State(state): State<AppState>,
    user: AuthUser,
    mut multipart: Multipart,
) -> Result<Json<Vec<String>>, ApiError> {
    let mut urls = Vec::new();

    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some("photos") {
            continue;
        }
        let file_name = field.file_name().unwrap_or("photo").to_string();
        let content_type = field.content_type().map(str::to_string);
        let bytes = field.bytes().await?;
        if bytes.is_empty() {
            continue;
        }

        let url = state.objects.put(bytes, &file_name, content_type.as_deref()).await?;
        urls.push(url);
    }

    if urls.is_empty() {
        return Err(ApiError::missing("photos"));
    }

    tracing::info!(user_id = %user.id, "Uploaded {} photo(s)", urls.len());
    Ok(Json(urls))
}

/// Download a photo from a link and store it
pub async fn upload_by_link(
    State(state): State<AppState>,
    user: AuthUser,
    ApiJson(payload): ApiJson<UploadByLinkRequest>,
) -> Result<Json<UploadedUrl>, ApiError> {
    let link = required("link", payload.link)?;
    let remote = fetch_remote(&state.http, &link, state.config.server.max_upload_bytes).await?;
    let url = state
        .objects
        .put(remote.bytes, &remote.file_name, remote.content_type.as_deref())
        .await?;

    tracing::info!(user_id = %user.id, "Uploaded photo from link");
    Ok(Json(UploadedUrl { url }))
}

pub fn create_upload_routes() -> Router<AppState> {
    Router::new()
        .route("/api/upload", post(upload))
        .route("/api/upload-by-link", post(upload_by_link))
}
