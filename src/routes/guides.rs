//! Tour guide profile routes
//!
//! Profiles are submitted as multipart forms: text fields plus an identity
//! document (`idProof`) and a `profilePhoto`. An account owns at most one
//! profile, and only that account may change it.

use std::collections::HashMap;

use axum::{
    Json, Router,
    extract::{Multipart, Path, Query, State},
    routing::{get, post},
};
use bytes::Bytes;
use serde::Deserialize;

use crate::auth::models::normalize_email;
use crate::auth::{AuthUser, ensure_owner};
use crate::database::store::{GUIDE_EMAIL_TAKEN, GUIDE_EXISTS};
use crate::database::{Guide, GuideFields, GuideUpdate, NewGuide};
use crate::errors::ApiError;
use crate::routes::{comma_list, required};
use crate::server::AppState;
use crate::types::{GuideId, parse_id};

const ID_PROOF: &str = "idProof";
const PROFILE_PHOTO: &str = "profilePhoto";

struct UploadedFile {
    bytes: Bytes,
    file_name: String,
    content_type: Option<String>,
}

/// Parsed guide form
#[derive(Default)]
struct GuideForm {
    text: HashMap<String, String>,
    files: HashMap<String, UploadedFile>,
}

impl GuideForm {
    async fn read(mut multipart: Multipart) -> Result<Self, ApiError> {
        let mut form = Self::default();
        while let Some(field) = multipart.next_field().await? {
            let Some(name) = field.name().map(str::to_string) else {
                continue;
            };
            match field.file_name().map(str::to_string) {
                Some(file_name) => {
                    let content_type = field.content_type().map(str::to_string);
                    let bytes = field.bytes().await?;
                    if !bytes.is_empty() {
                        form.files.insert(
                            name,
                            UploadedFile {
                                bytes,
                                file_name,
                                content_type,
                            },
                        );
                    }
                }
                None => {
                    form.text.insert(name, field.text().await?);
                }
            }
        }
        Ok(form)
    }

    fn field(&mut self, name: &str) -> Result<String, ApiError> {
        required(name, self.text.remove(name))
    }

    fn list(&mut self, name: &str) -> Result<Vec<String>, ApiError> {
        let values = comma_list(&self.field(name)?);
        if values.is_empty() {
            return Err(ApiError::missing(name));
        }
        Ok(values)
    }

    fn fields(&mut self) -> Result<GuideFields, ApiError> {
        let email = normalize_email(&self.field("email")?);
        if !email.contains('@') {
            return Err(ApiError::validation("email", "email must be a valid email address"));
        }
        Ok(GuideFields {
            name: self.field("name")?,
            contact: self.field("contact")?,
            email,
            languages: self.list("languages")?,
            places: self.list("places")?,
        })
    }
}

/// Upload a form file, if present, and return its URL
async fn store_file(state: &AppState, file: Option<UploadedFile>) -> Result<Option<String>, ApiError> {
    match file {
        Some(file) => {
            let url = state
                .objects
                .put(file.bytes, &file.file_name, file.content_type.as_deref())
                .await?;
            Ok(Some(url))
        }
        None => Ok(None),
    }
}

pub async fn register_guide(
    State(state): State<AppState>,
    user: AuthUser,
    multipart: Multipart,
) -> Result<Json<Guide>, ApiError> {
    let mut form = GuideForm::read(multipart).await?;
    let fields = form.fields()?;
    let id_proof = form.files.remove(ID_PROOF).ok_or_else(|| ApiError::missing(ID_PROOF))?;
    let profile_photo = form
        .files
        .remove(PROFILE_PHOTO)
        .ok_or_else(|| ApiError::missing(PROFILE_PHOTO))?;

    // Checked before uploading so rejected forms leave no stray objects
    if state.store.find_guide_by_owner(user.id).await?.is_some() {
        return Err(ApiError::Conflict(GUIDE_EXISTS.to_string()));
    }
    if state.store.find_guide_by_email(&fields.email).await?.is_some() {
        return Err(ApiError::Conflict(GUIDE_EMAIL_TAKEN.to_string()));
    }

    let id_proof = store_file(&state, Some(id_proof)).await?.unwrap_or_default();
    let profile_photo = store_file(&state, Some(profile_photo)).await?.unwrap_or_default();

    let guide = state
        .store
        .create_guide(NewGuide {
            owner: user.id,
            fields,
            profile_photo,
            id_proof,
        })
        .await?;

    tracing::info!(guide_id = %guide.id, owner = %user.id, "Registered guide profile");
    Ok(Json(guide))
}

/// Apply a form to an existing guide whose ownership is already verified
async fn apply_form(state: &AppState, id: GuideId, multipart: Multipart) -> Result<Guide, ApiError> {
    let mut form = GuideForm::read(multipart).await?;
    let fields = form.fields()?;
    let id_proof = form.files.remove(ID_PROOF);
    let profile_photo = form.files.remove(PROFILE_PHOTO);

    // Same pre-upload check as registration; the store still enforces uniqueness
    if let Some(other) = state.store.find_guide_by_email(&fields.email).await? {
        if other.id != id {
            return Err(ApiError::Conflict(GUIDE_EMAIL_TAKEN.to_string()));
        }
    }

    let update = GuideUpdate {
        fields,
        id_proof: store_file(state, id_proof).await?,
        profile_photo: store_file(state, profile_photo).await?,
    };

    let guide = state
        .store
        .update_guide(id, update)
        .await?
        .ok_or_else(|| ApiError::not_found("Guide profile"))?;

    tracing::info!(guide_id = %id, "Updated guide profile");
    Ok(guide)
}

/// Update the caller's own guide profile
pub async fn update_own_guide(
    State(state): State<AppState>,
    user: AuthUser,
    multipart: Multipart,
) -> Result<Json<Guide>, ApiError> {
    let guide = state
        .store
        .find_guide_by_owner(user.id)
        .await?
        .ok_or_else(|| ApiError::not_found("Guide profile"))?;
    Ok(Json(apply_form(&state, guide.id, multipart).await?))
}

/// Update a guide profile by id; owner only
pub async fn update_guide(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
    multipart: Multipart,
) -> Result<Json<Guide>, ApiError> {
    let id = parse_id("id", &id)?;
    let guide = state
        .store
        .find_guide(id)
        .await?
        .ok_or_else(|| ApiError::not_found("Guide profile"))?;
    ensure_owner(&user, &guide)?;
    Ok(Json(apply_form(&state, id, multipart).await?))
}

#[derive(Debug, Deserialize)]
pub struct GuideProfileQuery {
    pub email: Option<String>,
}

pub async fn guide_by_email(
    State(state): State<AppState>,
    Query(query): Query<GuideProfileQuery>,
) -> Result<Json<Guide>, ApiError> {
    let email = normalize_email(&required("email", query.email)?);
    let guide = state
        .store
        .find_guide_by_email(&email)
        .await?
        .ok_or_else(|| ApiError::not_found("Guide profile"))?;
    Ok(Json(guide))
}

pub async fn my_guide(State(state): State<AppState>, user: AuthUser) -> Result<Json<Guide>, ApiError> {
    let guide = state
        .store
        .find_guide_by_owner(user.id)
        .await?
        .ok_or_else(|| ApiError::not_found("Guide profile"))?;
    Ok(Json(guide))
}

pub async fn list_guides(State(state): State<AppState>) -> Result<Json<Vec<Guide>>, ApiError> {
    Ok(Json(state.store.list_guides().await?))
}

pub async fn get_guide(State(state): State<AppState>, Path(id): Path<String>) -> Result<Json<Guide>, ApiError> {
    let id = parse_id("id", &id)?;
    let guide = state
        .store
        .find_guide(id)
        .await?
        .ok_or_else(|| ApiError::not_found("Guide profile"))?;
    Ok(Json(guide))
}

pub fn create_guide_routes() -> Router<AppState> {
    Router::new()
        .route("/api/register-guide", post(register_guide))
        .route("/api/update-guide", post(update_own_guide))
        .route("/api/guide-profile", get(guide_by_email))
        .route("/api/guide-profile/me", get(my_guide))
        .route("/api/guides", get(list_guides))
        .route("/api/guides/{id}", get(get_guide).put(update_guide))
}
