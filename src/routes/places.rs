//! Property listing routes

use axum::{
    Json, Router,
    extract::{Path, State},
    routing::get,
};
use serde::Deserialize;
use serde_json::Value;

use crate::auth::{AuthUser, ensure_owner};
use crate::database::{Place, PlaceFields};
use crate::errors::ApiError;
use crate::routes::{ApiJson, integer, optional, required, text};
use crate::server::AppState;
use crate::types::parse_id;

/// Listing body for create and update. Photos arrive as `addedPhotos`.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaceRequest {
    pub id: Option<String>,
    pub title: Option<String>,
    pub address: Option<String>,
    pub added_photos: Option<Vec<String>>,
    pub description: Option<String>,
    pub perks: Option<Vec<String>>,
    pub extra_info: Option<String>,
    pub check_in: Option<Value>,
    pub check_out: Option<Value>,
    pub max_guests: Option<Value>,
    pub price: Option<Value>,
}

impl PlaceRequest {
    fn into_fields(self) -> Result<PlaceFields, ApiError> {
        let max_guests = integer("maxGuests", self.max_guests.as_ref())?.unwrap_or(1);
        if !(1..=i64::from(i32::MAX)).contains(&max_guests) {
            return Err(ApiError::validation("maxGuests", "maxGuests must be at least 1"));
        }
        let price = integer("price", self.price.as_ref())?.unwrap_or(0);
        if price < 0 {
            return Err(ApiError::validation("price", "price must not be negative"));
        }

        Ok(PlaceFields {
            title: required("title", self.title)?,
            address: required("address", self.address)?,
            photos: clean(self.added_photos),
            description: optional(self.description),
            perks: clean(self.perks),
            extra_info: optional(self.extra_info),
            check_in: text(self.check_in.as_ref()),
            check_out: text(self.check_out.as_ref()),
            max_guests: max_guests as i32,
            price,
        })
    }
}

fn clean(values: Option<Vec<String>>) -> Vec<String> {
    values
        .unwrap_or_default()
        .into_iter()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .collect()
}

pub async fn create_place(
    State(state): State<AppState>,
    user: AuthUser,
    ApiJson(payload): ApiJson<PlaceRequest>,
) -> Result<Json<Place>, ApiError> {
    let fields = payload.into_fields()?;
    let place = state.store.create_place(user.id, fields).await?;
    tracing::info!(place_id = %place.id, owner = %user.id, "Created place");
    Ok(Json(place))
}

pub async fn user_places(State(state): State<AppState>, user: AuthUser) -> Result<Json<Vec<Place>>, ApiError> {
    Ok(Json(state.store.list_places_by_owner(user.id).await?))
}

pub async fn get_place(State(state): State<AppState>, Path(id): Path<String>) -> Result<Json<Place>, ApiError> {
    let id = parse_id("id", &id)?;
    let place = state.store.find_place(id).await?.ok_or_else(|| ApiError::not_found("Place"))?;
    Ok(Json(place))
}

/// Replace a listing's fields. Only the owner may do this; a rejected update
/// leaves the stored listing untouched.
pub async fn update_place(
    State(state): State<AppState>,
    user: AuthUser,
    ApiJson(mut payload): ApiJson<PlaceRequest>,
) -> Result<Json<Place>, ApiError> {
    let id = parse_id("id", &required("id", payload.id.take())?)?;
    let place = state.store.find_place(id).await?.ok_or_else(|| ApiError::not_found("Place"))?;
    ensure_owner(&user, &place)?;

    let fields = payload.into_fields()?;
    let updated = state
        .store
        .update_place(id, fields)
        .await?
        .ok_or_else(|| ApiError::not_found("Place"))?;

    tracing::info!(place_id = %id, "Updated place");
    Ok(Json(updated))
}

pub async fn list_places(State(state): State<AppState>) -> Result<Json<Vec<Place>>, ApiError> {
    Ok(Json(state.store.list_places().await?))
}

pub fn create_place_routes() -> Router<AppState> {
    Router::new()
        .route("/api/places", get(list_places).post(create_place).put(update_place))
        .route("/api/places/{id}", get(get_place))
        .route("/api/user-places", get(user_places))
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use serde_json::{Value, json};

    use crate::test_utils::TestApp;
    use crate::types::parse_id;

    fn listing(title: &str) -> Value {
        json!({
            "title": title,
            "address": "1 Harbour Road",
            "addedPhotos": ["https://test-bucket.s3.amazonaws.com/a.jpg"],
            "description": "Sea view",
            "perks": ["wifi", "parking"],
            "extraInfo": "No pets",
            "checkIn": "14",
            "checkOut": 11,
            "maxGuests": "4",
            "price": 120
        })
    }

    #[tokio::test]
    async fn test_owner_update_and_foreign_update() {
        let app = TestApp::new();
        let (ann, ann_user) = app.sign_up("Ann", "a@x.com", "secret").await;
        let (bob, _) = app.sign_up("Bob", "b@x.com", "hunter2").await;

        let (status, place) = app.post("/api/places", Some(&ann), listing("Cottage")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(place["owner"], ann_user["_id"]);
        assert_eq!(place["checkOut"], "11");
        assert_eq!(place["maxGuests"], 4);
        let id = place["_id"].as_str().unwrap().to_string();
        let place_id = parse_id("id", &id).unwrap();
        let before = app.state.store.find_place(place_id).await.unwrap().unwrap();

        let mut update = listing("Bob's now");
        update["id"] = json!(id);
        let (status, body) = app.put("/api/places", Some(&bob), update).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body["error"], "forbidden");
        let after = app.state.store.find_place(place_id).await.unwrap().unwrap();
        assert_eq!(before, after);

        let mut update = listing("Seaside Cottage");
        update["id"] = json!(id);
        let (status, body) = app.put("/api/places", Some(&ann), update).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["title"], "Seaside Cottage");
        assert_eq!(body["_id"], json!(id));

        let (_, fetched) = app.get(&format!("/api/places/{id}"), None).await;
        assert_eq!(fetched["title"], "Seaside Cottage");
    }

    #[tokio::test]
    async fn test_anonymous_reads_and_mutations() {
        let app = TestApp::new();
        let (ann, _) = app.sign_up("Ann", "a@x.com", "secret").await;
        app.post("/api/places", Some(&ann), listing("Cottage")).await;

        let (status, places) = app.get("/api/places", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(places.as_array().unwrap().len(), 1);

        let (status, body) = app.post("/api/places", None, listing("Sneaky")).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"], "unauthenticated");

        let mut update = listing("Sneaky");
        update["id"] = places[0]["_id"].clone();
        let (status, _) = app.put("/api/places", None, update).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let (status, _) = app.get("/api/user-places", None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_user_places_lists_only_own() {
        let app = TestApp::new();
        let (ann, _) = app.sign_up("Ann", "a@x.com", "secret").await;
        let (bob, _) = app.sign_up("Bob", "b@x.com", "hunter2").await;
        app.post("/api/places", Some(&ann), listing("Cottage")).await;
        app.post("/api/places", Some(&bob), listing("Loft")).await;

        let (status, mine) = app.get("/api/user-places", Some(&ann)).await;
        assert_eq!(status, StatusCode::OK);
        let titles: Vec<_> = mine.as_array().unwrap().iter().map(|p| p["title"].clone()).collect();
        assert_eq!(titles, vec![json!("Cottage")]);
    }

    #[tokio::test]
    async fn test_listing_validation() {
        let app = TestApp::new();
        let (ann, _) = app.sign_up("Ann", "a@x.com", "secret").await;

        let mut body = listing("Cottage");
        body["title"] = json!("  ");
        let (status, err) = app.post("/api/places", Some(&ann), body).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(err["field"], "title");

        let mut body = listing("Cottage");
        body["maxGuests"] = json!(0);
        let (status, err) = app.post("/api/places", Some(&ann), body).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(err["field"], "maxGuests");

        let mut body = listing("Cottage");
        body["price"] = json!(-5);
        let (status, err) = app.post("/api/places", Some(&ann), body).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(err["field"], "price");
    }

    #[tokio::test]
    async fn test_unknown_and_malformed_ids() {
        let app = TestApp::new();
        let (status, body) = app.get(&format!("/api/places/{}", uuid::Uuid::new_v4()), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"], "not_found");

        let (status, body) = app.get("/api/places/not-an-id", None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["field"], "id");

        let (ann, _) = app.sign_up("Ann", "a@x.com", "secret").await;
        let mut update = listing("Ghost");
        update["id"] = json!(uuid::Uuid::new_v4().to_string());
        let (status, _) = app.put("/api/places", Some(&ann), update).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
