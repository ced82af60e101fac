//! Property booking routes

use axum::{Json, Router, extract::State, routing::get};
use serde::Deserialize;
use serde_json::Value;

use crate::auth::AuthUser;
use crate::database::{Booking, BookingWithPlace, NewBooking};
use crate::errors::ApiError;
use crate::routes::{ApiJson, date, integer, required};
use crate::server::AppState;
use crate::types::parse_id;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingRequest {
    pub place: Option<String>,
    pub check_in: Option<String>,
    pub check_out: Option<String>,
    pub number_of_guests: Option<Value>,
    pub name: Option<String>,
    pub phone: Option<String>,
    pub price: Option<Value>,
}

pub async fn create_booking(
    State(state): State<AppState>,
    user: AuthUser,
    ApiJson(payload): ApiJson<BookingRequest>,
) -> Result<Json<Booking>, ApiError> {
    let place = parse_id("place", &required("place", payload.place)?)?;
    let check_in = date("checkIn", &required("checkIn", payload.check_in)?)?;
    let check_out = date("checkOut", &required("checkOut", payload.check_out)?)?;
    if check_out <= check_in {
        return Err(ApiError::validation("checkOut", "checkOut must be after checkIn"));
    }

    let number_of_guests = integer("numberOfGuests", payload.number_of_guests.as_ref())?
        .ok_or_else(|| ApiError::missing("numberOfGuests"))?;
    if !(1..=i64::from(i32::MAX)).contains(&number_of_guests) {
        return Err(ApiError::validation("numberOfGuests", "numberOfGuests must be at least 1"));
    }
    let price = integer("price", payload.price.as_ref())?.ok_or_else(|| ApiError::missing("price"))?;
    if price < 0 {
        return Err(ApiError::validation("price", "price must not be negative"));
    }
    let name = required("name", payload.name)?;
    let phone = required("phone", payload.phone)?;

    if state.store.find_place(place).await?.is_none() {
        return Err(ApiError::not_found("Place"));
    }

    let booking = state
        .store
        .create_booking(NewBooking {
            place,
            user: user.id,
            check_in,
            check_out,
            number_of_guests: number_of_guests as i32,
            name,
            phone,
            price,
        })
        .await?;

    tracing::info!(booking_id = %booking.id, place_id = %place, "Created booking");
    Ok(Json(booking))
}

/// The caller's bookings with each place embedded
pub async fn list_bookings(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<Json<Vec<BookingWithPlace>>, ApiError> {
    let bookings = state.store.list_bookings_by_user(user.id).await?;

    let mut result = Vec::with_capacity(bookings.len());
    for booking in bookings {
        match state.store.find_place(booking.place).await? {
            Some(place) => result.push(booking.with_place(place)),
            None => tracing::warn!(booking_id = %booking.id, "Booking references a missing place"),
        }
    }
    Ok(Json(result))
}

pub fn create_booking_routes() -> Router<AppState> {
    Router::new().route("/api/bookings", get(list_bookings).post(create_booking))
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use serde_json::{Value, json};

    use crate::test_utils::TestApp;

    async fn place_for(app: &TestApp, cookie: &str) -> String {
        let (_, place) = app
            .post(
                "/api/places",
                Some(cookie),
                json!({ "title": "Cottage", "address": "1 Harbour Road", "price": 100 }),
            )
            .await;
        place["_id"].as_str().unwrap().to_string()
    }

    fn booking(place: &str) -> Value {
        json!({
            "place": place,
            "checkIn": "2025-06-01",
            "checkOut": "2025-06-04",
            "numberOfGuests": 2,
            "name": "Ann",
            "phone": "+44 1234",
            "price": 300
        })
    }

    #[tokio::test]
    async fn test_create_and_list_bookings() {
        let app = TestApp::new();
        let (ann, ann_user) = app.sign_up("Ann", "a@x.com", "secret").await;
        let (bob, _) = app.sign_up("Bob", "b@x.com", "hunter2").await;
        let place = place_for(&app, &ann).await;

        let (status, created) = app.post("/api/bookings", Some(&ann), booking(&place)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(created["user"], ann_user["_id"]);
        assert_eq!(created["checkIn"], "2025-06-01");
        assert_eq!(created["numberOfGuests"], 2);

        let (status, mine) = app.get("/api/bookings", Some(&ann)).await;
        assert_eq!(status, StatusCode::OK);
        let mine = mine.as_array().unwrap();
        assert_eq!(mine.len(), 1);
        assert_eq!(mine[0]["place"]["title"], "Cottage");

        let (_, theirs) = app.get("/api/bookings", Some(&bob)).await;
        assert!(theirs.as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_booking_requires_auth() {
        let app = TestApp::new();
        let (ann, _) = app.sign_up("Ann", "a@x.com", "secret").await;
        let place = place_for(&app, &ann).await;

        let (status, _) = app.post("/api/bookings", None, booking(&place)).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        let (status, _) = app.get("/api/bookings", None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_booking_validation() {
        let app = TestApp::new();
        let (ann, _) = app.sign_up("Ann", "a@x.com", "secret").await;
        let place = place_for(&app, &ann).await;

        let mut body = booking(&place);
        body["checkOut"] = json!("2025-06-01");
        let (status, err) = app.post("/api/bookings", Some(&ann), body).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(err["field"], "checkOut");

        let mut body = booking(&place);
        body.as_object_mut().unwrap().remove("phone");
        let (status, err) = app.post("/api/bookings", Some(&ann), body).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(err["field"], "phone");

        let mut body = booking(&place);
        body["numberOfGuests"] = json!(0);
        let (status, err) = app.post("/api/bookings", Some(&ann), body).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(err["field"], "numberOfGuests");
    }

    #[tokio::test]
    async fn test_booking_unknown_place() {
        let app = TestApp::new();
        let (ann, _) = app.sign_up("Ann", "a@x.com", "secret").await;
        let (status, _) = app
            .post("/api/bookings", Some(&ann), booking(&uuid::Uuid::new_v4().to_string()))
            .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
