//! Guide booking routes
//!
//! A booking is visible to the account that made it and to the owner of the
//! booked guide profile.

use axum::{
    Json, Router,
    extract::{Path, State},
    routing::{get, post},
};
use serde::Deserialize;

use crate::auth::{AuthUser, PublicUser, ensure_owner};
use crate::database::{GuideBooking, GuideBookingWithGuide, GuideBookingWithUser, NewGuideBooking};
use crate::errors::ApiError;
use crate::routes::{ApiJson, date, required, timestamp};
use crate::server::AppState;
use crate::types::parse_id;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingDetails {
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub name: Option<String>,
    pub phone: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookGuideRequest {
    pub guide_id: Option<String>,
    pub booking_details: Option<BookingDetails>,
    pub booking_date: Option<String>,
}

pub async fn book_guide(
    State(state): State<AppState>,
    user: AuthUser,
    ApiJson(payload): ApiJson<BookGuideRequest>,
) -> Result<Json<GuideBooking>, ApiError> {
    let guide = parse_id("guideId", &required("guideId", payload.guide_id)?)?;
    let details = payload
        .booking_details
        .ok_or_else(|| ApiError::missing("bookingDetails"))?;
    let booking_date = timestamp("bookingDate", &required("bookingDate", payload.booking_date)?)?;

    let start_date = date("startDate", &required("startDate", details.start_date)?)?;
    let end_date = date("endDate", &required("endDate", details.end_date)?)?;
    if end_date < start_date {
        return Err(ApiError::validation("endDate", "endDate must not be before startDate"));
    }
    let name = required("name", details.name)?;
    let phone = required("phone", details.phone)?;

    if state.store.find_guide(guide).await?.is_none() {
        return Err(ApiError::not_found("Guide profile"));
    }

    let booking = state
        .store
        .create_guide_booking(NewGuideBooking {
            user: user.id,
            guide,
            start_date,
            end_date,
            name,
            phone,
            booking_date,
        })
        .await?;

    tracing::info!(booking_id = %booking.id, guide_id = %guide, "Booked guide");
    Ok(Json(booking))
}

pub async fn my_guide_bookings(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<Json<Vec<GuideBooking>>, ApiError> {
    Ok(Json(state.store.list_guide_bookings_by_user(user.id).await?))
}

/// One booking with its guide embedded
pub async fn get_guide_booking(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<GuideBookingWithGuide>, ApiError> {
    let id = parse_id("id", &id)?;
    let booking = state
        .store
        .find_guide_booking(id)
        .await?
        .ok_or_else(|| ApiError::not_found("Booking"))?;
    let guide = state
        .store
        .find_guide(booking.guide)
        .await?
        .ok_or_else(|| ApiError::not_found("Guide profile"))?;

    if booking.user != user.id && guide.owner != user.id {
        tracing::warn!(user_id = %user.id, booking_id = %id, "Guide booking access denied");
        return Err(ApiError::Forbidden(
            "Only the booker or the guide may view this booking".to_string(),
        ));
    }

    Ok(Json(booking.with_guide(guide)))
}

/// Bookings of a guide, for the guide's owner, with each booker embedded
pub async fn bookings_for_guide(
    State(state): State<AppState>,
    user: AuthUser,
    Path(guide_id): Path<String>,
) -> Result<Json<Vec<GuideBookingWithUser>>, ApiError> {
    let guide_id = parse_id("guideId", &guide_id)?;
    let guide = state
        .store
        .find_guide(guide_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Guide profile"))?;
    ensure_owner(&user, &guide)?;

    let bookings = state.store.list_guide_bookings_by_guide(guide_id).await?;
    if bookings.is_empty() {
        return Err(ApiError::not_found("Booking"));
    }

    let mut result = Vec::with_capacity(bookings.len());
    for booking in bookings {
        let booker = state.store.find_user(booking.user).await?;
        result.push(booking.with_user(booker.as_ref().map(PublicUser::from)));
    }
    Ok(Json(result))
}

pub fn create_guide_booking_routes() -> Router<AppState> {
    Router::new()
        .route("/api/book-guide", post(book_guide))
        .route("/api/book-guide/{id}", get(get_guide_booking))
        .route("/api/my-guide-bookings", get(my_guide_bookings))
        .route("/api/guide-bookings/{guideId}", get(bookings_for_guide))
}
